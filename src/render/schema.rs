/// The single repeating-section key. A template table row whose cells
/// reference `comparables.<field>` placeholders is duplicated once per
/// bound comparable sale.
pub const REPEATING_SECTION_KEY: &str = "comparables";

/// Maps one leaf field of the form payload to a flat placeholder key.
#[derive(Debug, Clone)]
pub struct FieldMapping {
    /// Top-level form section the field lives under.
    pub section: String,
    /// Field name inside the section.
    pub field: String,
    /// Flat placeholder key it resolves to.
    pub placeholder: String,
}

impl FieldMapping {
    pub fn new(section: &str, field: &str, placeholder: &str) -> Self {
        Self {
            section: section.to_string(),
            field: field.to_string(),
            placeholder: placeholder.to_string(),
        }
    }
}

/// Declares which placeholders exist independently of what data arrives.
///
/// Decoupling the schema from the runtime payload lets the same renderer
/// serve evolving forms without code changes; fields the payload lacks
/// resolve to empty strings rather than failing.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    /// Per-section leaf-field mappings.
    pub fields: Vec<FieldMapping>,
    /// Static boilerplate content, placeholder key to text.
    pub globals: Vec<(String, String)>,
    /// Form field name to row placeholder key, for the repeating section.
    pub row_fields: Vec<(String, String)>,
    /// `(section, field)` of the list the repeating section binds to.
    pub repeating_source: Option<(String, String)>,
}

impl Schema {
    /// The standard valuation-report schema.
    pub fn standard() -> Self {
        let fields = vec![
            FieldMapping::new("Info", "Property Address", "Replace_Address"),
            FieldMapping::new("Info", "Client Name", "Replace_Client"),
            FieldMapping::new("Info", "Valuation Date", "Replace_Valuation_Date"),
            FieldMapping::new("Info", "Purpose", "Replace_Purpose"),
            FieldMapping::new("Info", "Interest Valued", "Replace_Interest"),
            FieldMapping::new("Property", "Land Area", "Replace_Land_Area"),
            FieldMapping::new("Property", "Floor Area", "Replace_Floor_Area"),
            FieldMapping::new("Property", "Year Built", "Replace_Year_Built"),
            FieldMapping::new("Property", "Zoning", "Replace_Zoning"),
            FieldMapping::new("Property", "Construction", "Replace_Construction"),
            FieldMapping::new("Property", "Accommodation", "Replace_Accommodation"),
            FieldMapping::new("Valuation", "Market Value", "Replace_Market_Value"),
            FieldMapping::new("Valuation", "Market Value In Words", "Replace_Market_Value_Words"),
            FieldMapping::new("Valuation", "Rental Value", "Replace_Rental_Value"),
            FieldMapping::new("Valuation", "Valuation Approach", "Replace_Approach"),
            FieldMapping::new("Commentary", "Location", "Replace_Location_Commentary"),
            FieldMapping::new("Commentary", "Market", "Replace_Market_Commentary"),
            FieldMapping::new("Commentary", "Condition", "Replace_Condition_Commentary"),
            FieldMapping::new("Commentary", "Tenure", "Replace_Tenure_Commentary"),
        ];

        let globals = vec![
            (
                "Replace_Disclaimer".to_string(),
                "This report is provided for the use of the named client only and \
                 no responsibility is accepted to any third party for the whole or \
                 any part of its contents."
                    .to_string(),
            ),
            (
                "Replace_Basis_Of_Value".to_string(),
                "Market Value as defined by the International Valuation Standards: \
                 the estimated amount for which an asset should exchange on the \
                 valuation date between a willing buyer and a willing seller in an \
                 arm's length transaction."
                    .to_string(),
            ),
        ];

        let row_fields = vec![
            ("Address".to_string(), "address".to_string()),
            ("Sale Date".to_string(), "sale_date".to_string()),
            ("Sale Price".to_string(), "sale_price".to_string()),
            ("Land Area".to_string(), "land_area".to_string()),
            ("Comparison".to_string(), "comparison".to_string()),
        ];

        Self {
            fields,
            globals,
            row_fields,
            repeating_source: Some(("Sales Evidence".to_string(), "Comparable Sales".to_string())),
        }
    }
}
