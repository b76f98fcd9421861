// Prompt templates for LLM interactions
//
// All prompts used by the assist endpoints live here. Prompts are
// versioned so generated text can be traced back to the wording that
// produced it.

use std::collections::HashMap;

/// Prompt template structure
pub struct PromptTemplate {
    pub name: String,
    pub version: String,
    pub system: String,
    pub user_template: String,
}

impl PromptTemplate {
    /// Render the user template, substituting `{{var}}` markers from the
    /// variable map. Unknown markers are left in place so a missing
    /// variable is visible in the output rather than silently blank.
    pub fn render(&self, variables: &HashMap<String, String>) -> String {
        let mut rendered = self.user_template.clone();
        for (key, value) in variables {
            rendered = rendered.replace(&format!("{{{{{key}}}}}"), value);
        }
        rendered
    }
}

pub mod library {
    use super::PromptTemplate;

    pub fn commentary_draft() -> PromptTemplate {
        PromptTemplate {
            name: "commentary_draft".to_string(),
            version: "1.0.0".to_string(),
            system: "You are an experienced property valuer drafting report \
                     commentary. Write in measured, professional prose. Do not \
                     invent facts that are not in the provided details."
                .to_string(),
            user_template: "Property: {{address}}\n\
                            Section: {{section}}\n\
                            Known details:\n{{details}}\n\n\
                            Draft the {{section}} commentary for the valuation \
                            report. Two to four sentences, no heading."
                .to_string(),
        }
    }

    pub fn rewrite_text() -> PromptTemplate {
        PromptTemplate {
            name: "rewrite_text".to_string(),
            version: "1.0.0".to_string(),
            system: "You are editing text for a property valuation report. \
                     Return only the rewritten text with no preamble."
                .to_string(),
            user_template: "Instruction: {{instruction}}\n\n\
                            Text to rewrite:\n{{text}}"
                .to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_substitutes_variables() {
        let template = library::rewrite_text();
        let vars = HashMap::from([
            ("instruction".to_string(), "make it shorter".to_string()),
            ("text".to_string(), "a long passage".to_string()),
        ]);

        let rendered = template.render(&vars);

        assert!(rendered.contains("make it shorter"));
        assert!(rendered.contains("a long passage"));
        assert!(!rendered.contains("{{"));
    }

    #[test]
    fn unknown_variables_stay_visible() {
        let template = library::commentary_draft();
        let rendered = template.render(&HashMap::new());
        assert!(rendered.contains("{{address}}"));
    }
}
