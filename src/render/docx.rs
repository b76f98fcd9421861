use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Write};
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

use crate::error::{Error, Result};

use super::image;
use super::{Binding, ImageBinding, Row};

/// Opening/closing marker syntax bounding a placeholder tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Delimiters {
    pub open: &'static str,
    pub close: &'static str,
}

/// Primary delimiter pair.
pub const DOUBLE_BRACE: Delimiters = Delimiters {
    open: "{{",
    close: "}}",
};

/// Fallback delimiter pair.
pub const PERCENT_BRACKET: Delimiters = Delimiters {
    open: "{%",
    close: "%}",
};

/// One reportable defect found by a substitution pass. The renderer
/// surfaces the first of these verbatim when every attempt fails.
#[derive(Debug, Clone, Error)]
pub enum SubstitutionError {
    #[error("unterminated placeholder near \"{snippet}\"")]
    Unterminated { snippet: String },

    #[error("image placeholder \"{tag}\" has no bound image")]
    MissingImage { tag: String },
}

/// An image substitution recorded by the pass; the archive-level embed
/// happens after the text pass succeeds.
#[derive(Debug, Clone)]
pub struct PendingImage {
    pub rid: u32,
    pub binding: ImageBinding,
}

/// Statistics and side outputs of one substitution pass.
#[derive(Debug, Default)]
pub struct PassStats {
    /// Scalar substitutions whose value was non-empty and not "N/A".
    pub counted: usize,
    /// Substitutions where any binding existed, regardless of value.
    pub bound_hits: usize,
    pub pending_images: Vec<PendingImage>,
    pub issues: Vec<SubstitutionError>,
    pub next_rid: u32,
}

/// The unpacked docx container: an ordered list of archive entries.
pub struct DocxArchive {
    entries: Vec<(String, Vec<u8>)>,
}

const DOCUMENT_XML: &str = "word/document.xml";

impl DocxArchive {
    /// Unpacks template bytes. Anything that is not a readable zip archive
    /// is a render failure.
    pub fn unpack(bytes: &[u8]) -> Result<Self> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| Error::Render(format!("template is not a docx archive: {e}")))?;

        let mut entries = Vec::with_capacity(archive.len());
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::Render(format!("unreadable archive entry: {e}")))?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf)
                .map_err(|e| Error::Render(format!("unreadable archive entry {name}: {e}")))?;
            entries.push((name, buf));
        }

        Ok(Self { entries })
    }

    pub fn get(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, b)| b.as_slice())
    }

    /// Replaces an entry, appending it when absent.
    pub fn set(&mut self, name: &str, bytes: Vec<u8>) {
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = bytes,
            None => self.entries.push((name.to_string(), bytes)),
        }
    }

    pub fn document_xml(&self) -> Result<String> {
        let bytes = self
            .get(DOCUMENT_XML)
            .ok_or_else(|| Error::Render("archive has no word/document.xml".to_string()))?;
        String::from_utf8(bytes.to_vec())
            .map_err(|e| Error::Render(format!("document.xml is not UTF-8: {e}")))
    }

    pub fn set_document_xml(&mut self, xml: String) {
        self.set(DOCUMENT_XML, xml.into_bytes());
    }

    /// Repacks the archive to bytes.
    pub fn pack(&self) -> Result<Vec<u8>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Deflated);

        for (name, bytes) in &self.entries {
            writer
                .start_file(name.as_str(), options)
                .map_err(|e| Error::Render(format!("repack failed at {name}: {e}")))?;
            writer
                .write_all(bytes)
                .map_err(|e| Error::Render(format!("repack failed at {name}: {e}")))?;
        }

        Ok(writer
            .finish()
            .map_err(|e| Error::Render(format!("repack failed: {e}")))?
            .into_inner())
    }
}

fn wt_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<w:t(?:\s[^>]*)?>(.*?)</w:t>").unwrap())
}

fn paragraph_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<w:p(?:\s[^>]*)?>.*?</w:p>").unwrap())
}

fn placeholder_regex(delims: Delimiters) -> Regex {
    let pattern = format!(
        r"{}\s*([A-Za-z0-9_][A-Za-z0-9_.\- ]*?)\s*{}",
        regex::escape(delims.open),
        regex::escape(delims.close)
    );
    Regex::new(&pattern).unwrap()
}

/// `<w:t>` content spans of a region, concatenated into one searchable
/// string with a byte-offset map back into the source XML. Word splits
/// placeholder text across runs freely; searching the concatenation is
/// what makes split placeholders visible.
struct SegmentMap {
    /// Absolute (start, end) byte offsets of each segment's content.
    spans: Vec<(usize, usize)>,
    /// Concatenated-text start offset of each segment.
    starts: Vec<usize>,
    text: String,
}

impl SegmentMap {
    fn build(xml: &str, base: usize, region: &str) -> Self {
        let mut spans = Vec::new();
        let mut starts = Vec::new();
        let mut text = String::new();
        debug_assert!(base + region.len() <= xml.len());

        for caps in wt_regex().captures_iter(region) {
            let content = caps.get(1).unwrap();
            starts.push(text.len());
            spans.push((base + content.start(), base + content.end()));
            text.push_str(content.as_str());
        }

        Self { spans, starts, text }
    }

    /// Segment index and local offset for a concatenated-text position.
    fn locate(&self, pos: usize) -> (usize, usize) {
        let idx = self.starts.partition_point(|&s| s <= pos) - 1;
        (idx, pos - self.starts[idx])
    }

    /// Translates a concatenated-text range into source-XML edits: the
    /// replacement lands in the first touched segment, every other touched
    /// segment portion is cleared.
    fn edits_for(&self, range: std::ops::Range<usize>, replacement: String) -> Vec<Edit> {
        let (si, sl) = self.locate(range.start);
        let (ei, _) = self.locate(range.end - 1);
        let el = range.end - self.starts[ei];

        if si == ei {
            return vec![Edit {
                start: self.spans[si].0 + sl,
                end: self.spans[si].0 + el,
                replacement,
            }];
        }

        let mut edits = vec![Edit {
            start: self.spans[si].0 + sl,
            end: self.spans[si].1,
            replacement,
        }];
        for k in si + 1..ei {
            edits.push(Edit {
                start: self.spans[k].0,
                end: self.spans[k].1,
                replacement: String::new(),
            });
        }
        edits.push(Edit {
            start: self.spans[ei].0,
            end: self.spans[ei].0 + el,
            replacement: String::new(),
        });
        edits
    }
}

struct Edit {
    start: usize,
    end: usize,
    replacement: String,
}

fn apply_edits(xml: &str, mut edits: Vec<Edit>) -> String {
    edits.sort_by(|a, b| b.start.cmp(&a.start));
    let mut out = xml.to_string();
    for edit in edits {
        out.replace_range(edit.start..edit.end, &edit.replacement);
    }
    out
}

fn escape_xml(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Encodes a scalar value for insertion into a `<w:t>` content span.
/// With normalization on, newlines become explicit `<w:br/>` elements;
/// without it they ride along as literal characters (which Word collapses,
/// the visible symptom that makes the normalized attempt worth retrying).
fn encode_value(value: &str, normalize_newlines: bool) -> String {
    let escaped = escape_xml(value);
    if normalize_newlines {
        escaped.replace('\n', "</w:t><w:br/><w:t xml:space=\"preserve\">")
    } else {
        escaped
    }
}

fn is_counted(value: &str) -> bool {
    let trimmed = value.trim();
    !trimmed.is_empty() && trimmed != "N/A"
}

/// One substitution pass over a document region.
///
/// `replace_unbound` distinguishes the global pass (unknown keys render as
/// empty string) from the scoped repeating-row pass (unknown keys are left
/// for the global pass to resolve).
pub fn substitute(
    xml: &str,
    bindings: &HashMap<String, Binding>,
    image_tags: &HashSet<String>,
    delims: Delimiters,
    normalize_newlines: bool,
    next_rid: u32,
    replace_unbound: bool,
) -> (String, PassStats) {
    let mut stats = PassStats {
        next_rid,
        ..PassStats::default()
    };
    let placeholder = placeholder_regex(delims);
    let mut edits = Vec::new();

    for para in paragraph_regex().find_iter(xml) {
        let map = SegmentMap::build(xml, para.start(), para.as_str());
        if map.text.is_empty() {
            continue;
        }

        let mut matched: Vec<std::ops::Range<usize>> = Vec::new();
        for caps in placeholder.captures_iter(&map.text) {
            let whole = caps.get(0).unwrap();
            let key = caps.get(1).unwrap().as_str().trim();
            matched.push(whole.range());

            let replacement = match bindings.get(key) {
                Some(Binding::Image(img)) => {
                    let rid = stats.next_rid;
                    stats.next_rid += 1;
                    stats.pending_images.push(PendingImage {
                        rid,
                        binding: img.clone(),
                    });
                    image::placeholder_splice(rid, img.width, img.height)
                }
                Some(Binding::Text(value)) => {
                    stats.bound_hits += 1;
                    if is_counted(value) {
                        stats.counted += 1;
                    }
                    encode_value(value, normalize_newlines)
                }
                // A bare repeating-section marker left after row expansion
                // renders as nothing.
                Some(Binding::Rows(_)) => String::new(),
                None => {
                    if image_tags.contains(key) {
                        stats.issues.push(SubstitutionError::MissingImage {
                            tag: key.to_string(),
                        });
                    }
                    if !replace_unbound {
                        continue;
                    }
                    String::new()
                }
            };

            edits.extend(map.edits_for(whole.range(), replacement));
        }

        // An opening delimiter that never became a full match is a
        // malformed placeholder and fails the attempt.
        for (pos, _) in map.text.match_indices(delims.open) {
            if !matched.iter().any(|r| r.contains(&pos)) {
                let snippet: String = map.text[pos..].chars().take(30).collect();
                stats.issues.push(SubstitutionError::Unterminated { snippet });
            }
        }
    }

    // An image tag known to the configuration but absent from the bindings
    // is a tag/key mismatch even when the delimiters never matched around
    // it; an empty image slot is never emitted silently.
    if !image_tags.is_empty() {
        let full = SegmentMap::build(xml, 0, xml);
        for tag in image_tags {
            if !bindings.contains_key(tag.as_str()) && full.text.contains(tag.as_str()) {
                stats.issues.push(SubstitutionError::MissingImage {
                    tag: tag.clone(),
                });
            }
        }
    }

    (apply_edits(xml, edits), stats)
}

/// Finds outermost `<w:tr>` ranges, tolerating nested tables.
fn table_row_ranges(xml: &str) -> Vec<(usize, usize)> {
    const CLOSE: &str = "</w:tr>";
    let mut events: Vec<(usize, bool)> = Vec::new();

    for (pos, _) in xml.match_indices("<w:tr") {
        // Require a real row-open token, not e.g. <w:trPr>.
        let rest = &xml[pos + 5..];
        if rest.starts_with('>') || rest.starts_with(' ') {
            events.push((pos, true));
        }
    }
    for (pos, _) in xml.match_indices(CLOSE) {
        events.push((pos, false));
    }
    events.sort_by_key(|e| e.0);

    let mut ranges = Vec::new();
    let mut depth = 0usize;
    let mut open_at = 0usize;
    for (pos, is_open) in events {
        if is_open {
            if depth == 0 {
                open_at = pos;
            }
            depth += 1;
        } else if depth > 0 {
            depth -= 1;
            if depth == 0 {
                ranges.push((open_at, pos + CLOSE.len()));
            }
        }
    }
    ranges
}

/// Expands every table row referencing `<key>.<field>` placeholders once
/// per bound row. Returns the expanded XML and the number of row-field
/// substitutions performed.
pub fn expand_rows(
    xml: &str,
    key: &str,
    rows: &[Row],
    delims: Delimiters,
    normalize_newlines: bool,
) -> (String, usize) {
    let marker = Regex::new(&format!(
        r"{}\s*{}\.",
        regex::escape(delims.open),
        regex::escape(key)
    ))
    .unwrap();

    let mut row_hits = 0usize;
    let mut edits = Vec::new();
    let no_images = HashSet::new();

    for (start, end) in table_row_ranges(xml) {
        let row_xml = &xml[start..end];
        let map = SegmentMap::build(xml, start, row_xml);
        if !marker.is_match(&map.text) {
            continue;
        }

        let mut clones = String::new();
        for row in rows {
            let row_bindings: HashMap<String, Binding> = row
                .iter()
                .map(|(field, value)| (format!("{key}.{field}"), Binding::text(value.clone())))
                .collect();

            let (clone, stats) = substitute(
                row_xml,
                &row_bindings,
                &no_images,
                delims,
                normalize_newlines,
                0,
                false,
            );
            row_hits += stats.bound_hits;
            clones.push_str(&clone);
        }

        edits.push(Edit {
            start,
            end,
            replacement: clones,
        });
    }

    (apply_edits(xml, edits), row_hits)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_bindings(pairs: &[(&str, &str)]) -> HashMap<String, Binding> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), Binding::text(*v)))
            .collect()
    }

    fn para(inner: &str) -> String {
        format!("<w:p><w:r><w:t>{inner}</w:t></w:r></w:p>")
    }

    #[test]
    fn substitutes_simple_placeholder() {
        let xml = para("Address: {{Replace_Address}}");
        let bindings = text_bindings(&[("Replace_Address", "12 Test St")]);

        let (out, stats) = substitute(
            &xml,
            &bindings,
            &HashSet::new(),
            DOUBLE_BRACE,
            false,
            1,
            true,
        );

        assert!(out.contains("Address: 12 Test St"));
        assert_eq!(stats.counted, 1);
        assert!(stats.issues.is_empty());
    }

    #[test]
    fn substitutes_placeholder_split_across_runs() {
        let xml = "<w:p><w:r><w:t>{{Replace_</w:t></w:r>\
                   <w:r><w:t>Address}}</w:t></w:r></w:p>";
        let bindings = text_bindings(&[("Replace_Address", "12 Test St")]);

        let (out, stats) = substitute(
            xml,
            &bindings,
            &HashSet::new(),
            DOUBLE_BRACE,
            false,
            1,
            true,
        );

        assert!(out.contains("12 Test St"), "got: {out}");
        assert!(!out.contains("Replace_"));
        assert_eq!(stats.counted, 1);
    }

    #[test]
    fn unbound_placeholder_renders_empty() {
        let xml = para("before {{Replace_Missing}} after");

        let (out, stats) = substitute(
            &xml,
            &HashMap::new(),
            &HashSet::new(),
            DOUBLE_BRACE,
            false,
            1,
            true,
        );

        assert!(out.contains("before  after"));
        assert_eq!(stats.counted, 0);
        assert!(stats.issues.is_empty());
    }

    #[test]
    fn empty_and_na_values_are_not_counted() {
        let xml = para("{{A}} {{B}} {{C}}");
        let bindings = text_bindings(&[("A", ""), ("B", "N/A"), ("C", "real")]);

        let (_, stats) = substitute(
            &xml,
            &bindings,
            &HashSet::new(),
            DOUBLE_BRACE,
            false,
            1,
            true,
        );

        assert_eq!(stats.counted, 1);
        assert_eq!(stats.bound_hits, 3);
    }

    #[test]
    fn unterminated_placeholder_is_an_issue() {
        let xml = para("{{Broken and no close");

        let (_, stats) = substitute(
            &xml,
            &HashMap::new(),
            &HashSet::new(),
            DOUBLE_BRACE,
            false,
            1,
            true,
        );

        assert!(matches!(
            stats.issues.first(),
            Some(SubstitutionError::Unterminated { .. })
        ));
    }

    #[test]
    fn value_is_xml_escaped() {
        let xml = para("{{A}}");
        let bindings = text_bindings(&[("A", "Smith & Sons <Pty>")]);

        let (out, _) = substitute(
            &xml,
            &bindings,
            &HashSet::new(),
            DOUBLE_BRACE,
            false,
            1,
            true,
        );

        assert!(out.contains("Smith &amp; Sons &lt;Pty&gt;"));
    }

    #[test]
    fn newline_normalization_emits_breaks() {
        let xml = para("{{A}}");
        let bindings = text_bindings(&[("A", "line one\nline two")]);

        let (out, _) = substitute(
            &xml,
            &bindings,
            &HashSet::new(),
            DOUBLE_BRACE,
            true,
            1,
            true,
        );

        assert!(out.contains("<w:br/>"));
        assert!(out.contains("line one"));
        assert!(out.contains("line two"));
    }

    #[test]
    fn missing_image_binding_is_an_issue_even_without_matching_delimiters() {
        let xml = para("{%Replace_Image_Front%}");
        let image_tags: HashSet<String> = ["Replace_Image_Front".to_string()].into();

        // Pass runs with the double-brace pair, so the percent tag never
        // matches; the tag text alone must still raise the issue.
        let (_, stats) = substitute(
            &xml,
            &HashMap::new(),
            &image_tags,
            DOUBLE_BRACE,
            false,
            1,
            true,
        );

        assert!(matches!(
            stats.issues.first(),
            Some(SubstitutionError::MissingImage { .. })
        ));
    }

    #[test]
    fn percent_bracket_pair_substitutes() {
        let xml = para("{%Replace_Address%}");
        let bindings = text_bindings(&[("Replace_Address", "12 Test St")]);

        let (out, stats) = substitute(
            &xml,
            &bindings,
            &HashSet::new(),
            PERCENT_BRACKET,
            true,
            1,
            true,
        );

        assert!(out.contains("12 Test St"));
        assert_eq!(stats.counted, 1);
    }

    fn comparable_row_table() -> String {
        format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc><w:tc>{}</w:tc></w:tr></w:tbl>",
            para("{{comparables.address}}"),
            para("{{comparables.sale_price}}")
        )
    }

    #[test]
    fn expands_row_once_per_entry() {
        let xml = comparable_row_table();
        let rows = vec![
            Row::from([
                ("address".to_string(), "1 First Ave".to_string()),
                ("sale_price".to_string(), "$800,000".to_string()),
            ]),
            Row::from([
                ("address".to_string(), "2 Second Ave".to_string()),
                ("sale_price".to_string(), "$750,000".to_string()),
            ]),
        ];

        let (out, hits) = expand_rows(&xml, "comparables", &rows, DOUBLE_BRACE, false);

        assert_eq!(out.matches("<w:tr>").count(), 2);
        assert!(out.contains("1 First Ave"));
        assert!(out.contains("2 Second Ave"));
        assert_eq!(hits, 4);
    }

    #[test]
    fn zero_rows_removes_the_template_row() {
        let xml = comparable_row_table();
        let (out, hits) = expand_rows(&xml, "comparables", &[], DOUBLE_BRACE, false);

        assert!(!out.contains("<w:tr>"));
        assert_eq!(hits, 0);
    }

    #[test]
    fn rows_leave_unrelated_placeholders_for_the_global_pass() {
        let xml = format!(
            "<w:tbl><w:tr><w:tc>{}</w:tc></w:tr></w:tbl>",
            para("{{comparables.address}} {{Replace_Client}}")
        );
        let rows = vec![Row::from([(
            "address".to_string(),
            "1 First Ave".to_string(),
        )])];

        let (out, _) = expand_rows(&xml, "comparables", &rows, DOUBLE_BRACE, false);

        assert!(out.contains("{{Replace_Client}}"));
        assert!(out.contains("1 First Ave"));
    }

    #[test]
    fn archive_round_trip_preserves_entries() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(para("{{A}}").as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let mut archive = DocxArchive::unpack(&bytes).unwrap();
        assert!(archive.document_xml().unwrap().contains("{{A}}"));

        archive.set_document_xml(para("done").to_string());
        let repacked = archive.pack().unwrap();

        let reread = DocxArchive::unpack(&repacked).unwrap();
        assert!(reread.document_xml().unwrap().contains("done"));
    }

    #[test]
    fn unpack_rejects_garbage() {
        assert!(DocxArchive::unpack(b"not a zip").is_err());
    }
}
