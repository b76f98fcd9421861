use std::collections::{HashMap, HashSet};

use base64::Engine as _;

use crate::error::{Error, Result};
use crate::infrastructure::stores::templates::DOCX_CONTENT_TYPE;

use super::docx::{self, Delimiters, DocxArchive, SubstitutionError, DOUBLE_BRACE, PERCENT_BRACKET};
use super::image;
use super::schema::REPEATING_SECTION_KEY;
use super::Binding;

/// Successful render: the repacked document plus what was substituted.
#[derive(Debug)]
pub struct Rendered {
    pub bytes: Vec<u8>,
    /// Non-empty, non-"N/A" scalar substitutions plus every repeating-row
    /// field occurrence.
    pub replaced_count: usize,
    pub images_embedded: usize,
}

impl Rendered {
    /// The document as a base64 data URI, the form handed back to callers.
    pub fn data_uri(&self) -> String {
        format!(
            "data:{DOCX_CONTENT_TYPE};base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&self.bytes)
        )
    }
}

/// Fixed attempt order: primary delimiters plain, primary with line-break
/// normalization, then the fallback pair with normalization.
const ATTEMPTS: [(Delimiters, bool); 3] = [
    (DOUBLE_BRACE, false),
    (DOUBLE_BRACE, true),
    (PERCENT_BRACKET, true),
];

/// Why one attempt failed. Attempts are independent: no partial output is
/// carried forward, every attempt starts from the pristine template bytes.
enum AttemptError {
    /// The substitution pass reported malformed placeholders or unbound
    /// image tags.
    Issues(Vec<SubstitutionError>),
    /// Images were supplied but no image substitution fired, which signals
    /// a delimiter mismatch rather than a hard error.
    ImageHookNotInvoked,
    /// Archive-level failure (unreadable template, staged file missing).
    Fatal(Error),
}

impl AttemptError {
    /// Human-readable explanation: the first reported sub-error's message.
    fn explanation(&self) -> String {
        match self {
            AttemptError::Issues(issues) => issues
                .first()
                .map(|i| i.to_string())
                .unwrap_or_else(|| "substitution failed".to_string()),
            AttemptError::ImageHookNotInvoked => {
                "no image placeholder matched the supplied images \
                 (delimiter mismatch?)"
                    .to_string()
            }
            AttemptError::Fatal(e) => e.to_string(),
        }
    }
}

/// Renders a template against a resolved placeholder map.
///
/// Tries each delimiter/line-break strategy in order until one succeeds;
/// when all are exhausted the last attempt's explanation surfaces as a
/// `Render` error.
pub fn render(
    template: &[u8],
    bindings: &HashMap<String, Binding>,
    image_tags: &HashSet<String>,
) -> Result<Rendered> {
    let images_supplied = bindings
        .values()
        .any(|b| matches!(b, Binding::Image(_)));

    let mut last_error: Option<AttemptError> = None;

    for (n, (delims, normalize)) in ATTEMPTS.iter().enumerate() {
        match attempt(template, bindings, image_tags, *delims, *normalize, images_supplied) {
            Ok(rendered) => {
                tracing::info!(
                    attempt = n + 1,
                    replaced = rendered.replaced_count,
                    images = rendered.images_embedded,
                    "render succeeded"
                );
                return Ok(rendered);
            }
            Err(e) => {
                tracing::warn!(attempt = n + 1, reason = %e.explanation(), "render attempt failed");
                last_error = Some(e);
            }
        }
    }

    let explanation = last_error
        .map(|e| e.explanation())
        .unwrap_or_else(|| "render failed".to_string());
    Err(Error::Render(explanation))
}

fn attempt(
    template: &[u8],
    bindings: &HashMap<String, Binding>,
    image_tags: &HashSet<String>,
    delims: Delimiters,
    normalize_newlines: bool,
    images_supplied: bool,
) -> std::result::Result<Rendered, AttemptError> {
    let mut archive = DocxArchive::unpack(template).map_err(AttemptError::Fatal)?;
    let doc = archive.document_xml().map_err(AttemptError::Fatal)?;

    let (doc, row_hits) = match bindings.get(REPEATING_SECTION_KEY) {
        Some(Binding::Rows(rows)) => {
            docx::expand_rows(&doc, REPEATING_SECTION_KEY, rows, delims, normalize_newlines)
        }
        _ => (doc, 0),
    };

    let next_rid = image::next_rid(&archive);
    let (doc, stats) = docx::substitute(
        &doc,
        bindings,
        image_tags,
        delims,
        normalize_newlines,
        next_rid,
        true,
    );

    if !stats.issues.is_empty() {
        return Err(AttemptError::Issues(stats.issues));
    }
    if images_supplied && stats.pending_images.is_empty() {
        return Err(AttemptError::ImageHookNotInvoked);
    }

    for pending in &stats.pending_images {
        let bytes = std::fs::read(&pending.binding.path).map_err(|e| {
            AttemptError::Fatal(Error::Render(format!(
                "staged image {} unreadable: {e}",
                pending.binding.path.display()
            )))
        })?;
        let ext = pending
            .binding
            .path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("png");
        image::register_image(&mut archive, pending.rid, ext, bytes)
            .map_err(AttemptError::Fatal)?;
    }

    archive.set_document_xml(doc);
    let bytes = archive.pack().map_err(AttemptError::Fatal)?;

    Ok(Rendered {
        bytes,
        replaced_count: stats.counted + row_hits,
        images_embedded: stats.pending_images.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn minimal_docx(document_xml: &str) -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        let options = zip::write::FileOptions::default();

        writer.start_file("[Content_Types].xml", options).unwrap();
        writer
            .write_all(
                br#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">
<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>
<Default Extension="xml" ContentType="application/xml"/>
</Types>"#,
            )
            .unwrap();

        writer.start_file("word/document.xml", options).unwrap();
        writer
            .write_all(
                format!(
                    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{document_xml}</w:body></w:document>"#
                )
                .as_bytes(),
            )
            .unwrap();

        writer.finish().unwrap().into_inner()
    }

    fn para(inner: &str) -> String {
        format!("<w:p><w:r><w:t>{inner}</w:t></w:r></w:p>")
    }

    #[test]
    fn fully_bound_template_renders_on_first_attempt() {
        let template = minimal_docx(&para("{{Replace_Address}}"));
        let bindings = HashMap::from([(
            "Replace_Address".to_string(),
            Binding::text("12 Test St"),
        )]);

        let rendered = render(&template, &bindings, &HashSet::new()).unwrap();

        assert_eq!(rendered.replaced_count, 1);
        let out = DocxArchive::unpack(&rendered.bytes).unwrap();
        assert!(out.document_xml().unwrap().contains("12 Test St"));
    }

    #[test]
    fn malformed_primary_delimiters_succeed_under_fallback_pair() {
        let body = format!(
            "{}{}",
            para("{{Broken with no close"),
            para("{%Replace_Address%}")
        );
        let template = minimal_docx(&body);
        let bindings = HashMap::from([(
            "Replace_Address".to_string(),
            Binding::text("12 Test St"),
        )]);

        let rendered = render(&template, &bindings, &HashSet::new()).unwrap();

        assert_ne!(rendered.bytes, template);
        let out = DocxArchive::unpack(&rendered.bytes).unwrap();
        assert!(out.document_xml().unwrap().contains("12 Test St"));
    }

    #[test]
    fn unbound_image_tag_exhausts_all_attempts() {
        let template = minimal_docx(&para("{{Replace_Image_Front}}"));
        let image_tags = HashSet::from(["Replace_Image_Front".to_string()]);

        let err = render(&template, &HashMap::new(), &image_tags).unwrap_err();

        match err {
            Error::Render(message) => assert!(
                message.contains("Replace_Image_Front"),
                "unexpected message: {message}"
            ),
            other => panic!("expected render error, got {other:?}"),
        }
    }

    #[test]
    fn data_uri_is_docx_typed() {
        let rendered = Rendered {
            bytes: vec![1, 2, 3],
            replaced_count: 0,
            images_embedded: 0,
        };
        assert!(rendered
            .data_uri()
            .starts_with("data:application/vnd.openxmlformats-officedocument"));
    }
}
