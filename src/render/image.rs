use std::sync::OnceLock;

use regex::Regex;

use crate::error::Result;

use super::docx::DocxArchive;

/// EMUs per pixel at 96 dpi.
const EMU_PER_PIXEL: u32 = 9525;

/// Pixel size used when neither the request nor the image-placeholder
/// configuration supplies dimensions.
pub const DEFAULT_WIDTH: u32 = 400;
pub const DEFAULT_HEIGHT: u32 = 300;

const RELS_PATH: &str = "word/_rels/document.xml.rels";
const CONTENT_TYPES_PATH: &str = "[Content_Types].xml";

const EMPTY_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"></Relationships>"#;

/// Replacement text spliced into a `<w:t>` content span for an image
/// placeholder: closes the hosting run, emits a drawing run, reopens a
/// plain run so any trailing text survives.
pub fn placeholder_splice(rid: u32, width_px: u32, height_px: u32) -> String {
    format!(
        "</w:t></w:r><w:r>{}</w:r><w:r><w:t xml:space=\"preserve\">",
        drawing_xml(rid, width_px, height_px)
    )
}

/// Self-contained inline drawing referencing relationship `rId{rid}`.
/// Namespaces are declared locally so the splice is valid regardless of
/// what the template's root element declares.
fn drawing_xml(rid: u32, width_px: u32, height_px: u32) -> String {
    let cx = width_px * EMU_PER_PIXEL;
    let cy = height_px * EMU_PER_PIXEL;
    format!(
        concat!(
            "<w:drawing>",
            "<wp:inline distT=\"0\" distB=\"0\" distL=\"0\" distR=\"0\" ",
            "xmlns:wp=\"http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing\">",
            "<wp:extent cx=\"{cx}\" cy=\"{cy}\"/>",
            "<wp:docPr id=\"{id}\" name=\"Picture {id}\"/>",
            "<a:graphic xmlns:a=\"http://schemas.openxmlformats.org/drawingml/2006/main\">",
            "<a:graphicData uri=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:pic xmlns:pic=\"http://schemas.openxmlformats.org/drawingml/2006/picture\">",
            "<pic:nvPicPr><pic:cNvPr id=\"{id}\" name=\"Picture {id}\"/><pic:cNvPicPr/></pic:nvPicPr>",
            "<pic:blipFill>",
            "<a:blip r:embed=\"rId{id}\" ",
            "xmlns:r=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships\"/>",
            "<a:stretch><a:fillRect/></a:stretch>",
            "</pic:blipFill>",
            "<pic:spPr><a:xfrm><a:off x=\"0\" y=\"0\"/><a:ext cx=\"{cx}\" cy=\"{cy}\"/></a:xfrm>",
            "<a:prstGeom prst=\"rect\"><a:avLst/></a:prstGeom></pic:spPr>",
            "</pic:pic></a:graphicData></a:graphic></wp:inline></w:drawing>",
        ),
        id = rid,
        cx = cx,
        cy = cy,
    )
}

fn rid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"Id="rId(\d+)""#).unwrap())
}

/// First relationship id number not already used by the document.
pub fn next_rid(archive: &DocxArchive) -> u32 {
    let rels = archive
        .get(RELS_PATH)
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_default();

    rid_regex()
        .captures_iter(&rels)
        .filter_map(|c| c[1].parse::<u32>().ok())
        .max()
        .unwrap_or(0)
        + 1
}

/// Adds the media entry, relationship and content-type default that back
/// one embedded image.
pub fn register_image(archive: &mut DocxArchive, rid: u32, ext: &str, bytes: Vec<u8>) -> Result<()> {
    let media_name = format!("media/image_r{rid}.{ext}");
    archive.set(&format!("word/{media_name}"), bytes);

    let rels = archive
        .get(RELS_PATH)
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_else(|| EMPTY_RELS.to_string());
    let relationship = format!(
        "<Relationship Id=\"rId{rid}\" \
         Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/image\" \
         Target=\"{media_name}\"/>"
    );
    let rels = rels.replace("</Relationships>", &format!("{relationship}</Relationships>"));
    archive.set(RELS_PATH, rels.into_bytes());

    let content_type = mime_guess::from_ext(ext).first_or_octet_stream();
    if let Some(types) = archive.get(CONTENT_TYPES_PATH) {
        let types = String::from_utf8_lossy(types).into_owned();
        if !types.contains(&format!("Extension=\"{ext}\"")) {
            let default = format!(
                "<Default Extension=\"{ext}\" ContentType=\"{content_type}\"/>"
            );
            let types = types.replace("</Types>", &format!("{default}</Types>"));
            archive.set(CONTENT_TYPES_PATH, types.into_bytes());
        }
    }

    Ok(())
}
