//! Text extraction for binary document formats.

use quick_xml::events::Event;
use quick_xml::Reader;
use std::fmt::Write as _;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::{Error, Result};

fn parse_error(path: &Path, reason: impl std::fmt::Display) -> Error {
    Error::Parse { path: path.to_string_lossy().to_string(), reason: reason.to_string() }
}

/// Text of every page, each under a `--- Page n ---` marker, and the page
/// count. Pages without extractable text are left out.
pub fn pdf_text(path: &Path) -> Result<(String, usize)> {
    let doc = lopdf::Document::load(path).map_err(|e| parse_error(path, e))?;
    if doc.is_encrypted() {
        return Err(parse_error(path, "encrypted PDF"));
    }
    let pages: Vec<u32> = doc.get_pages().keys().copied().collect();
    let mut text = String::new();
    for &n in &pages {
        match doc.extract_text(&[n]) {
            Ok(page) if !page.trim().is_empty() => {
                let _ = write!(text, "\n--- Page {n} ---\n{}\n", page.trim());
            }
            Ok(_) => {}
            Err(e) => tracing::debug!(path = %path.display(), page = n, error = %e, "no text on page"),
        }
    }
    Ok((text.trim().to_string(), pages.len()))
}

/// Paragraph text of a Word document (`word/document.xml`).
pub fn docx_text(path: &Path) -> Result<String> {
    let mut archive = zip::ZipArchive::new(File::open(path)?).map_err(|e| parse_error(path, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| parse_error(path, e))?
        .read_to_string(&mut xml)
        .map_err(|e| parse_error(path, e))?;
    document_xml_text(&xml).map_err(|e| parse_error(path, e))
}

/// Collects `<w:t>` runs; paragraphs end with a newline, `<w:tab/>` and
/// `<w:br/>` become a tab and a newline.
fn document_xml_text(xml: &str) -> std::result::Result<String, quick_xml::Error> {
    let mut reader = Reader::from_str(xml);
    let mut out = String::new();
    let mut in_text = false;
    loop {
        match reader.read_event()? {
            Event::Start(e) if e.local_name().as_ref() == b"t" => in_text = true,
            Event::End(e) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => out.push('\n'),
                _ => {}
            },
            Event::Empty(e) => match e.local_name().as_ref() {
                b"tab" => out.push('\t'),
                b"br" | b"cr" => out.push('\n'),
                _ => {}
            },
            Event::Text(t) if in_text => out.push_str(&t.unescape()?),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(out.trim().to_string())
}
