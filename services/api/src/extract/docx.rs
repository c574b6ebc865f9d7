//! services/api/src/extract/docx.rs
//!
//! DOCX text extraction. A .docx file is a zip archive whose document body
//! lives in `word/document.xml`; the visible text is the content of the
//! `<w:t>` runs. Parse failure is fatal for this format: there is no
//! fallback path.

use super::ExtractError;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::io::Read;

/// Extracts the paragraph text of an in-memory DOCX document.
pub fn extract_text(bytes: &[u8]) -> Result<String, ExtractError> {
    let cursor = std::io::Cursor::new(bytes);
    let mut archive = zip::ZipArchive::new(cursor).map_err(|_| ExtractError::Docx)?;
    let mut document = archive
        .by_name("word/document.xml")
        .map_err(|_| ExtractError::Docx)?;
    let mut xml = String::new();
    document
        .read_to_string(&mut xml)
        .map_err(|_| ExtractError::Docx)?;

    let mut reader = Reader::from_str(&xml);
    let mut text = String::new();
    let mut in_text_run = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_text_run = true,
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_text_run = false,
                // Paragraph boundaries become line breaks.
                b"w:p" => text.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text_run => {
                let run = t.unescape().map_err(|_| ExtractError::Docx)?;
                text.push_str(&run);
            }
            Ok(Event::Eof) => break,
            Err(_) => return Err(ExtractError::Docx),
            _ => {}
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn docx_with_document_xml(xml: &str) -> Vec<u8> {
        let mut archive = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        archive
            .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        archive.write_all(xml.as_bytes()).unwrap();
        archive.finish().unwrap().into_inner()
    }

    #[test]
    fn text_runs_are_joined_and_paragraphs_become_lines() {
        let bytes = docx_with_document_xml(concat!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body>"#,
            r#"<w:p><w:r><w:t>First </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Second paragraph.</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#,
        ));
        let text = extract_text(&bytes).unwrap();
        assert_eq!(text, "First paragraph.\nSecond paragraph.\n");
    }

    #[test]
    fn entities_inside_runs_are_unescaped() {
        let bytes = docx_with_document_xml(concat!(
            r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">"#,
            r#"<w:body><w:p><w:r><w:t>Fish &amp; chips</w:t></w:r></w:p></w:body></w:document>"#,
        ));
        assert_eq!(extract_text(&bytes).unwrap(), "Fish & chips\n");
    }

    #[test]
    fn archive_without_the_document_part_fails() {
        let mut archive = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
        archive
            .start_file("word/other.xml", zip::write::SimpleFileOptions::default())
            .unwrap();
        archive.write_all(b"<w:document/>").unwrap();
        let bytes = archive.finish().unwrap().into_inner();
        assert!(extract_text(&bytes).is_err());
    }

    #[test]
    fn non_archive_bytes_fail() {
        assert!(extract_text(b"plain text, not a zip").is_err());
    }
}
