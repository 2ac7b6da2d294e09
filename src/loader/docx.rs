//! Word document loading: one record per file.
//!
//! A .docx is a zip archive; the body text lives in `word/document.xml`
//! as `<w:t>` runs grouped into `<w:p>` paragraphs.

use std::io::{Cursor, Read};
use std::path::Path;

use anyhow::Context;
use quick_xml::Reader;
use quick_xml::events::Event;

use crate::models::RawDocument;
use crate::utils::file::read_file_bytes;

pub fn load(path: &Path, source_path: &str, max_size: u64) -> anyhow::Result<Vec<RawDocument>> {
    let bytes =
        read_file_bytes(path, max_size).with_context(|| format!("reading {}", path.display()))?;

    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
        .with_context(|| format!("opening {} as zip archive", path.display()))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .with_context(|| format!("{} has no word/document.xml", path.display()))?
        .read_to_string(&mut xml)
        .with_context(|| format!("reading document body of {}", path.display()))?;

    let text = extract_body_text(&xml)?;
    Ok(vec![RawDocument::new(text, source_path, None)])
}

/// Pull visible text out of the document body, one line per paragraph.
fn extract_body_text(xml: &str) -> anyhow::Result<String> {
    let mut reader = Reader::from_str(xml);
    let mut text = String::new();
    let mut in_run_text = false;

    loop {
        match reader.read_event().context("parsing document.xml")? {
            Event::Start(e) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Event::End(e) if e.name().as_ref() == b"w:t" => in_run_text = false,
            Event::End(e) if e.name().as_ref() == b"w:p" => text.push('\n'),
            Event::Empty(e) if e.name().as_ref() == b"w:tab" => text.push('\t'),
            Event::Empty(e) if e.name().as_ref() == b"w:br" => text.push('\n'),
            Event::Text(e) if in_run_text => {
                text.push_str(&e.unescape().context("unescaping run text")?);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(text.trim_end().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    fn write_docx(path: &Path, body_xml: &str) {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(body_xml.as_bytes()).unwrap();
        let cursor = writer.finish().unwrap();
        fs::write(path, cursor.into_inner()).unwrap();
    }

    #[test]
    fn test_load_docx_paragraphs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.docx");
        write_docx(
            &path,
            r#"<?xml version="1.0"?><w:document><w:body>
                <w:p><w:r><w:t>First paragraph.</w:t></w:r></w:p>
                <w:p><w:r><w:t>Second </w:t></w:r><w:r><w:t>paragraph.</w:t></w:r></w:p>
            </w:body></w:document>"#,
        );

        let docs = load(&path, "data/report.docx", 1 << 20).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].text, "First paragraph.\nSecond paragraph.");
    }

    #[test]
    fn test_load_docx_entities() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("amp.docx");
        write_docx(
            &path,
            r#"<w:document><w:body><w:p><w:r><w:t>ham &amp; eggs</w:t></w:r></w:p></w:body></w:document>"#,
        );

        let docs = load(&path, "data/amp.docx", 1 << 20).unwrap();
        assert_eq!(docs[0].text, "ham & eggs");
    }

    #[test]
    fn test_not_a_zip_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.docx");
        fs::write(&path, "plain text pretending").unwrap();

        assert!(load(&path, "data/fake.docx", 1 << 20).is_err());
    }
}
