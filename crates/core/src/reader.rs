use crate::error::ReadError;
use crate::traits::DocumentReader;
use lopdf::Document;
use regex::Regex;
use std::io::{Cursor, Read};
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pdf,
    Docx,
    PlainText,
}

impl DocumentKind {
    /// Maps a supported extension to its reader; `None` for anything else.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "pdf" => Some(Self::Pdf),
            "docx" => Some(Self::Docx),
            "txt" | "md" => Some(Self::PlainText),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    /// Upload dispatch: unknown names are decoded as plain text.
    pub fn from_file_name(name: &str) -> Self {
        name.rsplit_once('.')
            .and_then(|(_, ext)| Self::from_extension(ext))
            .unwrap_or(Self::PlainText)
    }

    fn reader(self) -> &'static dyn DocumentReader {
        match self {
            Self::Pdf => &LopdfReader,
            Self::Docx => &DocxReader,
            Self::PlainText => &PlainTextReader,
        }
    }
}

#[derive(Default)]
pub struct LopdfReader;

impl LopdfReader {
    /// Text of every page that has any, in page order.
    pub fn extract_pages(&self, bytes: &[u8], name: &str) -> Result<Vec<String>, ReadError> {
        let document =
            Document::load_mem(bytes).map_err(|error| ReadError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for page_no in document.get_pages().into_keys() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| ReadError::PdfParse(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        if pages.is_empty() {
            return Err(ReadError::PdfParse(format!(
                "pdf had no readable page text: {name}"
            )));
        }

        Ok(pages)
    }
}

impl DocumentReader for LopdfReader {
    fn read(&self, bytes: &[u8], name: &str) -> Result<String, ReadError> {
        Ok(self.extract_pages(bytes, name)?.join("\n"))
    }
}

#[derive(Default)]
pub struct DocxReader;

impl DocxReader {
    fn document_xml(bytes: &[u8]) -> Result<String, ReadError> {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|error| ReadError::Docx(error.to_string()))?;
        let mut entry = archive
            .by_name("word/document.xml")
            .map_err(|error| ReadError::Docx(error.to_string()))?;
        let mut xml = String::new();
        entry.read_to_string(&mut xml)?;
        Ok(xml)
    }
}

impl DocumentReader for DocxReader {
    fn read(&self, bytes: &[u8], _name: &str) -> Result<String, ReadError> {
        let xml = Self::document_xml(bytes)?;
        let paragraph_re = Regex::new(r"(?s)<w:p(?:\s[^>]*[^/>])?>(.*?)</w:p>")
            .map_err(|error| ReadError::Docx(error.to_string()))?;
        let run_re = Regex::new(r"<w:t(?:\s[^>]*)?>([^<]*)</w:t>|<w:tab/>|<w:br/>")
            .map_err(|error| ReadError::Docx(error.to_string()))?;
        let entity_re = Regex::new(r"&(#[xX][0-9A-Fa-f]+|#[0-9]+|lt|gt|quot|apos|amp);")
            .map_err(|error| ReadError::Docx(error.to_string()))?;

        let paragraphs = paragraph_re
            .captures_iter(&xml)
            .filter_map(|paragraph| paragraph.get(1))
            .map(|body| {
                let mut text = String::new();
                for run in run_re.captures_iter(body.as_str()) {
                    match run.get(1) {
                        Some(value) => text.push_str(&unescape_xml(&entity_re, value.as_str())),
                        None if run[0].starts_with("<w:tab") => text.push('\t'),
                        None => text.push('\n'),
                    }
                }
                text
            })
            .collect::<Vec<_>>();

        Ok(paragraphs.join("\n"))
    }
}

#[derive(Default)]
pub struct PlainTextReader;

impl DocumentReader for PlainTextReader {
    fn read(&self, bytes: &[u8], _name: &str) -> Result<String, ReadError> {
        Ok(String::from_utf8_lossy(bytes).into_owned())
    }
}

/// Decodes the predefined entities and numeric character references in one
/// pass. References that name no valid char are left as written.
fn unescape_xml(entity_re: &Regex, value: &str) -> String {
    entity_re
        .replace_all(value, |caps: &regex::Captures<'_>| {
            let entity = &caps[1];
            let decoded = match entity {
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" => Some('\''),
                "amp" => Some('&'),
                _ => {
                    let hex = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X"));
                    let code = match hex {
                        Some(hex) => u32::from_str_radix(hex, 16).ok(),
                        None => entity.strip_prefix('#').and_then(|digits| digits.parse().ok()),
                    };
                    code.and_then(char::from_u32)
                }
            };
            decoded.map_or_else(|| caps[0].to_string(), String::from)
        })
        .into_owned()
}

/// Reads a document from disk, dispatching on its extension.
pub fn extract_text(path: &Path) -> Result<String, ReadError> {
    let kind = DocumentKind::from_path(path)
        .ok_or_else(|| ReadError::UnsupportedFormat(path.display().to_string()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| ReadError::MissingFileName(path.display().to_string()))?;
    let bytes = std::fs::read(path)?;
    kind.reader().read(&bytes, name)
}

/// Reads an uploaded document, dispatching on its declared file name.
pub fn extract_text_from_bytes(name: &str, bytes: &[u8]) -> Result<String, ReadError> {
    DocumentKind::from_file_name(name).reader().read(bytes, name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    fn docx_bytes(document_xml: &str) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options =
            SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);
        writer.start_file("word/document.xml", options)?;
        writer.write_all(document_xml.as_bytes())?;
        Ok(writer.finish()?.into_inner())
    }

    #[test]
    fn plain_text_is_read_from_disk() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("resume.txt");
        std::fs::write(&path, "Sample Resume Content")?;

        let text = extract_text(&path)?;
        assert!(text.contains("Sample"));
        Ok(())
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() -> Result<(), Box<dyn std::error::Error>> {
        let text = extract_text_from_bytes("notes.txt", b"Rust \xff\xfe developer")?;
        assert!(text.starts_with("Rust "));
        assert!(text.ends_with(" developer"));
        Ok(())
    }

    #[test]
    fn unsupported_extension_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("photo.png");
        std::fs::write(&path, [0u8, 1, 2])?;

        let result = extract_text(&path);
        assert!(matches!(result, Err(ReadError::UnsupportedFormat(_))));
        Ok(())
    }

    #[test]
    fn broken_pdf_is_an_error() {
        let result = extract_text_from_bytes("broken.pdf", b"%PDF-1.4\n%broken");
        assert!(matches!(result, Err(ReadError::PdfParse(_))));
    }

    #[test]
    fn docx_paragraphs_keep_document_order() -> Result<(), Box<dyn std::error::Error>> {
        let xml = concat!(
            r#"<?xml version="1.0" encoding="UTF-8"?>"#,
            r#"<w:document><w:body>"#,
            r#"<w:p><w:pPr><w:tabs><w:tab w:val="left" w:pos="720"/></w:tabs></w:pPr>"#,
            r#"<w:r><w:t>Education</w:t></w:r></w:p>"#,
            r#"<w:p w:rsidR="0011"/>"#,
            r#"<w:p w:rsidR="00AB"><w:r><w:t xml:space="preserve">B.Tech </w:t></w:r>"#,
            r#"<w:r><w:t>R&amp;D Institute</w:t></w:r><w:r><w:tab/><w:t>2016 - 2020</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#
        );
        let bytes = docx_bytes(xml)?;

        let text = extract_text_from_bytes("resume.docx", &bytes)?;
        assert_eq!(text, "Education\nB.Tech R&D Institute\t2016 - 2020");
        Ok(())
    }

    #[test]
    fn docx_numeric_character_references_are_decoded() -> Result<(), Box<dyn std::error::Error>> {
        let xml = concat!(
            r#"<w:document><w:body>"#,
            r#"<w:p><w:r><w:t>B.Tech, ABC University 2016 &#8211; 2020</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Analyst, Beta Labs Jul 2020 &#x2013; Present &amp;lt;&#xD800;</w:t></w:r></w:p>"#,
            r#"</w:body></w:document>"#
        );
        let bytes = docx_bytes(xml)?;

        let text = extract_text_from_bytes("resume.docx", &bytes)?;
        assert_eq!(
            text,
            "B.Tech, ABC University 2016 \u{2013} 2020\nAnalyst, Beta Labs Jul 2020 \u{2013} Present &lt;&#xD800;"
        );

        let extractor = crate::periods::PeriodExtractor::new(6)?;
        let lines: Vec<&str> = text.lines().collect();
        let education =
            extractor.extract_periods(&lines[..1], crate::models::PeriodMode::Education);
        assert_eq!(education.len(), 1);
        assert_eq!(Some(education[0].start), crate::models::YearMonth::new(2016, 1));
        Ok(())
    }

    #[test]
    fn docx_without_document_part_is_an_error() -> Result<(), Box<dyn std::error::Error>> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("other.xml", SimpleFileOptions::default())?;
        writer.write_all(b"<x/>")?;
        let bytes = writer.finish()?.into_inner();

        let result = extract_text_from_bytes("resume.docx", &bytes);
        assert!(matches!(result, Err(ReadError::Docx(_))));
        Ok(())
    }

    #[test]
    fn upload_names_fall_back_to_plain_text() {
        assert_eq!(DocumentKind::from_file_name("jd.PDF"), DocumentKind::Pdf);
        assert_eq!(DocumentKind::from_file_name("jd.docx"), DocumentKind::Docx);
        assert_eq!(DocumentKind::from_file_name("jd"), DocumentKind::PlainText);
        assert_eq!(DocumentKind::from_file_name("jd.rtf"), DocumentKind::PlainText);
    }
}
