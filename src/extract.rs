//! Feature extraction for OOXML documents.
//!
//! Turns one document into a [`DocumentFeatures`] record: body text, heading
//! structure, embedded-image content hashes, and document properties.
//! Extraction is total over sub-parts — a document without headings, images,
//! or properties yields empty values. Only file I/O failure, a non-archive
//! input, or an unreadable primary text stream fail the document, and such a
//! failure is scoped to that one document (the batch continues without it).

use std::path::Path;

use md5::{Digest, Md5};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::container::DocxContainer;
use crate::metadata;
use crate::models::DocumentFeatures;

/// Archive entry holding the document body.
const DOCUMENT_ENTRY: &str = "word/document.xml";
/// Archive directory holding embedded media.
const MEDIA_PREFIX: &str = "word/media/";

/// Per-document extraction error. Recoverable at the batch level: the
/// pipeline logs and skips the document rather than aborting the run.
#[derive(Debug)]
pub enum ExtractError {
    /// The file (or an archive entry) could not be read.
    Unreadable(String),
    /// The input is not a ZIP-based document container.
    NotAnArchive(String),
    /// The primary text stream is missing or unparseable.
    Body(String),
}

impl std::fmt::Display for ExtractError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractError::Unreadable(e) => write!(f, "unreadable input: {}", e),
            ExtractError::NotAnArchive(e) => write!(f, "not a document archive: {}", e),
            ExtractError::Body(e) => write!(f, "body extraction failed: {}", e),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract all features from the document at `path`.
pub fn extract_features(path: &Path) -> Result<DocumentFeatures, ExtractError> {
    let mut container = DocxContainer::open(path)?;
    from_container(&mut container, &path.to_string_lossy())
}

/// Extract all features from an already-opened container.
pub fn from_container(
    container: &mut DocxContainer,
    source_id: &str,
) -> Result<DocumentFeatures, ExtractError> {
    let body_xml = container
        .read_entry(DOCUMENT_ENTRY)?
        .ok_or_else(|| ExtractError::Body(format!("{} not found", DOCUMENT_ENTRY)))?;

    let paragraphs = read_body_paragraphs(&body_xml)?;

    let text = paragraphs
        .iter()
        .map(|p| p.text.as_str())
        .collect::<Vec<_>>()
        .join("\n");

    let headings = paragraphs
        .iter()
        .filter(|p| p.is_heading())
        .map(|p| p.text.trim().to_string())
        .collect();

    let image_hashes = hash_media_entries(container)?;
    let metadata = metadata::extract_metadata(container);

    Ok(DocumentFeatures {
        source_id: source_id.to_string(),
        text,
        headings,
        image_hashes,
        metadata,
    })
}

/// One `w:p` element: its paragraph style (if any) and run-concatenated text.
#[derive(Debug, Default)]
struct BodyParagraph {
    style: Option<String>,
    text: String,
}

impl BodyParagraph {
    /// A paragraph is a heading iff its style id has a case-insensitive
    /// `Heading` prefix (Heading1, heading2, ...).
    fn is_heading(&self) -> bool {
        self.style
            .as_deref()
            .and_then(|s| s.get(..7))
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case("heading"))
    }
}

/// Walk `word/document.xml` collecting every paragraph's style and text.
fn read_body_paragraphs(xml: &[u8]) -> Result<Vec<BodyParagraph>, ExtractError> {
    let mut reader = Reader::from_reader(xml);
    // No trim_text here: run text inside <w:t> keeps its whitespace, so
    // adjacent runs concatenate the way they render.
    let mut buf = Vec::new();
    let mut paragraphs = Vec::new();
    let mut current: Option<BodyParagraph> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"p" {
                    current = Some(BodyParagraph::default());
                } else if e.local_name().as_ref() == b"pStyle" {
                    let style = val_attribute(&e);
                    if let Some(p) = current.as_mut() {
                        if p.style.is_none() {
                            p.style = style;
                        }
                    }
                } else if e.local_name().as_ref() == b"t" && current.is_some() {
                    if let Ok(Event::Text(te)) = reader.read_event_into(&mut buf) {
                        let piece = te.unescape().unwrap_or_default().into_owned();
                        if let Some(p) = current.as_mut() {
                            p.text.push_str(&piece);
                        }
                    }
                }
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"p" {
                    paragraphs.push(BodyParagraph::default());
                } else if e.local_name().as_ref() == b"pStyle" {
                    let style = val_attribute(&e);
                    if let Some(p) = current.as_mut() {
                        if p.style.is_none() {
                            p.style = style;
                        }
                    }
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"p" {
                    if let Some(p) = current.take() {
                        paragraphs.push(p);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Body(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(paragraphs)
}

/// The `w:val` attribute of a style element, namespace prefix ignored.
fn val_attribute(e: &BytesStart<'_>) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|a| a.key.local_name().as_ref() == b"val")
        .and_then(|a| a.unescape_value().ok())
        .map(|v| v.into_owned())
}

/// MD5 (hex) of every non-directory entry under `word/media/`, in entry-name
/// order. Duplicate hashes are retained; the best-match image comparison
/// treats the list as a set, so duplicates cannot skew the score.
fn hash_media_entries(container: &mut DocxContainer) -> Result<Vec<String>, ExtractError> {
    let mut hashes = Vec::new();
    for name in container.entry_names(MEDIA_PREFIX) {
        if let Some(bytes) = container.read_entry(&name)? {
            hashes.push(hex::encode(Md5::digest(&bytes)));
        }
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Write};

    fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
        let mut buf = Vec::new();
        {
            let mut zip = zip::ZipWriter::new(Cursor::new(&mut buf));
            for (name, data) in entries {
                zip.start_file(*name, zip::write::SimpleFileOptions::default())
                    .unwrap();
                zip.write_all(data).unwrap();
            }
            zip.finish().unwrap();
        }
        buf
    }

    const BODY: &[u8] = br#"<?xml version="1.0"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main">
  <w:body>
    <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Intro</w:t></w:r></w:p>
    <w:p><w:r><w:t>Hello </w:t></w:r><w:r><w:t>world</w:t></w:r></w:p>
    <w:p><w:pPr><w:pStyle w:val="heading2"/></w:pPr><w:r><w:t> Methods </w:t></w:r></w:p>
    <w:p><w:pPr><w:pStyle w:val="Normal"/></w:pPr><w:r><w:t>Body text</w:t></w:r></w:p>
  </w:body>
</w:document>"#;

    fn features(entries: &[(&str, &[u8])]) -> DocumentFeatures {
        let mut container = DocxContainer::from_bytes(build_zip(entries)).unwrap();
        from_container(&mut container, "test.docx").unwrap()
    }

    #[test]
    fn body_text_concatenates_runs_per_paragraph() {
        let f = features(&[("word/document.xml", BODY)]);
        assert_eq!(f.text, "Intro\nHello world\n Methods \nBody text");
    }

    #[test]
    fn headings_match_prefix_case_insensitively_and_trim() {
        let f = features(&[("word/document.xml", BODY)]);
        assert_eq!(f.headings, vec!["Intro", "Methods"]);
    }

    #[test]
    fn duplicate_headings_are_retained() {
        let xml = br#"<w:document xmlns:w="x"><w:body>
            <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Same</w:t></w:r></w:p>
            <w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t>Same</w:t></w:r></w:p>
        </w:body></w:document>"#;
        let f = features(&[("word/document.xml", xml)]);
        assert_eq!(f.headings, vec!["Same", "Same"]);
    }

    #[test]
    fn missing_document_xml_fails_extraction() {
        let mut container =
            DocxContainer::from_bytes(build_zip(&[("word/media/a.png", b"x")])).unwrap();
        let err = from_container(&mut container, "bad.docx").unwrap_err();
        assert!(matches!(err, ExtractError::Body(_)));
    }

    #[test]
    fn media_entries_are_hashed() {
        let f = features(&[
            ("word/document.xml", BODY),
            ("word/media/image1.png", b"image-bytes"),
            ("word/media/image2.png", b"image-bytes"),
        ]);
        assert_eq!(f.image_hashes.len(), 2);
        // Identical bytes hash identically; duplicates are kept.
        assert_eq!(f.image_hashes[0], f.image_hashes[1]);
        assert_eq!(f.image_hashes[0].len(), 32);
        assert!(f.image_hashes[0].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn no_media_yields_empty_hash_list() {
        let f = features(&[("word/document.xml", BODY)]);
        assert!(f.image_hashes.is_empty());
    }

    #[test]
    fn extraction_failure_is_scoped_to_open() {
        let err = extract_features(Path::new("/does/not/exist.docx")).unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable(_)));
    }
}
