//! Read-only view over the ZIP archive underlying an OOXML document.
//!
//! Entry absence is not an error — callers get `None` and decide whether the
//! missing part matters. Entry reads are byte-bounded as zip-bomb protection.

use std::io::{Cursor, Read};
use std::path::Path;

use zip::result::ZipError;
use zip::ZipArchive;

use crate::extract::ExtractError;

/// Maximum decompressed bytes to read from a single ZIP entry.
const MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// An opened document container. Lives for the duration of one extraction.
#[derive(Debug)]
pub struct DocxContainer {
    archive: ZipArchive<Cursor<Vec<u8>>>,
}

impl DocxContainer {
    /// Open the container at `path`. Fails if the file cannot be read or is
    /// not a ZIP archive.
    pub fn open(path: &Path) -> Result<Self, ExtractError> {
        let bytes = std::fs::read(path)
            .map_err(|e| ExtractError::Unreadable(format!("{}: {}", path.display(), e)))?;
        Self::from_bytes(bytes)
    }

    /// Open a container over in-memory bytes.
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, ExtractError> {
        let archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| ExtractError::NotAnArchive(e.to_string()))?;
        Ok(Self { archive })
    }

    /// Read a named entry. Returns `Ok(None)` when the entry does not exist.
    pub fn read_entry(&mut self, name: &str) -> Result<Option<Vec<u8>>, ExtractError> {
        let entry = match self.archive.by_name(name) {
            Ok(entry) => entry,
            Err(ZipError::FileNotFound) => return Ok(None),
            Err(e) => return Err(ExtractError::NotAnArchive(e.to_string())),
        };
        let mut out = Vec::new();
        entry
            .take(MAX_ENTRY_BYTES)
            .read_to_end(&mut out)
            .map_err(|e| ExtractError::Unreadable(format!("{}: {}", name, e)))?;
        if out.len() as u64 >= MAX_ENTRY_BYTES {
            return Err(ExtractError::Unreadable(format!(
                "ZIP entry {} exceeds size limit ({} bytes)",
                name, MAX_ENTRY_BYTES
            )));
        }
        Ok(Some(out))
    }

    /// Non-directory entry names starting with `prefix`, sorted for
    /// deterministic iteration.
    pub fn entry_names(&self, prefix: &str) -> Vec<String> {
        let mut names: Vec<String> = self
            .archive
            .file_names()
            .filter(|n| n.starts_with(prefix) && !n.ends_with('/'))
            .map(|n| n.to_string())
            .collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn zip_with_entries(entries: &[(&str, &[u8])]) -> Vec<u8> {
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

    #[test]
    fn not_a_zip_is_rejected() {
        let err = DocxContainer::from_bytes(b"not a zip".to_vec()).unwrap_err();
        assert!(matches!(err, ExtractError::NotAnArchive(_)));
    }

    #[test]
    fn missing_entry_is_none() {
        let bytes = zip_with_entries(&[("word/document.xml", b"<w:document/>")]);
        let mut container = DocxContainer::from_bytes(bytes).unwrap();
        assert!(container.read_entry("docProps/core.xml").unwrap().is_none());
    }

    #[test]
    fn read_entry_returns_bytes() {
        let bytes = zip_with_entries(&[("word/document.xml", b"hello")]);
        let mut container = DocxContainer::from_bytes(bytes).unwrap();
        let data = container.read_entry("word/document.xml").unwrap().unwrap();
        assert_eq!(data, b"hello");
    }

    #[test]
    fn entry_names_filters_by_prefix_and_sorts() {
        let bytes = zip_with_entries(&[
            ("word/media/image2.png", b"b"),
            ("word/media/image1.png", b"a"),
            ("word/document.xml", b"x"),
        ]);
        let container = DocxContainer::from_bytes(bytes).unwrap();
        assert_eq!(
            container.entry_names("word/media/"),
            vec!["word/media/image1.png", "word/media/image2.png"]
        );
        assert!(container.entry_names("docProps/").is_empty());
    }

    #[test]
    fn missing_file_fails_open() {
        let err = DocxContainer::open(Path::new("/no/such/file.docx")).unwrap_err();
        assert!(matches!(err, ExtractError::Unreadable(_)));
    }
}
