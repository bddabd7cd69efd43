//! Document-properties extraction and metadata similarity.
//!
//! Reads the three standard property parts of an OOXML container
//! (`docProps/core.xml`, `docProps/app.xml`, `docProps/custom.xml`) into the
//! fixed-schema [`DocMeta`] record, and scores two records with a weighted
//! rule table. Property extraction is best-effort: a missing or malformed
//! part contributes nothing instead of failing the document.

use chrono::{DateTime, Utc};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::container::DocxContainer;
use crate::models::DocMeta;

const CORE_PROPS_ENTRY: &str = "docProps/core.xml";
const APP_PROPS_ENTRY: &str = "docProps/app.xml";
const CUSTOM_PROPS_ENTRY: &str = "docProps/custom.xml";

/// Read all three property parts into a [`DocMeta`]. Never fails — absent or
/// unreadable parts leave their fields at defaults.
pub fn extract_metadata(container: &mut DocxContainer) -> DocMeta {
    let mut meta = DocMeta::default();

    if let Ok(Some(xml)) = container.read_entry(CORE_PROPS_ENTRY) {
        apply_core_properties(&xml, &mut meta);
    }
    if let Ok(Some(xml)) = container.read_entry(APP_PROPS_ENTRY) {
        apply_app_properties(&xml, &mut meta);
    }
    if let Ok(Some(xml)) = container.read_entry(CUSTOM_PROPS_ENTRY) {
        apply_custom_properties(&xml, &mut meta);
    }

    meta
}

/// Core properties: author, editors, timestamps, descriptive fields.
fn apply_core_properties(xml: &[u8], meta: &mut DocMeta) {
    for (name, value) in element_texts(xml) {
        match name.as_str() {
            "creator" => meta.author = Some(value),
            "lastModifiedBy" => meta.last_modified_by = Some(value),
            "created" => meta.created = parse_timestamp(&value),
            "modified" => meta.modified = parse_timestamp(&value),
            "subject" => meta.subject = Some(value),
            "title" => meta.title = Some(value),
            "keywords" => meta.keywords = Some(value),
            "category" => meta.category = Some(value),
            _ => {}
        }
    }
}

/// Application properties: tool identity, template, and document statistics.
fn apply_app_properties(xml: &[u8], meta: &mut DocMeta) {
    for (name, value) in element_texts(xml) {
        match name.as_str() {
            "Template" => meta.template = Some(value),
            "Application" => meta.application = Some(value),
            "Company" => meta.company = Some(value),
            "Manager" => meta.manager = Some(value),
            "LastPrinted" => meta.last_printed = parse_timestamp(&value),
            "RevisionNumber" => meta.revision_number = parse_number(&value),
            "TotalTime" => meta.total_editing_time = parse_number(&value),
            "Pages" => meta.page_count = parse_number(&value),
            "Words" => meta.word_count = parse_number(&value),
            "Characters" => meta.char_count = parse_number(&value),
            "Paragraphs" => meta.paragraph_count = parse_number(&value),
            _ => {}
        }
    }
}

/// Custom properties: `<property name="...">` elements whose first child
/// element carries a string value. Merged into [`DocMeta::custom`] under
/// their declared names.
fn apply_custom_properties(xml: &[u8], meta: &mut DocMeta) {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut pending_name: Option<String> = None;
    let mut captured: Option<String> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"property" {
                    pending_name = e
                        .attributes()
                        .flatten()
                        .find(|a| a.key.local_name().as_ref() == b"name")
                        .and_then(|a| a.unescape_value().ok())
                        .map(|v| v.into_owned());
                    captured = None;
                }
            }
            Ok(Event::Text(te)) => {
                if pending_name.is_some() && captured.is_none() {
                    captured = Some(te.unescape().unwrap_or_default().into_owned());
                }
            }
            Ok(Event::End(e)) => {
                if e.local_name().as_ref() == b"property" {
                    if let (Some(name), Some(value)) = (pending_name.take(), captured.take()) {
                        meta.custom.insert(name, value);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
}

/// Flat `(local element name, text)` pairs in document order. Property parts
/// are shallow, so pairing each start tag with its first text child is enough.
fn element_texts(xml: &[u8]) -> Vec<(String, String)> {
    let mut reader = Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut out = Vec::new();
    let mut pending: Option<String> = None;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                pending = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
            }
            Ok(Event::Text(te)) => {
                if let Some(name) = pending.take() {
                    out.push((name, te.unescape().unwrap_or_default().into_owned()));
                }
            }
            Ok(Event::End(_)) => {
                pending = None;
            }
            Ok(Event::Eof) => break,
            Err(_) => break,
            _ => {}
        }
        buf.clear();
    }
    out
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Unparseable numbers become `None`, never zero.
fn parse_number(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok()
}

// Day windows for the date-proximity rules.
const CREATED_WINDOW_DAYS: i64 = 3;
const MODIFIED_WINDOW_DAYS: i64 = 7;
const LAST_PRINTED_WINDOW_DAYS: i64 = 7;

/// Weighted metadata similarity over the fixed rule table.
///
/// Every rule yields a sub-score in {0, 0.5, 1}; the result is the weighted
/// sum normalized by the total weight of the applied rules, rounded to four
/// decimals. The submitter-identity rule only participates when both sides
/// carry an identity.
pub fn metadata_similarity(a: &DocMeta, b: &DocMeta) -> f64 {
    let mut rules: Vec<(f64, f64)> = vec![
        (0.12, exact_match(&a.author, &b.author)),
        (0.05, exact_match(&a.last_modified_by, &b.last_modified_by)),
        (0.03, exact_match(&a.company, &b.company)),
        (0.02, exact_match(&a.manager, &b.manager)),
        (0.12, date_proximity(a.created, b.created, CREATED_WINDOW_DAYS)),
        (0.08, date_proximity(a.modified, b.modified, MODIFIED_WINDOW_DAYS)),
        (
            0.02,
            date_proximity(a.last_printed, b.last_printed, LAST_PRINTED_WINDOW_DAYS),
        ),
        (
            0.04,
            numeric_tolerance(a.revision_number, b.revision_number, 0.02),
        ),
        (
            0.03,
            numeric_tolerance(a.total_editing_time, b.total_editing_time, 0.10),
        ),
        (0.02, exact_match(&a.application, &b.application)),
        (0.06, exact_match(&a.template, &b.template)),
        (0.02, exact_match(&a.subject, &b.subject)),
        (0.02, exact_match(&a.category, &b.category)),
        (0.02, exact_match(&a.keywords, &b.keywords)),
        (0.06, numeric_tolerance(a.page_count, b.page_count, 0.05)),
        (0.04, numeric_tolerance(a.word_count, b.word_count, 0.05)),
        (0.03, numeric_tolerance(a.char_count, b.char_count, 0.05)),
    ];

    if a.submitter.is_some() && b.submitter.is_some() {
        rules.push((0.05, exact_match(&a.submitter, &b.submitter)));
    }

    let total_weight: f64 = rules.iter().map(|(w, _)| w).sum();
    let weighted: f64 = rules.iter().map(|(w, s)| w * s).sum();
    round4(weighted / total_weight)
}

/// Case-insensitive, trimmed string equality: 1 or 0. Missing either ⇒ 0.
fn exact_match(a: &Option<String>, b: &Option<String>) -> f64 {
    match (a, b) {
        (Some(a), Some(b)) if a.trim().to_lowercase() == b.trim().to_lowercase() => 1.0,
        _ => 0.0,
    }
}

/// 1 within the day window, 0.5 within twice the window, else 0.
/// Missing either timestamp ⇒ 0.
fn date_proximity(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>, days: i64) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    let diff = (a - b).num_seconds().abs();
    let window = days * 86_400;
    if diff <= window {
        1.0
    } else if diff <= 2 * window {
        0.5
    } else {
        0.0
    }
}

/// Relative difference `|a-b| / max(1, (a+b)/2)` against a tolerance:
/// 1 within it, 0.5 within twice it, else 0. Missing either value ⇒ 0.
fn numeric_tolerance(a: Option<f64>, b: Option<f64>, tolerance: f64) -> f64 {
    let (Some(a), Some(b)) = (a, b) else {
        return 0.0;
    };
    if a.is_nan() || b.is_nan() {
        return 0.0;
    }
    let delta = (a - b).abs() / f64::max(1.0, (a + b) / 2.0);
    if delta <= tolerance {
        1.0
    } else if delta <= tolerance * 2.0 {
        0.5
    } else {
        0.0
    }
}

fn round4(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
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

    const CORE_XML: &[u8] = br#"<?xml version="1.0"?>
<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties"
    xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/">
  <dc:creator>Alice</dc:creator>
  <cp:lastModifiedBy>Bob</cp:lastModifiedBy>
  <dcterms:created>2024-03-01T10:00:00Z</dcterms:created>
  <dcterms:modified>2024-03-05T10:00:00Z</dcterms:modified>
  <dc:subject>Assignment 1</dc:subject>
  <dc:title>My Essay</dc:title>
  <cp:keywords>essay, draft</cp:keywords>
  <cp:category>Homework</cp:category>
</cp:coreProperties>"#;

    const APP_XML: &[u8] = br#"<?xml version="1.0"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
  <Template>Normal.dotm</Template>
  <Application>Microsoft Office Word</Application>
  <Company>Example Corp</Company>
  <Manager>Carol</Manager>
  <LastPrinted>2024-03-02T08:00:00Z</LastPrinted>
  <RevisionNumber>12</RevisionNumber>
  <TotalTime>90</TotalTime>
  <Pages>7</Pages>
  <Words>3500</Words>
  <Characters>12345</Characters>
  <Paragraphs>40</Paragraphs>
</Properties>"#;

    const APP_XML_BAD_NUMBER: &[u8] = br#"<?xml version="1.0"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties">
  <Words>not-a-number</Words>
  <Pages>7</Pages>
</Properties>"#;

    const CUSTOM_XML: &[u8] = br#"<?xml version="1.0"?>
<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/custom-properties"
    xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">
  <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="2" name="Client"><vt:lpwstr>Acme</vt:lpwstr></property>
  <property fmtid="{D5CDD505-2E9C-101B-9397-08002B2CF9AE}" pid="3" name="CaseNumber"><vt:i4>33</vt:i4></property>
</Properties>"#;

    fn extract(entries: &[(&str, &[u8])]) -> DocMeta {
        let mut container = DocxContainer::from_bytes(build_zip(entries)).unwrap();
        extract_metadata(&mut container)
    }

    #[test]
    fn core_properties_are_mapped() {
        let meta = extract(&[(CORE_PROPS_ENTRY, CORE_XML)]);
        assert_eq!(meta.author.as_deref(), Some("Alice"));
        assert_eq!(meta.last_modified_by.as_deref(), Some("Bob"));
        assert_eq!(meta.title.as_deref(), Some("My Essay"));
        assert_eq!(meta.category.as_deref(), Some("Homework"));
        assert_eq!(
            meta.created,
            Some(Utc.with_ymd_and_hms(2024, 3, 1, 10, 0, 0).unwrap())
        );
    }

    #[test]
    fn app_properties_are_mapped() {
        let meta = extract(&[(APP_PROPS_ENTRY, APP_XML)]);
        assert_eq!(meta.application.as_deref(), Some("Microsoft Office Word"));
        assert_eq!(meta.manager.as_deref(), Some("Carol"));
        assert_eq!(meta.revision_number, Some(12.0));
        assert_eq!(meta.page_count, Some(7.0));
        assert_eq!(meta.word_count, Some(3500.0));
        assert_eq!(meta.paragraph_count, Some(40.0));
        assert!(meta.last_printed.is_some());
    }

    #[test]
    fn unparseable_number_stays_none() {
        let meta = extract(&[(APP_PROPS_ENTRY, APP_XML_BAD_NUMBER)]);
        // Never zero: a missing count must not pass the numeric rules.
        assert_eq!(meta.word_count, None);
        assert_eq!(meta.page_count, Some(7.0));
    }

    #[test]
    fn custom_properties_merge_by_name() {
        let meta = extract(&[(CUSTOM_PROPS_ENTRY, CUSTOM_XML)]);
        assert_eq!(meta.custom.get("Client").map(String::as_str), Some("Acme"));
        assert_eq!(meta.custom.get("CaseNumber").map(String::as_str), Some("33"));
    }

    #[test]
    fn absent_parts_leave_defaults() {
        let meta = extract(&[("word/document.xml", b"<w:document/>")]);
        assert!(meta.author.is_none());
        assert!(meta.custom.is_empty());
    }

    #[test]
    fn exact_match_ignores_case_and_whitespace() {
        let a = Some("  Alice ".to_string());
        let b = Some("alice".to_string());
        assert_eq!(exact_match(&a, &b), 1.0);
        assert_eq!(exact_match(&a, &Some("Bob".to_string())), 0.0);
        assert_eq!(exact_match(&a, &None), 0.0);
    }

    #[test]
    fn date_proximity_windows() {
        let base = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let within = Some(base + chrono::Duration::days(2));
        let double = Some(base + chrono::Duration::days(5));
        let beyond = Some(base + chrono::Duration::days(10));
        assert_eq!(date_proximity(Some(base), within, 3), 1.0);
        assert_eq!(date_proximity(Some(base), double, 3), 0.5);
        assert_eq!(date_proximity(Some(base), beyond, 3), 0.0);
        assert_eq!(date_proximity(Some(base), None, 3), 0.0);
    }

    #[test]
    fn numeric_tolerance_bands() {
        assert_eq!(numeric_tolerance(Some(100.0), Some(101.0), 0.02), 1.0);
        assert_eq!(numeric_tolerance(Some(100.0), Some(103.0), 0.02), 0.5);
        assert_eq!(numeric_tolerance(Some(100.0), Some(150.0), 0.02), 0.0);
        assert_eq!(numeric_tolerance(None, Some(1.0), 0.02), 0.0);
    }

    #[test]
    fn identical_metadata_scores_one() {
        let meta = extract(&[(CORE_PROPS_ENTRY, CORE_XML), (APP_PROPS_ENTRY, APP_XML)]);
        assert_eq!(metadata_similarity(&meta, &meta), 1.0);
    }

    #[test]
    fn empty_metadata_scores_zero() {
        let a = DocMeta::default();
        assert_eq!(metadata_similarity(&a, &a), 0.0);
    }

    #[test]
    fn submitter_rule_is_additive_when_both_present() {
        let mut a = DocMeta::default();
        let mut b = DocMeta::default();
        a.author = Some("Alice".into());
        b.author = Some("Alice".into());
        let without = metadata_similarity(&a, &b);

        a.submitter = Some("s123".into());
        b.submitter = Some("s123".into());
        let with = metadata_similarity(&a, &b);
        // Matching identities raise the score; the extra weight joins the
        // denominator too, so the delta is modest.
        assert!(with > without, "{} vs {}", with, without);
    }

    #[test]
    fn mismatched_submitters_lower_the_score() {
        let mut a = DocMeta::default();
        let mut b = DocMeta::default();
        a.author = Some("Alice".into());
        b.author = Some("Alice".into());
        let without = metadata_similarity(&a, &b);

        a.submitter = Some("s123".into());
        b.submitter = Some("s456".into());
        let with = metadata_similarity(&a, &b);
        assert!(with < without, "{} vs {}", with, without);
    }
}
