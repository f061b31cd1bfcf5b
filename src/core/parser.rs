//! Turns uploaded files into a [`Dataset`].

use crate::core::values;
use crate::domain::model::{Dataset, Record};
use crate::utils::error::{Result, SynthError};
use regex::Regex;
use serde_json::{Map, Value};
use std::io::{Cursor, Read};
use std::sync::LazyLock;

static XML_TAG_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"<(/)?([A-Za-z0-9_:\-\.]+)[^>]*?(/)?>").expect("xml tag pattern")
});

/// Dispatches on the lower-cased file extension.
pub fn parse_bytes(file_name: &str, bytes: &[u8]) -> Result<Dataset> {
    let extension = std::path::Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    tracing::debug!("Parsing {} ({} bytes) as {}", file_name, bytes.len(), extension);

    match extension.as_str() {
        "csv" => parse_csv(bytes),
        "json" => parse_json(bytes),
        "txt" => parse_txt(&decode_utf8(bytes)?),
        "docx" => parse_docx(bytes),
        _ => Err(SynthError::UnsupportedFormat { extension }),
    }
}

/// Header row first; cells are auto-typed.
pub fn parse_csv(bytes: &[u8]) -> Result<Dataset> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(false)
        .from_reader(bytes);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row?;
        let mut record = Record::new();
        for (header, cell) in headers.iter().zip(row.iter()) {
            record.insert(header.clone(), auto_type(cell));
        }
        records.push(record);
    }

    tracing::debug!("Parsed {} CSV rows with {} columns", records.len(), headers.len());
    Ok(Dataset::new(headers, records))
}

/// A JSON array of objects, or one object that becomes a single record.
pub fn parse_json(bytes: &[u8]) -> Result<Dataset> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|_| SynthError::processing("Invalid JSON format"))?;

    let items = match value {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        _ => {
            return Err(SynthError::validation(
                "JSON input must be an object or an array of objects",
            ))
        }
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| match item {
            Value::Object(map) => Ok(Record::from(map)),
            _ => Err(SynthError::validation(format!(
                "JSON element {} is not an object",
                i
            ))),
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(Dataset::from_records(records))
}

/// Tab separated when the header line has a tab, comma separated otherwise.
/// Values are kept as trimmed strings.
pub fn parse_txt(text: &str) -> Result<Dataset> {
    let first_line = text
        .lines()
        .find(|l| !l.trim().is_empty())
        .ok_or_else(|| SynthError::processing("No tabular data found in text file"))?;
    let delimiter = if first_line.contains('\t') { '\t' } else { ',' };
    Ok(parse_delimited(text, delimiter))
}

pub fn parse_docx(bytes: &[u8]) -> Result<Dataset> {
    let text = docx_text(bytes)?;
    if text.lines().filter(|l| !l.trim().is_empty()).count() < 2 {
        return Err(SynthError::processing("No tabular data found in document"));
    }
    Ok(parse_delimited(&text, '\t'))
}

/// Raw text of a .docx body: one line per paragraph or table row, cells and
/// tab stops separated by `\t`.
pub fn docx_text(bytes: &[u8]) -> Result<String> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")?
        .read_to_string(&mut xml)?;

    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut cell_depth = 0usize;
    let mut in_text = false;
    let mut last_end = 0usize;

    for caps in XML_TAG_RE.captures_iter(&xml) {
        let Some(tag) = caps.get(0) else { continue };
        if in_text {
            line.push_str(&unescape_xml(&xml[last_end..tag.start()]));
        }
        last_end = tag.end();

        let closing = caps.get(1).is_some();
        let self_closing = caps.get(3).is_some();
        match (&caps[2], closing) {
            ("w:t", false) => in_text = !self_closing,
            ("w:t", true) => in_text = false,
            ("w:tab", false) => line.push('\t'),
            ("w:br", false) | ("w:cr", false) => {
                if cell_depth > 0 {
                    line.push(' ');
                } else {
                    lines.push(std::mem::take(&mut line));
                }
            }
            ("w:p", true) => {
                if cell_depth > 0 {
                    line.push(' ');
                } else {
                    lines.push(std::mem::take(&mut line));
                }
            }
            ("w:tc", false) if !self_closing => cell_depth += 1,
            ("w:tc", true) => {
                cell_depth = cell_depth.saturating_sub(1);
                line.truncate(line.trim_end_matches(' ').len());
                line.push('\t');
            }
            ("w:tr", true) => {
                let row = line.trim_end_matches(['\t', ' ']).to_string();
                line.clear();
                lines.push(row);
            }
            _ => {}
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }

    Ok(lines.join("\n"))
}

fn parse_delimited(text: &str, delimiter: char) -> Dataset {
    let mut lines = text.lines().filter(|l| !l.trim().is_empty());
    let headers: Vec<String> = match lines.next() {
        Some(header) => header.split(delimiter).map(|h| h.trim().to_string()).collect(),
        None => return Dataset::default(),
    };

    let records = lines
        .map(|line| {
            let cells: Vec<&str> = line.split(delimiter).collect();
            let mut record = Record::from(Map::new());
            for (i, header) in headers.iter().enumerate() {
                let value = match cells.get(i).map(|c| c.trim()) {
                    Some(cell) if !cell.is_empty() => Value::String(cell.to_string()),
                    _ => Value::Null,
                };
                record.insert(header.clone(), value);
            }
            record
        })
        .collect();

    Dataset::new(headers, records)
}

fn auto_type(cell: &str) -> Value {
    if cell.is_empty() {
        return Value::Null;
    }
    if let Some(number) = values::parse_finite(cell) {
        return values::number_value(number);
    }
    match cell.to_lowercase().as_str() {
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => Value::String(cell.to_string()),
    }
}

fn decode_utf8(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| SynthError::processing(format!("Input is not valid UTF-8: {}", e)))
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use zip::write::{FileOptions, ZipWriter};

    fn docx_with_body(body: &str) -> Vec<u8> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file::<_, ()>("word/document.xml", FileOptions::default())
            .unwrap();
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8"?><w:document xmlns:w="w"><w:body>{}</w:body></w:document>"#,
            body
        );
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_parse_csv_auto_types_cells() {
        let csv = "id,name,score,active,note\n1,Alice,9.5,TRUE,\n2,Bob,7,false,late\n\n";
        let dataset = parse_bytes("people.CSV", csv.as_bytes()).unwrap();

        assert_eq!(dataset.columns, vec!["id", "name", "score", "active", "note"]);
        assert_eq!(dataset.len(), 2);
        let first = &dataset.records[0];
        assert_eq!(first.value("id"), &json!(1));
        assert_eq!(first.value("score"), &json!(9.5));
        assert_eq!(first.value("active"), &json!(true));
        assert_eq!(first.value("note"), &Value::Null);
        assert_eq!(dataset.records[1].value("note"), &json!("late"));
    }

    #[test]
    fn test_parse_csv_rejects_ragged_rows() {
        let csv = "a,b\n1,2\n3\n";
        let err = parse_csv(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, SynthError::CsvError(_)));
    }

    #[test]
    fn test_parse_json_array_and_single_object() {
        let dataset = parse_json(br#"[{"a": 1}, {"a": 2, "b": "x"}]"#).unwrap();
        assert_eq!(dataset.columns, vec!["a", "b"]);
        assert_eq!(dataset.len(), 2);

        let single = parse_json(br#"{"a": 1}"#).unwrap();
        assert_eq!(single.len(), 1);
    }

    #[test]
    fn test_parse_json_errors() {
        let err = parse_json(b"{not json").unwrap_err();
        assert_eq!(err.to_string(), "Data processing error: Invalid JSON format");

        assert!(matches!(
            parse_json(b"[1, 2]").unwrap_err(),
            SynthError::ValidationError { .. }
        ));
    }

    #[test]
    fn test_parse_txt_detects_delimiter() {
        let tsv = "name\tage\nAlice\t30\nBob\t\n";
        let dataset = parse_txt(tsv).unwrap();
        assert_eq!(dataset.columns, vec!["name", "age"]);
        assert_eq!(dataset.records[0].value("age"), &json!("30"));
        assert_eq!(dataset.records[1].value("age"), &Value::Null);

        let csv = "name, city\n Alice , Paris\n";
        let dataset = parse_txt(csv).unwrap();
        assert_eq!(dataset.columns, vec!["name", "city"]);
        assert_eq!(dataset.records[0].value("city"), &json!("Paris"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = parse_bytes("data.xlsx", b"").unwrap_err();
        assert_eq!(err.to_string(), "Unsupported file format: xlsx");
    }

    #[test]
    fn test_parse_docx_table() {
        let row = |a: &str, b: &str| {
            format!(
                "<w:tr><w:tc><w:p><w:r><w:t>{}</w:t></w:r></w:p></w:tc><w:tc><w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p></w:tc></w:tr>",
                a, b
            )
        };
        let body = format!(
            "<w:p><w:r><w:t>Staff list</w:t></w:r></w:p><w:tbl>{}{}{}</w:tbl>",
            row("name", "dept"),
            row("Ann", "R&amp;D"),
            row("Ben", " Ops ")
        );
        let text = docx_text(&docx_with_body(&body)).unwrap();
        assert_eq!(text, "Staff list\nname\tdept\nAnn\tR&D\nBen\t Ops");

        // With the title paragraph dropped the table header is the first line.
        let dataset = parse_bytes("staff.docx", &docx_with_body(&body[body.find("<w:tbl>").unwrap()..])).unwrap();
        assert_eq!(dataset.columns, vec!["name", "dept"]);
        assert_eq!(dataset.records[0].value("dept"), &json!("R&D"));
        assert_eq!(dataset.records[1].value("dept"), &json!("Ops"));
    }

    #[test]
    fn test_parse_docx_without_table_fails() {
        let body = "<w:p><w:r><w:t>Only a title</w:t></w:r></w:p>";
        let err = parse_docx(&docx_with_body(body)).unwrap_err();
        assert!(err.to_string().contains("No tabular data found in document"));
    }
}
