use crate::core::values;
use crate::domain::model::{Dataset, OutputFormat};
use crate::utils::error::{Result, SynthError};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

pub fn to_csv(dataset: &Dataset) -> Result<String> {
    delimited(dataset, b',')
}

pub fn to_tsv(dataset: &Dataset) -> Result<String> {
    delimited(dataset, b'\t')
}

pub fn to_json(dataset: &Dataset) -> Result<String> {
    Ok(serde_json::to_string_pretty(&dataset.records)?)
}

/// Serialised body plus the file extension and MIME type to store it under.
pub fn render(dataset: &Dataset, format: OutputFormat) -> Result<(Vec<u8>, &'static str, &'static str)> {
    let body = match format {
        OutputFormat::Csv => to_csv(dataset)?,
        OutputFormat::Json => to_json(dataset)?,
        OutputFormat::Tsv => to_tsv(dataset)?,
    };
    Ok((body.into_bytes(), format.extension(), format.content_type()))
}

/// Packs `(name, contents)` pairs into a zip archive.
pub fn bundle(entries: &[(String, Vec<u8>)]) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    for (name, contents) in entries {
        zip.start_file::<_, ()>(name.as_str(), FileOptions::default())?;
        zip.write_all(contents)?;
    }
    let cursor = zip.finish()?;
    tracing::debug!("Bundled {} files into zip archive", entries.len());
    Ok(cursor.into_inner())
}

fn delimited(dataset: &Dataset, delimiter: u8) -> Result<String> {
    if dataset.is_empty() {
        return Ok(String::new());
    }

    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());
    writer.write_record(&dataset.columns)?;
    for record in &dataset.records {
        writer.write_record(dataset.columns.iter().map(|c| values::display(record.value(c))))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| SynthError::processing(format!("Failed to flush export: {}", e)))?;
    String::from_utf8(bytes)
        .map_err(|e| SynthError::processing(format!("Export is not valid UTF-8: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Record;
    use serde_json::{json, Value};
    use std::io::Read;

    fn dataset() -> Dataset {
        let rows = json!([
            {"name": "Ann", "note": "likes, commas", "score": 3.5},
            {"name": "Ben \"B\"", "note": null, "score": 2}
        ]);
        let records = rows
            .as_array()
            .unwrap()
            .iter()
            .map(|v| match v {
                Value::Object(map) => Record::from(map.clone()),
                _ => unreachable!(),
            })
            .collect();
        Dataset::from_records(records)
    }

    #[test]
    fn test_csv_quotes_and_nulls() {
        let csv = to_csv(&dataset()).unwrap();
        assert_eq!(
            csv,
            "name,note,score\nAnn,\"likes, commas\",3.5\n\"Ben \"\"B\"\"\",,2\n"
        );
    }

    #[test]
    fn test_tsv_uses_tabs() {
        let tsv = to_tsv(&dataset()).unwrap();
        assert!(tsv.starts_with("name\tnote\tscore\n"));
        assert!(tsv.contains("Ann\tlikes, commas\t3.5"));
    }

    #[test]
    fn test_empty_dataset_exports_nothing() {
        assert_eq!(to_csv(&Dataset::default()).unwrap(), "");
        assert_eq!(to_tsv(&Dataset::default()).unwrap(), "");
    }

    #[test]
    fn test_json_is_pretty_array() {
        let text = to_json(&dataset()).unwrap();
        assert!(text.starts_with("[\n  {\n    \"name\": \"Ann\""));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed[1]["note"], Value::Null);
    }

    #[test]
    fn test_render_reports_extension_and_mime() {
        let (_, ext, mime) = render(&dataset(), OutputFormat::Tsv).unwrap();
        assert_eq!((ext, mime), ("tsv", "text/tab-separated-values"));
        let (body, ext, _) = render(&dataset(), OutputFormat::Json).unwrap();
        assert_eq!(ext, "json");
        assert!(!body.is_empty());
    }

    #[test]
    fn test_bundle_contents() {
        let entries = vec![
            ("data.csv".to_string(), b"a,b\n1,2\n".to_vec()),
            ("metadata.json".to_string(), b"{}".to_vec()),
        ];
        let bytes = bundle(&entries).unwrap();

        let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = String::new();
        archive
            .by_name("data.csv")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "a,b\n1,2\n");
    }
}
