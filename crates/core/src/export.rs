use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::record::ExtractedRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON encoding failed: {0}")]
    Json(#[from] serde_json::Error),
    #[error("TOML encoding failed: {0}")]
    Toml(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Json,
    Toml,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Json => "json",
            ExportFormat::Toml => "toml",
        }
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(ExportFormat::Json),
            "toml" => Ok(ExportFormat::Toml),
            other => Err(format!("Unknown export format: '{other}'")),
        }
    }
}

/// Field set in display order, followed by the raw recognized texts.
struct ExportDocument<'a>(&'a ExtractedRecord);

impl Serialize for ExportDocument<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let fields = self.0.fields();
        let mut map = serializer.serialize_map(Some(fields.len() + 1))?;
        for (kind, value) in &fields {
            map.serialize_entry(kind.key(), value.as_str())?;
        }
        map.serialize_entry("rawTexts", &self.0.raw_texts)?;
        map.end()
    }
}

/// `<doctype>_<epochMillis>.<ext>`
pub fn export_file_name(record: &ExtractedRecord, format: ExportFormat, epoch_millis: i64) -> String {
    format!("{}_{}.{}", record.doc_type.slug(), epoch_millis, format.extension())
}

pub fn render(record: &ExtractedRecord, format: ExportFormat) -> Result<String, ExportError> {
    let doc = ExportDocument(record);
    Ok(match format {
        ExportFormat::Json => serde_json::to_string_pretty(&doc)?,
        ExportFormat::Toml => toml::to_string_pretty(&doc)?,
    })
}

/// Write the record into `dir` and return the created path.
pub fn export_record(
    record: &ExtractedRecord,
    dir: &Path,
    format: ExportFormat,
    epoch_millis: i64,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(export_file_name(record, format, epoch_millis));
    std::fs::write(&path, render(record, format)?)?;
    Ok(path)
}
