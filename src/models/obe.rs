use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::models::field_alias::{first_number, first_string};

/// Attainment of one course outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoAttainment {
    pub name: String,
    pub attainment: f64,
}

impl CoAttainment {
    /// Normalises whatever list shape the analytics endpoint returned.
    ///
    /// Records may name the outcome `co`, `name` or `id` and the value
    /// `attainment`, `percentage` or `value`. The list itself may be wrapped
    /// in an object under `co_attainment`, `attainments` or `data`.
    pub fn list_from_wire(payload: &Value) -> Vec<CoAttainment> {
        let records: &[Value] = match payload {
            Value::Array(items) => items.as_slice(),
            Value::Object(_) => ["co_attainment", "attainments", "data"]
                .iter()
                .find_map(|key| payload.get(*key).and_then(Value::as_array))
                .map(Vec::as_slice)
                .unwrap_or_default(),
            _ => &[],
        };
        records
            .iter()
            .filter(|record| record.is_object())
            .enumerate()
            .map(|(index, record)| CoAttainment {
                name: first_string(record, &["co", "name", "id"])
                    .unwrap_or_else(|| format!("CO{}", index + 1)),
                attainment: first_number(record, &["attainment", "percentage", "value"]).unwrap_or(0.0),
            })
            .collect()
    }
}

/// Body of `POST /obe/generate-report`.
#[derive(Debug, Clone, Serialize)]
pub struct ReportRequest {
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub semester: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub academic_year: Option<String>,
    pub report_type: String,
}

impl ReportRequest {
    pub fn comprehensive(subject: &str) -> Self {
        ReportRequest {
            subject: subject.to_string(),
            semester: None,
            academic_year: None,
            report_type: "comprehensive".to_string(),
        }
    }
}

/// A generated report ready to be handed to the user as a download.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportArtifact {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ReportArtifact {
    pub fn new(subject: &str, content_type: Option<&str>, disposition: Option<&str>, bytes: Vec<u8>) -> Self {
        let content_type = content_type
            .unwrap_or("application/octet-stream")
            .to_string();
        let filename = disposition
            .and_then(filename_from_disposition)
            .unwrap_or_else(|| default_filename(subject, &content_type));
        ReportArtifact {
            filename,
            content_type,
            bytes,
        }
    }

    /// Writes the report into `dir` and returns the full path.
    pub fn save_to(&self, dir: &Path) -> io::Result<PathBuf> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.filename);
        fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

fn filename_from_disposition(disposition: &str) -> Option<String> {
    disposition
        .split(';')
        .map(str::trim)
        .find_map(|part| part.strip_prefix("filename="))
        .map(|name| name.trim_matches('"'))
        .and_then(|name| Path::new(name).file_name()?.to_str().map(str::to_string))
        .filter(|name| !name.is_empty())
}

fn default_filename(subject: &str, content_type: &str) -> String {
    let extension = match content_type.split(';').next().map(str::trim) {
        Some("application/pdf") => "pdf",
        Some("application/json") => "json",
        Some("text/csv") => "csv",
        Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet") => "xlsx",
        _ => "bin",
    };
    let slug: String = subject
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    let slug = slug.trim_matches('-');
    if slug.is_empty() {
        format!("obe-report.{}", extension)
    } else {
        format!("obe-report-{}.{}", slug, extension)
    }
}
