// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Report files
//!
//! Layout under the output directory:
//!
//! ```text
//! <name>.csv          one target, header + row
//! all-targets.csv     every target
//! raw/<name>.json     one MeasurementResult with all samples
//! all_results.json    every MeasurementResult
//! summary.md          host info, size and cold-start tables
//! ```

use super::csv::csv_document;
use super::error::{ReportError, ReportResult};
use super::markdown::{generate_summary, SystemInfo};
use super::result::MeasurementResult;
use crate::observability::messages::report::ReportWritten;
use chrono::Utc;
use std::path::{Path, PathBuf};

pub const COMBINED_CSV: &str = "all-targets.csv";
pub const COMBINED_JSON: &str = "all_results.json";
pub const SUMMARY_FILE: &str = "summary.md";
pub const RAW_DIR: &str = "raw";

pub struct ReportWriter {
    output_dir: PathBuf,
}

impl ReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn target_csv_path(&self, target: &str) -> PathBuf {
        self.output_dir.join(format!("{}.csv", target))
    }

    pub fn raw_json_path(&self, target: &str) -> PathBuf {
        self.output_dir.join(RAW_DIR).join(format!("{}.json", target))
    }

    async fn ensure_dirs(&self) -> ReportResult<()> {
        let raw = self.output_dir.join(RAW_DIR);
        tokio::fs::create_dir_all(&raw)
            .await
            .map_err(|source| ReportError::Io { path: raw, source })
    }

    async fn write(&self, path: PathBuf, contents: String) -> ReportResult<PathBuf> {
        tokio::fs::write(&path, contents.as_bytes())
            .await
            .map_err(|source| ReportError::Io {
                path: path.clone(),
                source,
            })?;
        tracing::debug!(
            "{}",
            ReportWritten {
                path: &path,
                bytes: contents.len(),
            }
        );
        Ok(path)
    }

    /// Writes `<name>.csv` and `raw/<name>.json` for one target.
    pub async fn write_target(&self, result: &MeasurementResult) -> ReportResult<()> {
        self.ensure_dirs().await?;
        let csv = csv_document(std::slice::from_ref(result));
        self.write(self.target_csv_path(&result.target), csv).await?;

        let json = serde_json::to_string_pretty(result)?;
        self.write(self.raw_json_path(&result.target), json).await?;
        Ok(())
    }

    /// Writes the combined CSV, combined JSON and Markdown summary.
    pub async fn write_combined(
        &self,
        results: &[MeasurementResult],
        system: &SystemInfo,
    ) -> ReportResult<Vec<PathBuf>> {
        self.ensure_dirs().await?;
        let csv = csv_document(results);
        let json = serde_json::to_string_pretty(results)?;
        let summary = generate_summary(results, system, Utc::now());

        Ok(vec![
            self.write(self.output_dir.join(COMBINED_CSV), csv).await?,
            self.write(self.output_dir.join(COMBINED_JSON), json).await?,
            self.write(self.output_dir.join(SUMMARY_FILE), summary).await?,
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::csv::CSV_HEADER;
    use tempfile::TempDir;

    fn host() -> SystemInfo {
        SystemInfo {
            os: "Linux".to_string(),
            os_version: "test".to_string(),
            kernel_version: None,
            cpu_model: "cpu".to_string(),
            cpu_cores: 1,
            memory_bytes: 1,
            hostname: "host".to_string(),
        }
    }

    #[tokio::test]
    async fn test_target_files() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path().join("results"));
        let mut result = MeasurementResult::new("rust", "native");
        result.cold_start_ms = vec![1.5, 2.5];

        writer.write_target(&result).await.unwrap();

        let csv = std::fs::read_to_string(writer.target_csv_path("rust")).unwrap();
        assert_eq!(csv.lines().next(), Some(CSV_HEADER));
        assert_eq!(csv.lines().count(), 2);

        let raw = std::fs::read_to_string(writer.raw_json_path("rust")).unwrap();
        let json: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(json["cold_start_ms"][1], 2.5);
    }

    #[tokio::test]
    async fn test_combined_files() {
        let dir = TempDir::new().unwrap();
        let writer = ReportWriter::new(dir.path());
        let results = vec![
            MeasurementResult::new("rust", "native"),
            MeasurementResult::new("tinygo", "sandbox-reactor"),
        ];

        let written = writer.write_combined(&results, &host()).await.unwrap();
        assert_eq!(written.len(), 3);

        let csv = std::fs::read_to_string(dir.path().join(COMBINED_CSV)).unwrap();
        assert_eq!(csv.lines().count(), 3);
        let json: serde_json::Value = serde_json::from_str(
            &std::fs::read_to_string(dir.path().join(COMBINED_JSON)).unwrap(),
        )
        .unwrap();
        assert_eq!(json.as_array().unwrap().len(), 2);
        assert!(dir.path().join(SUMMARY_FILE).exists());
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, b"x").unwrap();

        let writer = ReportWriter::new(blocker.join("nested"));
        let err = writer
            .write_target(&MeasurementResult::new("rust", "native"))
            .await
            .unwrap_err();
        assert!(matches!(err, ReportError::Io { .. }));
    }
}
