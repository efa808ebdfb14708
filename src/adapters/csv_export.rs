use crate::domain::model::CharacterSummary;
use crate::domain::ports::{ExportReceipt, ExportSink, Storage};
use crate::utils::error::{RankError, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;

pub const CSV_FILENAME: &str = "top_characters.csv";

fn serialize_error(e: csv::Error) -> RankError {
    RankError::export(format!("failed to serialize CSV: {}", e))
}

/// Serializes summaries as `name,species,height,appearances`.
///
/// Every failure here is an `ExportFailure`.
pub fn to_csv(summaries: &[CharacterSummary]) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    if summaries.is_empty() {
        writer
            .write_record(["name", "species", "height", "appearances"])
            .map_err(serialize_error)?;
    }
    for summary in summaries {
        writer.serialize(summary).map_err(serialize_error)?;
    }

    writer
        .into_inner()
        .map_err(|e| RankError::export(format!("failed to flush CSV writer: {}", e)))
}

/// Writes the CSV through a `Storage` and forwards it to an HTTP endpoint.
pub struct CsvExportSink<S: Storage> {
    storage: S,
    endpoint: Option<String>,
    client: Client,
}

impl<S: Storage> CsvExportSink<S> {
    pub fn new(storage: S, endpoint: Option<String>, client: Client) -> Self {
        Self {
            storage,
            endpoint,
            client,
        }
    }

    async fn forward(&self, endpoint: &str, csv_bytes: Vec<u8>) -> Result<()> {
        let part = Part::bytes(csv_bytes)
            .file_name(CSV_FILENAME)
            .mime_str("text/csv")?;
        let form = Form::new().part("file", part);

        tracing::debug!("Uploading {} to {}", CSV_FILENAME, endpoint);
        let response = self
            .client
            .post(endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| RankError::export(format!("upload to {} failed: {}", endpoint, e)))?;

        if !response.status().is_success() {
            return Err(RankError::export(format!(
                "upload to {} returned {}",
                endpoint,
                response.status()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl<S: Storage> ExportSink for CsvExportSink<S> {
    async fn export(&self, summaries: &[CharacterSummary]) -> Result<ExportReceipt> {
        let csv_bytes = to_csv(summaries)?;

        self.storage
            .write_file(CSV_FILENAME, &csv_bytes)
            .await
            .map_err(|e| RankError::export(format!("failed to persist CSV: {}", e)))?;
        tracing::info!(
            "CSV file content:\n\n{}",
            String::from_utf8_lossy(&csv_bytes)
        );

        let forwarded = match &self.endpoint {
            Some(endpoint) => {
                self.forward(endpoint, csv_bytes).await?;
                tracing::info!("CSV file sent to {} successfully", endpoint);
                true
            }
            None => false,
        };

        Ok(ExportReceipt {
            path: self.storage.locate(CSV_FILENAME),
            rows: summaries.len(),
            forwarded,
            exported_at: chrono::Utc::now(),
        })
    }
}
