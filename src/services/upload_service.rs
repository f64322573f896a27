use std::sync::Arc;
use std::time::Duration;
use log::{error, info, warn};
use reqwest::Method;
use serde::Deserialize;
use crate::models::ingestion_task::{IngestionError, IngestionEvent, IngestionTask, TaskId};
use crate::services::gateway::{Gateway, RequestBody, UploadForm};
use crate::services::ingestion_service::IngestionTracker;

const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
const DEFAULT_MAX_POLLS: u32 = 30;
pub const INDEXING_TIMEOUT_REASON: &str = "indexing did not finish in time";

/// A document handed over for ingestion.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub filename: String,
    pub title: Option<String>,
    pub subject: String,
    pub document_type: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    fn into_form(self) -> UploadForm {
        let title = self.title.unwrap_or_else(|| self.filename.clone());
        UploadForm {
            filename: self.filename,
            bytes: self.bytes,
            fields: vec![
                ("title".to_string(), title),
                ("subject".to_string(), self.subject),
                ("document_type".to_string(), self.document_type),
            ],
        }
    }
}

/// What the backend knows about a stored document.
#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRecord {
    pub id: i64,
    #[serde(default)]
    pub indexing_status: String,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// Sends documents to the backend and reports real progress to the tracker.
#[derive(Clone)]
pub struct DocumentUploader {
    gateway: Arc<Gateway>,
    tracker: IngestionTracker,
    poll_interval: Duration,
    max_polls: u32,
}

impl DocumentUploader {
    pub fn new(gateway: Arc<Gateway>, tracker: IngestionTracker) -> Self {
        DocumentUploader {
            gateway,
            tracker,
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_polls: DEFAULT_MAX_POLLS,
        }
    }

    pub fn with_polling(mut self, poll_interval: Duration, max_polls: u32) -> Self {
        self.poll_interval = poll_interval;
        self.max_polls = max_polls.max(1);
        self
    }

    pub fn tracker(&self) -> &IngestionTracker {
        &self.tracker
    }

    /// Registers the task and starts the upload in the background.
    pub fn upload(&self, file: UploadFile) -> Result<IngestionTask, IngestionError> {
        let task = self.tracker.register(&file.filename)?;
        let uploader = self.clone();
        let id = task.id.clone();
        tokio::spawn(async move { uploader.run(id, file).await });
        Ok(task)
    }

    /// Uploads `file` and follows indexing until the task settles or is gone.
    pub async fn run(&self, id: TaskId, file: UploadFile) {
        info!("Uploading {} for task {}", file.filename, id);
        let response = self
            .gateway
            .send(Method::POST, "/documents/upload", RequestBody::Multipart(file.into_form()))
            .await
            .and_then(|response| response.json::<DocumentRecord>());
        let record = match response {
            Ok(record) => record,
            Err(e) => {
                error!("Upload for task {} failed: {}", id, e);
                self.tracker.apply_event(&id, IngestionEvent::Failed(e.to_string()));
                return;
            }
        };

        if self.settle(&id, &record) {
            return;
        }
        if self.tracker.apply_event(&id, IngestionEvent::Uploaded).is_none() {
            return;
        }

        let path = format!("/documents/{}", record.id);
        for attempt in 1..=self.max_polls {
            tokio::time::sleep(self.poll_interval).await;
            if !self.tracker.contains(&id) {
                info!("Task {} was cancelled; stop polling document {}", id, record.id);
                return;
            }
            match self.gateway.get_json::<DocumentRecord>(&path).await {
                Ok(record) => {
                    if self.settle(&id, &record) {
                        return;
                    }
                    let done = (attempt as f32 / self.max_polls as f32).min(0.99);
                    if self.tracker.apply_event(&id, IngestionEvent::IndexingProgress(done)).is_none() {
                        return;
                    }
                }
                Err(e) => {
                    error!("Polling document {} failed: {}", record.id, e);
                    self.tracker.apply_event(&id, IngestionEvent::Failed(e.to_string()));
                    return;
                }
            }
        }
        warn!("Document {} still not indexed after {} polls", record.id, self.max_polls);
        self.tracker
            .apply_event(&id, IngestionEvent::Failed(INDEXING_TIMEOUT_REASON.to_string()));
    }

    /// Applies a terminal status if the record has one. Returns whether the
    /// task is finished.
    fn settle(&self, id: &str, record: &DocumentRecord) -> bool {
        match record.indexing_status.as_str() {
            "completed" => {
                self.tracker.apply_event(id, IngestionEvent::Indexed);
                true
            }
            "failed" => {
                let reason = record
                    .error_message
                    .clone()
                    .unwrap_or_else(|| "indexing failed".to_string());
                self.tracker.apply_event(id, IngestionEvent::Failed(reason));
                true
            }
            _ => false,
        }
    }
}
