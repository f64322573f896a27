use std::path::Path;
use std::time::Duration;
use serde::Serialize;
use uuid::Uuid;
use crate::config::ALLOWED_EXTENSIONS;

pub type TaskId = String;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum IngestionStage {
    Uploading,
    Indexing,
    Complete,
    Failed { reason: String },
}

impl IngestionStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, IngestionStage::Complete | IngestionStage::Failed { .. })
    }

    pub fn label(&self) -> &'static str {
        match self {
            IngestionStage::Uploading => "Uploading...",
            IngestionStage::Indexing => "Indexing...",
            IngestionStage::Complete => "Complete",
            IngestionStage::Failed { .. } => "Failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IngestionError {
    #[error("File name is empty")]
    EmptyFilename,

    #[error("Unsupported file type for {0}; allowed: pdf, docx, xlsx, pptx")]
    UnsupportedFileType(String),

    #[error("Task {0} already exists")]
    DuplicateTask(TaskId),

    #[error("No ingestion task with id {0}")]
    NotFound(TaskId),

    #[error("Task {0} has already completed")]
    AlreadyComplete(TaskId),
}

/// Progress signal from a real upload/index pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionEvent {
    UploadProgress { sent: u64, total: u64 },
    Uploaded,
    /// Fraction of indexing done, `0.0..=1.0`.
    IndexingProgress(f32),
    Indexed,
    Failed(String),
}

/// Shape of the simulated progress curve, also used to place real events on
/// the same 0..100 scale.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressPlan {
    pub upload_ceiling: f32,
    pub indexing_floor: f32,
    pub upload_duration: Duration,
    pub indexing_duration: Duration,
    pub tick: Duration,
}

impl Default for ProgressPlan {
    fn default() -> Self {
        ProgressPlan {
            upload_ceiling: 60.0,
            indexing_floor: 65.0,
            upload_duration: Duration::from_millis(1400),
            indexing_duration: Duration::from_millis(1200),
            tick: Duration::from_millis(200),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IngestionTask {
    pub id: TaskId,
    pub filename: String,
    pub progress: f32,
    pub stage: IngestionStage,
    #[serde(skip)]
    stage_elapsed: Duration,
}

impl IngestionTask {
    pub fn new(filename: &str) -> Result<Self, IngestionError> {
        validate_filename(filename)?;
        Ok(IngestionTask {
            id: Uuid::new_v4().to_string(),
            filename: filename.trim().to_string(),
            progress: 0.0,
            stage: IngestionStage::Uploading,
            stage_elapsed: Duration::ZERO,
        })
    }

    /// Whole-number percentage for display.
    pub fn percent(&self) -> u8 {
        self.progress.round().clamp(0.0, 100.0) as u8
    }

    fn raise_progress(&mut self, candidate: f32) {
        let candidate = candidate.clamp(0.0, 100.0);
        if candidate > self.progress {
            self.progress = candidate;
        }
    }

    fn enter_indexing(&mut self, plan: &ProgressPlan) {
        self.stage = IngestionStage::Indexing;
        self.stage_elapsed = Duration::ZERO;
        self.raise_progress(plan.indexing_floor);
    }

    fn complete(&mut self) {
        self.stage = IngestionStage::Complete;
        self.progress = 100.0;
    }
}

pub fn validate_filename(filename: &str) -> Result<(), IngestionError> {
    let filename = filename.trim();
    if filename.is_empty() {
        return Err(IngestionError::EmptyFilename);
    }
    let extension = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);
    match extension {
        Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
        _ => Err(IngestionError::UnsupportedFileType(filename.to_string())),
    }
}

fn fraction(elapsed: Duration, total: Duration) -> f32 {
    if total.is_zero() {
        return 1.0;
    }
    (elapsed.as_secs_f32() / total.as_secs_f32()).clamp(0.0, 1.0)
}

/// Moves a task along the simulated clock by `elapsed`.
///
/// Time left over when the upload ceiling is reached carries into indexing.
/// Progress never goes down; terminal tasks come back unchanged.
pub fn advance(task: &IngestionTask, elapsed: Duration, plan: &ProgressPlan) -> IngestionTask {
    let mut next = task.clone();
    let mut remaining = elapsed;
    loop {
        match next.stage {
            IngestionStage::Uploading => {
                let spent = next.stage_elapsed + remaining;
                if spent >= plan.upload_duration {
                    remaining = spent - plan.upload_duration;
                    next.raise_progress(plan.upload_ceiling);
                    next.enter_indexing(plan);
                    continue;
                }
                next.stage_elapsed = spent;
                next.raise_progress(plan.upload_ceiling * fraction(spent, plan.upload_duration));
                return next;
            }
            IngestionStage::Indexing => {
                let spent = next.stage_elapsed + remaining;
                if spent >= plan.indexing_duration {
                    next.complete();
                    return next;
                }
                next.stage_elapsed = spent;
                let span = 100.0 - plan.indexing_floor;
                next.raise_progress(plan.indexing_floor + span * fraction(spent, plan.indexing_duration));
                return next;
            }
            IngestionStage::Complete | IngestionStage::Failed { .. } => return next,
        }
    }
}

/// Applies one real transport event. Terminal tasks ignore further events.
pub fn apply_event(task: &IngestionTask, event: &IngestionEvent, plan: &ProgressPlan) -> IngestionTask {
    let mut next = task.clone();
    if next.stage.is_terminal() {
        return next;
    }
    match event {
        IngestionEvent::UploadProgress { sent, total } => {
            if next.stage == IngestionStage::Uploading && *total > 0 {
                let ratio = (*sent as f64 / *total as f64).clamp(0.0, 1.0) as f32;
                next.raise_progress(plan.upload_ceiling * ratio);
            }
        }
        IngestionEvent::Uploaded => {
            if next.stage == IngestionStage::Uploading {
                next.raise_progress(plan.upload_ceiling);
                next.enter_indexing(plan);
            }
        }
        IngestionEvent::IndexingProgress(done) => {
            if next.stage == IngestionStage::Uploading {
                next.enter_indexing(plan);
            }
            let span = 100.0 - plan.indexing_floor;
            next.raise_progress(plan.indexing_floor + span * done.clamp(0.0, 1.0));
        }
        IngestionEvent::Indexed => next.complete(),
        IngestionEvent::Failed(reason) => {
            next.stage = IngestionStage::Failed { reason: reason.clone() };
        }
    }
    next
}
