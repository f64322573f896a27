#[path = "../common/mod.rs"]
mod common;

use std::time::Duration;
use acad_rag_console::models::ingestion_task::{IngestionError, IngestionEvent, IngestionStage, ProgressPlan};
use acad_rag_console::services::gateway::RequestBody;
use acad_rag_console::services::ingestion_service::{IngestionTracker, ProgressDriver};
use acad_rag_console::services::upload_service::{DocumentUploader, UploadFile, INDEXING_TIMEOUT_REASON};
use common::{Harness, ScriptedTransport};
use serde_json::json;

fn syllabus() -> UploadFile {
    UploadFile {
        filename: "DS_Syllabus_2024.pdf".to_string(),
        title: None,
        subject: "Data Structures".to_string(),
        document_type: "syllabus".to_string(),
        bytes: b"%PDF-1.4".to_vec(),
    }
}

fn uploader(harness: &Harness) -> DocumentUploader {
    let tracker = IngestionTracker::new(ProgressPlan::default(), ProgressDriver::Manual);
    DocumentUploader::new(harness.gateway.clone(), tracker).with_polling(Duration::from_millis(100), 5)
}

#[tokio::test(start_paused = true)]
async fn test_two_files_advance_independently() {
    common::init_logging();
    let tracker = IngestionTracker::simulated();
    let syllabus = tracker.enqueue("DS_Syllabus_2024.pdf").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;
    let marks = tracker.enqueue("Marks_Register.xlsx").unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let ahead = tracker.get(&syllabus.id).unwrap();
    let behind = tracker.get(&marks.id).unwrap();
    assert!(ahead.progress > behind.progress);

    tracker.cancel(&marks.id).unwrap();
    let before = tracker.get(&syllabus.id).unwrap();
    tokio::time::sleep(Duration::from_secs(5)).await;

    let finished = tracker.get(&syllabus.id).unwrap();
    assert!(finished.progress >= before.progress);
    assert_eq!(finished.stage, IngestionStage::Complete);
    assert!(tracker.get(&marks.id).is_none());
    assert_eq!(tracker.snapshot().len(), 1);
}

#[test]
fn test_progress_never_decreases_under_events() {
    let tracker = IngestionTracker::new(ProgressPlan::default(), ProgressDriver::Manual);
    let task = tracker.register("CO_Mapping.docx").unwrap();
    let events = [
        IngestionEvent::UploadProgress { sent: 80, total: 100 },
        IngestionEvent::UploadProgress { sent: 20, total: 100 },
        IngestionEvent::Uploaded,
        IngestionEvent::IndexingProgress(0.5),
        IngestionEvent::IndexingProgress(0.1),
        IngestionEvent::Indexed,
    ];
    let mut last = 0.0;
    for event in events {
        let current = tracker.apply_event(&task.id, event).unwrap();
        assert!(current.progress >= last);
        last = current.progress;
    }
    assert_eq!(last, 100.0);
    assert_eq!(
        tracker.cancel(&task.id).unwrap_err(),
        IngestionError::AlreadyComplete(task.id.clone())
    );
}

#[tokio::test(start_paused = true)]
async fn test_uploader_follows_indexing_to_completion() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(200, json!({ "id": 12, "indexing_status": "pending" }))
        .push_json(200, json!({ "id": 12, "indexing_status": "in_progress" }))
        .push_json(200, json!({ "id": 12, "indexing_status": "completed" }));
    let harness = Harness::new(transport, Some("jwt"));
    let uploader = uploader(&harness);

    let task = uploader.tracker().register("DS_Syllabus_2024.pdf").unwrap();
    uploader.run(task.id.clone(), syllabus()).await;

    let done = uploader.tracker().get(&task.id).unwrap();
    assert_eq!(done.stage, IngestionStage::Complete);
    assert_eq!(done.percent(), 100);
    assert_eq!(harness.transport.paths(), vec!["/documents/upload", "/documents/12", "/documents/12"]);

    let upload = &harness.transport.requests()[0];
    assert_eq!(upload.bearer.as_deref(), Some("jwt"));
    let RequestBody::Multipart(form) = &upload.body else {
        panic!("upload was not multipart");
    };
    assert_eq!(form.filename, "DS_Syllabus_2024.pdf");
    assert!(form.fields.contains(&("subject".to_string(), "Data Structures".to_string())));
    assert!(form.fields.contains(&("document_type".to_string(), "syllabus".to_string())));
    assert!(form.fields.contains(&("title".to_string(), "DS_Syllabus_2024.pdf".to_string())));
}

#[tokio::test(start_paused = true)]
async fn test_uploader_reports_indexing_failure() {
    let transport = ScriptedTransport::new();
    transport
        .push_json(200, json!({ "id": 3, "indexing_status": "pending" }))
        .push_json(200, json!({ "id": 3, "indexing_status": "failed", "error_message": "No text found in PDF" }));
    let harness = Harness::new(transport, Some("jwt"));
    let uploader = uploader(&harness);

    let task = uploader.tracker().register("scan.pdf").unwrap();
    uploader.run(task.id.clone(), syllabus()).await;

    let failed = uploader.tracker().get(&task.id).unwrap();
    assert_eq!(failed.stage, IngestionStage::Failed { reason: "No text found in PDF".to_string() });
    assert!(failed.progress >= ProgressPlan::default().indexing_floor);
    assert!(uploader.tracker().cancel(&task.id).is_ok());
}

#[tokio::test(start_paused = true)]
async fn test_uploader_gives_up_after_its_poll_budget() {
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({ "id": 8, "indexing_status": "pending" }));
    for _ in 0..5 {
        transport.push_json(200, json!({ "id": 8, "indexing_status": "in_progress" }));
    }
    let harness = Harness::new(transport, Some("jwt"));
    let uploader = uploader(&harness);

    let task = uploader.tracker().register("lab.pptx").unwrap();
    uploader.run(task.id.clone(), syllabus()).await;

    let timed_out = uploader.tracker().get(&task.id).unwrap();
    assert_eq!(timed_out.stage, IngestionStage::Failed { reason: INDEXING_TIMEOUT_REASON.to_string() });
    assert!(timed_out.progress < 100.0);
    assert_eq!(harness.transport.requests().len(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_rejected_upload_fails_the_task() {
    let transport = ScriptedTransport::new();
    transport.push_failure("connection reset");
    let harness = Harness::new(transport, Some("jwt"));
    let uploader = uploader(&harness);

    let task = uploader.tracker().register("notes.docx").unwrap();
    uploader.run(task.id.clone(), syllabus()).await;

    let failed = uploader.tracker().get(&task.id).unwrap();
    assert!(matches!(failed.stage, IngestionStage::Failed { ref reason } if reason.contains("connection reset")));
}

#[tokio::test(start_paused = true)]
async fn test_cancelled_upload_stops_polling() {
    let transport = ScriptedTransport::new();
    transport.push_json(200, json!({ "id": 5, "indexing_status": "pending" }));
    let harness = Harness::new(transport, Some("jwt"));
    let uploader = uploader(&harness);

    let task = uploader.upload(syllabus()).unwrap();
    while harness.transport.requests().is_empty() {
        tokio::task::yield_now().await;
    }
    uploader.tracker().cancel(&task.id).unwrap();
    tokio::time::sleep(Duration::from_secs(2)).await;

    assert!(uploader.tracker().get(&task.id).is_none());
    assert_eq!(harness.transport.paths(), vec!["/documents/upload"]);
}
