//! Async pipeline tests.
//!
//! Requires the `async` feature. Fixture-backed checks require
//! `tests/fixtures/generate_fixtures.sh`.

#![cfg(feature = "async")]

use std::path::Path;
use std::sync::Arc;

use cutlist::{CutlistError, SessionId, SessionStore, VideoSource, edit_async, ingest_async};
use serde_json::json;

#[tokio::test]
async fn edit_without_ingest_fails_on_worker() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SessionStore::new(dir.path()));
    let id = SessionId::new("async").unwrap();

    let result = edit_async(store, id, json!([])).await;
    assert!(matches!(result, Err(CutlistError::UnknownSession(_))));
}

#[tokio::test]
async fn missing_upload_fails_on_worker() {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SessionStore::new(dir.path().join("sessions")));
    let id = SessionId::new("async").unwrap();

    let result = ingest_async(
        store,
        id,
        VideoSource::Upload(dir.path().join("missing.mp4")),
    )
    .await;
    assert!(matches!(result, Err(CutlistError::Acquisition { .. })));
}

#[tokio::test]
async fn ingest_then_edit() {
    let path = "tests/fixtures/sample_video.mp4";
    if !Path::new(path).exists() {
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(SessionStore::new(dir.path()));
    let id = SessionId::new("async").unwrap();

    let live = ingest_async(
        Arc::clone(&store),
        id.clone(),
        VideoSource::Upload(path.into()),
    )
    .await
    .unwrap();
    assert_eq!(live.cutlist.len(), 2);

    let outcome = edit_async(
        Arc::clone(&store),
        id.clone(),
        json!([{"Start(sec)": 0.0, "End(sec)": 9.0}]),
    )
    .await
    .unwrap();
    assert_eq!(outcome.cutlist.len(), 1);
    assert_eq!(store.live(&id).unwrap().cutlist, outcome.cutlist);
}
