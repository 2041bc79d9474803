//! Running the pipeline off the async runtime.
//!
//! Detection decodes every frame of a video, which can take far longer
//! than a request handler should block. [`ingest_async`] and [`edit_async`]
//! run the blocking [`SessionStore`] operations on
//! `tokio::task::spawn_blocking` and hand back a [`PipelineFuture`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use cutlist::{CutlistError, SessionId, SessionStore, VideoSource};
//!
//! # async fn example() -> Result<(), CutlistError> {
//! let store = Arc::new(SessionStore::new("workspace"));
//! let id = SessionId::new("demo")?;
//! let live = cutlist::ingest_async(
//!     Arc::clone(&store),
//!     id,
//!     VideoSource::Upload("input.mp4".into()),
//! )
//! .await?;
//! println!("{} cut(s)", live.cutlist.len());
//! # Ok(())
//! # }
//! ```

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::task::JoinHandle;

use crate::acquisition::VideoSource;
use crate::error::CutlistError;
use crate::session::{EditOutcome, LiveCutlist, SessionId, SessionStore};

/// A pipeline operation running on a blocking worker thread.
///
/// Resolves to the operation's result, or [`CutlistError::WorkerFailed`]
/// if the worker panicked or was cancelled.
pub struct PipelineFuture<T> {
    handle: JoinHandle<Result<T, CutlistError>>,
}

impl<T> Future for PipelineFuture<T> {
    type Output = Result<T, CutlistError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.handle).poll(cx).map(|result| {
            result.unwrap_or_else(|error| Err(CutlistError::WorkerFailed(error.to_string())))
        })
    }
}

fn spawn<T, F>(task: F) -> PipelineFuture<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, CutlistError> + Send + 'static,
{
    PipelineFuture {
        handle: tokio::task::spawn_blocking(task),
    }
}

/// Run [`SessionStore::ingest`] on a blocking worker thread.
///
/// Must be called from within a Tokio runtime.
pub fn ingest_async(
    store: Arc<SessionStore>,
    id: SessionId,
    source: VideoSource,
) -> PipelineFuture<LiveCutlist> {
    spawn(move || store.ingest(&id, &source))
}

/// Run [`SessionStore::edit`] on a blocking worker thread.
///
/// Must be called from within a Tokio runtime.
pub fn edit_async(
    store: Arc<SessionStore>,
    id: SessionId,
    payload: Value,
) -> PipelineFuture<EditOutcome> {
    spawn(move || store.edit(&id, &payload))
}
