//! Background pipeline runner
//!
//! At most one pipeline runs at a time: the sidebar form is gated while a
//! job is in flight, and the run itself happens on a background task so
//! request handling never blocks on the external tools. Progress events
//! are drained into a snapshot the status endpoint can read, and the
//! outcome lands in the session as a notice.

use crate::session::{Notice, SharedSession};
use std::sync::Arc;
use stemdeck_core::downloader::validate_source_url;
use stemdeck_core::pipeline::{Pipeline, PipelineRequest};
use stemdeck_core::sanitize::resolve_track_name;
use stemdeck_core::Config;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("another track is still processing")]
    Busy,

    #[error("that does not look like a valid URL")]
    InvalidUrl,
}

/// Point-in-time view of the active job.
#[derive(Debug, Clone)]
pub struct JobSnapshot {
    pub id: Uuid,
    pub name: String,
    pub stage: String,
}

#[derive(Debug)]
struct ActiveJob {
    id: Uuid,
    name: String,
    stage: String,
    cancel: CancellationToken,
}

pub struct JobRunner {
    config: Config,
    session: SharedSession,
    active: Arc<RwLock<Option<ActiveJob>>>,
}

impl JobRunner {
    pub fn new(config: Config, session: SharedSession) -> Self {
        Self {
            config,
            session,
            active: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn snapshot(&self) -> Option<JobSnapshot> {
        self.active.read().await.as_ref().map(|job| JobSnapshot {
            id: job.id,
            name: job.name.clone(),
            stage: job.stage.clone(),
        })
    }

    /// Start a pipeline run for `url`, refusing while one is in flight.
    pub async fn submit(&self, url: String, requested_name: String) -> Result<JobSnapshot, SubmitError> {
        if !validate_source_url(&url) {
            return Err(SubmitError::InvalidUrl);
        }

        let mut active = self.active.write().await;
        if active.is_some() {
            return Err(SubmitError::Busy);
        }

        let id = Uuid::new_v4();
        let name = resolve_track_name(&requested_name);
        let cancel = CancellationToken::new();
        let (progress_tx, mut progress_rx) = mpsc::channel::<stemdeck_core::pipeline::PipelineStage>(32);

        *active = Some(ActiveJob {
            id,
            name: name.clone(),
            stage: "starting".to_string(),
            cancel: cancel.clone(),
        });
        drop(active);

        info!("job {} started for {}", id, name);

        // Drain progress events into the snapshot.
        let active_ref = Arc::clone(&self.active);
        tokio::spawn(async move {
            while let Some(stage) = progress_rx.recv().await {
                let label = stage.label();
                if let Some(job) = active_ref.write().await.as_mut() {
                    job.stage = label;
                }
            }
        });

        let pipeline = Pipeline::new(
            self.config.clone(),
            PipelineRequest {
                url,
                requested_name,
            },
            progress_tx,
            cancel,
        );

        let active_ref = Arc::clone(&self.active);
        let session = Arc::clone(&self.session);
        let job_name = name.clone();
        tokio::spawn(async move {
            let notice = match pipeline.run().await {
                Ok(_) => Notice::Success(format!("{job_name} is ready")),
                Err(e) if e.is_cancelled() => {
                    Notice::Info(format!("processing of {job_name} was cancelled"))
                }
                Err(e) => Notice::Error(format!("processing of {job_name} failed: {e}")),
            };
            info!("job for {} finished: {:?}", job_name, notice);
            session.write().await.push_notice(notice);
            *active_ref.write().await = None;
        });

        Ok(JobSnapshot {
            id,
            name,
            stage: "starting".to_string(),
        })
    }

    /// Ask the active job to stop. Returns whether there was one.
    pub async fn cancel(&self) -> bool {
        match self.active.read().await.as_ref() {
            Some(job) => {
                info!("job {} cancel requested", job.id);
                job.cancel.cancel();
                true
            }
            None => false,
        }
    }

    #[cfg(test)]
    async fn force_active(&self, name: &str) {
        *self.active.write().await = Some(ActiveJob {
            id: Uuid::new_v4(),
            name: name.to_string(),
            stage: "separating".to_string(),
            cancel: CancellationToken::new(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Session;

    fn runner() -> JobRunner {
        let session = Arc::new(RwLock::new(Session::new()));
        JobRunner::new(Config::default(), session)
    }

    #[tokio::test]
    async fn test_submit_rejects_bad_url() {
        let runner = runner();
        let err = runner
            .submit("not a url".to_string(), "Test".to_string())
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::InvalidUrl);
        assert!(runner.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn test_single_job_slot() {
        let runner = runner();
        runner.force_active("First_Track").await;

        let err = runner
            .submit(
                "https://youtube.com/watch?v=abc".to_string(),
                "Second".to_string(),
            )
            .await
            .unwrap_err();
        assert_eq!(err, SubmitError::Busy);

        let snapshot = runner.snapshot().await.unwrap();
        assert_eq!(snapshot.name, "First_Track");
        assert_eq!(snapshot.stage, "separating");
    }

    #[tokio::test]
    async fn test_cancel_without_job() {
        assert!(!runner().cancel().await);
    }
}
