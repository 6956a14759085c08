// SPDX-FileCopyrightText: 2026 Herald Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Server-Sent Events stream of job progress.
//!
//! `GET /progress/stream?jobId=` emits the current snapshot immediately and
//! then one event per committed change:
//!
//! ```text
//! event: progress
//! data: {"total":3,"sent":1,"failed":0,"paused":false,"running":true,...}
//! ```
//!
//! The stream ends after the first snapshot with `running: false`.

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{self, Stream};
use herald_campaign::Progress;
use tokio::sync::watch;

use crate::error::ApiResult;
use crate::handlers::JobQuery;
use crate::server::AppState;

/// Name of every event on the stream.
pub const PROGRESS_EVENT: &str = "progress";

/// GET /progress/stream?jobId=
pub async fn progress_stream(
    State(state): State<AppState>,
    Query(query): Query<JobQuery>,
) -> ApiResult<Sse<impl Stream<Item = Result<Event, axum::Error>>>> {
    let rx = state.service.subscribe(&query.job_id)?;
    Ok(Sse::new(snapshots(rx)).keep_alive(KeepAlive::default()))
}

/// Current snapshot first, then every change until the job stops running.
fn snapshots(
    rx: watch::Receiver<Progress>,
) -> impl Stream<Item = Result<Event, axum::Error>> {
    stream::unfold(Some((rx, true)), |slot| async move {
        let (mut rx, first) = slot?;
        if !first && rx.changed().await.is_err() {
            return None;
        }
        let progress = rx.borrow_and_update().clone();
        let next = progress.running.then_some((rx, false));
        Some((Event::default().event(PROGRESS_EVENT).json_data(&progress), next))
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use futures::StreamExt;
    use herald_campaign::{CampaignService, EngineSettings, JobStore, SendEngine};
    use herald_test_utils::{MockChannel, sample_units};

    use super::*;

    #[tokio::test(start_paused = true)]
    async fn stream_ends_with_final_snapshot() {
        let engine = SendEngine::new(Arc::new(MockChannel::new()), EngineSettings::default());
        let service = CampaignService::new(Arc::new(JobStore::new()), engine);
        let id = service
            .start(sample_units(3), Duration::from_secs(1))
            .unwrap();

        let events: Vec<_> = snapshots(service.subscribe(id.as_str()).unwrap())
            .collect()
            .await;

        assert!(events.len() >= 2);
        assert!(events.iter().all(Result::is_ok));
        assert!(!service.progress(id.as_str()).unwrap().running);
    }

    #[tokio::test]
    async fn finished_job_yields_single_event() {
        let (tx, rx) = watch::channel(Progress {
            total: 1,
            sent: 1,
            failed: 0,
            paused: false,
            running: false,
            cancelled: false,
            state: herald_campaign::JobPhase::Done,
            last_error: String::new(),
        });
        let events: Vec<_> = snapshots(rx).collect().await;
        assert_eq!(events.len(), 1);
        drop(tx);
    }
}
