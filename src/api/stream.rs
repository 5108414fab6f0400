//! SSE streaming endpoint exposing the job bus to out-of-process
//! scheduler subscribers.

use axum::{
    extract::State as AxumState,
    response::sse::{Event, Sse},
};
use std::convert::Infallible;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::BroadcastStream;

use crate::SharedState;

/// GET /jobs/stream - SSE stream of prepared jobs
pub async fn stream_jobs(
    AxumState(state): AxumState<SharedState>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    let rx = state.jobs.subscribe();
    let stream = BroadcastStream::new(rx);

    let event_stream = stream.filter_map(|result| {
        match result {
            Ok(job) => {
                let data = serde_json::to_string(&job).unwrap_or_default();
                Some(Ok(Event::default().event("job.prepare").data(data)))
            }
            Err(_) => None, // Skip lagged messages
        }
    });

    Sse::new(event_stream)
}
