use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::StreamExt;

use common::bus::ReloadEvent;

use crate::ServiceState;

pub const RELOAD_EVENT: &str = "reload";

/// Live-reload stream. Each reload published on the bus becomes a `reload`
/// event carrying the reloaded content path.
///
/// The bus subscription lives inside the stream and is dropped with it when
/// the client disconnects.
pub async fn handler(
    State(state): State<ServiceState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = mpsc::unbounded_channel::<ReloadEvent>();
    let subscription = state.bus().subscribe(move |event: &ReloadEvent| {
        tx.send(event.clone())
            .map_err(|_| anyhow::anyhow!("event stream receiver dropped"))
    });
    tracing::debug!(subscription = subscription.id(), "event stream connected");

    let stream = UnboundedReceiverStream::new(rx).map(move |event| {
        let _guard = &subscription;
        Ok(Event::default()
            .event(RELOAD_EVENT)
            .data(event.path.to_string()))
    });

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(30))
            .text("keepalive"),
    )
}
