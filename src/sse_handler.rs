use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{sse::Event, Json, Sse},
};
use futures::stream::Stream;
use serde::Serialize;
use std::{convert::Infallible, pin::Pin, task::{Context, Poll}, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;

use crate::feed::{ItemStats, ItemUpdate};
use crate::gateway::GatewayState;

fn update_to_axum(update: ItemUpdate) -> Event {
    Event::default()
        .event("update")
        .data(update.event.to_json())
}

/// GET /sse/items/{item}
pub async fn sse_item(
    State(state): State<GatewayState>,
    Path(item): Path<String>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, (StatusCode, String)> {
    let (handle, receiver) = state.hub.join(&item).await.map_err(|e| {
        tracing::warn!(item = %item, error = %e, "Subscription failed");
        (StatusCode::SERVICE_UNAVAILABLE, e.to_string())
    })?;

    tracing::info!(
        item = %item,
        handle = %handle,
        clients = state.hub.client_count(&item),
        "SSE client joined"
    );

    let stream_handle = handle.clone();
    let event_stream = BroadcastStream::new(receiver)
        .filter_map(move |result| result.ok().filter(|u| u.handle == stream_handle))
        .map(|update| Ok::<_, Infallible>(update_to_axum(update)));
    let event_stream =
        futures::StreamExt::take_until(event_stream, state.cancel.clone().cancelled_owned());

    let hub = state.hub.clone();
    let cleanup_item = item.clone();
    let final_stream = CleanupStream {
        inner: Box::pin(event_stream),
        item,
        cleanup: Some(Box::new(move || {
            tokio::spawn(async move {
                hub.leave(&cleanup_item).await;
            });
        })),
    };

    Ok(Sse::new(final_stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(10))
            .text("keep-alive"),
    ))
}

#[derive(Debug, Serialize)]
pub struct ItemsResponse {
    pub instance_id: String,
    pub items: Vec<ItemStats>,
}

/// GET /api/items
pub async fn list_items(State(state): State<GatewayState>) -> Json<ItemsResponse> {
    Json(ItemsResponse {
        instance_id: state.instance_id.clone(),
        items: state.hub.stats(),
    })
}

/// Runs `cleanup` once the client goes away and axum drops the stream
pub struct CleanupStream<S> {
    inner: Pin<Box<S>>,
    cleanup: Option<Box<dyn FnOnce() + Send>>,
    item: String,
}

impl<S> Drop for CleanupStream<S> {
    fn drop(&mut self) {
        tracing::info!(item = %self.item, "SSE client left");
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl<S: Stream> Stream for CleanupStream<S> {
    type Item = S::Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}
