//! Export Routes
//!
//! - GET /api/v1/pois/export/csv - Filtered POIs as a streamed CSV download
//!
//! The header goes out first; row chunks are encoded on the blocking pool
//! and handed to the response body through a bounded channel, so memory
//! stays flat however many rows match.

use axum::{
    body::Body,
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::{stream, StreamExt};
use std::io;
use std::ops::ControlFlow;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::api::dto::FilterParams;
use crate::api::error::ApiResult;
use crate::api::routes::run_blocking;
use crate::api::state::AppState;
use crate::export;

/// Download file name
pub const EXPORT_FILENAME: &str = "poi_export.csv";

/// Encoded chunks buffered between the scan and the socket
const CHANNEL_CAPACITY: usize = 4;

/// GET /api/v1/pois/export/csv
pub async fn export_csv(
    State(state): State<Arc<AppState>>,
    Query(filters): Query<FilterParams>,
) -> ApiResult<Response> {
    let predicate = filters.to_predicate();
    let chunk_size = state.export.chunk_size;
    let engine = Arc::clone(&state.engine);

    // A store that cannot answer fails the request before any bytes are sent
    {
        let engine = Arc::clone(&engine);
        run_blocking(move || engine.store().len()).await?;
    }

    let header_line = export::header_bytes()?;
    let (tx, rx) = mpsc::channel::<Result<Vec<u8>, io::Error>>(CHANNEL_CAPACITY);

    tokio::task::spawn_blocking(move || {
        let result = export::project_chunks(&engine, &predicate, chunk_size, &mut |chunk| {
            let encoded = export::encode_rows(&chunk).map_err(|e| io::Error::other(e.to_string()));
            let failed = encoded.is_err();
            if tx.blocking_send(encoded).is_err() || failed {
                // Receiver gone (client disconnected) or encoding failed
                return ControlFlow::Break(());
            }
            ControlFlow::Continue(())
        });

        match result {
            Ok(rows) => tracing::info!(rows, "CSV export streamed"),
            Err(e) => {
                tracing::error!(error = %e, "CSV export aborted");
                let _ = tx.blocking_send(Err(io::Error::other(e.to_string())));
            }
        }
    });

    let rows = stream::unfold(rx, |mut rx| async move {
        rx.recv().await.map(|item| (item, rx))
    });
    let body = stream::once(async move { Ok::<_, io::Error>(header_line) }).chain(rows);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}", EXPORT_FILENAME),
            ),
        ],
        Body::from_stream(body),
    )
        .into_response())
}
