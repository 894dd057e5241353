//! `GET /tunnel?id=…` — redeem a minted handle and stream the bytes.

use axum::body::Body;
use axum::extract::{Query, State};
use axum::http::{HeaderMap, Response, StatusCode, header};
use axum::response::IntoResponse;
use serde::Deserialize;
use tracing::{debug, warn};
use uuid::Uuid;

use sluice_plan::PlanKind;
use sluice_tunnel::StreamError;

use crate::api::server::AppState;

#[derive(Debug, Deserialize)]
pub struct TunnelQuery {
    id: Uuid,
}

pub async fn tunnel(
    State(state): State<AppState>,
    Query(query): Query<TunnelQuery>,
    headers: HeaderMap,
) -> axum::response::Response {
    // One-shot: a second request for the same id finds nothing.
    let Some(plan) = state.store.take(&query.id) else {
        debug!(id = %query.id, "tunnel id unknown, expired or already redeemed");
        return StatusCode::NOT_FOUND.into_response();
    };

    // Only the direct-proxy path is seekable; everything else is produced
    // front to back.
    let range = matches!(plan.kind, PlanKind::DirectProxy)
        .then(|| {
            headers
                .get(header::RANGE)
                .and_then(|v| v.to_str().ok())
                .map(str::to_owned)
        })
        .flatten();

    let filename = plan.filename.clone();
    let handle = match state.runner.open(plan, range).await {
        Ok(handle) => handle,
        Err(err) => {
            warn!(id = %query.id, error = %err, "tunnel failed to start");
            let status = match err {
                StreamError::UpstreamStatus { .. } | StreamError::Network { .. } => {
                    StatusCode::BAD_GATEWAY
                }
                _ => StatusCode::INTERNAL_SERVER_ERROR,
            };
            return status.into_response();
        }
    };

    let info = handle.info.clone();
    let mut response = Response::builder()
        .status(info.status)
        .header(
            header::CONTENT_TYPE,
            info.content_type
                .as_deref()
                .unwrap_or("application/octet-stream"),
        )
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename.replace('"', "")),
        );
    if let Some(length) = info.content_length {
        response = response.header(header::CONTENT_LENGTH, length);
    }
    if let Some(estimated) = info.estimated_length {
        response = response.header("estimated-content-length", estimated);
    }
    if info.accept_ranges {
        response = response.header(header::ACCEPT_RANGES, "bytes");
    }

    match response.body(Body::from_stream(handle.into_stream())) {
        Ok(response) => response.into_response(),
        Err(err) => {
            warn!(id = %query.id, error = %err, "failed to build tunnel response");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
