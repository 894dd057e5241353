//! `POST /` — resolve a link and answer with a delivery decision.

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use tracing::{debug, error};

use sluice_plan::{ErrorCode, ResolveError, builder};

use crate::api::models::{ApiResponse, DownloadRequest, encode_plan};
use crate::api::server::AppState;
use crate::resolver::validate_link;

pub async fn resolve(
    State(state): State<AppState>,
    body: Result<Json<DownloadRequest>, JsonRejection>,
) -> (StatusCode, Json<ApiResponse>) {
    let Ok(Json(request)) = body else {
        return error_response(ResolveError::new(ErrorCode::LinkInvalid));
    };

    let url = match validate_link(&request.url) {
        Ok(url) => url,
        Err(err) => return error_response(err),
    };

    let record = match state.resolver.resolve(&url).await {
        Ok(record) => record,
        Err(err) => {
            if err.critical {
                error!(%url, code = %err.code, "critical resolver failure");
            }
            return error_response(err);
        }
    };

    let plan = builder::build(&record, &request.options, &state.defaults);
    debug!(%url, service = %record.service, kind = ?plan.kind, "plan built");

    let response = encode_plan(plan, request.options.always_proxy, &state.config, &state.store);
    let status = if response.is_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::OK
    };
    (status, Json(response))
}

fn error_response(error: ResolveError) -> (StatusCode, Json<ApiResponse>) {
    (StatusCode::BAD_REQUEST, Json(ApiResponse::error(error)))
}
