//! Direct proxying of upstream bytes, unchanged.
//!
//! The only delivery path that honors Range requests: the client's range is
//! forwarded verbatim and the upstream's answer is relayed as-is.

use futures::StreamExt;
use reqwest::header::{ACCEPT_RANGES, RANGE};
use reqwest::{Client, Response, StatusCode};
use tokio_util::sync::CancellationToken;

use crate::error::StreamError;
use crate::ffmpeg::InputSource;
use crate::http::header_map;
use crate::runner::ByteSink;

/// Issue the upstream GET and fail fast on a non-success status.
pub(crate) async fn open_upstream(
    client: &Client,
    input: &InputSource,
    range: Option<&str>,
) -> Result<Response, StreamError> {
    let mut request = client
        .get(&input.location)
        .headers(header_map(&input.headers));
    if let Some(range) = range {
        request = request.header(RANGE, range);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(StreamError::UpstreamStatus {
            status: status.as_u16(),
            url: input.location.clone(),
        });
    }
    Ok(response)
}

pub(crate) fn supports_ranges(response: &Response) -> bool {
    response.status() == StatusCode::PARTIAL_CONTENT
        || response
            .headers()
            .get(ACCEPT_RANGES)
            .is_some_and(|v| v == "bytes")
}

/// Relay the response body into the sink until it ends, the deadline fires,
/// the consumer goes away, or the operation is cancelled.
pub(crate) async fn forward(
    response: Response,
    deadline: tokio::time::Instant,
    sink: &ByteSink,
    cancel: &CancellationToken,
) -> Result<(), StreamError> {
    let mut stream = response.bytes_stream();
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(StreamError::Cancelled),
            _ = tokio::time::sleep_until(deadline) => return Err(StreamError::DeadlineExceeded),
            _ = sink.closed() => return Err(StreamError::ClientGone),
            chunk = stream.next() => match chunk {
                Some(Ok(bytes)) => {
                    if sink.send(Ok(bytes)).await.is_err() {
                        return Err(StreamError::ClientGone);
                    }
                }
                Some(Err(err)) => return Err(err.into()),
                None => return Ok(()),
            },
        }
    }
}
