//! Small HTTP helpers shared by the proxy path and the temp file manager.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rustc_hash::FxHashMap;
use tracing::warn;

/// Convert plan headers into a reqwest header map. Entries that do not form
/// a valid header name/value pair are skipped rather than failing the whole
/// request.
pub fn header_map(headers: &FxHashMap<String, String>) -> HeaderMap {
    let mut map = HeaderMap::with_capacity(headers.len());
    for (name, value) in headers {
        match (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            (Ok(name), Ok(value)) => {
                map.insert(name, value);
            }
            _ => warn!(name, "skipping malformed upstream header"),
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_headers_convert_and_invalid_are_dropped() {
        let mut headers = FxHashMap::default();
        headers.insert("user-agent".to_string(), "sluice/0.1".to_string());
        headers.insert("cookie".to_string(), "a=b".to_string());
        headers.insert("bad name".to_string(), "x".to_string());
        headers.insert("x-bad-value".to_string(), "line\nbreak".to_string());

        let map = header_map(&headers);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("user-agent").unwrap(), "sluice/0.1");
        assert_eq!(map.get("cookie").unwrap(), "a=b");
    }
}
