use futures_util::StreamExt;
use serde_json::Value;

/// Reads the full response body, returning the bytes and their count.
pub(super) async fn drain_response_body(
    response: reqwest::Response,
) -> Result<(Vec<u8>, u64), reqwest::Error> {
    let mut stream = response.bytes_stream();
    let mut body = Vec::new();
    let mut total_bytes: u64 = 0;
    while let Some(chunk) = stream.next().await {
        let bytes = chunk?;
        total_bytes = total_bytes.saturating_add(u64::try_from(bytes.len()).unwrap_or(u64::MAX));
        body.extend_from_slice(&bytes);
    }
    Ok((body, total_bytes))
}

/// JSON when the content type says so and it parses, raw text otherwise.
pub(super) fn parse_body(content_type: Option<&str>, bytes: &[u8]) -> Value {
    let is_json = content_type.is_some_and(|value| value.to_ascii_lowercase().contains("json"));
    if is_json && let Ok(parsed) = serde_json::from_slice(bytes) {
        return parsed;
    }
    Value::String(String::from_utf8_lossy(bytes).into_owned())
}
