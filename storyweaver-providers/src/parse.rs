use anyhow::{Context, anyhow};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    code: Option<i64>,
    #[serde(default)]
    message: Option<String>,
}

impl ApiError {
    fn describe(&self) -> String {
        format!(
            "backend error (code={}): {}",
            self.code.map(|c| c.to_string()).unwrap_or_else(|| "?".into()),
            self.message.as_deref().unwrap_or("no message")
        )
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    #[serde(default)]
    text: Option<String>,
}

fn candidate_text(resp: GenerateContentResponse) -> anyhow::Result<Option<String>> {
    if let Some(err) = resp.error {
        return Err(anyhow!(err.describe()));
    }
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    Ok((!text.is_empty()).then_some(text))
}

/// Text of one streamed event. `None` for events without text (e.g. usage-only chunks).
pub fn parse_stream_fragment(payload: &str) -> anyhow::Result<Option<String>> {
    let resp: GenerateContentResponse =
        serde_json::from_str(payload).context("decode stream event JSON")?;
    candidate_text(resp)
}

pub fn parse_generate_content(body: &[u8]) -> anyhow::Result<String> {
    let resp: GenerateContentResponse =
        serde_json::from_slice(body).context("decode generateContent JSON")?;
    candidate_text(resp)?.ok_or_else(|| anyhow!("no text in generateContent response"))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub mime_type: String,
    pub data_base64: String,
}

#[derive(Debug, Deserialize)]
struct PredictResponse {
    #[serde(default)]
    predictions: Vec<Prediction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Prediction {
    #[serde(default)]
    bytes_base64_encoded: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

/// Images of a predict response, in order. Filtered entries (no bytes) are skipped.
pub fn parse_image_predictions(body: &[u8], fallback_mime: &str) -> anyhow::Result<Vec<EncodedImage>> {
    let resp: PredictResponse = serde_json::from_slice(body).context("decode predict JSON")?;
    Ok(resp
        .predictions
        .into_iter()
        .filter_map(|p| {
            let data = p.bytes_base64_encoded.filter(|d| !d.is_empty())?;
            Some(EncodedImage {
                mime_type: p.mime_type.unwrap_or_else(|| fallback_mime.to_string()),
                data_base64: data,
            })
        })
        .collect())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoOperation {
    pub name: String,
    pub done: bool,
    pub video_uri: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OperationResponse {
    name: String,
    #[serde(default)]
    done: bool,
    #[serde(default)]
    response: Option<OperationResult>,
    #[serde(default)]
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OperationResult {
    #[serde(default)]
    generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateVideoResponse {
    #[serde(default)]
    generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Deserialize)]
struct GeneratedSample {
    #[serde(default)]
    video: Option<VideoRef>,
}

#[derive(Debug, Deserialize)]
struct VideoRef {
    #[serde(default)]
    uri: Option<String>,
}

pub fn parse_video_operation(body: &[u8]) -> anyhow::Result<VideoOperation> {
    let resp: OperationResponse = serde_json::from_slice(body).context("decode operation JSON")?;
    let video_uri = resp
        .response
        .and_then(|r| r.generate_video_response)
        .and_then(|r| r.generated_samples.into_iter().next())
        .and_then(|s| s.video)
        .and_then(|v| v.uri)
        .filter(|u| !u.trim().is_empty());

    Ok(VideoOperation {
        name: resp.name,
        done: resp.done,
        video_uri,
        error: resp.error.map(|e| e.describe()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_generate_content_text() {
        let body = br#"{"candidates":[{"content":{"parts":[{"text":"Hel"},{"text":"lo"}]}}]}"#;
        assert_eq!(parse_generate_content(body).unwrap(), "Hello");
    }

    #[test]
    fn generate_content_without_text_errors() {
        assert!(parse_generate_content(br#"{"candidates":[]}"#).is_err());
        assert!(parse_generate_content(br#"{"error":{"code":429,"message":"quota"}}"#).is_err());
    }

    #[test]
    fn stream_fragment_skips_textless_events() {
        let with_text = r#"{"candidates":[{"content":{"parts":[{"text":"The storm"}]}}]}"#;
        assert_eq!(parse_stream_fragment(with_text).unwrap().as_deref(), Some("The storm"));

        let usage_only = r#"{"usageMetadata":{"totalTokenCount":12}}"#;
        assert_eq!(parse_stream_fragment(usage_only).unwrap(), None);

        let err = parse_stream_fragment(r#"{"error":{"code":500,"message":"boom"}}"#).unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[test]
    fn image_predictions_keep_order_and_skip_filtered() {
        let body = br#"{"predictions":[
            {"bytesBase64Encoded":"QQ==","mimeType":"image/jpeg"},
            {"raiFilteredReason":"unsafe"},
            {"bytesBase64Encoded":"Qg=="}
        ]}"#;
        let images = parse_image_predictions(body, "image/jpeg").unwrap();
        assert_eq!(images.len(), 2);
        assert_eq!(images[0].data_base64, "QQ==");
        assert_eq!(images[1].mime_type, "image/jpeg");

        assert!(parse_image_predictions(b"{}", "image/jpeg").unwrap().is_empty());
    }

    #[test]
    fn pending_operation_has_no_uri() {
        let op = parse_video_operation(br#"{"name":"models/veo/operations/1"}"#).unwrap();
        assert_eq!(op.name, "models/veo/operations/1");
        assert!(!op.done);
        assert!(op.video_uri.is_none());
    }

    #[test]
    fn finished_operation_exposes_download_uri() {
        let body = br#"{"name":"op","done":true,"response":{"generateVideoResponse":{"generatedSamples":[{"video":{"uri":"https://files/v:download?alt=media"}}]}}}"#;
        let op = parse_video_operation(body).unwrap();
        assert!(op.done);
        assert_eq!(op.video_uri.as_deref(), Some("https://files/v:download?alt=media"));
        assert!(op.error.is_none());
    }

    #[test]
    fn failed_operation_reports_error() {
        let body = br#"{"name":"op","done":true,"error":{"code":3,"message":"prompt rejected"}}"#;
        let op = parse_video_operation(body).unwrap();
        assert!(op.done);
        assert!(op.error.unwrap().contains("prompt rejected"));
    }
}
