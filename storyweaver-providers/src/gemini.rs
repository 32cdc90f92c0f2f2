//! Request builders for the Gemini API family (Gemini text, Imagen images, Veo video).

use crate::request::HttpRequest;
use serde_json::json;

pub const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Clone, PartialEq, Eq)]
pub struct GeminiConfig {
    pub base_url: String,
    pub api_key: String,
}

impl std::fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRequestOptions {
    pub count: u32,
    pub mime_type: String,
    pub aspect_ratio: String,
}

fn text_contents(prompt: &str) -> serde_json::Value {
    json!({
        "contents": [
            { "role": "user", "parts": [ { "text": prompt } ] }
        ]
    })
}

pub fn build_stream_generate_request(cfg: &GeminiConfig, model: &str, prompt: &str) -> HttpRequest {
    let url = join_url(
        &cfg.base_url,
        &format!("models/{model}:streamGenerateContent?alt=sse"),
    );
    HttpRequest::post_json(url, &text_contents(prompt))
        .with_header("Accept", "text/event-stream")
        .with_header(API_KEY_HEADER, cfg.api_key.clone())
}

pub fn build_generate_content_request(cfg: &GeminiConfig, model: &str, prompt: &str) -> HttpRequest {
    let url = join_url(&cfg.base_url, &format!("models/{model}:generateContent"));
    HttpRequest::post_json(url, &text_contents(prompt))
        .with_header(API_KEY_HEADER, cfg.api_key.clone())
}

pub fn build_generate_images_request(
    cfg: &GeminiConfig,
    model: &str,
    prompt: &str,
    opts: &ImageRequestOptions,
) -> HttpRequest {
    let url = join_url(&cfg.base_url, &format!("models/{model}:predict"));
    let payload = json!({
        "instances": [ { "prompt": prompt } ],
        "parameters": {
            "sampleCount": opts.count,
            "aspectRatio": opts.aspect_ratio,
            "outputOptions": { "mimeType": opts.mime_type },
        }
    });
    HttpRequest::post_json(url, &payload).with_header(API_KEY_HEADER, cfg.api_key.clone())
}

pub fn build_submit_video_request(
    cfg: &GeminiConfig,
    model: &str,
    prompt: &str,
    clip_count: u32,
) -> HttpRequest {
    let url = join_url(&cfg.base_url, &format!("models/{model}:predictLongRunning"));
    let payload = json!({
        "instances": [ { "prompt": prompt } ],
        "parameters": { "sampleCount": clip_count }
    });
    HttpRequest::post_json(url, &payload).with_header(API_KEY_HEADER, cfg.api_key.clone())
}

/// `operation_name` is the backend-issued handle, e.g. `models/veo/operations/abc`.
pub fn build_poll_operation_request(cfg: &GeminiConfig, operation_name: &str) -> HttpRequest {
    HttpRequest::get(join_url(&cfg.base_url, operation_name))
        .with_header(API_KEY_HEADER, cfg.api_key.clone())
}

/// Download links are fetched with the key in the query string.
pub fn build_download_request(cfg: &GeminiConfig, uri: &str) -> anyhow::Result<HttpRequest> {
    let mut url = url::Url::parse(uri)
        .map_err(|e| anyhow::anyhow!("invalid download uri: {e}"))?;
    url.query_pairs_mut().append_pair("key", &cfg.api_key);
    Ok(HttpRequest::get(url.to_string()))
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Body;

    fn cfg() -> GeminiConfig {
        GeminiConfig {
            base_url: "https://api.example.com/v1beta/".into(),
            api_key: "k".into(),
        }
    }

    fn json_body(req: &HttpRequest) -> serde_json::Value {
        match &req.body {
            Body::Json(s) => serde_json::from_str(s).unwrap(),
            Body::Empty => panic!("expected json"),
        }
    }

    #[test]
    fn join_url_handles_trailing_slash() {
        assert_eq!(
            join_url("https://api.example.com/", "/models/m:predict"),
            "https://api.example.com/models/m:predict"
        );
        assert_eq!(
            join_url("https://api.example.com", "models/m:predict"),
            "https://api.example.com/models/m:predict"
        );
    }

    #[test]
    fn stream_request_asks_for_sse() {
        let req = build_stream_generate_request(&cfg(), "gemini-2.5-flash", "hi");
        assert_eq!(req.method, "POST");
        assert_eq!(
            req.url,
            "https://api.example.com/v1beta/models/gemini-2.5-flash:streamGenerateContent?alt=sse"
        );
        assert_eq!(req.header(API_KEY_HEADER), Some("k"));
        assert_eq!(json_body(&req)["contents"][0]["parts"][0]["text"], "hi");
    }

    #[test]
    fn image_request_carries_batch_options() {
        let opts = ImageRequestOptions {
            count: 4,
            mime_type: "image/jpeg".into(),
            aspect_ratio: "16:9".into(),
        };
        let req = build_generate_images_request(&cfg(), "imagen", "p", &opts);
        assert!(req.url.ends_with("/models/imagen:predict"));
        let body = json_body(&req);
        assert_eq!(body["parameters"]["sampleCount"], 4);
        assert_eq!(body["parameters"]["aspectRatio"], "16:9");
        assert_eq!(body["parameters"]["outputOptions"]["mimeType"], "image/jpeg");
    }

    #[test]
    fn video_requests_target_long_running_endpoints() {
        let submit = build_submit_video_request(&cfg(), "veo", "p", 1);
        assert!(submit.url.ends_with("/models/veo:predictLongRunning"));
        assert_eq!(json_body(&submit)["parameters"]["sampleCount"], 1);

        let poll = build_poll_operation_request(&cfg(), "models/veo/operations/abc");
        assert_eq!(poll.method, "GET");
        assert_eq!(poll.url, "https://api.example.com/v1beta/models/veo/operations/abc");
    }

    #[test]
    fn download_appends_key_with_correct_separator() {
        let with_query =
            build_download_request(&cfg(), "https://files.example.com/v:download?alt=media").unwrap();
        assert_eq!(with_query.url, "https://files.example.com/v:download?alt=media&key=k");

        let bare = build_download_request(&cfg(), "https://files.example.com/v").unwrap();
        assert_eq!(bare.url, "https://files.example.com/v?key=k");
        assert!(bare.header(API_KEY_HEADER).is_none());

        assert!(build_download_request(&cfg(), "not a uri").is_err());
    }

    #[test]
    fn config_debug_hides_key() {
        let s = format!("{:?}", cfg());
        assert!(s.contains("[REDACTED]"));
        assert!(!s.contains("\"k\""));
    }
}
