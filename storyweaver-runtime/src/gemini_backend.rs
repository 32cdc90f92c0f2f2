use std::collections::VecDeque;

use anyhow::{Context, anyhow};
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use storyweaver_engine::traits::{
    FetchedBinary, FragmentStream, GeneratedImage, ImageProvider, ImageSpec, OperationHandle,
    OperationStatus, TextProvider, VideoProvider,
};
use storyweaver_providers::gemini::{
    GeminiConfig, ImageRequestOptions, build_download_request, build_generate_content_request,
    build_generate_images_request, build_poll_operation_request, build_stream_generate_request,
    build_submit_video_request,
};
use storyweaver_providers::parse::{
    VideoOperation, parse_generate_content, parse_image_predictions, parse_stream_fragment,
    parse_video_operation,
};
use storyweaver_providers::request::HttpRequest;
use storyweaver_providers::runtime::{HttpResponse, HttpRuntime, collect_body};
use storyweaver_providers::sse::SseDecoder;

/// Text, image and video generation against the Gemini REST API.
#[derive(Clone)]
pub struct GeminiBackend {
    http: HttpRuntime,
    cfg: GeminiConfig,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("base_url", &self.cfg.base_url)
            .field("api_key", &"[REDACTED]")
            .finish()
    }
}

impl GeminiBackend {
    pub fn new(http: HttpRuntime, cfg: GeminiConfig) -> Self {
        Self { http, cfg }
    }

    async fn call(&self, what: &str, req: &HttpRequest) -> anyhow::Result<HttpResponse> {
        log::debug!("gemini {what}: {req:?}");
        let resp = self.http.execute(req).await.with_context(|| format!("{what} request"))?;
        if !resp.is_success() {
            return Err(anyhow!("{what} failed: {}", resp.describe_failure()));
        }
        Ok(resp)
    }
}

fn operation_status(op: VideoOperation) -> OperationStatus {
    OperationStatus {
        handle: OperationHandle(op.name),
        done: op.done,
        download_uri: op.video_uri,
        error: op.error,
    }
}

struct SseFragments {
    body: BoxStream<'static, anyhow::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
    finished: bool,
}

// Turns an SSE body into text fragments. The first error ends the stream.
fn fragment_stream(body: BoxStream<'static, anyhow::Result<Vec<u8>>>) -> FragmentStream {
    let state = SseFragments {
        body,
        decoder: SseDecoder::new(),
        pending: VecDeque::new(),
        finished: false,
    };

    futures_util::stream::unfold(state, |mut st| async move {
        loop {
            if let Some(payload) = st.pending.pop_front() {
                match parse_stream_fragment(&payload) {
                    Ok(Some(text)) => return Some((Ok(text), st)),
                    Ok(None) => continue,
                    Err(e) => {
                        st.finished = true;
                        st.pending.clear();
                        return Some((Err(e), st));
                    }
                }
            }
            if st.finished {
                return None;
            }
            match st.body.next().await {
                Some(Ok(chunk)) => {
                    let events = st.decoder.push(&chunk);
                    st.pending.extend(events);
                }
                Some(Err(e)) => {
                    st.finished = true;
                    return Some((Err(e), st));
                }
                None => {
                    st.finished = true;
                    let tail = st.decoder.finish();
                    st.pending.extend(tail);
                }
            }
        }
    })
    .boxed()
}

#[async_trait::async_trait]
impl TextProvider for GeminiBackend {
    async fn stream_text(&self, model: &str, prompt: &str) -> anyhow::Result<FragmentStream> {
        let req = build_stream_generate_request(&self.cfg, model, prompt);
        let resp = self
            .http
            .execute_streaming(&req)
            .await
            .context("streamGenerateContent request")?;

        if !(200..=299).contains(&resp.status) {
            let status = resp.status;
            let body = collect_body(resp).await;
            let failed = HttpResponse {
                status,
                content_type: None,
                body,
            };
            return Err(anyhow!("streamGenerateContent failed: {}", failed.describe_failure()));
        }

        Ok(fragment_stream(resp.body))
    }

    async fn generate_text(&self, model: &str, prompt: &str) -> anyhow::Result<String> {
        let req = build_generate_content_request(&self.cfg, model, prompt);
        let resp = self.call("generateContent", &req).await?;
        parse_generate_content(&resp.body)
    }
}

#[async_trait::async_trait]
impl ImageProvider for GeminiBackend {
    async fn generate_images(
        &self,
        model: &str,
        prompt: &str,
        spec: &ImageSpec,
    ) -> anyhow::Result<Vec<GeneratedImage>> {
        let opts = ImageRequestOptions {
            count: spec.count,
            mime_type: spec.mime_type.clone(),
            aspect_ratio: spec.aspect_ratio.clone(),
        };
        let req = build_generate_images_request(&self.cfg, model, prompt, &opts);
        let resp = self.call("predict", &req).await?;

        let images = parse_image_predictions(&resp.body, &spec.mime_type)?
            .into_iter()
            .map(|img| GeneratedImage {
                mime_type: img.mime_type,
                data_base64: img.data_base64,
            })
            .collect();
        Ok(images)
    }
}

#[async_trait::async_trait]
impl VideoProvider for GeminiBackend {
    async fn submit_video_job(
        &self,
        model: &str,
        prompt: &str,
        clip_count: u32,
    ) -> anyhow::Result<OperationStatus> {
        let req = build_submit_video_request(&self.cfg, model, prompt, clip_count);
        let resp = self.call("predictLongRunning", &req).await?;
        Ok(operation_status(parse_video_operation(&resp.body)?))
    }

    async fn poll_video_job(&self, handle: &OperationHandle) -> anyhow::Result<OperationStatus> {
        let req = build_poll_operation_request(&self.cfg, handle.as_str());
        let resp = self.call("operations.get", &req).await?;
        Ok(operation_status(parse_video_operation(&resp.body)?))
    }

    async fn fetch_binary(&self, uri: &str) -> anyhow::Result<FetchedBinary> {
        let req = build_download_request(&self.cfg, uri)?;
        let resp = self.http.execute(&req).await.context("video download request")?;
        Ok(FetchedBinary {
            status: resp.status,
            content_type: resp.content_type,
            bytes: resp.body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunked(parts: &[&str]) -> BoxStream<'static, anyhow::Result<Vec<u8>>> {
        let items: Vec<anyhow::Result<Vec<u8>>> =
            parts.iter().map(|p| Ok(p.as_bytes().to_vec())).collect();
        futures_util::stream::iter(items).boxed()
    }

    async fn collect(stream: FragmentStream) -> Vec<Result<String, String>> {
        stream
            .map(|r| r.map_err(|e| e.to_string()))
            .collect()
            .await
    }

    #[tokio::test]
    async fn fragments_survive_arbitrary_chunking() {
        let body = chunked(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"The st",
            "orm\"}]}}]}\n\ndata: {\"usageMetadata\":{}}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\" came.\"}]}}]}",
        ]);
        let out = collect(fragment_stream(body)).await;
        assert_eq!(out, vec![Ok("The storm".to_string()), Ok(" came.".to_string())]);
    }

    #[tokio::test]
    async fn error_payload_ends_the_stream() {
        let body = chunked(&[
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"Once\"}]}}]}\n\n",
            "data: {\"error\":{\"code\":500,\"message\":\"overloaded\"}}\n\n",
            "data: {\"candidates\":[{\"content\":{\"parts\":[{\"text\":\"never\"}]}}]}\n\n",
        ]);
        let out = collect(fragment_stream(body)).await;
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], Ok("Once".to_string()));
        assert!(out[1].as_ref().unwrap_err().contains("overloaded"));
    }

    #[test]
    fn debug_hides_key() {
        let backend = GeminiBackend::new(
            HttpRuntime::new(Default::default()).unwrap(),
            GeminiConfig {
                base_url: "https://example.com".into(),
                api_key: "secret-key".into(),
            },
        );
        let s = format!("{backend:?}");
        assert!(!s.contains("secret-key"));
    }
}
