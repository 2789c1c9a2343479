use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::config::endpoint;
use crate::core::model::{BackendReply, DownloadReply, DownloadRequest, ServiceStatus};
use crate::plugins::registry::{BackendContext, BackendError, DownloadBackend};

const DOWNLOAD_PATH: &str = "api/download";
const STATUS_PATH: &str = "api/status";

pub struct HttpBackend {
    client: reqwest::Client,
    download_url: Url,
    status_url: Url,
}

impl HttpBackend {
    pub fn new(base_url: Url, ctx: BackendContext) -> anyhow::Result<Self> {
        let headers = Self::build_headers(&ctx)?;
        let mut builder = reqwest::Client::builder()
            .user_agent(ctx.user_agent.clone())
            .default_headers(headers);
        if let Some(secs) = ctx.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            download_url: endpoint(&base_url, DOWNLOAD_PATH)?,
            status_url: endpoint(&base_url, STATUS_PATH)?,
        })
    }

    fn build_headers(ctx: &BackendContext) -> Result<HeaderMap, BackendError> {
        let mut h = HeaderMap::new();
        h.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (k, v) in &ctx.headers {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|e| BackendError::InvalidHeader(format!("{k}: {e}")))?;
            let value = HeaderValue::from_str(v)
                .map_err(|e| BackendError::InvalidHeader(format!("{k}: {e}")))?;
            h.insert(name, value);
        }
        Ok(h)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(resp: reqwest::Response) -> Result<T, BackendError> {
        let body = resp
            .bytes()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        serde_json::from_slice(&body).map_err(|e| BackendError::Decode(e.to_string()))
    }
}

#[async_trait]
impl DownloadBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    async fn submit(&self, req: &DownloadRequest) -> Result<BackendReply, BackendError> {
        debug!(url = %self.download_url, "POST download request");

        // `.json()` sets Content-Type: application/json
        let resp = self
            .client
            .post(self.download_url.clone())
            .json(req)
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;

        let http_status = resp.status().as_u16();
        // Parsed regardless of status: failures carry `error` in the body too.
        let body: DownloadReply = Self::read_json(resp).await?;
        debug!(http_status, success = body.success, "download reply");
        Ok(BackendReply { http_status, body })
    }

    async fn service_status(&self) -> Result<ServiceStatus, BackendError> {
        let resp = self
            .client
            .get(self.status_url.clone())
            .send()
            .await
            .map_err(|e| BackendError::Transport(e.to_string()))?;
        Self::read_json(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::model::{AudioFormat, Resolution, VideoFormat};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serves exactly one canned HTTP response and hands back the raw request.
    async fn serve_once(status_line: &'static str, body: &'static str) -> (Url, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 1024];
            loop {
                let n = sock.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf).to_string();
                if let Some(head_end) = text.find("\r\n\r\n") {
                    let content_length = text[..head_end]
                        .lines()
                        .find_map(|l| {
                            let (k, v) = l.split_once(':')?;
                            k.eq_ignore_ascii_case("content-length").then(|| v.trim().parse::<usize>().ok())?
                        })
                        .unwrap_or(0);
                    if buf.len() >= head_end + 4 + content_length {
                        break;
                    }
                }
            }
            let resp = format!(
                "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            sock.write_all(resp.as_bytes()).await.unwrap();
            sock.shutdown().await.unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });
        (Url::parse(&format!("http://{addr}/")).unwrap(), handle)
    }

    fn sample_request() -> DownloadRequest {
        DownloadRequest {
            url: "https://www.youtube.com/watch?v=xyz".to_string(),
            resolution: Resolution::P480,
            format: VideoFormat::Webm,
            audio_only: false,
            audio_format: AudioFormat::M4a,
        }
    }

    #[tokio::test]
    async fn posts_json_to_download_endpoint() {
        let (base, server) = serve_once("200 OK", r#"{"success":true,"message":"Download completed successfully!"}"#).await;
        let mut ctx = BackendContext::default();
        ctx.headers.insert("X-Trace".to_string(), "t1".to_string());
        let backend = HttpBackend::new(base, ctx).unwrap();

        let reply = backend.submit(&sample_request()).await.unwrap();
        assert_eq!(reply.http_status, 200);
        assert!(reply.body.success);

        let raw = server.await.unwrap();
        let lower = raw.to_ascii_lowercase();
        assert!(raw.starts_with("POST /api/download HTTP/1.1"));
        assert!(lower.contains("content-type: application/json"));
        assert!(lower.contains("x-trace: t1"));

        let body = &raw[raw.find("\r\n\r\n").unwrap() + 4..];
        let sent: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(
            sent,
            serde_json::json!({
                "url": "https://www.youtube.com/watch?v=xyz",
                "resolution": "480p",
                "format": "webm",
                "audioOnly": false,
                "audioFormat": "m4a",
            })
        );
    }

    #[tokio::test]
    async fn error_status_still_parses_body() {
        let (base, _server) = serve_once("400 Bad Request", r#"{"success":false,"error":"Download failed: boom"}"#).await;
        let backend = HttpBackend::new(base, BackendContext::default()).unwrap();
        let reply = backend.submit(&sample_request()).await.unwrap();
        assert_eq!(reply.http_status, 400);
        assert!(!reply.transport_ok());
        assert_eq!(reply.body.error.as_deref(), Some("Download failed: boom"));
    }

    #[tokio::test]
    async fn non_json_body_is_decode_error() {
        let (base, _server) = serve_once("200 OK", "<html>oops</html>").await;
        let backend = HttpBackend::new(base, BackendContext::default()).unwrap();
        let err = backend.submit(&sample_request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn empty_body_is_decode_error() {
        let (base, _server) = serve_once("200 OK", "").await;
        let backend = HttpBackend::new(base, BackendContext::default()).unwrap();
        let err = backend.submit(&sample_request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Decode(_)));
    }

    #[tokio::test]
    async fn refused_connection_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let base = Url::parse(&format!("http://{addr}/")).unwrap();
        let backend = HttpBackend::new(base, BackendContext::default()).unwrap();
        let err = backend.submit(&sample_request()).await.unwrap_err();
        assert!(matches!(err, BackendError::Transport(_)));
    }

    #[tokio::test]
    async fn status_endpoint() {
        let (base, server) = serve_once("200 OK", r#"{"status":"YouTube Downloader API is running"}"#).await;
        let backend = HttpBackend::new(base, BackendContext::default()).unwrap();
        let st = backend.service_status().await.unwrap();
        assert_eq!(st.status, "YouTube Downloader API is running");
        assert!(server.await.unwrap().starts_with("GET /api/status HTTP/1.1"));
    }

    #[test]
    fn bad_header_name_fails_construction() {
        let mut ctx = BackendContext::default();
        ctx.headers.insert("bad header".to_string(), "v".to_string());
        let base = Url::parse("http://localhost:5000/").unwrap();
        assert!(HttpBackend::new(base, ctx).is_err());
    }
}
