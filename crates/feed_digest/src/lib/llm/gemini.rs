use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use reqwest::{Client, Response};
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;

use crate::{
    extract::{ExtractedContent, ScratchFile},
    llm::prompt::PromptTemplate,
    Summarizer, SummaryResponse,
};

pub struct GeminiClient {
    client: Client,
    api_key: Option<String>,
    model: String,
    base_url: String,
    upload_url: String,
    prompt_path: PathBuf,
}

#[derive(Debug, thiserror::Error)]
pub enum GeminiError {
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },
    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
    #[error("Failed to read prompt template {path:?}: {source}")]
    Prompt {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Upload session did not return an upload url")]
    MissingUploadUrl,
    #[error("Uploaded file {name} never became active (state: {state})")]
    FileNotActive { name: String, state: String },
    #[error("No content in response")]
    EmptyResponse,
}

impl GeminiClient {
    const BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
    const UPLOAD_URL: &str = "https://generativelanguage.googleapis.com/upload/v1beta";
    const TIMEOUT: Duration = Duration::from_secs(300);
    const FILE_POLL_INTERVAL: Duration = Duration::from_secs(2);
    const FILE_POLL_ATTEMPTS: usize = 30;

    pub fn new(api_key: Option<String>, model: impl Into<String>) -> Result<Self, GeminiError> {
        let client = Client::builder().timeout(Self::TIMEOUT).build()?;

        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            model: model.into(),
            base_url: Self::BASE_URL.into(),
            upload_url: Self::UPLOAD_URL.into(),
            prompt_path: PathBuf::from("prompts/transcript.txt"),
        })
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_upload_url(mut self, url: impl Into<String>) -> Self {
        self.upload_url = url.into();
        self
    }

    pub fn with_prompt_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.prompt_path = path.into();
        self
    }

    fn api_key(&self) -> Result<&str, GeminiError> {
        self.api_key.as_deref().ok_or(GeminiError::MissingApiKey)
    }

    async fn ensure_success(resp: Response) -> Result<Response, GeminiError> {
        if resp.status().is_success() {
            return Ok(resp);
        }

        let status = resp.status().as_u16();
        let message = resp.text().await.unwrap_or_default();
        Err(GeminiError::Api { status, message })
    }

    pub async fn send_generate_request(
        &self,
        parts: Vec<Part<'_>>,
    ) -> Result<GenerateResponse, GeminiError> {
        let body = GenerateRequest {
            contents: vec![Content { parts }],
        };

        let resp = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", self.api_key()?)
            .json(&body)
            .send()
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Failed to make http request"))?;

        let resp = Self::ensure_success(resp).await?;
        Ok(resp.json::<GenerateResponse>().await?)
    }

    /// Uploads a local file through the resumable Files API, streaming it from disk
    #[tracing::instrument(skip(self))]
    pub async fn upload_file(
        &self,
        path: &Path,
        mime_type: &str,
    ) -> Result<UploadedFile, GeminiError> {
        let size = tokio::fs::metadata(path).await?.len();
        let display_name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("audio");

        let start = self
            .client
            .post(format!("{}/files", self.upload_url))
            .header("x-goog-api-key", self.api_key()?)
            .header("X-Goog-Upload-Protocol", "resumable")
            .header("X-Goog-Upload-Command", "start")
            .header("X-Goog-Upload-Header-Content-Length", size.to_string())
            .header("X-Goog-Upload-Header-Content-Type", mime_type)
            .json(&serde_json::json!({ "file": { "display_name": display_name } }))
            .send()
            .await?;
        let start = Self::ensure_success(start).await?;

        let session_url = start
            .headers()
            .get("x-goog-upload-url")
            .and_then(|v| v.to_str().ok())
            .map(String::from)
            .ok_or(GeminiError::MissingUploadUrl)?;

        let file = tokio::fs::File::open(path).await?;
        let resp = self
            .client
            .post(session_url)
            .header("Content-Length", size.to_string())
            .header("X-Goog-Upload-Offset", "0")
            .header("X-Goog-Upload-Command", "upload, finalize")
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)))
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;

        let uploaded = resp.json::<UploadResponse>().await?.file;
        tracing::info!(name = %uploaded.name, bytes = size, "Uploaded file");

        Ok(uploaded)
    }

    /// Audio needs server-side processing before it can be referenced in a prompt
    async fn wait_until_active(&self, file: &UploadedFile) -> Result<(), GeminiError> {
        let mut state = file.state.clone().unwrap_or_default();

        for _ in 0..Self::FILE_POLL_ATTEMPTS {
            match state.as_str() {
                "ACTIVE" => return Ok(()),
                "FAILED" => break,
                _ => tokio::time::sleep(Self::FILE_POLL_INTERVAL).await,
            }

            let resp = self
                .client
                .get(format!("{}/{}", self.base_url, file.name))
                .header("x-goog-api-key", self.api_key()?)
                .send()
                .await?;
            state = Self::ensure_success(resp)
                .await?
                .json::<UploadedFile>()
                .await?
                .state
                .unwrap_or_default();
        }

        Err(GeminiError::FileNotActive {
            name: file.name.clone(),
            state,
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn delete_file(&self, name: &str) -> Result<(), GeminiError> {
        let resp = self
            .client
            .delete(format!("{}/{}", self.base_url, name))
            .header("x-goog-api-key", self.api_key()?)
            .send()
            .await?;
        Self::ensure_success(resp).await?;

        tracing::info!(name, "Deleted uploaded file");
        Ok(())
    }

    pub async fn list_models(&self) -> Result<Vec<ModelInfo>, GeminiError> {
        let resp = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", self.api_key()?)
            .send()
            .await?;
        let resp = Self::ensure_success(resp).await?;

        Ok(resp.json::<ModelList>().await?.models)
    }

    /// Upload, generate, then delete the upload whatever the generation outcome
    async fn generate_from_audio(
        &self,
        prompt: &str,
        audio: &ScratchFile,
    ) -> Result<GenerateResponse, GeminiError> {
        let uploaded = self.upload_file(audio.path(), audio.mime_type()).await?;
        let mime_type = uploaded.mime_type.as_deref().unwrap_or(audio.mime_type());

        let result = match self.wait_until_active(&uploaded).await {
            Ok(()) => {
                self.send_generate_request(vec![
                    Part::text(prompt),
                    Part::file(mime_type, &uploaded.uri),
                ])
                .await
            }
            Err(e) => Err(e),
        };

        if let Err(e) = self.delete_file(&uploaded.name).await {
            tracing::warn!(error = %e, name = %uploaded.name, "Failed to delete uploaded file");
        }

        result
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Part<'a> {
    Text {
        text: &'a str,
    },
    File {
        #[serde(rename = "fileData")]
        file_data: FileData<'a>,
    },
}

impl<'a> Part<'a> {
    pub fn text(text: &'a str) -> Self {
        Part::Text { text }
    }

    pub fn file(mime_type: &'a str, file_uri: &'a str) -> Self {
        Part::File {
            file_data: FileData {
                mime_type,
                file_uri,
            },
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData<'a> {
    mime_type: &'a str,
    file_uri: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct GenerateResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
pub struct Candidate {
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

impl GenerateResponse {
    /// Concatenated text parts of the first candidate
    pub fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text = parts
            .iter()
            .filter_map(|p| p.text.as_deref())
            .collect::<String>();

        (!text.trim().is_empty()).then_some(text)
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    file: UploadedFile,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    /// Resource name, `files/<id>`
    pub name: String,
    pub uri: String,
    pub mime_type: Option<String>,
    pub state: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ModelList {
    #[serde(default)]
    models: Vec<ModelInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelInfo {
    pub name: String,
    pub display_name: Option<String>,
}

impl Summarizer for GeminiClient {
    type Error = GeminiError;

    #[tracing::instrument(skip_all, fields(model = %self.model, title = %title))]
    async fn summarize(
        &self,
        title: &str,
        content: &ExtractedContent,
    ) -> Result<SummaryResponse, Self::Error> {
        // checked up front so nothing is uploaded without a key
        self.api_key()
            .inspect_err(|e| tracing::error!(error = %e, "Cannot summarize"))?;

        let template = PromptTemplate::load(&self.prompt_path)
            .await
            .map_err(|source| GeminiError::Prompt {
                path: self.prompt_path.clone(),
                source,
            })?;

        let response = match content {
            ExtractedContent::Transcript(transcript) => {
                let prompt = template.render(title, Some(transcript));
                self.send_generate_request(vec![Part::text(&prompt)]).await
            }
            ExtractedContent::Audio(audio) => {
                let prompt = template.render(title, None);
                self.generate_from_audio(&prompt, audio).await
            }
        }
        .inspect_err(|e| tracing::error!(error = %e, "Failed to summarize content"))?;

        let summary = response.text().ok_or(GeminiError::EmptyResponse)?;
        Ok(SummaryResponse { summary })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::{Arc, Mutex};
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
    };

    /// Reads one request, draining its body, and returns `"METHOD /path"`
    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        let head_end = loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return String::new();
            }
            buf.extend_from_slice(&chunk[..n]);
            if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let headers = head.to_ascii_lowercase();
        let content_length = headers
            .lines()
            .find_map(|l| l.strip_prefix("content-length:"))
            .and_then(|v| v.trim().parse::<usize>().ok());
        let chunked = headers.contains("transfer-encoding: chunked");

        loop {
            let body = &buf[head_end..];
            let done = match content_length {
                Some(len) => body.len() >= len,
                None if chunked => body.ends_with(b"0\r\n\r\n"),
                None => true,
            };
            if done {
                break;
            }

            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
        }

        head.lines()
            .next()
            .and_then(|line| line.rsplit_once(' '))
            .map(|(request, _)| request.to_string())
            .unwrap_or_default()
    }

    /// Local stand-in for the Files and generateContent endpoints. Uploads come back in
    /// `file_state` and generation always answers 500. Returns the base url and the
    /// request log.
    async fn serve_gemini(file_state: &'static str) -> (String, Arc<Mutex<Vec<String>>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let log = requests.clone();
        let base_url = base.clone();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let request = read_request(&mut socket).await;
                log.lock().unwrap().push(request.clone());

                let (status, extra_headers, body) = match request.as_str() {
                    "POST /upload/files" => (
                        "200 OK",
                        format!("x-goog-upload-url: {base_url}/upload/session\r\n"),
                        "{}".to_string(),
                    ),
                    "POST /upload/session" => (
                        "200 OK",
                        String::new(),
                        json!({
                            "file": {
                                "name": "files/abc",
                                "uri": format!("{base_url}/files/abc"),
                                "mimeType": "audio/mpeg",
                                "state": file_state
                            }
                        })
                        .to_string(),
                    ),
                    "DELETE /files/abc" => ("200 OK", String::new(), "{}".to_string()),
                    r if r.ends_with(":generateContent") => (
                        "500 Internal Server Error",
                        String::new(),
                        json!({ "error": { "code": 500, "status": "INTERNAL" } }).to_string(),
                    ),
                    _ => ("404 Not Found", String::new(), "{}".to_string()),
                };

                let head = format!(
                    "HTTP/1.1 {status}\r\n{extra_headers}Content-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        (base, requests)
    }

    fn local_client(base: &str, dir: &Path) -> GeminiClient {
        let prompt_path = dir.join("audio.txt");
        std::fs::write(&prompt_path, "Summarize {title}").unwrap();

        GeminiClient::new(Some("key".into()), "test-model")
            .unwrap()
            .with_client(Client::builder().no_proxy().build().unwrap())
            .with_base_url(base)
            .with_upload_url(format!("{base}/upload"))
            .with_prompt_path(prompt_path)
    }

    fn scratch_audio(dir: &Path) -> ExtractedContent {
        let path = dir.join("episode-104.audio");
        std::fs::write(&path, b"ID3-fake-audio-bytes").unwrap();
        ExtractedContent::Audio(ScratchFile::new(path, "audio/mpeg"))
    }

    #[test]
    fn test_request_serializes_text_and_file_parts() {
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![
                    Part::text("Summarize this sermon"),
                    Part::file("audio/mpeg", "https://generativelanguage.googleapis.com/v1beta/files/abc"),
                ],
            }],
        };

        assert_eq!(
            serde_json::to_value(&body).unwrap(),
            json!({
                "contents": [{
                    "parts": [
                        { "text": "Summarize this sermon" },
                        { "fileData": {
                            "mimeType": "audio/mpeg",
                            "fileUri": "https://generativelanguage.googleapis.com/v1beta/files/abc"
                        }}
                    ]
                }]
            })
        );
    }

    #[test]
    fn test_response_text_joins_first_candidate_parts() {
        let response: GenerateResponse = serde_json::from_value(json!({
            "candidates": [
                { "content": { "parts": [{ "text": "<h3>Theme</h3>" }, { "text": "<p>Hope</p>" }], "role": "model" } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ],
            "usageMetadata": { "totalTokenCount": 12 }
        }))
        .unwrap();

        assert_eq!(response.text().as_deref(), Some("<h3>Theme</h3><p>Hope</p>"));
    }

    #[test]
    fn test_response_without_text_is_empty() {
        let blocked: GenerateResponse = serde_json::from_value(json!({
            "promptFeedback": { "blockReason": "SAFETY" }
        }))
        .unwrap();
        assert!(blocked.text().is_none());

        let whitespace: GenerateResponse = serde_json::from_value(json!({
            "candidates": [{ "content": { "parts": [{ "text": "  \n" }] } }]
        }))
        .unwrap();
        assert!(whitespace.text().is_none());
    }

    #[test]
    fn test_upload_response_parses_file() {
        let uploaded: UploadResponse = serde_json::from_value(json!({
            "file": {
                "name": "files/q1w2e3",
                "uri": "https://generativelanguage.googleapis.com/v1beta/files/q1w2e3",
                "mimeType": "audio/mpeg",
                "state": "PROCESSING",
                "sizeBytes": "1024"
            }
        }))
        .unwrap();

        assert_eq!(uploaded.file.name, "files/q1w2e3");
        assert_eq!(uploaded.file.state.as_deref(), Some("PROCESSING"));
    }

    #[tokio::test]
    async fn test_missing_api_key_fails_before_any_request() {
        let client = GeminiClient::new(None, "gemini-flash-latest")
            .unwrap()
            .with_base_url("http://127.0.0.1:9");

        let result = client
            .summarize("Title", &ExtractedContent::Transcript("text".into()))
            .await;

        assert!(matches!(result, Err(GeminiError::MissingApiKey)));
    }

    #[tokio::test]
    async fn test_unreadable_prompt_template_fails() {
        let dir = tempfile::tempdir().unwrap();
        let client = GeminiClient::new(Some("key".into()), "gemini-flash-latest")
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
            .with_prompt_path(dir.path().join("missing.txt"));

        let result = client
            .summarize("Title", &ExtractedContent::Transcript("text".into()))
            .await;

        assert!(matches!(result, Err(GeminiError::Prompt { .. })));
    }

    #[tokio::test]
    async fn test_uploaded_file_deleted_when_generation_fails() {
        let (base, requests) = serve_gemini("ACTIVE").await;
        let dir = tempfile::tempdir().unwrap();

        let result = local_client(&base, dir.path())
            .summarize("Episode 104", &scratch_audio(dir.path()))
            .await;

        assert!(matches!(result, Err(GeminiError::Api { status: 500, .. })));
        assert_eq!(
            *requests.lock().unwrap(),
            vec![
                "POST /upload/files",
                "POST /upload/session",
                "POST /models/test-model:generateContent",
                "DELETE /files/abc",
            ]
        );
    }

    #[tokio::test]
    async fn test_uploaded_file_deleted_when_processing_fails() {
        let (base, requests) = serve_gemini("FAILED").await;
        let dir = tempfile::tempdir().unwrap();

        let result = local_client(&base, dir.path())
            .summarize("Episode 104", &scratch_audio(dir.path()))
            .await;

        assert!(matches!(
            result,
            Err(GeminiError::FileNotActive { ref name, ref state }) if name == "files/abc" && state == "FAILED"
        ));
        assert_eq!(
            *requests.lock().unwrap(),
            vec!["POST /upload/files", "POST /upload/session", "DELETE /files/abc"]
        );
    }
}
