//! HTTP client for the records and authentication endpoints.

use std::path::Path;

use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::models::Hero;

/// Errors from the remote API layer.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The HTTP request itself failed (network, DNS, TLS, body decoding).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The password was rejected, or the server answered without a token.
    #[error("invalid password")]
    Unauthorized,

    /// Any other non-2xx status.
    #[error("API error ({status}): {body}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Raw response body for debugging.
        body: String,
    },

    /// A local image could not be read.
    #[error("failed to read image: {0}")]
    Io(#[from] std::io::Error),

    /// No upload endpoint was given to the client.
    #[error("image upload endpoint is not configured")]
    UploadNotConfigured,

    /// The file extension does not name an image format the upload endpoint accepts.
    #[error("unsupported image type: {0}")]
    UnsupportedImage(String),
}

#[derive(Serialize)]
struct AuthRequest<'a> {
    password: &'a str,
}

#[derive(Deserialize)]
struct AuthResponse {
    token: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest<'a> {
    image: String,
    content_type: &'a str,
}

/// Where the upload endpoint stored an image.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UploadedImage {
    /// Public URL, suitable for `Hero::image`.
    pub url: String,
    /// Object key on the storage side.
    pub filename: String,
}

/// MIME type for an image path, judged by its extension.
pub fn image_content_type(path: &Path) -> Option<&'static str> {
    let extension = path.extension()?.to_str()?.to_ascii_lowercase();
    match extension.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        _ => None,
    }
}

/// Client for the heroes backend. Cheap to clone.
#[derive(Debug, Clone)]
pub struct HeroesApi {
    client: reqwest::Client,
    records_url: String,
    auth_url: String,
    upload_url: Option<String>,
}

impl HeroesApi {
    /// Create a client for the given endpoints.
    pub fn new(records_url: impl Into<String>, auth_url: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), records_url, auth_url)
    }

    /// Reuse an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        records_url: impl Into<String>,
        auth_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            records_url: records_url.into(),
            auth_url: auth_url.into(),
            upload_url: None,
        }
    }

    /// Enable image uploads against `upload_url`.
    pub fn with_upload_url(mut self, upload_url: impl Into<String>) -> Self {
        self.upload_url = Some(upload_url.into());
        self
    }


    /// Fetch the complete hero list.
    pub async fn fetch_heroes(&self) -> Result<Vec<Hero>, ApiError> {
        let response = self.client.get(&self.records_url).send().await?;
        let heroes: Vec<Hero> = Self::parse_response(response).await?;
        debug!(count = heroes.len(), "Fetched heroes");
        Ok(heroes)
    }

    /// Exchange the admin password for a session token.
    pub async fn authenticate(&self, password: &str) -> Result<String, ApiError> {
        let response = self
            .client
            .post(&self.auth_url)
            .json(&AuthRequest { password })
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(ApiError::Unauthorized);
        }
        let body: AuthResponse = Self::parse_response(response).await?;
        body.token
            .filter(|token| !token.is_empty())
            .ok_or(ApiError::Unauthorized)
    }

    /// Create a hero. The returned record carries the id assigned by the server.
    pub async fn create_hero(&self, hero: &Hero, token: &str) -> Result<Hero, ApiError> {
        let response = self
            .client
            .post(&self.records_url)
            .bearer_auth(token)
            .json(hero)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Overwrite the stored version of `hero` (matched by id).
    pub async fn update_hero(&self, hero: &Hero, token: &str) -> Result<Hero, ApiError> {
        let response = self
            .client
            .put(&self.records_url)
            .bearer_auth(token)
            .json(hero)
            .send()
            .await?;
        Self::parse_response(response).await
    }

    /// Delete by id. Returns `false` when the server did not know the id.
    pub async fn delete_hero(&self, id: i64, token: &str) -> Result<bool, ApiError> {
        let response = self
            .client
            .delete(&self.records_url)
            .bearer_auth(token)
            .query(&[("id", id)])
            .send()
            .await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(false);
        }
        Self::ensure_success(response).await?;
        Ok(true)
    }

    /// Upload raw image bytes, base64-encoded, and return the stored location.
    pub async fn upload_image(
        &self,
        bytes: &[u8],
        content_type: &str,
        token: &str,
    ) -> Result<UploadedImage, ApiError> {
        let Some(upload_url) = self.upload_url.as_deref() else {
            return Err(ApiError::UploadNotConfigured);
        };
        let request = UploadRequest {
            image: base64::engine::general_purpose::STANDARD.encode(bytes),
            content_type,
        };
        let response = self
            .client
            .post(upload_url)
            .bearer_auth(token)
            .json(&request)
            .send()
            .await?;
        let uploaded: UploadedImage = Self::parse_response(response).await?;
        info!(url = %uploaded.url, size = bytes.len(), "Image uploaded");
        Ok(uploaded)
    }

    /// Read a local image file and upload it.
    pub async fn upload_image_file(
        &self,
        path: &Path,
        token: &str,
    ) -> Result<UploadedImage, ApiError> {
        let content_type = image_content_type(path)
            .ok_or_else(|| ApiError::UnsupportedImage(path.display().to_string()))?;
        let bytes = tokio::fs::read(path).await?;
        self.upload_image(&bytes, content_type, token).await
    }

    async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response, ApiError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ApiError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }

    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let response = Self::ensure_success(response).await?;
        Ok(response.json::<T>().await?)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use anyhow::Result;
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::{TcpListener, TcpStream},
        task::JoinHandle,
    };

    /// Serve one canned HTTP response and hand back the raw request.
    pub(crate) async fn serve_once(
        status: &'static str,
        body: String,
    ) -> Result<(String, JoinHandle<String>)> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.expect("accept connection");
            let request = read_request(&mut socket).await;
            let response = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket
                .write_all(response.as_bytes())
                .await
                .expect("write response");
            let _ = socket.shutdown().await;
            request
        });
        Ok((format!("http://{addr}/heroes"), handle))
    }

    async fn read_request(socket: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let read = socket.read(&mut chunk).await.expect("read request");
            if read == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..read]);
            if let Some(end) = buf.windows(4).position(|window| window == b"\r\n\r\n") {
                let headers = String::from_utf8_lossy(&buf[..end]).to_lowercase();
                let length = headers
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).into_owned()
    }

    pub(crate) fn hero_json(id: i64) -> String {
        format!(
            r#"{{"id":{id},"name":"Test","rank":"R","image":"i","period":"p","conflict":"c","region":"r","awards":["a"],"birthYear":1900,"biography":"b","timeline":[{{"year":1941,"event":"e"}}]}}"#
        )
    }

    #[tokio::test]
    async fn fetch_decodes_list() -> Result<()> {
        let (url, server) = serve_once("200 OK", format!("[{}]", hero_json(3))).await?;
        let api = HeroesApi::new(url, "http://127.0.0.1:1/auth");
        let heroes = api.fetch_heroes().await?;
        assert_eq!(heroes.len(), 1);
        assert_eq!(heroes[0].id, 3);
        assert_eq!(heroes[0].birth_year, 1900);
        let request = server.await?;
        assert!(request.starts_with("GET /heroes"));
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_returns_token() -> Result<()> {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"token":"admin:1:abc","message":"Authentication successful"}"#.to_string(),
        )
        .await?;
        let api = HeroesApi::new("http://127.0.0.1:1/heroes", url);
        let token = api.authenticate("secret").await?;
        assert_eq!(token, "admin:1:abc");
        let request = server.await?;
        assert!(request.starts_with("POST /heroes"));
        assert!(request.contains(r#"{"password":"secret"}"#));
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_maps_rejection() -> Result<()> {
        let (url, _server) = serve_once(
            "401 Unauthorized",
            r#"{"error":"Invalid password"}"#.to_string(),
        )
        .await?;
        let api = HeroesApi::new("http://127.0.0.1:1/heroes", url);
        let err = api.authenticate("wrong").await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized));
        Ok(())
    }

    #[tokio::test]
    async fn authenticate_without_token_is_rejected() -> Result<()> {
        let (url, _server) = serve_once("200 OK", "{}".to_string()).await?;
        let api = HeroesApi::new("http://127.0.0.1:1/heroes", url);
        assert!(matches!(
            api.authenticate("x").await,
            Err(ApiError::Unauthorized)
        ));
        Ok(())
    }

    #[tokio::test]
    async fn server_errors_carry_status_and_body() -> Result<()> {
        let (url, _server) = serve_once(
            "500 Internal Server Error",
            r#"{"error":"boom"}"#.to_string(),
        )
        .await?;
        let api = HeroesApi::new(url, "http://127.0.0.1:1/auth");
        match api.fetch_heroes().await {
            Err(ApiError::Api { status, body }) => {
                assert_eq!(status, 500);
                assert!(body.contains("boom"));
            }
            other => panic!("unexpected result: {other:?}"),
        }
        Ok(())
    }

    #[tokio::test]
    async fn delete_sends_id_and_token() -> Result<()> {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"message":"Hero deleted successfully"}"#.to_string(),
        )
        .await?;
        let api = HeroesApi::new(url, "http://127.0.0.1:1/auth");
        assert!(api.delete_hero(12, "tok").await?);
        let request = server.await?.to_lowercase();
        assert!(request.starts_with("delete /heroes?id=12"));
        assert!(request.contains("authorization: bearer tok"));
        Ok(())
    }

    #[tokio::test]
    async fn upload_sends_base64_and_content_type() -> Result<()> {
        let (url, server) = serve_once(
            "200 OK",
            r#"{"url":"https://cdn.example.com/heroes/a.png","filename":"heroes/a.png"}"#
                .to_string(),
        )
        .await?;
        let api = HeroesApi::new("http://127.0.0.1:1/heroes", "http://127.0.0.1:1/auth")
            .with_upload_url(url);
        let uploaded = api.upload_image(b"\x89PNG", "image/png", "tok").await?;
        assert_eq!(uploaded.url, "https://cdn.example.com/heroes/a.png");
        assert_eq!(uploaded.filename, "heroes/a.png");

        let request = server.await?;
        assert!(request.starts_with("POST /heroes"));
        assert!(request.contains(r#""image":"iVBORw==""#));
        assert!(request.contains(r#""contentType":"image/png""#));
        Ok(())
    }

    #[tokio::test]
    async fn upload_file_reads_local_image() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("portrait.JPG");
        std::fs::write(&path, b"abc")?;
        let (url, server) = serve_once(
            "200 OK",
            r#"{"url":"https://cdn.example.com/p.jpg","filename":"heroes/p.jpg"}"#.to_string(),
        )
        .await?;
        let api = HeroesApi::new("http://127.0.0.1:1/heroes", "http://127.0.0.1:1/auth")
            .with_upload_url(url);
        let uploaded = api.upload_image_file(&path, "tok").await?;
        assert_eq!(uploaded.url, "https://cdn.example.com/p.jpg");
        let request = server.await?;
        assert!(request.contains(r#""image":"YWJj""#));
        assert!(request.contains(r#""contentType":"image/jpeg""#));
        Ok(())
    }

    #[tokio::test]
    async fn upload_without_endpoint_is_refused() {
        let api = HeroesApi::new("http://127.0.0.1:1/heroes", "http://127.0.0.1:1/auth");
        let result = api.upload_image(b"abc", "image/png", "tok").await;
        assert!(matches!(result, Err(ApiError::UploadNotConfigured)));
    }

    #[tokio::test]
    async fn upload_rejects_non_images_before_sending() {
        let api = HeroesApi::new("http://127.0.0.1:1/heroes", "http://127.0.0.1:1/auth")
            .with_upload_url("http://127.0.0.1:1/upload");
        let result = api
            .upload_image_file(Path::new("notes.txt"), "tok")
            .await;
        assert!(matches!(result, Err(ApiError::UnsupportedImage(_))));
    }

    #[tokio::test]
    async fn delete_of_unknown_id_is_not_an_error() -> Result<()> {
        let (url, _server) =
            serve_once("404 Not Found", r#"{"error":"Hero not found"}"#.to_string()).await?;
        let api = HeroesApi::new(url, "http://127.0.0.1:1/auth");
        assert!(!api.delete_hero(12, "tok").await?);
        Ok(())
    }
}
