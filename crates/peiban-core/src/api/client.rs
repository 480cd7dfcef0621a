//! API client for communicating with the Peiban REST backend.
//!
//! This module provides the `ApiClient` struct for the login exchanges and
//! the authenticated profile, check-in and journal endpoints.

use std::path::Path;
use std::time::Duration;

use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::models::{
    AvatarResponse, CheckinCalendar, CheckinRecord, CheckinStatus, HealthStatus, LogEntry,
    LogPage, LoginResponse, ProfileUpdate, SendCodeResponse, User,
};

use super::ApiError;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

// ============================================================================
// Constants
// ============================================================================

/// Page size the history screen asks for.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

#[derive(Serialize)]
struct PhoneBody<'a> {
    phone: &'a str,
}

#[derive(Serialize)]
struct VerifyBody<'a> {
    phone: &'a str,
    code: &'a str,
}

#[derive(Serialize)]
struct WechatBody<'a> {
    code: &'a str,
}

/// An image file read into memory for a multipart upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Read an image from disk, keeping only its file name for the upload.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "image.jpg".to_string());
        Ok(Self { file_name, bytes })
    }

    fn mime_type(&self) -> &'static str {
        let ext = self
            .file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "png" => "image/png",
            "gif" => "image/gif",
            "webp" => "image/webp",
            _ => "image/jpeg",
        }
    }

    fn into_part(self) -> ApiResult<Part> {
        let mime = self.mime_type();
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(mime)?)
    }
}

/// Resolve an upload path returned by the backend into a URL.
/// Absolute `http(s)` URLs pass through untouched.
pub fn image_url(uploads_base_url: &str, path: &str) -> String {
    if path.is_empty() {
        String::new()
    } else if path.starts_with("http") {
        path.to_string()
    } else {
        format!(
            "{}/{}",
            uploads_base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// API client for the Peiban backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new API client against `base_url` (e.g. `http://host:5000/api`)
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> ApiResult<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        })
    }

    pub fn from_config(config: &Config) -> ApiResult<Self> {
        Self::new(
            config.api_base_url.clone(),
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: String) -> Self {
        Self {
            client: self.client.clone(),
            base_url: self.base_url.clone(),
            token: Some(token),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match self.token {
            Some(ref token) => request.bearer_auth(token),
            None => request,
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> ApiResult<Response> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder, what: &str) -> ApiResult<T> {
        let response = request.send().await?;
        let response = Self::check_response(response).await?;
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            warn!(endpoint = what, error = %e, "Failed to parse response");
            ApiError::InvalidResponse(format!("{}: {}", what, e))
        })
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        debug!(path, "GET");
        let request = self.authorized(self.client.get(self.url(path)));
        Self::send(request, path).await
    }

    async fn post<T: DeserializeOwned, B: Serialize>(&self, path: &str, body: &B) -> ApiResult<T> {
        debug!(path, "POST");
        let request = self.authorized(self.client.post(self.url(path)).json(body));
        Self::send(request, path).await
    }

    async fn post_form<T: DeserializeOwned>(&self, path: &str, form: Form) -> ApiResult<T> {
        debug!(path, "POST multipart");
        let request = self.authorized(self.client.post(self.url(path)).multipart(form));
        Self::send(request, path).await
    }

    /// POST to one of the login exchanges; these never carry a bearer token.
    async fn post_anonymous<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        debug!(path, "POST (anonymous)");
        let request = self.client.post(self.url(path)).json(body);
        Self::send(request, path).await
    }

    // ===== Authentication =====

    /// Ask the backend to send a verification code to `phone`.
    /// Development backends echo the code back.
    pub async fn send_code(&self, phone: &str) -> ApiResult<SendCodeResponse> {
        self.post_anonymous("/auth/send-code", &PhoneBody { phone }).await
    }

    /// Exchange phone + verification code for a token and user
    pub async fn verify_phone(&self, phone: &str, code: &str) -> ApiResult<LoginResponse> {
        self.post_anonymous("/auth/verify-phone", &VerifyBody { phone, code })
            .await
    }

    /// Exchange a WeChat authorization code for a token and user
    pub async fn wechat_login(&self, code: &str) -> ApiResult<LoginResponse> {
        self.post_anonymous("/auth/wechat", &WechatBody { code }).await
    }

    /// Identity behind the current token
    pub async fn me(&self) -> ApiResult<User> {
        self.get("/auth/me").await
    }

    pub async fn health(&self) -> ApiResult<HealthStatus> {
        let request = self.client.get(self.url("/health"));
        Self::send(request, "/health").await
    }

    // ===== Profile =====

    pub async fn profile(&self) -> ApiResult<User> {
        self.get("/user/profile").await
    }

    pub async fn update_profile(&self, update: &ProfileUpdate) -> ApiResult<User> {
        debug!(path = "/user/profile", "PUT");
        let request = self
            .authorized(self.client.put(self.url("/user/profile")))
            .json(update);
        Self::send(request, "/user/profile").await
    }

    pub async fn upload_avatar(&self, image: ImageUpload) -> ApiResult<AvatarResponse> {
        let form = Form::new().part("avatar", image.into_part()?);
        self.post_form("/user/avatar", form).await
    }

    // ===== Check-in =====

    /// Check in for today. The backend answers 400 if already checked in.
    pub async fn checkin(&self) -> ApiResult<CheckinRecord> {
        self.post("/checkin", &serde_json::json!({})).await
    }

    pub async fn checkin_status(&self) -> ApiResult<CheckinStatus> {
        self.get("/checkin/status").await
    }

    pub async fn checkin_calendar(&self) -> ApiResult<CheckinCalendar> {
        self.get("/checkin/calendar").await
    }

    /// Fetch status and calendar concurrently, as the home screen needs both.
    pub async fn checkin_overview(&self) -> ApiResult<(CheckinStatus, CheckinCalendar)> {
        futures::try_join!(self.checkin_status(), self.checkin_calendar())
    }

    // ===== Journal =====

    pub async fn logs(&self, page: u32, per_page: u32) -> ApiResult<LogPage> {
        self.get(&format!("/logs?page={}&per_page={}", page, per_page))
            .await
    }

    /// Create a journal entry; images are sent as `image0`..`imageN`.
    pub async fn create_log(&self, content: &str, images: Vec<ImageUpload>) -> ApiResult<LogEntry> {
        let mut form = Form::new().text("content", content.to_string());
        for (index, image) in images.into_iter().enumerate() {
            form = form.part(format!("image{}", index), image.into_part()?);
        }
        self.post_form("/logs", form).await
    }

    pub async fn log(&self, id: i64) -> ApiResult<LogEntry> {
        self.get(&format!("/logs/{}", id)).await
    }

    pub async fn delete_log(&self, id: i64) -> ApiResult<()> {
        let path = format!("/logs/{}", id);
        debug!(path = %path, "DELETE");
        let request = self.authorized(self.client.delete(self.url(&path)));
        let _: IgnoredAny = Self::send(request, &path).await?;
        Ok(())
    }
}
