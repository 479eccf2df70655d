use std::time::Duration;

use async_trait::async_trait;
use indexmap::IndexMap;
use reqwest::multipart;
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::domain::{Choice, FormSection, parse_sections};
use crate::form::LocalFile;
use crate::resolve::join_url;

use super::{ApiError, OnboardingApi, OtpTicket};

const SECTIONS_PATH: &str = "v1/onboarding/sections";
const SUBMIT_PATH: &str = "v1/onboarding/submit-section";
const MEDIA_PATH: &str = "v1/partners/media/upload";
const SEND_OTP_PATH: &str = "v1/auth/send-otp";
const VERIFY_OTP_PATH: &str = "v1/auth/verify-otp";

// Only the initial sections fetch carries an explicit deadline; every other
// request relies on the transport default.
const SECTIONS_TIMEOUT: Duration = Duration::from_secs(8);

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub sections_timeout: Duration,
    pub connect_timeout: Duration,
}

impl HttpConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        HttpConfig {
            base_url: base_url.into(),
            auth_token: None,
            sections_timeout: SECTIONS_TIMEOUT,
            connect_timeout: Duration::from_secs(10),
        }
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }
}

/// Shape every endpoint answers with. Success is `code == 200` (201 allowed
/// for uploads) and `status == "success"`, regardless of the HTTP status.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: Option<i64>,
    status: Option<String>,
    message: Option<String>,
    data: Option<Value>,
}

impl Envelope {
    fn accept(self, allow_created: bool) -> Result<(Option<Value>, Option<String>), ApiError> {
        let ok_code = match self.code {
            Some(200) => true,
            Some(201) => allow_created,
            _ => false,
        };
        let ok_status = self.status.as_deref() == Some("success");
        if ok_code && ok_status {
            Ok((self.data, self.message))
        } else {
            Err(ApiError::Envelope {
                code: self.code,
                status: self.status,
                message: self.message,
            })
        }
    }
}

/// `reqwest`-backed backend client. One pooled connection per host; bearer
/// auth on every request when a token is configured.
#[derive(Debug, Clone)]
pub struct HttpApi {
    client: reqwest::Client,
    config: HttpConfig,
}

impl HttpApi {
    pub fn new(config: HttpConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .pool_max_idle_per_host(8)
            .build()
            .map_err(|err| ApiError::Transport(err.to_string()))?;
        Ok(HttpApi { client, config })
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.config.base_url, path)
    }

    fn authorize(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.auth_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        allow_created: bool,
    ) -> Result<(Option<Value>, Option<String>), ApiError> {
        let response = self.authorize(request).send().await.map_err(from_reqwest)?;
        let status = response.status();
        let body = response.text().await.map_err(from_reqwest)?;
        if !status.is_success() {
            let message = serde_json::from_str::<Envelope>(&body)
                .ok()
                .and_then(|envelope| envelope.message);
            return Err(ApiError::Status {
                code: status.as_u16(),
                message,
            });
        }
        let envelope: Envelope =
            serde_json::from_str(&body).map_err(|err| ApiError::Malformed(err.to_string()))?;
        envelope.accept(allow_created)
    }
}

#[async_trait]
impl OnboardingApi for HttpApi {
    async fn fetch_sections(&self, partner_id: &str) -> Result<Vec<FormSection>, ApiError> {
        let request = self
            .client
            .get(self.endpoint(SECTIONS_PATH))
            .query(&[("partnerId", partner_id)])
            .timeout(self.config.sections_timeout);
        let (data, _) = self.execute(request, false).await?;
        let sections = data
            .as_ref()
            .and_then(|data| data.get("sections"))
            .cloned()
            .unwrap_or_else(|| Value::Array(Vec::new()));
        parse_sections(&sections).map_err(|err| ApiError::Malformed(err.to_string()))
    }

    async fn fetch_options(&self, source: &str) -> Result<Vec<Choice>, ApiError> {
        let url = join_url(&self.config.base_url, source);
        let request = self.client.get(url);
        let (data, _) = self.execute(request, false).await?;
        Ok(extract_choices(data.as_ref()))
    }

    async fn submit_section(
        &self,
        partner_id: &str,
        section_id: &str,
        values: &IndexMap<String, Value>,
    ) -> Result<String, ApiError> {
        let mut body = Map::new();
        body.insert("section_id".to_string(), Value::String(section_id.into()));
        for (key, value) in values {
            body.insert(key.clone(), value.clone());
        }
        let request = self
            .client
            .post(self.endpoint(SUBMIT_PATH))
            .query(&[("partner_id", partner_id)])
            .json(&Value::Object(body));
        let (_, message) = self.execute(request, false).await?;
        Ok(message.unwrap_or_default())
    }

    async fn upload_media(&self, file: &LocalFile) -> Result<String, ApiError> {
        let bytes = tokio::fs::read(&file.uri)
            .await
            .map_err(|err| ApiError::Transport(format!("cannot read {}: {err}", file.uri)))?;
        let mut part = multipart::Part::bytes(bytes).file_name(file.name.clone());
        if let Some(mime) = &file.mime {
            part = part
                .mime_str(mime)
                .map_err(|err| ApiError::Transport(err.to_string()))?;
        }
        // Content-type is left to the transport so the multipart boundary is
        // generated correctly.
        let form = multipart::Form::new().part("file", part);
        let request = self.client.post(self.endpoint(MEDIA_PATH)).multipart(form);
        let (data, _) = self.execute(request, true).await?;
        data.as_ref()
            .and_then(|data| data.get("file_url").or_else(|| data.get("url")))
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or_else(|| ApiError::Malformed("upload response has no file_url".to_string()))
    }

    async fn send_otp(&self, phone: &str) -> Result<OtpTicket, ApiError> {
        let request = self
            .client
            .post(self.endpoint(SEND_OTP_PATH))
            .json(&json!({ "phone": phone, "channel": "whatsapp" }));
        let (data, _) = self.execute(request, false).await?;
        let data = data.ok_or_else(|| ApiError::Malformed("send-otp response has no data".into()))?;
        let otp_id = data
            .get("otp_id")
            .and_then(Value::as_str)
            .ok_or_else(|| ApiError::Malformed("send-otp response has no otp_id".into()))?
            .to_string();
        let expires_in = data.get("expires_in").and_then(Value::as_u64).unwrap_or(0);
        Ok(OtpTicket { otp_id, expires_in })
    }

    async fn verify_otp(&self, otp_id: &str, code: &str) -> Result<(), ApiError> {
        let request = self
            .client
            .post(self.endpoint(VERIFY_OTP_PATH))
            .json(&json!({ "otp_id": otp_id, "otp": code }));
        self.execute(request, false).await?;
        Ok(())
    }
}

fn from_reqwest(err: reqwest::Error) -> ApiError {
    if err.is_timeout() {
        ApiError::Timeout
    } else {
        ApiError::Transport(err.to_string())
    }
}

/// Option payloads come as a bare array under `data`, or nested under a
/// `states`/`cities`/`areas` key. Absent data is simply no options.
fn extract_choices(data: Option<&Value>) -> Vec<Choice> {
    let Some(data) = data else {
        return Vec::new();
    };
    let items = match data {
        Value::Array(items) => Some(items),
        Value::Object(map) => ["states", "cities", "areas"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(Value::as_array),
        _ => None,
    };
    items
        .map(|items| items.iter().filter_map(Choice::from_value).collect())
        .unwrap_or_default()
}
