mod http;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use crate::domain::{Choice, FormSection};
use crate::form::LocalFile;

pub use http::{HttpApi, HttpConfig};

/// Failure taxonomy for every backend call. The success convention is strict:
/// HTTP 2xx and body `code == 200` and `status == "success"`; anything else
/// is one of these.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("network error: {0}")]
    Transport(String),
    #[error("request timed out")]
    Timeout,
    #[error("http {code}{}", message_suffix(.message))]
    Status { code: u16, message: Option<String> },
    #[error("backend rejected request{}", message_suffix(.message))]
    Envelope {
        code: Option<i64>,
        status: Option<String>,
        message: Option<String>,
    },
    #[error("malformed response: {0}")]
    Malformed(String),
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|text| format!(": {text}"))
        .unwrap_or_default()
}

impl ApiError {
    /// HTTP status code, when the failure carries one. OTP verification maps
    /// these to user-facing messages.
    pub fn http_status(&self) -> Option<u16> {
        match self {
            ApiError::Status { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Backend-supplied message string, surfaced verbatim when present.
    pub fn backend_message(&self) -> Option<&str> {
        match self {
            ApiError::Status { message, .. } | ApiError::Envelope { message, .. } => {
                message.as_deref()
            }
            _ => None,
        }
    }
}

/// Ticket returned by `send-otp`, consumed by `verify-otp`.
#[derive(Debug, Clone)]
pub struct OtpTicket {
    pub otp_id: String,
    pub expires_in: u64,
}

/// The backend surface the engine drives. `HttpApi` is the production
/// implementation; tests plug in an in-memory fake.
#[async_trait]
pub trait OnboardingApi: Send + Sync {
    /// `GET {base}v1/onboarding/sections?partnerId=...`
    async fn fetch_sections(&self, partner_id: &str) -> Result<Vec<FormSection>, ApiError>;

    /// `GET` an options source, relative or absolute, parameters already
    /// substituted.
    async fn fetch_options(&self, source: &str) -> Result<Vec<Choice>, ApiError>;

    /// `POST {base}v1/onboarding/submit-section?partner_id=...`; returns the
    /// backend success message.
    async fn submit_section(
        &self,
        partner_id: &str,
        section_id: &str,
        values: &IndexMap<String, Value>,
    ) -> Result<String, ApiError>;

    /// Multipart `POST {base}v1/partners/media/upload`; returns the stored
    /// file URL.
    async fn upload_media(&self, file: &LocalFile) -> Result<String, ApiError>;

    /// `POST {base}v1/auth/send-otp` over the whatsapp channel.
    async fn send_otp(&self, phone: &str) -> Result<OtpTicket, ApiError>;

    /// `POST {base}v1/auth/verify-otp`.
    async fn verify_otp(&self, otp_id: &str, code: &str) -> Result<(), ApiError>;
}
