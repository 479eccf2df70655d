use indexmap::IndexMap;

use crate::client::ApiError;
use crate::domain::SectionMessages;

/// Per-field OTP handshake. `Verified` is terminal for the session; no
/// client-side expiry countdown beyond what the backend reports.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OtpPhase {
    #[default]
    Idle,
    Sent {
        otp_id: String,
        expires_in: u64,
    },
    Verified,
}

impl OtpPhase {
    pub fn otp_id(&self) -> Option<&str> {
        match self {
            OtpPhase::Sent { otp_id, .. } => Some(otp_id),
            _ => None,
        }
    }
}

/// OTP state per phone field key.
#[derive(Debug, Clone, Default)]
pub struct OtpFlow {
    phases: IndexMap<String, OtpPhase>,
}

impl OtpFlow {
    pub fn phase(&self, key: &str) -> &OtpPhase {
        self.phases.get(key).unwrap_or(&OtpPhase::Idle)
    }

    pub fn is_verified(&self, key: &str) -> bool {
        matches!(self.phase(key), OtpPhase::Verified)
    }

    pub fn mark_sent(&mut self, key: impl Into<String>, otp_id: String, expires_in: u64) {
        self.phases
            .insert(key.into(), OtpPhase::Sent { otp_id, expires_in });
    }

    pub fn mark_verified(&mut self, key: impl Into<String>) {
        self.phases.insert(key.into(), OtpPhase::Verified);
    }
}

/// User-facing message for a failed verify call. HTTP status picks the
/// message variant; a backend-supplied message string wins when present.
pub fn verify_failure_message(err: &ApiError, messages: &SectionMessages) -> String {
    if let Some(message) = err.backend_message() {
        return message.to_string();
    }
    match err.http_status() {
        Some(400) => messages.otp_invalid(),
        Some(410) => messages.otp_expired(),
        Some(429) => messages.otp_max_attempts(),
        Some(404) => messages.otp_unavailable(),
        _ => messages.otp_failed(),
    }
}
