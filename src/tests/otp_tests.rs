use crate::client::ApiError;
use crate::domain::SectionMessages;
use crate::otp::{OtpFlow, OtpPhase, verify_failure_message};

fn status(code: u16) -> ApiError {
    ApiError::Status {
        code,
        message: None,
    }
}

#[test]
fn phases_progress_to_terminal_verified() {
    let mut flow = OtpFlow::default();
    assert_eq!(flow.phase("mobile"), &OtpPhase::Idle);
    assert_eq!(flow.phase("mobile").otp_id(), None);

    flow.mark_sent("mobile", "abc123".to_string(), 300);
    assert_eq!(flow.phase("mobile").otp_id(), Some("abc123"));
    assert!(!flow.is_verified("mobile"));

    flow.mark_verified("mobile");
    assert!(flow.is_verified("mobile"));
}

#[test]
fn verify_failure_maps_http_status_to_message() {
    let messages = SectionMessages::default();
    assert_eq!(
        verify_failure_message(&status(400), &messages),
        "Invalid OTP, please try again"
    );
    assert_eq!(
        verify_failure_message(&status(410), &messages),
        "OTP expired, please request a new one"
    );
    assert_eq!(
        verify_failure_message(&status(429), &messages),
        "Maximum OTP attempts exceeded"
    );
    assert_eq!(
        verify_failure_message(&status(404), &messages),
        "OTP verification is not configured"
    );
    assert_eq!(
        verify_failure_message(&status(500), &messages),
        "OTP verification failed"
    );
    assert_eq!(
        verify_failure_message(&ApiError::Timeout, &messages),
        "OTP verification failed"
    );
}

#[test]
fn backend_message_wins_over_fallback() {
    let messages = SectionMessages::default();
    let err = ApiError::Status {
        code: 400,
        message: Some("Galat OTP".to_string()),
    };
    assert_eq!(verify_failure_message(&err, &messages), "Galat OTP");
}

#[test]
fn localized_messages_replace_fallbacks() {
    let mut messages = SectionMessages::default();
    messages.insert("otp_expired", "OTP samapt ho gaya");
    assert_eq!(
        verify_failure_message(&status(410), &messages),
        "OTP samapt ho gaya"
    );
}
