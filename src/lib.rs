#![deny(rust_2018_idioms)]

mod client;
mod domain;
mod form;
mod otp;
mod resolve;
mod runtime;
mod submit;
mod upload;

#[cfg(test)]
mod tests;

pub use client::{ApiError, HttpApi, HttpConfig, OnboardingApi, OtpTicket};
pub use domain::{
    Choice, DEFAULT_FILE_TYPES, DEFAULT_MAX_SIZE_MB, FieldDescriptor, FieldKind, FormSection,
    SectionMessages, parse_section, parse_sections,
};
pub use form::{
    FieldState, FieldValue, FileSlot, FormState, LocalFile, OTP_CODE_KEY, OTP_SUFFIX,
    PHONE_MAX_DIGITS, strip_transient,
};
pub use otp::{OtpFlow, OtpPhase, verify_failure_message};
pub use resolve::{
    OptionStore, ResolveError, dependencies_of, direct_dependents, downstream_of, expand, join_url,
    placeholders,
};
pub use runtime::{DropdownError, FormSession};
pub use submit::{MissingReport, SubmitOutcome, missing_required, summary_message};
pub use upload::{ImageUploadReport, upload_images, validate_file};

pub mod prelude {
    pub use super::{
        ApiError, Choice, FieldDescriptor, FieldKind, FormSection, FormSession, HttpApi,
        HttpConfig, LocalFile, OnboardingApi, SubmitOutcome,
    };
}
