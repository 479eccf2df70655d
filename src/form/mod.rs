mod field;
mod file;
mod state;

pub use field::{FieldState, FieldValue, PHONE_MAX_DIGITS};
pub use file::{FileSlot, LocalFile};
pub use state::{FormState, OTP_CODE_KEY, OTP_SUFFIX, strip_transient};
