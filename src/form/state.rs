use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::{FieldDescriptor, FieldKind, FormSection};

use super::field::{FieldState, FieldValue};

/// Suffix of synthesized OTP companion fields; such keys never reach the
/// backend.
pub const OTP_SUFFIX: &str = "_otp";
pub const OTP_CODE_KEY: &str = "otp_code";

/// Ordered field states for one section, the live store behind a rendered
/// form. Declaration order is preserved.
#[derive(Debug, Clone)]
pub struct FormState {
    fields: Vec<FieldState>,
}

impl FormState {
    /// Build field states for a section. A phone field flagged `verify_otp`
    /// without a declared `otp` sibling gets a synthesized `<key>_otp` input
    /// right after it.
    pub fn from_section(section: &FormSection) -> Self {
        let has_otp_field = section
            .fields
            .iter()
            .any(|field| field.kind == FieldKind::Otp);
        let mut fields = Vec::with_capacity(section.fields.len());
        for descriptor in &section.fields {
            let needs_companion =
                descriptor.kind == FieldKind::Phone && descriptor.verify_otp && !has_otp_field;
            let key = descriptor.key.clone();
            fields.push(FieldState::from_descriptor(descriptor.clone()));
            if needs_companion {
                let mut companion =
                    FieldDescriptor::new(format!("{key}{OTP_SUFFIX}"), FieldKind::Otp);
                companion.label = "OTP".to_string();
                fields.push(FieldState::from_descriptor(companion));
            }
        }
        FormState { fields }
    }

    pub fn fields(&self) -> &[FieldState] {
        &self.fields
    }

    pub fn field(&self, key: &str) -> Option<&FieldState> {
        self.fields.iter().find(|field| field.key() == key)
    }

    pub fn field_mut(&mut self, key: &str) -> Option<&mut FieldState> {
        self.fields.iter_mut().find(|field| field.key() == key)
    }

    /// The entered OTP code for a phone field: its companion `<key>_otp`
    /// input when present, else the first standalone `otp` field.
    pub fn otp_code_for(&self, phone_key: &str) -> Option<String> {
        let companion = format!("{phone_key}{OTP_SUFFIX}");
        let field = self.field(&companion).or_else(|| {
            self.fields
                .iter()
                .find(|field| field.descriptor.kind == FieldKind::Otp)
        })?;
        match &field.value {
            FieldValue::Otp(code) if !code.trim().is_empty() => Some(code.trim().to_string()),
            _ => None,
        }
    }

    /// Snapshot of every field's submitted value, in declaration order.
    /// Transient OTP keys are still present here; stripping happens at
    /// submission time.
    pub fn values(&self) -> IndexMap<String, Value> {
        self.fields
            .iter()
            .map(|field| (field.key().to_string(), field.submitted_value()))
            .collect()
    }

    pub fn errors(&self) -> IndexMap<String, String> {
        self.fields
            .iter()
            .filter_map(|field| {
                field
                    .error
                    .as_ref()
                    .map(|message| (field.key().to_string(), message.clone()))
            })
            .collect()
    }

    pub fn set_errors(&mut self, errors: &IndexMap<String, String>) {
        for field in &mut self.fields {
            if let Some(message) = errors.get(field.key()) {
                field.set_error(message.clone());
            }
        }
    }

    pub fn clear_errors(&mut self) {
        for field in &mut self.fields {
            field.clear_error();
        }
    }

    pub fn is_dirty(&self) -> bool {
        self.fields.iter().any(|field| field.dirty)
    }
}

/// Drop transient OTP entries from a value map before it is posted: any key
/// ending in `_otp` plus the literal `otp_code`.
pub fn strip_transient(values: IndexMap<String, Value>) -> IndexMap<String, Value> {
    values
        .into_iter()
        .filter(|(key, _)| !key.ends_with(OTP_SUFFIX) && key != OTP_CODE_KEY)
        .collect()
}
