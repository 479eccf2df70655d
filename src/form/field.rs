use serde_json::Value;

use crate::domain::{Choice, FieldDescriptor, FieldKind};

use super::file::{FileSlot, LocalFile};

pub const PHONE_MAX_DIGITS: usize = 10;

/// Live value of one rendered field, one variant per `FieldKind`.
#[derive(Debug, Clone)]
pub enum FieldValue {
    Text(String),
    Dropdown(Option<Choice>),
    /// Formatted `DD/MM/YYYY` string, never a date object.
    Date(String),
    /// `None` until the user (or a default) defines it; `Some(false)` counts
    /// as present for required-field checks.
    Toggle(Option<bool>),
    Phone(String),
    Otp(String),
    File(FileSlot),
}

#[derive(Debug, Clone)]
pub struct FieldState {
    pub descriptor: FieldDescriptor,
    pub value: FieldValue,
    pub error: Option<String>,
    pub dirty: bool,
}

impl FieldState {
    pub fn from_descriptor(descriptor: FieldDescriptor) -> Self {
        let seed = descriptor
            .prefill
            .as_ref()
            .or(descriptor.default.as_ref())
            .cloned();
        let value = initial_value(&descriptor, seed.as_ref());
        FieldState {
            descriptor,
            value,
            error: None,
            dirty: false,
        }
    }

    pub fn key(&self) -> &str {
        &self.descriptor.key
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        match &mut self.value {
            FieldValue::Text(buffer) | FieldValue::Otp(buffer) => {
                *buffer = text.into();
                self.after_edit();
            }
            FieldValue::Phone(buffer) => {
                let digits: String = text
                    .into()
                    .chars()
                    .filter(char::is_ascii_digit)
                    .take(PHONE_MAX_DIGITS)
                    .collect();
                *buffer = digits;
                self.after_edit();
            }
            _ => {}
        }
    }

    pub fn select(&mut self, choice: Choice) {
        if let FieldValue::Dropdown(selected) = &mut self.value {
            *selected = Some(choice);
            self.after_edit();
        }
    }

    pub fn clear_selection(&mut self) {
        if let FieldValue::Dropdown(selected) = &mut self.value {
            *selected = None;
        }
    }

    pub fn set_toggle(&mut self, flag: bool) {
        if let FieldValue::Toggle(value) = &mut self.value {
            *value = Some(flag);
            self.after_edit();
        }
    }

    pub fn set_date(&mut self, day: u8, month: u8, year: u16) {
        if let FieldValue::Date(buffer) = &mut self.value {
            *buffer = format!("{day:02}/{month:02}/{year:04}");
            self.after_edit();
        }
    }

    pub fn set_picked_file(&mut self, file: LocalFile) {
        if let FieldValue::File(slot) = &mut self.value {
            *slot = FileSlot::Picked(file);
            self.after_edit();
        }
    }

    pub fn set_uploaded_url(&mut self, url: impl Into<String>) {
        if let FieldValue::File(slot) = &mut self.value {
            *slot = FileSlot::Uploaded(url.into());
            self.after_edit();
        }
    }

    pub fn file_slot(&self) -> Option<&FileSlot> {
        match &self.value {
            FieldValue::File(slot) => Some(slot),
            _ => None,
        }
    }

    pub fn display_value(&self) -> String {
        match &self.value {
            FieldValue::Text(text) | FieldValue::Date(text) | FieldValue::Otp(text) => text.clone(),
            FieldValue::Phone(digits) => digits.clone(),
            FieldValue::Dropdown(selected) => selected
                .as_ref()
                .map(|choice| choice.label.clone())
                .unwrap_or_default(),
            FieldValue::Toggle(flag) => flag.map(|f| f.to_string()).unwrap_or_default(),
            FieldValue::File(slot) => match slot {
                FileSlot::Empty => String::new(),
                FileSlot::Picked(file) => file.name.clone(),
                FileSlot::Uploaded(url) => url.clone(),
            },
        }
    }

    /// JSON value submitted for this field. A picked-but-unuploaded file is
    /// `null` on purpose: only the uploaded URL is submittable.
    pub fn submitted_value(&self) -> Value {
        match &self.value {
            FieldValue::Text(text) | FieldValue::Date(text) | FieldValue::Otp(text) => {
                Value::String(text.clone())
            }
            FieldValue::Phone(digits) => Value::String(digits.clone()),
            FieldValue::Dropdown(selected) => selected
                .as_ref()
                .map(|choice| Value::String(choice.stored_value().to_string()))
                .unwrap_or(Value::Null),
            FieldValue::Toggle(flag) => flag.map(Value::Bool).unwrap_or(Value::Null),
            FieldValue::File(slot) => slot
                .url()
                .map(|url| Value::String(url.to_string()))
                .unwrap_or(Value::Null),
        }
    }

    /// Whether the field satisfies a `required` constraint. A toggle counts
    /// once defined, even as `false`; a file counts only once uploaded.
    pub fn is_present(&self) -> bool {
        match &self.value {
            FieldValue::Text(text) | FieldValue::Date(text) | FieldValue::Otp(text) => {
                !text.trim().is_empty()
            }
            FieldValue::Phone(digits) => !digits.is_empty(),
            FieldValue::Dropdown(selected) => selected.is_some(),
            FieldValue::Toggle(flag) => flag.is_some(),
            FieldValue::File(slot) => slot.is_uploaded(),
        }
    }

    pub fn set_error(&mut self, message: String) {
        self.error = Some(message);
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    fn after_edit(&mut self) {
        self.dirty = true;
        self.error = None;
    }
}

fn initial_value(descriptor: &FieldDescriptor, seed: Option<&Value>) -> FieldValue {
    match descriptor.kind {
        FieldKind::Text => FieldValue::Text(seed_text(seed)),
        FieldKind::Otp => FieldValue::Otp(String::new()),
        FieldKind::Date => FieldValue::Date(seed_text(seed)),
        FieldKind::Phone => {
            let digits: String = seed_text(seed)
                .chars()
                .filter(char::is_ascii_digit)
                .take(PHONE_MAX_DIGITS)
                .collect();
            FieldValue::Phone(digits)
        }
        FieldKind::Toggle => FieldValue::Toggle(seed.and_then(seed_bool)),
        FieldKind::Dropdown => {
            let selected = seed
                .map(seed_text_value)
                .filter(|text| !text.is_empty())
                .map(|text| {
                    descriptor
                        .options
                        .iter()
                        .find(|choice| choice.stored_value() == text || choice.label == text)
                        .cloned()
                        .unwrap_or_else(|| Choice::new(text))
                });
            FieldValue::Dropdown(selected)
        }
        FieldKind::File => {
            let slot = seed
                .and_then(Value::as_str)
                .filter(|url| !url.is_empty())
                .map(|url| FileSlot::Uploaded(url.to_string()))
                .unwrap_or_default();
            FieldValue::File(slot)
        }
    }
}

fn seed_text(seed: Option<&Value>) -> String {
    seed.map(seed_text_value).unwrap_or_default()
}

fn seed_text_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(num) => num.to_string(),
        Value::Bool(flag) => flag.to_string(),
        _ => String::new(),
    }
}

fn seed_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(flag) => Some(*flag),
        Value::String(text) => match text.as_str() {
            "true" => Some(true),
            "false" => Some(false),
            _ => None,
        },
        _ => None,
    }
}
