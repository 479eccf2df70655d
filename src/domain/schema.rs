use indexmap::IndexMap;
use serde_json::Value;

pub const DEFAULT_FILE_TYPES: [&str; 4] = ["jpg", "jpeg", "png", "pdf"];
pub const DEFAULT_MAX_SIZE_MB: u64 = 5;

/// Field variants a section schema may declare. Unknown type strings are
/// rejected when the section is parsed, not when the field is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Dropdown,
    Date,
    File,
    Phone,
    Otp,
    Toggle,
}

impl FieldKind {
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "text" => Some(FieldKind::Text),
            "dropdown" => Some(FieldKind::Dropdown),
            "date" => Some(FieldKind::Date),
            "file" => Some(FieldKind::File),
            "phone" => Some(FieldKind::Phone),
            "otp" => Some(FieldKind::Otp),
            "toggle" => Some(FieldKind::Toggle),
            _ => None,
        }
    }

    pub fn tag(&self) -> &'static str {
        match self {
            FieldKind::Text => "text",
            FieldKind::Dropdown => "dropdown",
            FieldKind::Date => "date",
            FieldKind::File => "file",
            FieldKind::Phone => "phone",
            FieldKind::Otp => "otp",
            FieldKind::Toggle => "toggle",
        }
    }
}

/// One dropdown option. Backends serve either bare strings or objects whose
/// display text hides behind `name`, `label`, or `value`, with an optional
/// `id` used as the stored value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub id: Option<String>,
    pub label: String,
}

impl Choice {
    pub fn new(label: impl Into<String>) -> Self {
        Choice {
            id: None,
            label: label.into(),
        }
    }

    pub fn with_id(id: impl Into<String>, label: impl Into<String>) -> Self {
        Choice {
            id: Some(id.into()),
            label: label.into(),
        }
    }

    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(text) => Some(Choice::new(text.clone())),
            Value::Number(num) => Some(Choice::new(num.to_string())),
            Value::Object(map) => {
                let label = ["name", "label", "value"]
                    .iter()
                    .find_map(|key| map.get(*key))
                    .map(scalar_to_string)?;
                let id = map.get("id").map(scalar_to_string);
                Some(Choice { id, label })
            }
            _ => None,
        }
    }

    /// The value written into the form when this choice is selected: the
    /// option's `id` when present, its display label otherwise.
    pub fn stored_value(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.label)
    }
}

#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub key: String,
    pub kind: FieldKind,
    pub label: String,
    pub required: bool,
    pub default: Option<Value>,
    /// Pre-filled value from a prior submission, server-supplied.
    pub prefill: Option<Value>,
    pub options: Vec<Choice>,
    pub options_source: Option<String>,
    pub verify_otp: bool,
    pub file_types: Vec<String>,
    pub max_size_mb: u64,
}

impl FieldDescriptor {
    pub fn new(key: impl Into<String>, kind: FieldKind) -> Self {
        let key = key.into();
        FieldDescriptor {
            label: key.clone(),
            key,
            kind,
            required: false,
            default: None,
            prefill: None,
            options: Vec::new(),
            options_source: None,
            verify_otp: false,
            file_types: DEFAULT_FILE_TYPES.iter().map(|s| s.to_string()).collect(),
            max_size_mb: DEFAULT_MAX_SIZE_MB,
        }
    }
}

/// Localized message strings served with a section, with hardcoded English
/// fallbacks for every key the engine surfaces to the user.
#[derive(Debug, Clone, Default)]
pub struct SectionMessages {
    entries: IndexMap<String, String>,
}

impl SectionMessages {
    pub fn from_entries(entries: IndexMap<String, String>) -> Self {
        SectionMessages { entries }
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.entries.insert(key.into(), message.into());
    }

    fn get_or(&self, key: &str, fallback: &'static str) -> String {
        self.entries
            .get(key)
            .cloned()
            .unwrap_or_else(|| fallback.to_string())
    }

    pub fn required(&self) -> String {
        self.get_or("required", "This field is required")
    }

    pub fn select_first(&self, dependency_label: &str) -> String {
        let template = self.get_or("select_first", "Please select {field} first");
        template.replace("{field}", dependency_label)
    }

    pub fn phone_invalid(&self) -> String {
        self.get_or("phone_invalid", "Enter a valid 10 digit phone number")
    }

    pub fn otp_sent(&self) -> String {
        self.get_or("otp_sent", "OTP sent to your phone")
    }

    pub fn otp_code_missing(&self) -> String {
        self.get_or("otp_code_missing", "Enter the OTP first")
    }

    pub fn otp_not_generated(&self) -> String {
        self.get_or("otp_not_generated", "Generate an OTP first")
    }

    pub fn otp_invalid(&self) -> String {
        self.get_or("otp_invalid", "Invalid OTP, please try again")
    }

    pub fn otp_expired(&self) -> String {
        self.get_or("otp_expired", "OTP expired, please request a new one")
    }

    pub fn otp_max_attempts(&self) -> String {
        self.get_or("otp_max_attempts", "Maximum OTP attempts exceeded")
    }

    pub fn otp_unavailable(&self) -> String {
        self.get_or("otp_unavailable", "OTP verification is not configured")
    }

    pub fn otp_failed(&self) -> String {
        self.get_or("otp_failed", "OTP verification failed")
    }

    pub fn otp_send_failed(&self) -> String {
        self.get_or("otp_send_failed", "Could not send OTP, please try again")
    }

    pub fn otp_verified(&self) -> String {
        self.get_or("otp_verified", "Phone number verified")
    }

    pub fn otp_required(&self) -> String {
        self.get_or("otp_required", "Verify your phone number to continue")
    }

    pub fn upload_type_rejected(&self, allowed: &[String]) -> String {
        let template = self.get_or("upload_type_rejected", "Allowed file types: {types}");
        template.replace("{types}", &allowed.join(", "))
    }

    pub fn upload_size_rejected(&self, limit_mb: u64) -> String {
        let template = self.get_or("upload_size_rejected", "File must be at most {limit} MB");
        template.replace("{limit}", &limit_mb.to_string())
    }

    pub fn upload_failed(&self) -> String {
        self.get_or("upload_failed", "Upload failed, please try again")
    }

    pub fn submit_success(&self) -> String {
        self.get_or("submit_success", "Details saved")
    }

    pub fn submit_failed(&self) -> String {
        self.get_or("submit_failed", "Something went wrong, please try again")
    }
}

#[derive(Debug, Clone)]
pub struct FormSection {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub button_text: Option<String>,
    pub messages: SectionMessages,
    pub fields: Vec<FieldDescriptor>,
}

impl FormSection {
    pub fn field(&self, key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.key == key)
    }

    /// The first phone field gated behind OTP verification; standalone `otp`
    /// fields target this one when verifying.
    pub fn first_otp_phone(&self) -> Option<&FieldDescriptor> {
        self.fields
            .iter()
            .find(|field| field.kind == FieldKind::Phone && field.verify_otp)
    }
}

fn scalar_to_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Number(num) => num.to_string(),
        Value::Bool(flag) => flag.to_string(),
        other => other.to_string(),
    }
}
