use std::sync::Mutex;

use async_trait::async_trait;
use indexmap::IndexMap;
use serde_json::Value;

use crate::client::{ApiError, OnboardingApi, OtpTicket};
use crate::domain::{Choice, FieldDescriptor, FieldKind, FormSection, SectionMessages};
use crate::form::LocalFile;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    FetchSections(String),
    FetchOptions(String),
    Submit {
        partner_id: String,
        section_id: String,
        values: IndexMap<String, Value>,
    },
    Upload(String),
    SendOtp(String),
    VerifyOtp { otp_id: String, code: String },
}

/// In-memory backend double: canned responses in, recorded calls out.
#[derive(Debug)]
pub struct FakeApi {
    pub calls: Mutex<Vec<Call>>,
    sections: Mutex<Vec<FormSection>>,
    options: Mutex<IndexMap<String, Result<Vec<Choice>, ApiError>>>,
    uploads: Mutex<Vec<Result<String, ApiError>>>,
    send_otp: Mutex<Result<OtpTicket, ApiError>>,
    verify_otp: Mutex<Result<(), ApiError>>,
    submit: Mutex<Result<String, ApiError>>,
}

impl FakeApi {
    pub fn new() -> Self {
        FakeApi {
            calls: Mutex::new(Vec::new()),
            sections: Mutex::new(Vec::new()),
            options: Mutex::new(IndexMap::new()),
            uploads: Mutex::new(Vec::new()),
            send_otp: Mutex::new(Ok(OtpTicket {
                otp_id: "abc123".to_string(),
                expires_in: 300,
            })),
            verify_otp: Mutex::new(Ok(())),
            submit: Mutex::new(Ok("Details saved".to_string())),
        }
    }

    pub fn with_sections(sections: Vec<FormSection>) -> Self {
        let api = FakeApi::new();
        *api.sections.lock().unwrap() = sections;
        api
    }

    pub fn stub_options(&self, source: &str, result: Result<Vec<Choice>, ApiError>) {
        self.options.lock().unwrap().insert(source.to_string(), result);
    }

    pub fn queue_upload(&self, result: Result<String, ApiError>) {
        self.uploads.lock().unwrap().push(result);
    }

    pub fn stub_send_otp(&self, result: Result<OtpTicket, ApiError>) {
        *self.send_otp.lock().unwrap() = result;
    }

    pub fn stub_verify_otp(&self, result: Result<(), ApiError>) {
        *self.verify_otp.lock().unwrap() = result;
    }

    pub fn stub_submit(&self, result: Result<String, ApiError>) {
        *self.submit.lock().unwrap() = result;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn submit_calls(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::Submit { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl OnboardingApi for FakeApi {
    async fn fetch_sections(&self, partner_id: &str) -> Result<Vec<FormSection>, ApiError> {
        self.record(Call::FetchSections(partner_id.to_string()));
        Ok(self.sections.lock().unwrap().clone())
    }

    async fn fetch_options(&self, source: &str) -> Result<Vec<Choice>, ApiError> {
        self.record(Call::FetchOptions(source.to_string()));
        self.options
            .lock()
            .unwrap()
            .get(source)
            .cloned()
            .unwrap_or_else(|| Ok(Vec::new()))
    }

    async fn submit_section(
        &self,
        partner_id: &str,
        section_id: &str,
        values: &IndexMap<String, Value>,
    ) -> Result<String, ApiError> {
        self.record(Call::Submit {
            partner_id: partner_id.to_string(),
            section_id: section_id.to_string(),
            values: values.clone(),
        });
        self.submit.lock().unwrap().clone()
    }

    async fn upload_media(&self, file: &LocalFile) -> Result<String, ApiError> {
        self.record(Call::Upload(file.name.clone()));
        let mut uploads = self.uploads.lock().unwrap();
        if uploads.is_empty() {
            Ok(format!("https://cdn.example.com/{}", file.name))
        } else {
            uploads.remove(0)
        }
    }

    async fn send_otp(&self, phone: &str) -> Result<OtpTicket, ApiError> {
        self.record(Call::SendOtp(phone.to_string()));
        self.send_otp.lock().unwrap().clone()
    }

    async fn verify_otp(&self, otp_id: &str, code: &str) -> Result<(), ApiError> {
        self.record(Call::VerifyOtp {
            otp_id: otp_id.to_string(),
            code: code.to_string(),
        });
        self.verify_otp.lock().unwrap().clone()
    }
}

pub fn field(key: &str, kind: FieldKind) -> FieldDescriptor {
    FieldDescriptor::new(key, kind)
}

pub fn required(mut descriptor: FieldDescriptor) -> FieldDescriptor {
    descriptor.required = true;
    descriptor
}

pub fn with_source(mut descriptor: FieldDescriptor, source: &str) -> FieldDescriptor {
    descriptor.options_source = Some(source.to_string());
    descriptor
}

pub fn section(id: &str, fields: Vec<FieldDescriptor>) -> FormSection {
    FormSection {
        id: id.to_string(),
        title: id.to_string(),
        description: None,
        button_text: Some("Proceed".to_string()),
        messages: SectionMessages::default(),
        fields,
    }
}
