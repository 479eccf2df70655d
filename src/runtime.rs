use std::sync::Arc;

use anyhow::{Context, Result, bail};
use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::client::{ApiError, OnboardingApi};
use crate::domain::{Choice, FieldKind, FormSection};
use crate::form::{FieldValue, FileSlot, FormState, LocalFile, PHONE_MAX_DIGITS, strip_transient};
use crate::otp::{OtpFlow, verify_failure_message};
use crate::resolve::{OptionStore, direct_dependents, downstream_of, expand, placeholders};
use crate::submit::{SubmitOutcome, missing_required, summary_message};
use crate::upload::{ImageUploadReport, upload_images, validate_file};

/// Why a dropdown could not produce options. `Dependency` is a validation
/// message and the dropdown stays closed; `Fetch` is a resolver failure the
/// renderer may retry.
#[derive(Debug, Error)]
pub enum DropdownError {
    #[error("{0}")]
    Dependency(String),
    #[error(transparent)]
    Fetch(#[from] ApiError),
}

/// One section's live form: field values, resolved options, and OTP state.
/// All mutation flows through `&mut self`, so no completed network call can
/// write into a session that is already gone; dropping the session aborts
/// any outstanding prefetch tasks with it.
#[derive(Debug)]
pub struct FormSession<A: OnboardingApi + 'static> {
    api: Arc<A>,
    section: FormSection,
    form: FormState,
    options: OptionStore,
    otp: OtpFlow,
}

impl<A: OnboardingApi + 'static> FormSession<A> {
    /// Fetch the partner's sections and open the one named by `section_id`,
    /// defaulting to the first. Static dropdown options are prefetched in
    /// parallel, unordered.
    pub async fn load(api: Arc<A>, partner_id: &str, section_id: Option<&str>) -> Result<Self> {
        let sections = api
            .fetch_sections(partner_id)
            .await
            .context("failed to load onboarding sections")?;
        let section = pick_section(sections, section_id)?;
        let mut session = Self::from_section(api, section);
        session.prefetch_options().await;
        Ok(session)
    }

    /// Like `load`, but degrades to a caller-supplied default section when
    /// the fetch fails or times out.
    pub async fn load_or(
        api: Arc<A>,
        partner_id: &str,
        section_id: Option<&str>,
        fallback: FormSection,
    ) -> Self {
        match Self::load(Arc::clone(&api), partner_id, section_id).await {
            Ok(session) => session,
            Err(err) => {
                warn!(error = %err, "sections fetch failed, using fallback section");
                let mut session = Self::from_section(api, fallback);
                session.prefetch_options().await;
                session
            }
        }
    }

    pub fn from_section(api: Arc<A>, section: FormSection) -> Self {
        let form = FormState::from_section(&section);
        FormSession {
            api,
            section,
            form,
            options: OptionStore::default(),
            otp: OtpFlow::default(),
        }
    }

    pub fn section(&self) -> &FormSection {
        &self.section
    }

    pub fn form(&self) -> &FormState {
        &self.form
    }

    pub fn otp(&self) -> &OtpFlow {
        &self.otp
    }

    /// Options currently showable for a dropdown: its inline list when the
    /// schema carries one, else whatever the resolver has cached.
    pub fn visible_options(&self, key: &str) -> Vec<Choice> {
        if let Some(field) = self.section.field(key)
            && !field.options.is_empty()
        {
            return field.options.clone();
        }
        self.options.get(key).map(<[Choice]>::to_vec).unwrap_or_default()
    }

    /// Fetch every parameter-free options source concurrently. Failures
    /// degrade to an empty list so the form still renders; each one is
    /// logged.
    pub async fn prefetch_options(&mut self) {
        let mut tasks: JoinSet<(String, Result<Vec<Choice>, ApiError>)> = JoinSet::new();
        for field in &self.section.fields {
            if field.kind != FieldKind::Dropdown || !field.options.is_empty() {
                continue;
            }
            let Some(source) = field.options_source.clone() else {
                continue;
            };
            if !placeholders(&source).is_empty() {
                continue;
            }
            let api = Arc::clone(&self.api);
            let key = field.key.clone();
            tasks.spawn(async move { (key, api.fetch_options(&source).await) });
        }
        while let Some(joined) = tasks.join_next().await {
            let Ok((key, outcome)) = joined else {
                continue;
            };
            match outcome {
                Ok(choices) => {
                    debug!(field = %key, count = choices.len(), "options resolved");
                    self.options.insert(key, choices);
                }
                Err(err) => {
                    warn!(field = %key, error = %err, "options fetch failed");
                    self.options.insert(key, Vec::new());
                }
            }
        }
    }

    /// Gate and resolve a dropdown on open. An unset dependency rejects the
    /// open with a validation message; a resolver failure is returned as-is
    /// so the renderer can offer a retry.
    pub async fn open_dropdown(&mut self, key: &str) -> Result<Vec<Choice>, DropdownError> {
        let Some(field) = self.section.field(key) else {
            return Err(DropdownError::Dependency(self.section.messages.required()));
        };
        if !field.options.is_empty() {
            return Ok(field.options.clone());
        }
        let Some(source) = field.options_source.clone() else {
            return Ok(Vec::new());
        };
        let params = self.param_values();
        let expanded = expand(&source, &params).map_err(|err| {
            let dependency = match &err {
                crate::resolve::ResolveError::MissingParam(name) => self
                    .section
                    .field(name)
                    .map(|dep| dep.label.clone())
                    .unwrap_or_else(|| name.clone()),
            };
            DropdownError::Dependency(self.section.messages.select_first(&dependency))
        })?;
        if let Some(cached) = self.options.get(key) {
            return Ok(cached.to_vec());
        }
        let choices = self.api.fetch_options(&expanded).await?;
        self.options.insert(key.to_string(), choices.clone());
        Ok(choices)
    }

    /// Select an option by index into `visible_options`. Downstream
    /// dependents are reset and their options re-resolved where possible.
    pub async fn select_option(&mut self, key: &str, index: usize) -> Result<()> {
        let choices = self.visible_options(key);
        let Some(choice) = choices.get(index).cloned() else {
            bail!("option index {index} out of range for field '{key}'");
        };
        let Some(field) = self.form.field_mut(key) else {
            bail!("unknown field '{key}'");
        };
        field.select(choice);
        self.reset_downstream(key);
        self.refresh_dependents(key).await;
        Ok(())
    }

    pub fn set_text(&mut self, key: &str, text: impl Into<String>) {
        if let Some(field) = self.form.field_mut(key) {
            field.set_text(text);
        }
    }

    pub fn set_toggle(&mut self, key: &str, flag: bool) {
        if let Some(field) = self.form.field_mut(key) {
            field.set_toggle(flag);
        }
    }

    pub fn set_date(&mut self, key: &str, day: u8, month: u8, year: u16) {
        if let Some(field) = self.form.field_mut(key) {
            field.set_date(day, month, year);
        }
    }

    /// The phone field a standalone `otp` field's Verify action targets.
    pub fn otp_target_key(&self) -> Option<String> {
        self.section.first_otp_phone().map(|field| field.key.clone())
    }

    /// Request an OTP for a phone field. Requires a full 10-digit value;
    /// anything less is a local validation message with no network call.
    pub async fn generate_otp(&mut self, key: &str) -> Result<String, String> {
        let messages = self.section.messages.clone();
        if self.otp.is_verified(key) {
            return Err(messages.otp_verified());
        }
        let digits = self
            .form
            .field(key)
            .map(|field| field.display_value())
            .unwrap_or_default();
        if digits.len() < PHONE_MAX_DIGITS {
            let message = messages.phone_invalid();
            if let Some(field) = self.form.field_mut(key) {
                field.set_error(message.clone());
            }
            return Err(message);
        }
        match self.api.send_otp(&digits).await {
            Ok(ticket) => {
                self.otp.mark_sent(key, ticket.otp_id, ticket.expires_in);
                Ok(messages.otp_sent())
            }
            Err(err) => {
                warn!(field = %key, error = %err, "send-otp failed");
                Err(err
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| messages.otp_send_failed()))
            }
        }
    }

    /// Verify the entered code for a phone field. Never touches the network
    /// without both an entered code and a stored `otp_id`.
    pub async fn verify_otp(&mut self, key: &str) -> Result<String, String> {
        let messages = self.section.messages.clone();
        if self.otp.is_verified(key) {
            return Ok(messages.otp_verified());
        }
        let Some(code) = self.form.otp_code_for(key) else {
            return Err(messages.otp_code_missing());
        };
        let Some(otp_id) = self.otp.phase(key).otp_id().map(str::to_string) else {
            return Err(messages.otp_not_generated());
        };
        match self.api.verify_otp(&otp_id, &code).await {
            Ok(()) => {
                self.otp.mark_verified(key);
                if let Some(field) = self.form.field_mut(key) {
                    field.clear_error();
                }
                Ok(messages.otp_verified())
            }
            Err(err) => {
                let message = verify_failure_message(&err, &messages);
                if let Some(field) = self.form.field_mut(key) {
                    field.set_error(message.clone());
                }
                Err(message)
            }
        }
    }

    /// Validate and upload a picked file, storing the returned URL as the
    /// field value. Type and size rejections never reach the network.
    pub async fn attach_file(&mut self, key: &str, file: LocalFile) -> Result<String, String> {
        let messages = self.section.messages.clone();
        let Some(descriptor) = self.section.field(key).cloned() else {
            return Err(messages.upload_failed());
        };
        if let Err(message) = validate_file(&file, &descriptor, &messages) {
            if let Some(field) = self.form.field_mut(key) {
                field.set_error(message.clone());
            }
            return Err(message);
        }
        if let Some(field) = self.form.field_mut(key) {
            field.set_picked_file(file.clone());
        }
        match self.api.upload_media(&file).await {
            Ok(url) => {
                if let Some(field) = self.form.field_mut(key) {
                    field.set_uploaded_url(url.clone());
                }
                Ok(url)
            }
            Err(err) => {
                warn!(field = %key, error = %err, "upload failed");
                let message = err
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| messages.upload_failed());
                if let Some(field) = self.form.field_mut(key) {
                    if let FieldValue::File(slot) = &mut field.value {
                        *slot = FileSlot::Empty;
                    }
                    field.set_error(message.clone());
                }
                Err(message)
            }
        }
    }

    /// Upload a gallery of images against one field's constraints. The field
    /// itself is untouched; the caller owns the gallery list and decides what
    /// to do with the per-file outcomes.
    pub async fn attach_images(&self, key: &str, files: &[LocalFile]) -> ImageUploadReport {
        let messages = &self.section.messages;
        let Some(descriptor) = self.section.field(key) else {
            return ImageUploadReport::default();
        };
        upload_images(self.api.as_ref(), files, descriptor, messages).await
    }

    /// Validate required fields and OTP gating, then POST the value map with
    /// transient OTP keys stripped. Backend or transport failures leave the
    /// form populated for a user-initiated retry.
    pub async fn proceed(&mut self, partner_id: &str) -> SubmitOutcome {
        let messages = self.section.messages.clone();
        let report = missing_required(&self.form, &messages);
        let mut errors = report.errors.clone();

        for field in &self.section.fields {
            if field.kind != FieldKind::Phone || !field.verify_otp {
                continue;
            }
            let filled = self
                .form
                .field(&field.key)
                .map(|state| state.is_present())
                .unwrap_or(false);
            if filled && !self.otp.is_verified(&field.key) {
                errors
                    .entry(field.key.clone())
                    .or_insert_with(|| messages.otp_required());
            }
        }

        if !errors.is_empty() {
            self.form.set_errors(&errors);
            let summary = if report.is_empty() {
                messages.otp_required()
            } else {
                summary_message(report.file_count, report.field_count)
            };
            return SubmitOutcome::Blocked { summary, errors };
        }

        let values = strip_transient(self.form.values());
        match self
            .api
            .submit_section(partner_id, &self.section.id, &values)
            .await
        {
            Ok(message) => {
                self.form.clear_errors();
                let message = if message.is_empty() {
                    messages.submit_success()
                } else {
                    message
                };
                SubmitOutcome::Submitted { message, values }
            }
            Err(err) => {
                warn!(section = %self.section.id, error = %err, "section submit failed");
                let message = err
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| messages.submit_failed());
                SubmitOutcome::Failed { message }
            }
        }
    }

    /// Clear the value and cached options of everything downstream of `key`.
    /// A selected city never survives a change of state.
    fn reset_downstream(&mut self, key: &str) {
        for dependent in downstream_of(&self.section.fields, key) {
            if let Some(field) = self.form.field_mut(&dependent) {
                field.clear_selection();
            }
            self.options.remove(&dependent);
        }
    }

    /// Re-resolve options for direct dependents whose parameters are now all
    /// available. Failures degrade to an empty list, logged.
    async fn refresh_dependents(&mut self, key: &str) {
        let params = self.param_values();
        for dependent in direct_dependents(&self.section.fields, key) {
            let Some(source) = self
                .section
                .field(&dependent)
                .and_then(|field| field.options_source.clone())
            else {
                continue;
            };
            let Ok(expanded) = expand(&source, &params) else {
                // Another parameter upstream is still unset; resolution waits
                // for it.
                continue;
            };
            match self.api.fetch_options(&expanded).await {
                Ok(choices) => self.options.insert(dependent, choices),
                Err(err) => {
                    warn!(field = %dependent, error = %err, "dependent options fetch failed");
                    self.options.insert(dependent, Vec::new());
                }
            }
        }
    }

    fn param_values(&self) -> IndexMap<String, String> {
        self.form
            .fields()
            .iter()
            .filter_map(|field| match field.submitted_value() {
                Value::String(text) if !text.is_empty() => {
                    Some((field.key().to_string(), text))
                }
                Value::Bool(flag) => Some((field.key().to_string(), flag.to_string())),
                _ => None,
            })
            .collect()
    }
}

fn pick_section(sections: Vec<FormSection>, section_id: Option<&str>) -> Result<FormSection> {
    match section_id {
        Some(id) => sections
            .into_iter()
            .find(|section| section.id == id)
            .with_context(|| format!("backend returned no section '{id}'")),
        None => sections
            .into_iter()
            .next()
            .context("backend returned no sections"),
    }
}
