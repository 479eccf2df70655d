use indexmap::IndexMap;
use serde_json::Value;

use crate::domain::{FieldKind, SectionMessages};
use crate::form::FormState;

/// What `proceed` hands back to the caller.
#[derive(Debug, Clone)]
pub enum SubmitOutcome {
    /// Backend accepted the section; `values` is exactly what was posted.
    Submitted {
        message: String,
        values: IndexMap<String, Value>,
    },
    /// Client-side validation blocked the submit; no POST was issued.
    Blocked {
        summary: String,
        errors: IndexMap<String, String>,
    },
    /// The POST happened and failed; the form stays populated for a retry.
    Failed { message: String },
}

#[derive(Debug, Clone, Default)]
pub struct MissingReport {
    pub errors: IndexMap<String, String>,
    pub file_count: usize,
    pub field_count: usize,
}

impl MissingReport {
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Required-field sweep over the whole form. Toggles count once defined
/// (false included); file fields count only with an uploaded URL.
pub fn missing_required(form: &FormState, messages: &SectionMessages) -> MissingReport {
    let mut report = MissingReport::default();
    for field in form.fields() {
        if !field.descriptor.required || field.is_present() {
            continue;
        }
        if field.descriptor.kind == FieldKind::File {
            report.file_count += 1;
        } else {
            report.field_count += 1;
        }
        report
            .errors
            .insert(field.key().to_string(), messages.required());
    }
    report
}

/// One toast line summarizing what is missing, differentiating documents
/// from plain fields.
pub fn summary_message(file_count: usize, field_count: usize) -> String {
    match (file_count, field_count) {
        (0, fields) => format!("Please fill {fields} field(s)"),
        (files, 0) => format!("Please upload {files} document(s)"),
        (files, fields) => {
            format!("Please upload {files} document(s) and fill {fields} field(s)")
        }
    }
}
