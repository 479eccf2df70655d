use tracing::warn;

use crate::client::OnboardingApi;
use crate::domain::{FieldDescriptor, SectionMessages};
use crate::form::LocalFile;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Validate a picked file against the field's constraints. Type first, then
/// size; both rejections happen before any network call.
pub fn validate_file(
    file: &LocalFile,
    descriptor: &FieldDescriptor,
    messages: &SectionMessages,
) -> Result<(), String> {
    let file_type = file.file_type().unwrap_or_default();
    if !descriptor
        .file_types
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(&file_type))
    {
        return Err(messages.upload_type_rejected(&descriptor.file_types));
    }
    if file.size_bytes > descriptor.max_size_mb.saturating_mul(BYTES_PER_MB) {
        return Err(messages.upload_size_rejected(descriptor.max_size_mb));
    }
    Ok(())
}

/// Outcome of a sequential multi-image upload. Partial success is expected:
/// failed images are reported alongside the URLs that made it.
#[derive(Debug, Clone, Default)]
pub struct ImageUploadReport {
    pub uploaded: Vec<String>,
    pub failed: Vec<(String, String)>,
}

impl ImageUploadReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Upload a batch of images one by one, deliberately serialized. Used by
/// item-image screens that manage their own gallery list.
pub async fn upload_images<A: OnboardingApi + ?Sized>(
    api: &A,
    files: &[LocalFile],
    descriptor: &FieldDescriptor,
    messages: &SectionMessages,
) -> ImageUploadReport {
    let mut report = ImageUploadReport::default();
    for file in files {
        if let Err(message) = validate_file(file, descriptor, messages) {
            report.failed.push((file.name.clone(), message));
            continue;
        }
        match api.upload_media(file).await {
            Ok(url) => report.uploaded.push(url),
            Err(err) => {
                warn!(file = %file.name, error = %err, "image upload failed");
                let message = err
                    .backend_message()
                    .map(str::to_string)
                    .unwrap_or_else(|| messages.upload_failed());
                report.failed.push((file.name.clone(), message));
            }
        }
    }
    report
}
