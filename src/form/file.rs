/// A locally-picked asset before upload. Picking itself is delegated to the
/// host (camera, gallery, document picker); the engine only validates and
/// uploads what it is handed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalFile {
    pub uri: String,
    pub name: String,
    pub mime: Option<String>,
    pub size_bytes: u64,
}

impl LocalFile {
    pub fn new(uri: impl Into<String>, name: impl Into<String>, size_bytes: u64) -> Self {
        LocalFile {
            uri: uri.into(),
            name: name.into(),
            mime: None,
            size_bytes,
        }
    }

    pub fn with_mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Lowercased file type, derived from the name's extension and falling
    /// back to the mime subtype.
    pub fn file_type(&self) -> Option<String> {
        let from_name = self
            .name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| !ext.is_empty());
        from_name.or_else(|| {
            self.mime
                .as_deref()
                .and_then(|mime| mime.rsplit_once('/'))
                .map(|(_, subtype)| subtype.to_ascii_lowercase())
        })
    }
}

/// Lifecycle of a file field's value: empty, picked locally (not yet
/// submittable), or uploaded and replaced by the backend URL.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum FileSlot {
    #[default]
    Empty,
    Picked(LocalFile),
    Uploaded(String),
}

impl FileSlot {
    pub fn url(&self) -> Option<&str> {
        match self {
            FileSlot::Uploaded(url) if !url.is_empty() => Some(url),
            _ => None,
        }
    }

    pub fn is_uploaded(&self) -> bool {
        self.url().is_some()
    }
}
