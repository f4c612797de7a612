//! Multipart uploads with progress reporting
//!
//! The file body is streamed in chunks; each chunk pulled by the transport
//! advances `loaded`. Progress therefore tracks what hyper actually consumed,
//! not what was queued.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use bytes::Bytes;
use futures_util::StreamExt;
use reqwest::multipart::{Form, Part};

use crate::error::ApiError;

const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Bytes sent so far out of the file size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}

impl UploadProgress {
    /// Completed fraction in `0.0..=1.0`. An empty file is complete.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            (self.loaded as f64 / self.total as f64).min(1.0)
        }
    }
}

/// Progress callback. Called from the transport task, keep it cheap.
pub type ProgressFn = Arc<dyn Fn(UploadProgress) + Send + Sync>;

/// A file plus extra text fields, sent as `multipart/form-data`.
///
/// Cloneable so a request can be replayed after a token refresh; the replay
/// restarts progress from zero.
#[derive(Clone)]
pub struct Upload {
    field: String,
    file_name: String,
    mime: Option<String>,
    bytes: Bytes,
    fields: Vec<(String, String)>,
    progress: Option<ProgressFn>,
    chunk_size: usize,
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("field", &self.field)
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .field("fields", &self.fields)
            .finish()
    }
}

impl Upload {
    pub fn new(field: impl Into<String>, file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        let file_name = file_name.into();
        let mime = guess_mime(&file_name).map(str::to_owned);
        Self {
            field: field.into(),
            file_name,
            mime,
            bytes: bytes.into(),
            fields: Vec::new(),
            progress: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Read a file from disk into an upload.
    pub async fn from_path(field: impl Into<String>, path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(field, file_name, bytes))
    }

    pub fn mime(mut self, mime: impl Into<String>) -> Self {
        self.mime = Some(mime.into());
        self
    }

    /// Add a plain text form field next to the file.
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn on_progress(mut self, callback: impl Fn(UploadProgress) + Send + Sync + 'static) -> Self {
        self.progress = Some(Arc::new(callback));
        self
    }

    pub fn chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size.max(1);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Build a fresh form for one attempt.
    pub(crate) fn to_form(&self) -> Result<Form, ApiError> {
        let total = self.bytes.len() as u64;
        let chunks: Vec<Result<Bytes, std::io::Error>> = (0..self.bytes.len())
            .step_by(self.chunk_size)
            .map(|start| {
                let end = (start + self.chunk_size).min(self.bytes.len());
                Ok(self.bytes.slice(start..end))
            })
            .collect();

        if total == 0 {
            if let Some(callback) = &self.progress {
                callback(UploadProgress { loaded: 0, total });
            }
        }

        let progress = self.progress.clone();
        let mut loaded = 0u64;
        let stream = futures_util::stream::iter(chunks).inspect(move |chunk| {
            if let Ok(chunk) = chunk {
                loaded += chunk.len() as u64;
                if let Some(callback) = &progress {
                    callback(UploadProgress { loaded, total });
                }
            }
        });

        let mut part = Part::stream_with_length(reqwest::Body::wrap_stream(stream), total)
            .file_name(self.file_name.clone());
        if let Some(mime) = &self.mime {
            part = part
                .mime_str(mime)
                .map_err(|e| ApiError::local(format!("invalid mime type {mime}: {e}")))?;
        }

        let mut form = Form::new();
        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }
        Ok(form.part(self.field.clone(), part))
    }
}

/// Image types the console uploads; anything else goes out untyped.
fn guess_mime(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "pdf" => Some("application/pdf"),
        _ => None,
    }
}
