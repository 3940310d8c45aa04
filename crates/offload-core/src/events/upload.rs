//! Upload-intercepted event.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::types::id::{ResourceId, TenantId};

/// A file was uploaded and is now present in the local buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadEvent {
    /// Site that owns the upload.
    pub tenant_id: TenantId,
    /// Media object the file belongs to.
    pub resource_id: ResourceId,
    /// Absolute path of the original file.
    pub file_path: PathBuf,
    /// Derived files (resized renditions) generated from the original.
    #[serde(default)]
    pub variants: Vec<UploadVariant>,
}

/// A derived rendition of an uploaded resource.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadVariant {
    /// Rendition name as reported by the host (e.g. `"thumbnail"`).
    pub name: String,
    /// Absolute path of the rendition file.
    pub file_path: PathBuf,
}

impl UploadEvent {
    /// Create an event for a single file without variants.
    pub fn new(tenant_id: TenantId, resource_id: ResourceId, file_path: impl Into<PathBuf>) -> Self {
        Self {
            tenant_id,
            resource_id,
            file_path: file_path.into(),
            variants: Vec::new(),
        }
    }

    /// Attach a derived rendition.
    pub fn with_variant(mut self, name: impl Into<String>, file_path: impl Into<PathBuf>) -> Self {
        self.variants.push(UploadVariant {
            name: name.into(),
            file_path: file_path.into(),
        });
        self
    }

    /// Every file path carried by the event, original first.
    pub fn all_paths(&self) -> impl Iterator<Item = &PathBuf> {
        std::iter::once(&self.file_path).chain(self.variants.iter().map(|v| &v.file_path))
    }
}
