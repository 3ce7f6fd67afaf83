use crate::types::{DocumentStatus, PhaseId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

/// Metadata for an uploaded file. The blob itself lives in the upload store
/// and is addressed by `path`; everything else treats the file as opaque.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub name: String,
    /// Path of the stored blob, relative to the data root.
    pub path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phase: Option<PhaseId>,
    pub uploaded_by: String,
    pub version: u32,
    pub status: DocumentStatus,
    pub created_at: DateTime<Utc>,
}

impl Document {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        uploaded_by: impl Into<String>,
        phase: Option<PhaseId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            path: path.into(),
            content_type: None,
            phase,
            uploaded_by: uploaded_by.into(),
            version: 1,
            status: DocumentStatus::Active,
            created_at: Utc::now(),
        }
    }

    pub fn deprecate(&mut self) {
        self.status = DocumentStatus::Deprecated;
    }
}

// ---------------------------------------------------------------------------
// List operations (operate on a phase's Vec<Document>)
// ---------------------------------------------------------------------------

/// Append a document to the list. If an active document with the same name
/// already exists, the new record continues its version sequence and the
/// prior one is marked deprecated.
pub fn add_versioned(documents: &mut Vec<Document>, mut document: Document) -> String {
    let prior_version = documents
        .iter()
        .filter(|d| d.name == document.name)
        .map(|d| d.version)
        .max();
    if let Some(v) = prior_version {
        document.version = v + 1;
        for d in documents.iter_mut() {
            if d.name == document.name && d.status == DocumentStatus::Active {
                d.deprecate();
            }
        }
    }
    let id = document.id.clone();
    documents.push(document);
    id
}

pub fn find<'a>(documents: &'a [Document], id: &str) -> Option<&'a Document> {
    documents.iter().find(|d| d.id == id)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
