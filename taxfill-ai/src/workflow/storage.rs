//! Document storage boundaries
//!
//! The core never authenticates users or owns files. It asks a
//! `DocumentRegistry` which requested documents belong to the owner, then
//! fetches their bytes from an `ObjectStore`. Reference implementations
//! back both with the local filesystem and memory.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::debug;

// ============================================================================
// Object store
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("Object not found: {0}")]
    NotFound(String),

    #[error("Transient storage error: {0}")]
    Transient(String),
}

/// Raw bytes plus MIME type for a location token
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn fetch(&self, location: &str) -> Result<(Vec<u8>, String), StoreError>;
}

/// Object store rooted at a local folder
///
/// Location tokens are paths relative to the root. Anything resolving
/// outside the root reads as not found.
pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, location: &str) -> Option<PathBuf> {
        let relative = Path::new(location.trim());
        let mut resolved = self.root.clone();
        for component in relative.components() {
            match component {
                Component::Normal(part) => resolved.push(part),
                Component::CurDir => {}
                Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
            }
        }
        (resolved != self.root).then_some(resolved)
    }
}

/// MIME type from a file extension, for the types the extractor handles
pub fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let mime = match ext.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "json" => "application/json",
        _ => return None,
    };
    Some(mime)
}

#[async_trait]
impl ObjectStore for FilesystemObjectStore {
    async fn fetch(&self, location: &str) -> Result<(Vec<u8>, String), StoreError> {
        let path = self
            .resolve(location)
            .ok_or_else(|| StoreError::NotFound(location.to_string()))?;

        // Symlinks may still point outside the root
        let canonical_root = tokio::fs::canonicalize(&self.root)
            .await
            .map_err(|e| StoreError::Transient(format!("storage root unavailable: {}", e)))?;
        let canonical = match tokio::fs::canonicalize(&path).await {
            Ok(p) => p,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(location.to_string()));
            }
            Err(e) => return Err(StoreError::Transient(e.to_string())),
        };
        if !canonical.starts_with(&canonical_root) {
            return Err(StoreError::NotFound(location.to_string()));
        }

        let bytes = match tokio::fs::read(&canonical).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(location.to_string()));
            }
            Err(e) => return Err(StoreError::Transient(e.to_string())),
        };

        let mime = mime_from_extension(&canonical)
            .map(str::to_string)
            .or_else(|| infer::get(&bytes).map(|k| k.mime_type().to_string()))
            .unwrap_or_default();

        debug!(location = %location, bytes = bytes.len(), mime = %mime, "Fetched object");
        Ok((bytes, mime))
    }
}

// ============================================================================
// Document registry
// ============================================================================

/// A document the registry knows about
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub owner: String,
    /// Object store location token
    pub location: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("Registry unavailable: {0}")]
    Unavailable(String),
}

/// Authorization boundary
///
/// Implementations must only return documents owned by `owner`; ids they do
/// not return are treated as not found or not authorized.
#[async_trait]
pub trait DocumentRegistry: Send + Sync {
    async fn authorized_documents(
        &self,
        owner: &str,
        ids: &[String],
    ) -> Result<Vec<DocumentRef>, RegistryError>;
}

/// Owner → documents, held in memory
#[derive(Debug, Default)]
pub struct InMemoryDocumentRegistry {
    documents: HashMap<String, Vec<DocumentRef>>,
}

impl InMemoryDocumentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, document: DocumentRef) {
        self.documents
            .entry(document.owner.clone())
            .or_default()
            .push(document);
    }

    pub fn with_document(
        mut self,
        owner: impl Into<String>,
        id: impl Into<String>,
        location: impl Into<String>,
    ) -> Self {
        self.register(DocumentRef {
            id: id.into(),
            owner: owner.into(),
            location: location.into(),
        });
        self
    }

    /// Registry where each location is its own id, all owned by `owner`
    pub fn for_locations(owner: &str, locations: &[String]) -> Self {
        locations.iter().fold(Self::new(), |registry, location| {
            registry.with_document(owner, location.clone(), location.clone())
        })
    }
}

#[async_trait]
impl DocumentRegistry for InMemoryDocumentRegistry {
    async fn authorized_documents(
        &self,
        owner: &str,
        ids: &[String],
    ) -> Result<Vec<DocumentRef>, RegistryError> {
        let owned = self.documents.get(owner).map(Vec::as_slice).unwrap_or_default();
        Ok(owned
            .iter()
            .filter(|doc| ids.contains(&doc.id))
            .cloned()
            .collect())
    }
}
