//! Batch workflow: storage boundaries and the return pipeline

pub mod pipeline;
pub mod storage;

pub use pipeline::{
    finalize, CompletedReturn, DocumentIssue, DocumentIssueKind, PreparedReturn, ReturnPipeline,
};
pub use storage::{
    DocumentRef, DocumentRegistry, FilesystemObjectStore, InMemoryDocumentRegistry, ObjectStore,
    RegistryError, StoreError,
};
