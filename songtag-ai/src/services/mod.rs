//! Service modules for the tagging pipeline

pub mod batch_orchestrator;
pub mod file_scanner;
pub mod filename_normalizer;
pub mod inference_client;
pub mod reconciler;
pub mod tag_store;
pub mod transport;

pub use batch_orchestrator::{BatchOrchestrator, RunOutcome};
pub use file_scanner::{FileScanner, ScanError};
pub use filename_normalizer::{normalize, NormalizeMode};
pub use inference_client::{InferenceClient, InferenceOptions};
pub use reconciler::{compute_diff, Decision, Diff, FieldDiff, ReconcileError, Reconciler};
pub use tag_store::{tag_store_for, TagError, TagStore, TagStoreOptions, WriteOutcome};
pub use transport::{
    InferenceRequest, InferenceTransport, OllamaTransport, OpenAiTransport, TransportError,
};
