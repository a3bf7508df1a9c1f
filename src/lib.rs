// Follow Reconciler - Core Library
// Exposes all modules for use in CLI, API server, and tests

pub mod config;
pub mod db;
pub mod error;
pub mod export;
pub mod model;
pub mod parser;
pub mod reconciliation;
pub mod remote;
pub mod session;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::Config;
pub use db::{
    FollowStore, MemoryStore, SqliteStore, StoredData,
    compute_fingerprint, setup_database, STORAGE_KEY,
};
pub use error::{AnalysisError, InputFile};
pub use export::{export_csv, write_csv};
pub use model::{filter_users, FollowData, FollowSummary, ListKind, User};
pub use parser::{
    decode_payload, detect_shape, normalize, parse_followers_file, parse_following_file,
    ExportShape, Probe, Role,
};
pub use reconciliation::{Partitions, ReconciliationEngine};
pub use remote::{RemoteCounts, RemoteFetcher, RemoteResponse, RemoteUser, SessionCredential};
pub use session::FollowSession;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
