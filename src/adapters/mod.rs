/// External collaborator seams
///
/// The data layer never talks to the network or to a storage engine
/// directly; it goes through these traits:
/// - `HttpClient`: GET and JSON POST returning buffered responses
/// - `StorageAdapter`: async key-value store with change notification

// HTTP client trait and reqwest implementation
pub mod http;

// Key-value storage trait with in-memory and SQLite implementations
pub mod storage;

pub use http::{json_headers, Headers, HttpClient, HttpResponse, ReqwestHttpClient};
pub use storage::{MemoryStorage, SharedStorage, SqliteStorage, StorageAdapter, StorageEvent};
