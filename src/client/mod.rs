//! Data-access helpers for programs that talk to the shift API: a remote
//! backend, a local mirror kept in a pluggable key/value store, and the
//! repository that decides which one answers.

mod port;
mod remote;
mod repository;

pub use port::{FileStorage, MemoryStorage, Mirror, StoragePort};
pub use remote::RemoteApi;
pub use repository::{MirroredRepository, RecordSource};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("server answered {0}")]
    Status(reqwest::StatusCode),
    #[error("local storage failed: {0}")]
    Storage(#[from] std::io::Error),
    #[error("invalid stored data: {0}")]
    Decode(#[from] serde_json::Error),
}
