//! Boundary between the discovery engine and the management API client

use thiserror::Error;

/// One raw object as returned by the management API, keyed by API field name
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Failure reported by a management API client
///
/// The engine only distinguishes "the object or collection does not exist"
/// from everything else. Retries, timeouts and authentication problems are
/// all folded into `Other` by the client.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("not found")]
    NotFound,

    #[error("{0}")]
    Other(String),
}

/// Read access to a hierarchical REST management API
pub trait ManagementApi {
    /// Fetch the records at `path` (relative to the API base path)
    ///
    /// A single-object path yields one record, a collection path yields one
    /// record per member.
    fn fetch(&self, path: &str) -> std::result::Result<Vec<Record>, FetchError>;
}

impl<T: ManagementApi + ?Sized> ManagementApi for &T {
    fn fetch(&self, path: &str) -> std::result::Result<Vec<Record>, FetchError> {
        (**self).fetch(path)
    }
}

impl<T: ManagementApi + ?Sized> ManagementApi for Box<T> {
    fn fetch(&self, path: &str) -> std::result::Result<Vec<Record>, FetchError> {
        (**self).fetch(path)
    }
}
