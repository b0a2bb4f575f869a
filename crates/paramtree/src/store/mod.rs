//! Backing stores for parameters.
//!
//! Every backend exposes the same three primitives: put one parameter, delete
//! up to [`MAX_DELETE_BATCH`] parameters, and list one page of parameters
//! under a path. Pagination tokens are opaque outside the backend that
//! issued them.

use std::fmt;

use async_trait::async_trait;

use crate::error::{Error, Result};
use crate::path::ParameterPath;

pub mod local;
pub mod ssm;

pub use local::LocalStore;
pub use ssm::SsmStore;

/// Most names a single delete call may carry.
pub const MAX_DELETE_BATCH: usize = 10;

/// Which kind of backend a store is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Ssm,
    Local,
}

impl fmt::Display for StoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreBackend::Ssm => f.write_str("ssm"),
            StoreBackend::Local => f.write_str("local"),
        }
    }
}

/// A parameter as the store returns it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterRecord {
    pub name: String,
    pub value: String,
}

impl ParameterRecord {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Continuation token handed back by a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageToken(String);

impl PageToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// One page of a listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParameterPage {
    pub records: Vec<ParameterRecord>,
    /// `None` once the listing is exhausted.
    pub next_token: Option<PageToken>,
}

/// Primitive operations against a parameter store.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    /// Store one serialized value.
    async fn put_parameter(
        &self,
        name: &ParameterPath,
        value: &str,
        overwrite: bool,
        secure: bool,
    ) -> Result<()>;

    /// Delete up to [`MAX_DELETE_BATCH`] names. Missing names are not an error.
    async fn delete_parameters(&self, names: &[ParameterPath]) -> Result<()>;

    /// Fetch one page of parameters under `path`.
    async fn get_parameters_by_path(
        &self,
        path: &ParameterPath,
        recursive: bool,
        with_decryption: bool,
        next_token: Option<PageToken>,
    ) -> Result<ParameterPage>;

    fn backend(&self) -> StoreBackend;

    /// Whether values should be written encrypted when the caller has no preference.
    fn secure_by_default(&self) -> bool {
        false
    }
}

/// Fail fast on batches the backend would reject anyway.
pub(crate) fn check_batch(names: &[ParameterPath]) -> Result<()> {
    if names.len() > MAX_DELETE_BATCH {
        let first = names.first().map(ParameterPath::to_name).unwrap_or_default();
        return Err(Error::write(
            first,
            format!(
                "delete batch of {} exceeds the limit of {}",
                names.len(),
                MAX_DELETE_BATCH
            ),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_batch_limit() {
        let names: Vec<ParameterPath> = (0..11)
            .map(|i| ParameterPath::new(["cfg".to_string(), i.to_string()]).unwrap())
            .collect();
        assert!(check_batch(&names[..10]).is_ok());
        assert!(matches!(
            check_batch(&names),
            Err(Error::StoreWrite { .. })
        ));
    }
}
