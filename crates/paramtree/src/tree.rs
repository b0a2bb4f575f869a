//! Tree-level operations: write, read and delete whole configuration subtrees.
//!
//! Every store call goes through the [`RateLimiter`]. Leaf writes and delete
//! batches for one call are launched together and all allowed to settle; a
//! failure fails the call but nothing already applied is rolled back.
//! Listings are paged strictly in sequence.

use std::sync::Arc;

use futures::future::join_all;
use serde::Serialize;
use serde_json::Value;

use crate::codec;
use crate::error::{Error, Result};
use crate::limiter::RateLimiter;
use crate::path::ParameterPath;
use crate::store::{LocalStore, ParameterRecord, ParameterStore, SsmStore, MAX_DELETE_BATCH};
use paramconf::{BackendKind, ParamConfig};

/// What a `write` issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct WriteSummary {
    /// Leaves stored.
    pub put: usize,
    /// Empty-string leaves removed.
    pub deleted: usize,
}

/// What a `delete` issued.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DeleteSummary {
    pub deleted: usize,
    pub batches: usize,
}

enum LeafOp {
    Put { path: ParameterPath, encoded: String },
    Delete { path: ParameterPath },
}

/// Orchestrates tree operations against one store.
#[derive(Clone)]
pub struct ParameterTree {
    store: Arc<dyn ParameterStore>,
    limiter: RateLimiter,
    secure: bool,
}

impl ParameterTree {
    pub fn new(store: Arc<dyn ParameterStore>, limiter: RateLimiter) -> Self {
        let secure = store.secure_by_default();
        Self {
            store,
            limiter,
            secure,
        }
    }

    /// Override whether values are written encrypted.
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Build the configured backend with its admission rate.
    pub async fn from_config(config: &ParamConfig) -> Result<Self> {
        config.validate()?;
        let limiter = RateLimiter::per_second(config.requests_per_second());

        let tree = match config.backend {
            BackendKind::Ssm => {
                let store = SsmStore::from_config(&config.ssm).await;
                Self::new(Arc::new(store), limiter).with_secure(config.ssm.secure)
            }
            BackendKind::Local => {
                let store = LocalStore::open(&config.local.db_path)?
                    .with_page_size(config.local.page_size as usize);
                Self::new(Arc::new(store), limiter)
            }
        };

        tracing::debug!(
            backend = %tree.store.backend(),
            requests_per_second = tree.limiter.requests_per_second(),
            secure = tree.secure,
            "parameter tree ready"
        );
        Ok(tree)
    }

    pub fn store(&self) -> &Arc<dyn ParameterStore> {
        &self.store
    }

    pub fn limiter(&self) -> &RateLimiter {
        &self.limiter
    }

    /// Store every leaf of `tree` under `/{prefix}`.
    ///
    /// Values are stored JSON-encoded. An empty-string leaf deletes its key
    /// instead. All paths are validated before anything is sent. The root
    /// must be a mapping or sequence: a bare scalar would land on `/{prefix}`
    /// itself, which `read` and `delete` never list.
    #[tracing::instrument(skip_all, fields(prefix = %prefix))]
    pub async fn write(&self, prefix: &str, tree: &Value) -> Result<WriteSummary> {
        let root = ParameterPath::parse(prefix)?;
        if !(tree.is_object() || tree.is_array()) {
            return Err(Error::malformed(
                root.to_name(),
                "tree root must be a mapping or sequence",
            ));
        }

        let mut ops = Vec::new();
        for (components, value) in codec::flatten(tree, root.components()) {
            let path = ParameterPath::new(components)?;
            if codec::is_deletion(&value) {
                ops.push(LeafOp::Delete { path });
            } else {
                ops.push(LeafOp::Put {
                    path,
                    encoded: value.to_string(),
                });
            }
        }

        let mut summary = WriteSummary::default();
        for op in &ops {
            match op {
                LeafOp::Put { .. } => summary.put += 1,
                LeafOp::Delete { .. } => summary.deleted += 1,
            }
        }

        let results = join_all(ops.iter().map(|op| self.limiter.admit(|| self.apply(op)))).await;
        settle(results, "write")?;

        tracing::info!(put = summary.put, deleted = summary.deleted, "wrote tree");
        Ok(summary)
    }

    /// Reassemble the tree stored under `/{prefix}`.
    ///
    /// Records that cannot be decoded are logged and left out; they never fail
    /// the read. A prefix with nothing under it reads as an empty mapping.
    #[tracing::instrument(skip_all, fields(prefix = %prefix))]
    pub async fn read(&self, prefix: &str) -> Result<Value> {
        let root = ParameterPath::parse(prefix)?;
        let records = self.list_all(&root, true).await?;

        let total = records.len();
        let mut pairs = Vec::with_capacity(total);
        for record in records {
            match decode(&root, record) {
                Ok(pair) => pairs.push(pair),
                Err(err) => tracing::warn!(error = %err, "skipping unreadable parameter"),
            }
        }

        tracing::info!(records = total, kept = pairs.len(), "read tree");
        Ok(codec::treeify(pairs))
    }

    /// Remove every parameter under `/{prefix}`.
    #[tracing::instrument(skip_all, fields(prefix = %prefix))]
    pub async fn delete(&self, prefix: &str) -> Result<DeleteSummary> {
        let root = ParameterPath::parse(prefix)?;
        let records = self.list_all(&root, false).await?;

        let names: Vec<ParameterPath> = records
            .iter()
            .filter_map(|record| match ParameterPath::parse(&record.name) {
                Ok(path) => Some(path),
                Err(err) => {
                    tracing::warn!(error = %err, "skipping parameter with unusable name");
                    None
                }
            })
            .collect();

        let batches: Vec<&[ParameterPath]> = names.chunks(MAX_DELETE_BATCH).collect();
        let summary = DeleteSummary {
            deleted: names.len(),
            batches: batches.len(),
        };

        let results = join_all(
            batches
                .iter()
                .map(|batch| self.limiter.admit(|| self.store.delete_parameters(batch))),
        )
        .await;
        settle(results, "delete")?;

        tracing::info!(
            deleted = summary.deleted,
            batches = summary.batches,
            "deleted tree"
        );
        Ok(summary)
    }

    async fn apply(&self, op: &LeafOp) -> Result<()> {
        match op {
            LeafOp::Put { path, encoded } => {
                self.store.put_parameter(path, encoded, true, self.secure).await
            }
            LeafOp::Delete { path } => {
                self.store.delete_parameters(std::slice::from_ref(path)).await
            }
        }
    }

    /// Follow continuation tokens until the listing is exhausted.
    async fn list_all(
        &self,
        root: &ParameterPath,
        with_decryption: bool,
    ) -> Result<Vec<ParameterRecord>> {
        let mut records = Vec::new();
        let mut token = None;
        let mut pages = 0usize;

        loop {
            let current = token.take();
            let page = self
                .limiter
                .admit(|| {
                    self.store
                        .get_parameters_by_path(root, true, with_decryption, current)
                })
                .await?;
            pages += 1;
            records.extend(page.records);

            match page.next_token {
                Some(next) => token = Some(next),
                None => break,
            }
        }

        tracing::debug!(pages, records = records.len(), "listing complete");
        Ok(records)
    }
}

/// Turn a stored record into a relative path and decoded value.
fn decode(root: &ParameterPath, record: ParameterRecord) -> Result<(Vec<String>, Value)> {
    let path = ParameterPath::parse(&record.name)?;
    let relative = path
        .strip_prefix(root)
        .ok_or_else(|| {
            Error::MalformedPath {
                name: record.name.clone(),
                reason: format!("not below {}", root),
            }
        })?
        .to_vec();
    let value = serde_json::from_str(&record.value).map_err(|source| Error::Decode {
        name: record.name,
        source,
    })?;
    Ok((relative, value))
}

/// Wait-for-all semantics: report the first failure after every sibling settled.
fn settle(results: Vec<Result<()>>, action: &str) -> Result<()> {
    let failed = results.iter().filter(|r| r.is_err()).count();
    if failed > 0 {
        tracing::warn!(
            failed,
            total = results.len(),
            "{} partially applied; successful requests were not rolled back",
            action
        );
    }
    results.into_iter().collect()
}
