//! Store configuration trees in a flat, path-addressed parameter store.
//!
//! A nested document such as
//!
//! ```json
//! {"db": {"host": "localhost", "port": 5432}, "debug": false}
//! ```
//!
//! written under the prefix `app` becomes three parameters:
//! `/app/db/host = "localhost"`, `/app/db/port = 5432`, `/app/debug = false`.
//! Values are stored as JSON so a number and its string form stay distinct.
//! Writing an empty string to a key deletes it.
//!
//! # Components
//!
//! - [`path`] / [`codec`]: names ⇄ path components, trees ⇄ leaves.
//! - [`limiter`]: sliding-window admission for store calls.
//! - [`store`]: the [`ParameterStore`] trait, with [`SsmStore`] (cloud) and
//!   [`LocalStore`] (SQLite) backends.
//! - [`tree`]: [`ParameterTree`], which ties them together.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use paramtree::{LocalStore, ParameterTree, RateLimiter};
//!
//! # async fn demo() -> paramtree::Result<()> {
//! let store = LocalStore::open("/tmp/params.db")?;
//! let tree = ParameterTree::new(Arc::new(store), RateLimiter::per_second(1000));
//!
//! tree.write("app", &serde_json::json!({"db": {"port": 5432}})).await?;
//! let config = tree.read("app").await?;
//! assert_eq!(config["db"]["port"], 5432);
//! # Ok(())
//! # }
//! ```

pub mod codec;
pub mod error;
pub mod limiter;
pub mod path;
pub mod store;
pub mod telemetry;
pub mod tree;

pub use codec::{flatten, treeify};
pub use error::{Error, Result};
pub use limiter::RateLimiter;
pub use path::ParameterPath;
pub use store::{
    LocalStore, PageToken, ParameterPage, ParameterRecord, ParameterStore, SsmStore,
    StoreBackend, MAX_DELETE_BATCH,
};
pub use tree::{DeleteSummary, ParameterTree, WriteSummary};
