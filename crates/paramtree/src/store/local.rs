//! Embedded SQLite parameter store for offline use and tests.
//!
//! Mirrors the cloud store's contract: same page shape, same delete batch cap,
//! missing names tolerated on delete. Connections are opened per call with WAL
//! enabled, and all SQLite work runs on the blocking pool.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::{Connection, OpenFlags};

use super::{check_batch, PageToken, ParameterPage, ParameterRecord, ParameterStore, StoreBackend};
use crate::error::{Error, Result};
use crate::path::ParameterPath;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS parameters (
    name TEXT PRIMARY KEY,
    value TEXT NOT NULL,
    kind TEXT NOT NULL DEFAULT 'String',
    version INTEGER NOT NULL DEFAULT 1,
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);
"#;

const DEFAULT_PAGE_SIZE: usize = 10;

/// SQLite-backed [`ParameterStore`].
#[derive(Debug, Clone)]
pub struct LocalStore {
    path: PathBuf,
    page_size: usize,
}

impl LocalStore {
    /// Open database at path, creating it and its parent directory if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    Error::Config(format!(
                        "failed to create database directory {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }

        let store = Self {
            path,
            page_size: DEFAULT_PAGE_SIZE,
        };
        let conn = open_connection(&store.path).map_err(|e| store.config_error(e))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| store.config_error(e))?;
        Ok(store)
    }

    /// Create a database in a fresh temporary file. Each call is independent.
    pub fn temporary() -> Result<Self> {
        use std::sync::atomic::{AtomicU64, Ordering};
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let unique_id = COUNTER.fetch_add(1, Ordering::SeqCst);
        let db_name = format!("paramtree_{}_{}.db", std::process::id(), unique_id);
        Self::open(std::env::temp_dir().join(db_name))
    }

    /// Rows returned per listing page.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Look up a single stored value.
    pub async fn get_parameter(&self, name: &ParameterPath) -> Result<Option<String>> {
        let key = name.to_name();
        self.blocking(move |conn| {
            let result = conn.query_row(
                "SELECT value FROM parameters WHERE name = ?1",
                [&key],
                |row| row.get::<_, String>(0),
            );
            match result {
                Ok(value) => Ok(Some(value)),
                Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                Err(e) => Err(e),
            }
        })
        .await
        .map_err(|message| Error::read(name.to_name(), message))
    }

    fn config_error(&self, err: rusqlite::Error) -> Error {
        Error::Config(format!(
            "failed to initialize {}: {}",
            self.path.display(),
            err
        ))
    }

    async fn blocking<T, F>(&self, work: F) -> std::result::Result<T, String>
    where
        T: Send + 'static,
        F: FnOnce(Connection) -> rusqlite::Result<T> + Send + 'static,
    {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let conn = open_connection(&path)?;
            work(conn)
        })
        .await
        .map_err(|e| format!("database task failed: {}", e))?
        .map_err(|e| e.to_string())
    }
}

fn open_connection(path: &Path) -> rusqlite::Result<Connection> {
    let conn = Connection::open_with_flags(
        path,
        OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )?;

    conn.execute_batch(
        "
        PRAGMA journal_mode = WAL;
        PRAGMA busy_timeout = 5000;
    ",
    )?;

    Ok(conn)
}

#[async_trait]
impl ParameterStore for LocalStore {
    #[tracing::instrument(skip_all, fields(name = %name))]
    async fn put_parameter(
        &self,
        name: &ParameterPath,
        value: &str,
        overwrite: bool,
        secure: bool,
    ) -> Result<()> {
        let key = name.to_name();
        let value = value.to_string();
        let kind = if secure { "SecureString" } else { "String" };

        let inserted = self
            .blocking(move |conn| {
                let sql = if overwrite {
                    "INSERT INTO parameters (name, value, kind) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO UPDATE SET
                        value = excluded.value,
                        kind = excluded.kind,
                        version = version + 1,
                        updated_at = datetime('now')"
                } else {
                    "INSERT INTO parameters (name, value, kind) VALUES (?1, ?2, ?3)
                     ON CONFLICT(name) DO NOTHING"
                };
                conn.execute(sql, (&key, &value, kind))
            })
            .await
            .map_err(|message| Error::write(name.to_name(), message))?;

        if inserted == 0 {
            return Err(Error::write(
                name.to_name(),
                "ParameterAlreadyExists: overwrite not requested",
            ));
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(count = names.len()))]
    async fn delete_parameters(&self, names: &[ParameterPath]) -> Result<()> {
        check_batch(names)?;
        if names.is_empty() {
            return Ok(());
        }

        let keys: Vec<String> = names.iter().map(ParameterPath::to_name).collect();
        let first = keys[0].clone();
        let removed = self
            .blocking(move |mut conn| {
                let tx = conn.transaction()?;
                let mut removed = 0;
                {
                    let mut stmt = tx.prepare("DELETE FROM parameters WHERE name = ?1")?;
                    for key in &keys {
                        removed += stmt.execute([key])?;
                    }
                }
                tx.commit()?;
                Ok(removed)
            })
            .await
            .map_err(|message| Error::write(first, message))?;

        tracing::debug!(requested = names.len(), removed, "deleted local parameters");
        Ok(())
    }

    #[tracing::instrument(skip_all, fields(path = %path, recursive))]
    async fn get_parameters_by_path(
        &self,
        path: &ParameterPath,
        recursive: bool,
        // nothing is encrypted at rest locally
        _with_decryption: bool,
        next_token: Option<PageToken>,
    ) -> Result<ParameterPage> {

        let prefix = format!("{}/", path.to_name());
        let after = next_token.map(|t| t.as_str().to_string()).unwrap_or_default();
        let page_size = self.page_size;

        let mut records = self
            .blocking(move |conn| {
                let sql = if recursive {
                    "SELECT name, value FROM parameters
                     WHERE substr(name, 1, length(?1)) = ?1 AND name > ?2
                     ORDER BY name LIMIT ?3"
                } else {
                    "SELECT name, value FROM parameters
                     WHERE substr(name, 1, length(?1)) = ?1 AND name > ?2
                       AND instr(substr(name, length(?1) + 1), '/') = 0
                     ORDER BY name LIMIT ?3"
                };
                let mut stmt = conn.prepare(sql)?;
                let rows = stmt.query_map((&prefix, &after, (page_size + 1) as i64), |row| {
                    Ok(ParameterRecord {
                        name: row.get(0)?,
                        value: row.get(1)?,
                    })
                })?;
                rows.collect::<rusqlite::Result<Vec<_>>>()
            })
            .await
            .map_err(|message| Error::read(path.to_name(), message))?;

        let next_token = if records.len() > self.page_size {
            records.truncate(self.page_size);
            records.last().map(|r| PageToken::new(r.name.clone()))
        } else {
            None
        };

        tracing::debug!(
            records = records.len(),
            more = next_token.is_some(),
            "listed local parameters"
        );
        Ok(ParameterPage {
            records,
            next_token,
        })
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Local
    }
}
