//! In-memory store that records every call, for asserting request patterns.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use paramtree::{
    Error, PageToken, ParameterPage, ParameterPath, ParameterRecord, ParameterStore, Result,
    StoreBackend, MAX_DELETE_BATCH,
};
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Put {
        name: String,
        value: String,
        overwrite: bool,
        secure: bool,
    },
    Delete {
        names: Vec<String>,
    },
    List {
        path: String,
        recursive: bool,
        with_decryption: bool,
        token: Option<String>,
    },
}

#[derive(Default)]
pub struct RecordingStore {
    calls: Mutex<Vec<(Instant, Call)>>,
    // keyed by the token the page is requested with
    pages: Mutex<HashMap<Option<String>, ParameterPage>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `records` in pages of ten, chained by tokens "page-1", "page-2", ...
    pub fn with_records(self, records: Vec<ParameterRecord>) -> Self {
        let chunks: Vec<Vec<ParameterRecord>> =
            records.chunks(10).map(|chunk| chunk.to_vec()).collect();
        let count = chunks.len();
        let mut pages = Vec::new();
        for (index, chunk) in chunks.into_iter().enumerate() {
            let next = if index + 1 < count {
                Some(format!("page-{}", index + 1))
            } else {
                None
            };
            pages.push(chunk_page(chunk, next));
        }
        self.with_pages(pages)
    }

    /// Serve pages in order; page N is requested with page N-1's next token.
    pub fn with_pages(self, pages: Vec<ParameterPage>) -> Self {
        {
            let mut served = self.pages.lock().unwrap();
            let mut token: Option<String> = None;
            for page in pages {
                let next = page.next_token.as_ref().map(|t| t.as_str().to_string());
                served.insert(token.clone(), page);
                token = next;
            }
        }
        self
    }

    /// Any put or delete touching `name` fails.
    pub fn fail_on(self, name: &str) -> Self {
        self.failing.lock().unwrap().insert(name.to_string());
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .map(|(_, call)| call.clone())
            .collect()
    }

    pub fn timed_calls(&self) -> Vec<(Instant, Call)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn puts(&self) -> Vec<(String, String)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Put { name, value, .. } => Some((name, value)),
                _ => None,
            })
            .collect()
    }

    pub fn deletes(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Delete { names } => Some(names),
                _ => None,
            })
            .collect()
    }

    pub fn lists(&self) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|call| matches!(call, Call::List { .. }))
            .collect()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push((Instant::now(), call));
    }

    fn fails(&self, name: &str) -> bool {
        self.failing.lock().unwrap().contains(name)
    }
}

pub fn chunk_page(records: Vec<ParameterRecord>, next: Option<String>) -> ParameterPage {
    ParameterPage {
        records,
        next_token: next.map(PageToken::new),
    }
}

pub fn records(count: usize) -> Vec<ParameterRecord> {
    (0..count)
        .map(|i| ParameterRecord::new(format!("/cfg/key{:02}", i), i.to_string()))
        .collect()
}

#[async_trait]
impl ParameterStore for RecordingStore {
    async fn put_parameter(
        &self,
        name: &ParameterPath,
        value: &str,
        overwrite: bool,
        secure: bool,
    ) -> Result<()> {
        let name = name.to_name();
        self.record(Call::Put {
            name: name.clone(),
            value: value.to_string(),
            overwrite,
            secure,
        });
        if self.fails(&name) {
            return Err(Error::StoreWrite {
                name,
                message: "AccessDeniedException".to_string(),
            });
        }
        Ok(())
    }

    async fn delete_parameters(&self, names: &[ParameterPath]) -> Result<()> {
        assert!(names.len() <= MAX_DELETE_BATCH, "batch too large: {}", names.len());
        let names: Vec<String> = names.iter().map(ParameterPath::to_name).collect();
        self.record(Call::Delete {
            names: names.clone(),
        });
        if let Some(name) = names.iter().find(|name| self.fails(name)) {
            return Err(Error::StoreWrite {
                name: name.clone(),
                message: "InternalServerError".to_string(),
            });
        }
        Ok(())
    }

    async fn get_parameters_by_path(
        &self,
        path: &ParameterPath,
        recursive: bool,
        with_decryption: bool,
        next_token: Option<PageToken>,
    ) -> Result<ParameterPage> {
        let token = next_token.map(|t| t.as_str().to_string());
        self.record(Call::List {
            path: path.to_name(),
            recursive,
            with_decryption,
            token: token.clone(),
        });
        Ok(self
            .pages
            .lock()
            .unwrap()
            .get(&token)
            .cloned()
            .unwrap_or_default())
    }

    fn backend(&self) -> StoreBackend {
        StoreBackend::Local
    }
}
