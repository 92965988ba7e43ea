// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Input source descriptors and the records they produce
//!
//! All three source kinds normalize to the same `(key, value)` [`Record`]
//! shape. Sources are paged: each read returns a batch and an opaque
//! cursor for the next one.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default page size for search and query sources
pub const DEFAULT_PAGE_SIZE: usize = 1000;

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// Where a job's input comes from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InputSource {
    /// A line- or record-delimited file
    File {
        path: PathBuf,
        #[serde(default)]
        format: FileFormat,
    },
    /// A saved search, retrieved page by page
    Search {
        search_id: String,
        #[serde(default = "default_page_size")]
        page_size: usize,
    },
    /// A structured query object
    Query {
        query: String,
        #[serde(default = "default_page_size")]
        page_size: usize,
    },
}

impl InputSource {
    /// Short name of the source kind, for logs and errors
    pub fn kind(&self) -> &'static str {
        match self {
            InputSource::File { .. } => "file",
            InputSource::Search { .. } => "search",
            InputSource::Query { .. } => "query",
        }
    }

    /// Check the descriptor is well formed
    pub fn validate(&self) -> Result<(), String> {
        match self {
            InputSource::File { path, .. } if path.as_os_str().is_empty() => {
                Err("file input requires a path".to_string())
            }
            InputSource::Search { search_id, .. } if search_id.trim().is_empty() => {
                Err("search input requires a search_id".to_string())
            }
            InputSource::Query { query, .. } if query.trim().is_empty() => {
                Err("query input requires a query".to_string())
            }
            InputSource::Search { page_size: 0, .. } | InputSource::Query { page_size: 0, .. } => {
                Err("page_size must be at least 1".to_string())
            }
            _ => Ok(()),
        }
    }
}

/// How a file input is split into records
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileFormat {
    /// One record per line; the key is the 0-based line number
    #[default]
    Lines,
    /// One `key<TAB>value` record per line
    KeyValue,
}

/// A single key/value record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    pub value: String,
}

impl Record {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Opaque position within a paged source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cursor(pub String);

/// One page of records and the cursor for the next page, if any
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatch {
    pub records: Vec<Record>,
    pub next: Option<Cursor>,
}
