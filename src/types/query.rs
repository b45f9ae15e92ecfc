//! Mango query descriptors and pagination metadata.

use serde::Serialize;

/// Body of a `_find` request.
///
/// The selector is passed through untouched. `bookmark` is rewritten by the
/// cursor after every page and is omitted from the wire while empty.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct QueryDescriptor {
    pub selector: serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fields: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub bookmark: String,
    #[serde(rename = "use_index", skip_serializing_if = "Option::is_none")]
    pub index: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_stats: Option<bool>,
}

impl QueryDescriptor {
    pub fn new(selector: serde_json::Value) -> Self {
        Self {
            selector,
            fields: None,
            limit: None,
            bookmark: String::new(),
            index: None,
            execution_stats: None,
        }
    }

    pub fn with_fields(mut self, fields: Option<Vec<String>>) -> Self {
        self.fields = fields.filter(|f| !f.is_empty());
        self
    }

    /// Apply caller options on top of the selector and projection.
    pub fn with_options(mut self, options: &FindOptions) -> Self {
        self.limit = options.limit;
        self.index = options.index.clone();
        self.execution_stats = options.execution_stats.then_some(true);
        if let Some(bookmark) = &options.bookmark {
            self.bookmark = bookmark.clone();
        }
        self
    }
}

/// Options for `Database::find`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    /// Maximum number of documents per page.
    pub limit: Option<u32>,
    /// Resume a previous query from this bookmark.
    pub bookmark: Option<String>,
    /// Index hint, `"design_doc"` or `"design_doc/index_name"`.
    pub index: Option<String>,
    /// Ask the server for execution statistics.
    pub execution_stats: bool,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn bookmark<S: Into<String>>(mut self, bookmark: S) -> Self {
        self.bookmark = Some(bookmark.into());
        self
    }

    pub fn use_index<S: Into<String>>(mut self, index: S) -> Self {
        self.index = Some(index.into());
        self
    }

    pub fn execution_stats(mut self, enabled: bool) -> Self {
        self.execution_stats = enabled;
        self
    }
}

/// Metadata of the page currently buffered by a cursor.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryMeta {
    /// Position after the last buffered document. Always populated.
    pub bookmark: String,
    /// Number of documents in the current page, counted from the array.
    pub documents: usize,
    /// Server warning, e.g. when no index matched the selector.
    pub warning: Option<String>,
    /// Raw `execution_stats` object, present when statistics were requested.
    pub execution_stats: Option<serde_json::Map<String, serde_json::Value>>,
}
