use crate::error::{ModelError, Result};
use serde::Serialize;

/// Normalized title extracted from a filename, used as the query key for
/// every data source.
///
/// Created once per scrape request and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct SearchTitle(String);

impl SearchTitle {
    pub fn new(title: impl Into<String>) -> Result<Self> {
        let title = title.into();
        if title.is_empty() {
            return Err(ModelError::EmptyTitle);
        }
        Ok(Self(title))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl AsRef<str> for SearchTitle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SearchTitle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
