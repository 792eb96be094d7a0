use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid auth header: {0}")]
    InvalidHeader(String),

    #[error("non-JSON response: HTTP {status}")]
    NonJson { status: u16, text: String },

    #[error("unexpected response: {0}")]
    Unexpected(String),
}

// ---------------------------------------------------------------------------
// Query-language request body
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct GraphqlRequest<'a> {
    pub query: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Value>,
}

impl<'a> GraphqlRequest<'a> {
    pub fn new(query: &'a str) -> Self {
        Self {
            query,
            variables: None,
        }
    }

    pub fn with_variables(mut self, variables: Value) -> Self {
        self.variables = Some(variables);
        self
    }
}
