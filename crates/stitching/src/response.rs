//! The GraphQL response shape: data plus accumulated field errors.

use async_graphql_parser::Pos;
use serde::Serialize;

/// One step of a response path, either an object key or a list index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PathSegment {
    /// A response key (field alias or name).
    Field(String),
    /// An index into a list value.
    Index(usize),
}

/// An error that occurred while resolving one field, positioned in the
/// incoming document and in the response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerError {
    /// The error message.
    pub message: String,
    /// Locations in the source document, if known.
    #[serde(skip_serializing_if = "Vec::is_empty", serialize_with = "serialize_locations")]
    pub locations: Vec<Pos>,
    /// The response path at which the error occurred.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathSegment>,
}

impl ServerError {
    /// Create a server error at an optional source position.
    pub fn new(message: impl Into<String>, pos: Option<Pos>) -> Self {
        Self {
            message: message.into(),
            locations: pos.into_iter().collect(),
            path: Vec::new(),
        }
    }

    /// The same error, rooted at `path`.
    #[must_use]
    pub fn with_path(mut self, path: Vec<PathSegment>) -> Self {
        self.path = path;
        self
    }

    /// Re-root this error under a caller's path, keeping everything below the
    /// upstream operation's root field. Used when forwarding upstream errors
    /// into the outer response.
    #[must_use]
    pub fn prefixed_with(mut self, prefix: &[PathSegment]) -> Self {
        let tail = if self.path.is_empty() {
            Vec::new()
        } else {
            self.path.split_off(1)
        };
        self.path = prefix.iter().cloned().chain(tail).collect();
        self
    }
}

fn serialize_locations<S>(locations: &[Pos], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    #[derive(Serialize)]
    struct Location {
        line: usize,
        column: usize,
    }
    serializer.collect_seq(locations.iter().map(|pos| Location {
        line: pos.line,
        column: pos.column,
    }))
}

/// The result of executing one operation.
#[derive(Debug, Serialize)]
pub struct Response {
    /// The response data. `Null` when execution failed before producing any.
    pub data: serde_json::Value,
    /// Field errors collected during execution, in resolution order.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<ServerError>,
}

impl Response {
    /// A response carrying data and no errors.
    pub fn new(data: serde_json::Value) -> Self {
        Self {
            data,
            errors: Vec::new(),
        }
    }

    /// A response that failed before any field resolved.
    pub fn from_error(error: ServerError) -> Self {
        Self {
            data: serde_json::Value::Null,
            errors: vec![error],
        }
    }

    /// True if any field error was recorded.
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// The response in the standard GraphQL wire shape, for assertions and
    /// transports.
    pub fn into_json(self) -> serde_json::Value {
        serde_json::to_value(self).expect("response serialization is infallible")
    }
}
