use std::fmt::{self, Debug, Display, Formatter};

/// An error raised by a resolver or by the engine while resolving a single
/// field. It is attached to the response as a [`ServerError`](crate::response::ServerError)
/// once the engine knows the field's position and response path.
#[derive(Clone, PartialEq, Eq)]
pub struct Error {
    /// The error message.
    pub message: String,
}

impl Error {
    /// Create an error from the given error message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl Debug for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Error").field("message", &self.message).finish()
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Self::new(value.to_string())
    }
}

impl From<std::fmt::Error> for Error {
    fn from(value: std::fmt::Error) -> Self {
        Self::new(value.to_string())
    }
}

/// An alias for `Result<T, Error>`.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// A fatal error surfaced by [`merge_schemas`](crate::merge_schemas). Merge
/// errors abort the merge; nothing is partially stitched.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    /// An SDL contribution did not parse.
    #[error("failed to parse SDL contribution #{index}: {message}")]
    SdlParse {
        /// Position of the contribution in the input order.
        index: usize,
        /// The parser's message.
        message: String,
    },

    /// An `extend` declaration targets a type no contribution introduced.
    #[error("type extension targets unknown type `{type_name}`")]
    DanglingExtension {
        /// The extension's target type name.
        type_name: String,
    },

    /// A link resolver was bound to a type that does not exist in the merged
    /// type map.
    #[error("link resolver bound to unknown type `{type_name}`")]
    UnknownLinkType {
        /// The type the operator named.
        type_name: String,
    },

    /// A link resolver was bound to a field that does not exist on its type.
    #[error("link resolver bound to unknown field `{type_name}.{field_name}`")]
    UnknownLinkField {
        /// The type the operator named.
        type_name: String,
        /// The field the operator named.
        field_name: String,
    },

    /// The fragment annotation of a link resolver did not parse, or its type
    /// condition names a type absent from the merged schema.
    #[error("invalid fragment on link resolver `{type_name}.{field_name}`: {message}")]
    InvalidLinkFragment {
        /// The type the resolver is bound to.
        type_name: String,
        /// The field the resolver is bound to.
        field_name: String,
        /// What went wrong.
        message: String,
    },

    /// No contribution provided a query root, so the merged schema would not
    /// be executable.
    #[error("no contribution provides a query root type")]
    MissingQueryRoot,
}

/// A fatal error from [`Schema::build`](crate::schema::Schema::build).
#[derive(Debug, thiserror::Error)]
pub enum SchemaBuildError {
    /// The SDL did not parse.
    #[error("failed to parse schema SDL: {0}")]
    Parse(String),

    /// `extend` declarations are only meaningful as merge contributions.
    #[error("type extensions are not supported in a standalone schema (`extend type {type_name}`)")]
    UnexpectedExtension {
        /// The extension's target.
        type_name: String,
    },

    /// The SDL defines the same type twice.
    #[error("type `{type_name}` is defined twice")]
    DuplicateType {
        /// The repeated type name.
        type_name: String,
    },

    /// A resolver was registered for a type the SDL does not define.
    #[error("resolver registered for unknown type `{type_name}`")]
    UnknownType {
        /// The type the resolver names.
        type_name: String,
    },

    /// A resolver was registered for a field the SDL does not define.
    #[error("resolver registered for unknown field `{type_name}.{field_name}`")]
    UnknownField {
        /// The type the resolver names.
        type_name: String,
        /// The field the resolver names.
        field_name: String,
    },

    /// The SDL names a root operation type it never defines.
    #[error("schema names `{type_name}` as the {operation} root, but never defines it")]
    MissingRoot {
        /// The missing type.
        type_name: String,
        /// "query" or "mutation".
        operation: &'static str,
    },
}
