use thiserror::Error;

/// Per-file failure. The scanner catches these and records the file as
/// skipped; they never abort a scan.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("could not determine firmware dialect")]
    UnknownDialect,

    /// A version-2 file whose firmware block cannot be excised.
    #[error("firmware version block is missing its closing compatibility tag")]
    MalformedVersionBlock,

    #[error("malformed document: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("unknown root element '{root}' (was expecting 'song', 'sound', or 'kit')")]
    UnknownRoot { root: String },

    #[error("unknown instrument type '{tag}' in song '{song}'")]
    UnknownInstrument { tag: String, song: String },

    #[error("firmware version {version} is not supported for {kind}s")]
    UnsupportedFirmware { version: String, kind: &'static str },

    #[error("firmware version {version} is not supported")]
    UnsupportedVersion { version: String },

    #[error("missing {field} on {context}")]
    MissingField { field: &'static str, context: String },

    #[error("invalid number in {field} on {context}: '{value}'")]
    InvalidNumber {
        field: &'static str,
        value: String,
        context: String,
    },

    #[error("invalid fixed-point value '{value}'")]
    InvalidFixedPoint { value: String },

    #[error("could not read file: {0}")]
    Unreadable(#[from] std::io::Error),
}

impl ParseError {
    pub fn missing(field: &'static str, context: impl Into<String>) -> Self {
        ParseError::MissingField {
            field,
            context: context.into(),
        }
    }

    /// Appends the owning instrument to a structural error's context, so
    /// errors bubbling out of an embedded instrument name their container.
    pub(crate) fn within(self, owner: &str) -> Self {
        match self {
            ParseError::MissingField { field, context } => ParseError::MissingField {
                field,
                context: format!("{context} in {owner}"),
            },
            ParseError::InvalidNumber {
                field,
                value,
                context,
            } => ParseError::InvalidNumber {
                field,
                value,
                context: format!("{context} in {owner}"),
            },
            other => other,
        }
    }
}

/// Scan-level failure. Aborts the whole scan before or during the walk;
/// per-file parse problems are never reported through this type.
#[derive(Debug, Error)]
pub enum ScanError {
    #[error("permission to read the folder tree was denied")]
    PermissionDenied,

    #[error("failed to list folder '{path}': {source}")]
    Folder {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
