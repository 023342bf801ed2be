pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid date `{value}`: expected year[.month[.day]]")]
    InvalidDate { value: String },

    #[error("invalid color `{value}`: expected #rgb, #rrggbb or none")]
    InvalidColor { value: String },

    #[error("invalid config setting for option {option}: `{value}`")]
    InvalidOption { option: String, value: String },

    #[error("invalid entry at line {line} ({what}): {message}")]
    InvalidRecord {
        line: usize,
        what: String,
        message: String,
    },

    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn io(path: impl AsRef<std::path::Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }
}
