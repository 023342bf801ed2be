pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to open image {path}: {source}")]
    Asset {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid PNG file: {path}")]
    InvalidPng { path: String },

    #[error("invalid SVG image {path}: {message}")]
    InvalidSvg { path: String, message: String },

    #[error("unknown icon file format `{format}` for {path} (accepted formats: svg, png)")]
    UnsupportedIcon { path: String, format: String },

    #[error("orientation {orientation} is not supported: {reason}")]
    UnsupportedOrientation {
        orientation: i32,
        reason: &'static str,
    },

    #[error(transparent)]
    Config(#[from] timeclad_core::Error),

    #[error("layout JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
