use thiserror::Error;

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(Debug, Error)]
pub enum PlotError {
    #[error("invalid viewport size: width={width}, height={height}")]
    InvalidViewport { width: u32, height: u32 },

    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Plugin configuration that the host should have rejected up front.
    #[error("invalid plugin configuration: {0}")]
    InvalidConfig(String),

    #[error("no session data stored under `{key}`")]
    MissingSessionData { key: String },

    #[error("image export failed: {0}")]
    Export(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}
