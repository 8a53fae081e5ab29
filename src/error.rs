/// All errors the essay pipeline can report.
#[derive(Debug, thiserror::Error)]
pub enum EssayError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Network error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Font error: {0}")]
    Font(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Malformed AI response: {0}")]
    AiResponse(String),

    #[error("No essay text has been written")]
    EmptyEssay,

    #[error("Requester is not an admin")]
    Unauthorized,
}

pub type Result<T> = std::result::Result<T, EssayError>;
