use thiserror::Error;

#[derive(Error, Debug)]
pub enum DnaError {
    #[error("Unable to decode image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("Malformed model response: {0}")]
    ModelResponse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, DnaError>;
