use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("http error")]
    Http(#[from] reqwest::Error),

    #[error("node responded with {status} to {url}")]
    Status { status: StatusCode, url: String },

    #[error("serde_json error")]
    SerdeJson(#[from] serde_json::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
