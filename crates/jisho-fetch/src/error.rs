use jisho_core::FailureKind;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("No release asset matches {prefix}*{suffix}")]
    NotFound { prefix: String, suffix: String },

    #[error("Archive error: {0}")]
    Archive(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FetchError {
    pub fn kind(&self) -> FailureKind {
        match self {
            FetchError::Network(_) | FetchError::Http { .. } | FetchError::NotFound { .. } => {
                FailureKind::Network
            }
            FetchError::Archive(_) => FailureKind::Archive,
            FetchError::Io(_) => FailureKind::Io,
        }
    }

    pub(crate) fn archive(e: impl std::fmt::Display) -> Self {
        FetchError::Archive(e.to_string())
    }
}
