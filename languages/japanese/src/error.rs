use jisho_core::FailureKind;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl LoadError {
    pub fn kind(&self) -> FailureKind {
        match self {
            LoadError::FileNotFound(_) | LoadError::IoError(_) => FailureKind::Io,
            LoadError::InvalidFormat(_) | LoadError::ParseError(_) => FailureKind::Parse,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Dictionary is not ready: {0}")]
    NotReady(String),
}

impl StoreError {
    pub fn kind(&self) -> FailureKind {
        match self {
            StoreError::Load(e) => e.kind(),
            StoreError::Io(_) => FailureKind::Io,
            StoreError::Database(_) | StoreError::Serialize(_) | StoreError::NotReady(_) => {
                FailureKind::Store
            }
        }
    }

    pub fn is_not_ready(&self) -> bool {
        matches!(self, StoreError::NotReady(_))
    }
}
