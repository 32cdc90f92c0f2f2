use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Transport,
    Precondition,
    Data,
    Persistence,
}

/// Failure of one job. `Display` is the short message shown to the user; the
/// technical detail travels in `source`/`detail` and goes to the log.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("{message}")]
    Transport {
        message: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("{0}")]
    Precondition(String),

    #[error("{message}")]
    Data { message: String, detail: String },

    #[error("{message}")]
    Persistence {
        message: String,
        #[source]
        source: anyhow::Error,
    },
}

impl GenerationError {
    pub fn transport(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Transport {
            message: message.into(),
            source,
        }
    }

    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    pub fn data(message: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::Data {
            message: message.into(),
            detail: detail.into(),
        }
    }

    pub fn persistence(message: impl Into<String>, source: anyhow::Error) -> Self {
        Self::Persistence {
            message: message.into(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Precondition(_) => ErrorKind::Precondition,
            Self::Data { .. } => ErrorKind::Data,
            Self::Persistence { .. } => ErrorKind::Persistence,
        }
    }

    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Full detail for logs, including the context chain.
    pub fn log_detail(&self) -> String {
        match self {
            Self::Transport { message, source } | Self::Persistence { message, source } => {
                format!("{message}: {source:#}")
            }
            Self::Data { message, detail } => format!("{message}: {detail}"),
            Self::Precondition(message) => message.clone(),
        }
    }
}
