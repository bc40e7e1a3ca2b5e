use crate::overlay::template::TemplateError;

pub type ReelResult<T> = Result<T, ReelError>;

#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("server error: {0}")]
    Server(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn server(msg: impl Into<String>) -> Self {
        Self::Server(msg.into())
    }
}

impl From<std::io::Error> for ReelError {
    fn from(e: std::io::Error) -> Self {
        Self::Other(anyhow::Error::new(e))
    }
}
