use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    #[error("invalid target: {0}")]
    InvalidTarget(String),
    #[error("unsupported event kind: {0}")]
    UnsupportedEventKind(String),
    #[error("html parse error: {0}")]
    HtmlParse(String),
    #[error("selector not found: {0}")]
    SelectorNotFound(String),
    #[error("unsupported selector: {0}")]
    UnsupportedSelector(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("handler error: {0}")]
    Handler(String),
}

impl Error {
    pub fn handler(msg: impl Into<String>) -> Self {
        Self::Handler(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_includes_payload() {
        let err = Error::UnsupportedEventKind("random".into());
        assert_eq!(err.to_string(), "unsupported event kind: random");

        let err = Error::InvalidTarget("null".into());
        assert_eq!(err.to_string(), "invalid target: null");
    }
}
