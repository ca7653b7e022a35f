use thiserror::Error;

#[derive(Debug, Error)]
pub enum AnalyzeError {
    /// The provider has no record for the symbol.
    #[error("{0}")]
    NotFound(String),

    /// Provider or network failure, including malformed responses.
    #[error(transparent)]
    Upstream(#[from] anyhow::Error),

    #[error("{0}")]
    InvalidArgument(String),
}

pub type Result<T> = std::result::Result<T, AnalyzeError>;

impl AnalyzeError {
    pub fn not_found(ticker: &str) -> Self {
        Self::NotFound(format!("Stock not found: {ticker}"))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}
