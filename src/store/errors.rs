use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("invalid extension ID format: {0}. Must be 32 characters (a-p only)")]
    InvalidExtensionId(String),
    #[error("not a valid Chrome Web Store URL: {0}")]
    InvalidStoreUrl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(String),
    #[error("HTTP error {0}")]
    Status(u16),
    #[error("no content returned, the extension may not be available for download")]
    NoContent,
    #[error("received an HTML page instead of a CRX file, the extension may not be available")]
    HtmlResponse,
    #[error("package too large: {size} bytes exceeds the {limit} byte limit")]
    TooLarge { size: u64, limit: u64 },
}
