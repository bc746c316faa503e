use thiserror::Error;

/// Terminal failures of a single decode call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("not a CRX container and no zip signature found")]
    NotAContainer,
    #[error("unexpected CRX format version: {0}")]
    UnsupportedVersion(u8),
    #[error("CRX header truncated: need {needed} bytes, have {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("CRX file appears to be corrupted: payload offset {offset} is past the end ({len} bytes)")]
    Corrupted { offset: usize, len: usize },
    #[error("CRX containers nested deeper than {limit} levels")]
    TooDeeplyNested { limit: usize },
}
