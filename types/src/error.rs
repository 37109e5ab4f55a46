//! Parse errors for the fundamental types.

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypesError {
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("invalid field element: {0}")]
    InvalidFieldElement(String),

    #[error("empty key id")]
    EmptyKeyId,

    #[error("unknown fee disposition: {0}")]
    UnknownFeeDisposition(String),
}
