//! Core error type.
//!
//! Sub-crates define their own error enums; this one only covers parsing of
//! the small value types owned by `hl-core`.

use thiserror::Error;

use crate::ProductId;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("parse error: {0}")]
    Parse(String),

    #[error("product {0} has a zero count")]
    ZeroCount(ProductId),

    #[error("unit count for product {0} overflows")]
    CountOverflow(ProductId),
}

pub type CoreResult<T> = Result<T, CoreError>;
