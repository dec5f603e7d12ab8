mod axum;
pub use axum::*;

pub mod dto;
pub mod error;

#[cfg(test)]
mod test;

/// Freshness token a client presented through `If-None-Match`, if any.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IfNoneMatch(pub Option<String>);
