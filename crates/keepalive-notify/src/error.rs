//! Notification delivery errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("invalid mail address: {0}")]
    Address(#[from] lettre::address::AddressError),

    #[error("failed to build message: {0}")]
    Build(#[from] lettre::error::Error),

    #[error("smtp error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("delivery failed: {0}")]
    Delivery(String),
}
