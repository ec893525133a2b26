//! The module contains the errors the engine can return.
//!
//! Absence of a permission is never an error (see [`access::is_granted`]),
//! and lookups report a missing record with `None`. What is left is:
//!
//! - validation failures the user can correct ([`InvalidAmount`],
//!   [`InsufficientFunds`], [`ExistingKey`], ...), see [`EngineError::field`];
//! - precondition failures such as deleting a referenced category ([`InUse`]);
//! - store failures, propagated unchanged ([`Database`]).
//!
//!  [`access::is_granted`]: crate::access::is_granted
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`InsufficientFunds`]: EngineError::InsufficientFunds
//!  [`ExistingKey`]: EngineError::ExistingKey
//!  [`InUse`]: EngineError::InUse
//!  [`Database`]: EngineError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("\"{0}\" key not found!")]
    KeyNotFound(String),
    #[error("\"{0}\" already present!")]
    ExistingKey(String),
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),
    #[error("Insufficient funds: {0}")]
    InsufficientFunds(String),
    #[error("Invalid name: {0}")]
    InvalidName(String),
    #[error("Invalid email: {0}")]
    InvalidEmail(String),
    #[error("Invalid role: {0}")]
    InvalidRole(String),
    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
    #[error("Invalid id: {0}")]
    InvalidId(String),
    #[error("Still in use: {0}")]
    InUse(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Credential error: {0}")]
    Credential(String),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Name of the input field a validation error belongs to, if any.
    ///
    /// Form-driven callers attach the message to this field and redisplay
    /// the input instead of failing the request.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            Self::InvalidAmount(_) | Self::InsufficientFunds(_) => Some("amount"),
            Self::ExistingKey(_) | Self::InvalidName(_) => Some("title"),
            Self::InvalidEmail(_) => Some("email"),
            Self::InvalidRole(_) => Some("roles"),
            Self::InvalidFilter(_) => Some("date_to"),
            _ => None,
        }
    }

    pub fn is_forbidden(&self) -> bool {
        matches!(self, Self::Forbidden(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::KeyNotFound(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::KeyNotFound(a), Self::KeyNotFound(b)) => a == b,
            (Self::ExistingKey(a), Self::ExistingKey(b)) => a == b,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::InsufficientFunds(a), Self::InsufficientFunds(b)) => a == b,
            (Self::InvalidName(a), Self::InvalidName(b)) => a == b,
            (Self::InvalidEmail(a), Self::InvalidEmail(b)) => a == b,
            (Self::InvalidRole(a), Self::InvalidRole(b)) => a == b,
            (Self::InvalidFilter(a), Self::InvalidFilter(b)) => a == b,
            (Self::InvalidId(a), Self::InvalidId(b)) => a == b,
            (Self::InUse(a), Self::InUse(b)) => a == b,
            (Self::Forbidden(a), Self::Forbidden(b)) => a == b,
            (Self::Credential(a), Self::Credential(b)) => a == b,
            (Self::InvalidConfig(a), Self::InvalidConfig(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
