//! Pennywise engine.
//!
//! Entities, the authorization rules that guard them, the operation filter
//! and paginator used by every listing, and the [`Engine`] services that
//! tie them to the database.

pub use access::{Actor, Permission, Subject, deny_unless_granted, is_granted};
pub use categories::Category;
pub use error::EngineError;
pub use filter::OperationFilter;
pub use hasher::CredentialHasher;
pub use money::Money;
pub use operations::{Operation, OperationView};
pub use ops::{
    CategoryInput, Engine, EngineBuilder, OperationInput, ReportInput, TagInput, UserInput,
    WalletInput,
};
pub use pagination::{PAGE_SIZE, Page, page_number};
pub use reports::Report;
pub use roles::{Role, RoleSet};
pub use tags::Tag;
pub use users::User;
pub use wallets::{Wallet, WalletKind};

pub mod access;
mod categories;
mod error;
mod filter;
mod hasher;
mod money;
mod operation_tags;
mod operations;
mod ops;
mod pagination;
mod reports;
mod roles;
mod tags;
mod users;
mod util;
mod wallets;

type ResultEngine<T> = Result<T, EngineError>;
