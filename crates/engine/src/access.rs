//! Authorization decisions.
//!
//! [`is_granted`] answers whether an actor may perform a [`Permission`] on a
//! [`Subject`]. It is a pure function: no store access, no errors. A denial
//! is `false`; callers that prefer `?` use [`deny_unless_granted`].
//!
//! Rules per subject:
//!
//! | subject             | VIEW                                   | EDIT / DELETE     | LIST  |
//! |---------------------|----------------------------------------|-------------------|-------|
//! | Category, Tag       | author, admin, or author is admin-only | author, admin     | no    |
//! | Wallet, Report, Operation | owner/author                     | owner/author      | no    |
//! | User                | admin, self                            | admin, self       | admin |
//!
//! Without an actor every check is denied.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    Category, EngineError, Operation, Report, ResultEngine, Role, RoleSet, Tag, User, Wallet,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Permission {
    View,
    Edit,
    Delete,
    List,
}

impl Permission {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::View => "VIEW",
            Self::Edit => "EDIT",
            Self::Delete => "DELETE",
            Self::List => "LIST",
        }
    }
}

/// The authenticated identity a decision is made for.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub roles: RoleSet,
}

impl Actor {
    pub fn new(id: Uuid, roles: RoleSet) -> Self {
        Self { id, roles }
    }

    pub fn is_admin(&self) -> bool {
        self.roles.contains(Role::Admin)
    }
}

impl From<&User> for Actor {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.roles.clone())
    }
}

/// The record a permission is checked against, reduced to what the rules
/// need.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Subject {
    Category { author_id: Uuid, author_roles: RoleSet },
    Tag { author_id: Uuid, author_roles: RoleSet },
    Wallet { owner_id: Uuid },
    Report { author_id: Uuid },
    Operation { author_id: Uuid },
    User { id: Uuid },
}

impl Subject {
    /// `author` must be the user referenced by `category.author_id`.
    pub fn category(category: &Category, author: &User) -> Self {
        debug_assert_eq!(category.author_id, author.id);
        Self::Category {
            author_id: category.author_id,
            author_roles: author.roles.clone(),
        }
    }

    /// `author` must be the user referenced by `tag.author_id`.
    pub fn tag(tag: &Tag, author: &User) -> Self {
        debug_assert_eq!(tag.author_id, author.id);
        Self::Tag {
            author_id: tag.author_id,
            author_roles: author.roles.clone(),
        }
    }

    pub fn wallet(wallet: &Wallet) -> Self {
        Self::Wallet {
            owner_id: wallet.owner_id,
        }
    }

    pub fn report(report: &Report) -> Self {
        Self::Report {
            author_id: report.author_id,
        }
    }

    pub fn operation(operation: &Operation) -> Self {
        Self::Operation {
            author_id: operation.author_id,
        }
    }

    pub fn user(user: &User) -> Self {
        Self::User { id: user.id }
    }

    fn kind(&self) -> &'static str {
        match self {
            Self::Category { .. } => "category",
            Self::Tag { .. } => "tag",
            Self::Wallet { .. } => "wallet",
            Self::Report { .. } => "report",
            Self::Operation { .. } => "operation",
            Self::User { .. } => "user",
        }
    }
}

/// Decide whether `actor` may perform `permission` on `subject`.
pub fn is_granted(permission: Permission, subject: &Subject, actor: Option<&Actor>) -> bool {
    let Some(actor) = actor else {
        return false;
    };

    match (subject, permission) {
        (
            Subject::Category {
                author_id,
                author_roles,
            }
            | Subject::Tag {
                author_id,
                author_roles,
            },
            Permission::View,
        ) => {
            actor.id == *author_id
                || actor.is_admin()
                || author_roles.stored_is_exactly(&[Role::Admin])
        }
        (
            Subject::Category { author_id, .. } | Subject::Tag { author_id, .. },
            Permission::Edit | Permission::Delete,
        ) => actor.id == *author_id || actor.is_admin(),
        (
            Subject::Wallet {
                owner_id: author_id,
            }
            | Subject::Report { author_id }
            | Subject::Operation { author_id },
            Permission::View | Permission::Edit | Permission::Delete,
        ) => actor.id == *author_id,
        (Subject::User { id }, Permission::View | Permission::Edit | Permission::Delete) => {
            actor.is_admin() || actor.id == *id
        }
        (Subject::User { .. }, Permission::List) => actor.is_admin(),
        _ => false,
    }
}

/// [`is_granted`] for callers that turn a denial into a 403.
pub fn deny_unless_granted(
    permission: Permission,
    subject: &Subject,
    actor: Option<&Actor>,
) -> ResultEngine<()> {
    if is_granted(permission, subject, actor) {
        return Ok(());
    }
    tracing::debug!(
        permission = permission.as_str(),
        subject = subject.kind(),
        actor = ?actor.map(|a| a.id),
        "access denied"
    );
    Err(EngineError::Forbidden(format!(
        "{} on {} denied",
        permission.as_str(),
        subject.kind()
    )))
}
