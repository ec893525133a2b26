//! User roles.
//!
//! Only the elevated roles are stored. Every user implicitly holds
//! [`Role::User`]; [`RoleSet::effective`] adds it at read time and
//! [`RoleSet::to_stored_json`] never writes it.

use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "ROLE_USER")]
    User,
    #[serde(rename = "ROLE_ADMIN")]
    Admin,
    #[serde(rename = "ROLE_SUPER_ADMIN")]
    SuperAdmin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "ROLE_USER",
            Self::Admin => "ROLE_ADMIN",
            Self::SuperAdmin => "ROLE_SUPER_ADMIN",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for Role {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ROLE_USER" | "USER" => Ok(Self::User),
            "ROLE_ADMIN" | "ADMIN" => Ok(Self::Admin),
            "ROLE_SUPER_ADMIN" | "SUPER_ADMIN" | "SUPER-ADMIN" => Ok(Self::SuperAdmin),
            other => Err(EngineError::InvalidRole(format!("unknown role: {other}"))),
        }
    }
}

/// The roles persisted for a user.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleSet {
    stored: BTreeSet<Role>,
}

impl RoleSet {
    /// A role set holding nothing but the implicit base role.
    pub fn regular() -> Self {
        Self::default()
    }

    pub fn admin() -> Self {
        Self::from_roles([Role::Admin])
    }

    pub fn from_roles(roles: impl IntoIterator<Item = Role>) -> Self {
        Self {
            stored: roles.into_iter().filter(|r| *r != Role::User).collect(),
        }
    }

    /// Roles as persisted, without the implicit base role.
    pub fn stored(&self) -> &BTreeSet<Role> {
        &self.stored
    }

    /// Stored roles plus [`Role::User`].
    pub fn effective(&self) -> BTreeSet<Role> {
        let mut roles = self.stored.clone();
        roles.insert(Role::User);
        roles
    }

    pub fn contains(&self, role: Role) -> bool {
        role == Role::User || self.stored.contains(&role)
    }

    pub fn is_admin(&self) -> bool {
        self.contains(Role::Admin)
    }

    /// `true` when the stored roles are exactly `roles`.
    pub fn stored_is_exactly(&self, roles: &[Role]) -> bool {
        let other: BTreeSet<Role> = roles.iter().copied().collect();
        self.stored == other
    }

    pub fn grant(&mut self, role: Role) {
        if role != Role::User {
            self.stored.insert(role);
        }
    }

    pub fn revoke(&mut self, role: Role) {
        self.stored.remove(&role);
    }

    pub(crate) fn from_stored_json(raw: &str) -> ResultEngine<Self> {
        let roles: Vec<Role> = serde_json::from_str(raw)
            .map_err(|err| EngineError::InvalidRole(format!("corrupted role list: {err}")))?;
        Ok(Self::from_roles(roles))
    }

    pub(crate) fn to_stored_json(&self) -> String {
        let roles: Vec<&str> = self.stored.iter().map(|r| r.as_str()).collect();
        serde_json::to_string(&roles).unwrap_or_else(|_| "[]".to_string())
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<T: IntoIterator<Item = Role>>(iter: T) -> Self {
        Self::from_roles(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_role_is_implicit() {
        let roles = RoleSet::regular();
        assert!(roles.contains(Role::User));
        assert!(!roles.is_admin());
        assert!(roles.stored().is_empty());
        assert_eq!(roles.effective().len(), 1);
    }

    #[test]
    fn base_role_is_never_stored() {
        let roles = RoleSet::from_roles([Role::User, Role::Admin]);
        assert_eq!(roles.to_stored_json(), r#"["ROLE_ADMIN"]"#);
        assert!(roles.stored_is_exactly(&[Role::Admin]));
    }

    #[test]
    fn stored_json_round_trip() {
        let roles = RoleSet::from_roles([Role::SuperAdmin, Role::Admin]);
        let parsed = RoleSet::from_stored_json(&roles.to_stored_json()).unwrap();
        assert_eq!(parsed, roles);
        assert!(RoleSet::from_stored_json("not json").is_err());
    }

    #[test]
    fn super_admin_does_not_imply_admin() {
        let roles = RoleSet::from_roles([Role::SuperAdmin]);
        assert!(!roles.is_admin());
    }

    #[test]
    fn parse_role_labels() {
        assert_eq!(Role::try_from("admin").unwrap(), Role::Admin);
        assert_eq!(Role::try_from("ROLE_SUPER_ADMIN").unwrap(), Role::SuperAdmin);
        assert!(Role::try_from("root").is_err());
    }
}
