//! The authenticated caller.

use common::{Role, UserId};
use store::User;

use crate::error::{DomainError, Result};

/// Identity resolved from a session token and handed to every operation
/// that acts on behalf of a user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub username: String,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, username: impl Into<String>, role: Role) -> Self {
        Self {
            user_id,
            username: username.into(),
            role,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Fails with `Forbidden` unless the principal is an administrator.
    pub fn require_admin(&self, action: &'static str) -> Result<()> {
        if self.is_admin() {
            Ok(())
        } else {
            tracing::warn!(user_id = %self.user_id, action, "admin action refused");
            Err(DomainError::Forbidden { action })
        }
    }
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self::new(user.id, user.username.clone(), user.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_passes_capability_check() {
        let admin = Principal::new(UserId::new(), "root", Role::Admin);
        assert!(admin.require_admin("delete product").is_ok());
    }

    #[test]
    fn user_is_forbidden() {
        let user = Principal::new(UserId::new(), "jo", Role::User);
        let err = user.require_admin("delete product").unwrap_err();
        assert!(matches!(
            err,
            DomainError::Forbidden {
                action: "delete product"
            }
        ));
    }
}
