use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::domain::UserId;

/// Marketplace account roles. The review workflow only ever moves a buyer
/// to seller; administrators are outside its reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Buyer,
    Seller,
    Administrator,
}

impl AccountRole {
    pub const fn label(self) -> &'static str {
        match self {
            AccountRole::Buyer => "buyer",
            AccountRole::Seller => "seller",
            AccountRole::Administrator => "administrator",
        }
    }
}

/// Read/write access to the user store's role attribute.
pub trait RoleStore: Send + Sync {
    fn role_of(&self, user: &UserId) -> Result<Option<AccountRole>, RoleError>;
    fn set_role(&self, user: &UserId, role: AccountRole) -> Result<(), RoleError>;
}

/// The single writer of the role attribute on the approval path. No other
/// component mutates roles as a consequence of an application decision.
pub struct RoleTransitions<S> {
    store: Arc<S>,
}

impl<S: RoleStore> RoleTransitions<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Promote a buyer to seller.
    ///
    /// Promoting an existing seller is a no-op so retries are harmless.
    /// Administrators are never moved by this path.
    pub fn promote_to_seller(&self, user: &UserId) -> Result<(), RoleError> {
        match self.store.role_of(user)? {
            None => Err(RoleError::NotFound(user.clone())),
            Some(AccountRole::Seller) => Ok(()),
            Some(AccountRole::Administrator) => Err(RoleError::AdministratorGuard(user.clone())),
            Some(AccountRole::Buyer) => self.store.set_role(user, AccountRole::Seller),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RoleError {
    #[error("user not found: {0}")]
    NotFound(UserId),
    #[error("user {0} is an administrator and cannot be moved to seller")]
    AdministratorGuard(UserId),
    #[error("role store unavailable: {0}")]
    Unavailable(String),
}
