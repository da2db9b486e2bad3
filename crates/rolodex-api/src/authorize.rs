//! Ownership checks for owned resources

use rolodex_db::entities::{contact, managed_user};
use uuid::Uuid;

use crate::error::ApiError;
use crate::middleware::AuthUser;

/// A stored resource that records the identity which created it
pub trait Owned {
    /// Human-readable kind used in error messages, e.g. "Contact"
    const KIND: &'static str;

    fn owner_id(&self) -> Uuid;
}

impl Owned for contact::Model {
    const KIND: &'static str = "Contact";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

impl Owned for managed_user::Model {
    const KIND: &'static str = "User";

    fn owner_id(&self) -> Uuid {
        self.owner_id
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Update,
    Delete,
}

impl Action {
    fn verb(self) -> &'static str {
        match self {
            Action::Read => "access",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

/// Check that `user` may perform `action` on `resource`
///
/// Existence is checked before ownership, so an unknown resource is a 404
/// for everyone and a 403 is only returned for resources that exist.
pub fn require_owner<M: Owned>(
    resource: Option<M>,
    user: &AuthUser,
    action: Action,
) -> Result<M, ApiError> {
    let resource = resource.ok_or_else(|| ApiError::not_found(format!("{} not found", M::KIND)))?;

    if resource.owner_id() != user.id {
        return Err(ApiError::forbidden(format!(
            "User not authorized to {} this {}",
            action.verb(),
            M::KIND.to_lowercase()
        )));
    }

    Ok(resource)
}
