//! Access-control decisions for mutating operations.
//!
//! Two ownership rules coexist on purpose: posts denormalize their author as a
//! *username*, so post ownership is a username match; comments store the
//! author's immutable *stable id*, so comment ownership is an id match.
//! Changing either rule silently breaks ownership after a username rename.

use uuid::Uuid;

use crate::error::DomainError;
use crate::ports::TokenClaims;

/// The verified claim set derived from a token.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub is_admin: bool,
}

impl From<TokenClaims> for Identity {
    fn from(claims: TokenClaims) -> Self {
        Self {
            id: claims.user_id,
            username: claims.username,
            email: claims.email,
            is_admin: claims.is_admin,
        }
    }
}

/// Post ownership: allowed iff the identity's username matches the post's
/// author, or the identity is an admin.
pub fn authorize_owner_or_admin(identity: &Identity, owner_username: &str) -> Result<(), DomainError> {
    if identity.username == owner_username || identity.is_admin {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// Comment ownership: allowed iff the identity's stable id matches the
/// comment's author id, or the identity is an admin.
pub fn authorize_comment_owner_or_admin(identity: &Identity, owner_id: Uuid) -> Result<(), DomainError> {
    if identity.id == owner_id || identity.is_admin {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}

/// Admin gate. Fails closed: anything other than a verified admin flag is
/// not admin.
pub fn require_admin(identity: &Identity) -> Result<(), DomainError> {
    if identity.is_admin {
        Ok(())
    } else {
        Err(DomainError::Forbidden)
    }
}
