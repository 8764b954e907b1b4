//! Accounts service - registration, login, and the identity mutations whose
//! cascades keep the content store referentially clean.

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::access::{self, Identity};
use crate::domain::User;
use crate::error::DomainError;
use crate::ports::{PasswordService, PostRepository, TokenService, UserRepository};

/// A successful login: the account plus a freshly issued token.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub user: User,
    pub token: String,
}

/// A successful rename: the updated account, a token carrying the new
/// username, and the number of posts the cascade rewrote.
#[derive(Debug, Clone)]
pub struct RenameOutcome {
    pub user: User,
    pub token: String,
    pub posts_updated: u64,
}

/// Identity operations over the user and post stores.
///
/// The rename and deletion cascades are not transactional; the store only
/// guarantees per-document atomicity. Every cascade step is idempotent, so an
/// interrupted cascade is repaired by re-running it (`sync_posts` for
/// renames, re-issuing the delete for deletions).
#[derive(Clone)]
pub struct AccountService {
    users: Arc<dyn UserRepository>,
    posts: Arc<dyn PostRepository>,
    passwords: Arc<dyn PasswordService>,
    tokens: Arc<dyn TokenService>,
}

impl AccountService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        posts: Arc<dyn PostRepository>,
        passwords: Arc<dyn PasswordService>,
        tokens: Arc<dyn TokenService>,
    ) -> Self {
        Self {
            users,
            posts,
            passwords,
            tokens,
        }
    }

    /// Register a new account. Only the password hash is ever stored.
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<User, DomainError> {
        if username.trim().is_empty() || email.trim().is_empty() {
            return Err(DomainError::InvalidInput(
                "username and email are required".into(),
            ));
        }
        if !email.contains('@') {
            return Err(DomainError::InvalidInput("invalid email address".into()));
        }
        if password.len() < 8 {
            return Err(DomainError::InvalidInput(
                "password must be at least 8 characters".into(),
            ));
        }

        if self.users.find_by_username(username).await?.is_some() {
            return Err(DomainError::Conflict("Username already taken".into()));
        }
        if self.users.find_by_email(email).await?.is_some() {
            return Err(DomainError::Conflict("Email already registered".into()));
        }

        let password_hash = self
            .passwords
            .hash(password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;

        let user = User::new(username.to_string(), email.to_string(), password_hash);
        let saved = self.users.save(user).await?;
        tracing::info!(user_id = %saved.id, username = %saved.username, "User registered");
        Ok(saved)
    }

    /// Login by username or email. Any failure is the same `Unauthorized` so
    /// the response does not reveal whether the account exists.
    pub async fn login(&self, handle: &str, password: &str) -> Result<LoginOutcome, DomainError> {
        let user = self
            .users
            .find_by_username_or_email(handle)
            .await?
            .ok_or(DomainError::Unauthorized)?;

        let valid = self
            .passwords
            .verify(password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        let token = self.issue_token(&user)?;
        Ok(LoginOutcome { user, token })
    }

    /// Change own password; requires the current one.
    pub async fn change_password(
        &self,
        identity: &Identity,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), DomainError> {
        if new_password.len() < 8 {
            return Err(DomainError::InvalidInput(
                "password must be at least 8 characters".into(),
            ));
        }

        let mut user = self
            .users
            .find_by_id(identity.id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        let valid = self
            .passwords
            .verify(current_password, &user.password_hash)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        if !valid {
            return Err(DomainError::Unauthorized);
        }

        user.password_hash = self
            .passwords
            .hash(new_password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        user.updated_at = Utc::now();
        self.users.save(user).await?;
        Ok(())
    }

    /// Rename own account. The user record is saved first, then every post
    /// authored under the old username is rewritten; a fresh token carrying
    /// the new username is issued. If the cascade is interrupted the posts
    /// are repairable with [`AccountService::sync_posts`].
    pub async fn rename_username(
        &self,
        identity: &Identity,
        new_username: &str,
    ) -> Result<RenameOutcome, DomainError> {
        if new_username.trim().is_empty() {
            return Err(DomainError::InvalidInput("newUsername is required".into()));
        }

        if let Some(existing) = self.users.find_by_username(new_username).await? {
            if existing.id != identity.id {
                return Err(DomainError::Conflict("Username already taken".into()));
            }
        }

        let mut user = self
            .users
            .find_by_id(identity.id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        let old_username = user.username.clone();
        user.username = new_username.to_string();
        user.updated_at = Utc::now();
        let user = self.users.save(user).await?;

        let posts_updated = self.posts.rename_author(&old_username, new_username).await?;
        tracing::info!(
            user_id = %user.id,
            old = %old_username,
            new = %new_username,
            posts_updated,
            "Username renamed"
        );

        let token = self.issue_token(&user)?;
        Ok(RenameOutcome {
            user,
            token,
            posts_updated,
        })
    }

    /// Re-run the author rename cascade from `old_username` to the caller's
    /// current username. Safe to call any number of times. Only the current
    /// owner of the username (i.e. a fresh token) or an admin.
    pub async fn sync_posts(
        &self,
        identity: &Identity,
        old_username: &str,
    ) -> Result<u64, DomainError> {
        if old_username.trim().is_empty() {
            return Err(DomainError::InvalidInput("oldUsername is required".into()));
        }

        let user = self
            .users
            .find_by_id(identity.id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        // A stale token (username no longer current) may not drive the
        // cascade unless it belongs to an admin.
        if user.username != identity.username && !identity.is_admin {
            return Err(DomainError::Forbidden);
        }

        let updated = self.posts.rename_author(old_username, &user.username).await?;
        Ok(updated)
    }

    /// Update own avatar reference. No token change.
    pub async fn update_avatar(&self, identity: &Identity, avatar: &str) -> Result<User, DomainError> {
        if avatar.trim().is_empty() {
            return Err(DomainError::InvalidInput("avatar is required".into()));
        }

        let mut user = self
            .users
            .find_by_id(identity.id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;
        user.avatar = Some(avatar.to_string());
        user.updated_at = Utc::now();
        Ok(self.users.save(user).await?)
    }

    /// Delete own account and cascade: posts by username, comments by stable
    /// id, likes by stable id. The user row goes last, so an interrupted
    /// cascade leaves an account that a re-issued delete can still find.
    pub async fn delete_account(&self, identity: &Identity) -> Result<(), DomainError> {
        let user = self
            .users
            .find_by_id(identity.id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        self.cascade_content_removal(&user).await?;
        self.users.delete(user.id).await?;
        tracing::info!(user_id = %user.id, username = %user.username, "Account deleted");
        Ok(())
    }

    /// Admin-only deletion of another account, with the same cascades.
    /// Refuses the caller's own id: self-deletion goes through
    /// [`AccountService::delete_account`].
    pub async fn admin_delete_user(
        &self,
        identity: &Identity,
        target_id: Uuid,
    ) -> Result<(), DomainError> {
        access::require_admin(identity)?;
        if target_id == identity.id {
            return Err(DomainError::Forbidden);
        }

        let user = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        self.cascade_content_removal(&user).await?;
        self.users.delete(user.id).await?;
        tracing::info!(
            user_id = %user.id,
            username = %user.username,
            actor = %identity.username,
            "User deleted by admin"
        );
        Ok(())
    }

    /// Admin-only password reset; the target's current password is not
    /// required.
    pub async fn reset_password(
        &self,
        identity: &Identity,
        target_id: Uuid,
        new_password: &str,
    ) -> Result<(), DomainError> {
        access::require_admin(identity)?;
        if new_password.len() < 8 {
            return Err(DomainError::InvalidInput(
                "password must be at least 8 characters".into(),
            ));
        }

        let mut user = self
            .users
            .find_by_id(target_id)
            .await?
            .ok_or(DomainError::NotFound("user"))?;

        user.password_hash = self
            .passwords
            .hash(new_password)
            .map_err(|e| DomainError::Internal(e.to_string()))?;
        user.updated_at = Utc::now();
        self.users.save(user).await?;
        Ok(())
    }

    /// Admin-only listing of every account. Hash exclusion happens at the
    /// DTO boundary; it is never serialized.
    pub async fn list_users(&self, identity: &Identity) -> Result<Vec<User>, DomainError> {
        access::require_admin(identity)?;
        Ok(self.users.list_all().await?)
    }

    fn issue_token(&self, user: &User) -> Result<String, DomainError> {
        self.tokens
            .generate_token(user.id, &user.username, &user.email, user.is_admin)
            .map_err(|e| DomainError::Internal(e.to_string()))
    }

    /// The three content cascades of an account deletion. Each is idempotent;
    /// re-running after a partial failure finishes the job. Callers remove
    /// the user row only after all three succeed.
    async fn cascade_content_removal(&self, user: &User) -> Result<(), DomainError> {
        self.posts.delete_by_author(&user.username).await?;
        self.posts.remove_comments_by_user(user.id).await?;
        self.posts.remove_likes_by_user(user.id).await?;
        Ok(())
    }
}
