use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{Post, User};
use crate::error::RepoError;

/// User repository.
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError>;

    /// Login lookup: `handle` may be a username or an email address.
    async fn find_by_username_or_email(&self, handle: &str) -> Result<Option<User>, RepoError>;

    /// Save a user (create or update). Unique violations on username or email
    /// surface as [`RepoError::Constraint`].
    async fn save(&self, user: User) -> Result<User, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    async fn list_all(&self) -> Result<Vec<User>, RepoError>;
}

/// One page of the newest-first post feed.
#[derive(Debug, Clone)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total_pages: u64,
    pub current_page: u64,
}

/// Post repository, including the bulk operations backing the identity
/// cascades. Each bulk operation is idempotent so an interrupted cascade can
/// be re-run.
#[async_trait]
pub trait PostRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError>;

    async fn save(&self, post: Post) -> Result<Post, RepoError>;

    async fn delete(&self, id: Uuid) -> Result<(), RepoError>;

    /// Newest-first page of posts; `page` is 1-based.
    async fn list_recent(&self, page: u64, page_size: u64) -> Result<PostPage, RepoError>;

    /// Rewrite the author of every post authored under `old` to `new`.
    /// Returns the number of posts touched.
    async fn rename_author(&self, old: &str, new: &str) -> Result<u64, RepoError>;

    /// Delete every post authored under `author`. Returns the count deleted.
    async fn delete_by_author(&self, author: &str) -> Result<u64, RepoError>;

    /// Strip every comment authored by `user_id` from every post.
    /// Returns the number of posts touched.
    async fn remove_comments_by_user(&self, user_id: Uuid) -> Result<u64, RepoError>;

    /// Strip `user_id` from every post's likes set.
    /// Returns the number of posts touched.
    async fn remove_likes_by_user(&self, user_id: Uuid) -> Result<u64, RepoError>;
}
