//! Content service - post CRUD and the social operations (likes, comments).

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::access::{self, Identity};
use crate::domain::Post;
use crate::error::DomainError;
use crate::ports::{PostRepository, UserRepository};

/// Fields for a new post. The author is never part of this input; it is
/// always taken from the verified identity.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
}

/// Partial update to a post. `None` fields keep their prior value. There is
/// deliberately no author field here.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub title: Option<String>,
    pub content: Option<String>,
    pub image_url: Option<String>,
}

/// A post author rendered as a stable reference shape. `id` is absent only
/// for a post orphaned by an interrupted rename cascade.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorRef {
    pub id: Option<Uuid>,
    pub username: String,
}

/// A comment author. `username` is absent when the account no longer exists.
#[derive(Debug, Clone, Serialize)]
pub struct CommenterRef {
    pub id: Uuid,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub user: CommenterRef,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A post as rendered to clients: author and comment users normalized to
/// reference objects, never bare strings.
#[derive(Debug, Clone, Serialize)]
pub struct PostView {
    pub id: Uuid,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub author: AuthorRef,
    pub likes: Vec<Uuid>,
    pub comments: Vec<CommentView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct PostFeed {
    pub posts: Vec<PostView>,
    pub total_pages: u64,
    pub current_page: u64,
}

/// Post CRUD + social interactions, enforcing the access-control rules and
/// returning normalized views.
#[derive(Clone)]
pub struct ContentService {
    posts: Arc<dyn PostRepository>,
    users: Arc<dyn UserRepository>,
}

impl ContentService {
    pub fn new(posts: Arc<dyn PostRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { posts, users }
    }

    /// Create a post. Any authenticated identity may create; authorship is
    /// stamped from the identity's username.
    pub async fn create_post(&self, identity: &Identity, new: NewPost) -> Result<PostView, DomainError> {
        if new.title.trim().is_empty() {
            return Err(DomainError::InvalidInput("title is required".into()));
        }
        if new.content.trim().is_empty() {
            return Err(DomainError::InvalidInput("content is required".into()));
        }

        let post = Post::new(
            identity.username.clone(),
            new.title,
            new.content,
            new.image_url,
        );
        let saved = self.posts.save(post).await?;
        tracing::info!(post_id = %saved.id, author = %saved.author, "Post created");
        self.resolve(saved).await
    }

    /// Newest-first page of posts. Public.
    pub async fn list_posts(&self, page: u64, page_size: u64) -> Result<PostFeed, DomainError> {
        let page = page.max(1);
        let page_size = page_size.clamp(1, 100);
        let result = self.posts.list_recent(page, page_size).await?;

        let mut views = Vec::with_capacity(result.posts.len());
        for post in result.posts {
            views.push(self.resolve(post).await?);
        }

        Ok(PostFeed {
            posts: views,
            total_pages: result.total_pages,
            current_page: result.current_page,
        })
    }

    /// Fetch a single post. Public.
    pub async fn get_post(&self, id: Uuid) -> Result<PostView, DomainError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("post"))?;
        self.resolve(post).await
    }

    /// Update a post's fields. Owner (by username) or admin only; the author
    /// field itself is never updatable through this path.
    pub async fn update_post(
        &self,
        identity: &Identity,
        id: Uuid,
        changes: PostChanges,
    ) -> Result<PostView, DomainError> {
        let mut post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("post"))?;
        access::authorize_owner_or_admin(identity, &post.author)?;

        if let Some(title) = changes.title {
            post.title = title;
        }
        if let Some(content) = changes.content {
            post.content = content;
        }
        if let Some(image_url) = changes.image_url {
            post.image_url = Some(image_url);
        }
        post.updated_at = Utc::now();

        let saved = self.posts.save(post).await?;
        self.resolve(saved).await
    }

    /// Delete a post. Owner (by username) or admin only. Hard delete; the
    /// embedded comments and likes go with it.
    pub async fn delete_post(&self, identity: &Identity, id: Uuid) -> Result<(), DomainError> {
        let post = self
            .posts
            .find_by_id(id)
            .await?
            .ok_or(DomainError::NotFound("post"))?;
        access::authorize_owner_or_admin(identity, &post.author)?;

        self.posts.delete(id).await?;
        tracing::info!(post_id = %id, actor = %identity.username, "Post deleted");
        Ok(())
    }

    /// Idempotent like toggle: present removes, absent adds. Authentication
    /// only, no ownership requirement.
    pub async fn toggle_like(&self, identity: &Identity, post_id: Uuid) -> Result<PostView, DomainError> {
        let mut post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound("post"))?;

        post.toggle_like(identity.id);
        let saved = self.posts.save(post).await?;
        self.resolve(saved).await
    }

    /// Append a comment stamped with the identity's stable id and the current
    /// time. Authentication only.
    pub async fn add_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        text: String,
    ) -> Result<PostView, DomainError> {
        if text.trim().is_empty() {
            return Err(DomainError::InvalidInput("comment text is required".into()));
        }

        let mut post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound("post"))?;

        post.add_comment(identity.id, text);
        let saved = self.posts.save(post).await?;
        self.resolve(saved).await
    }

    /// Remove exactly one comment. Comment owner (by stable id) or admin.
    pub async fn delete_comment(
        &self,
        identity: &Identity,
        post_id: Uuid,
        comment_id: Uuid,
    ) -> Result<PostView, DomainError> {
        let mut post = self
            .posts
            .find_by_id(post_id)
            .await?
            .ok_or(DomainError::NotFound("post"))?;

        let comment = post
            .find_comment(comment_id)
            .ok_or(DomainError::NotFound("comment"))?;
        access::authorize_comment_owner_or_admin(identity, comment.user_id)?;

        post.remove_comment(comment_id);
        let saved = self.posts.save(post).await?;
        self.resolve(saved).await
    }

    /// Normalize a post for clients: resolve the author's id and each
    /// comment's username from the users store.
    async fn resolve(&self, post: Post) -> Result<PostView, DomainError> {
        let author_id = self
            .users
            .find_by_username(&post.author)
            .await?
            .map(|u| u.id);

        // One lookup per distinct commenter.
        let mut usernames: HashMap<Uuid, Option<String>> = HashMap::new();
        let mut comments = Vec::with_capacity(post.comments.len());
        for comment in &post.comments {
            if !usernames.contains_key(&comment.user_id) {
                let username = self
                    .users
                    .find_by_id(comment.user_id)
                    .await?
                    .map(|u| u.username);
                usernames.insert(comment.user_id, username);
            }
            comments.push(CommentView {
                id: comment.id,
                user: CommenterRef {
                    id: comment.user_id,
                    username: usernames[&comment.user_id].clone(),
                },
                text: comment.text.clone(),
                created_at: comment.created_at,
            });
        }

        Ok(PostView {
            id: post.id,
            title: post.title,
            content: post.content,
            image_url: post.image_url,
            author: AuthorRef {
                id: author_id,
                username: post.author,
            },
            likes: post.likes,
            comments,
            created_at: post.created_at,
            updated_at: post.updated_at,
        })
    }
}
