use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A comment embedded in a post. Carries the commenting user's stable id
/// (not their username) so comment ownership survives renames, and its own
/// sub-record id for targeted deletion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn new(user_id: Uuid, text: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            text,
            created_at: Utc::now(),
        }
    }
}

/// Post entity - a blog post with its likes and comments embedded.
///
/// `author` holds the creator's *username*, denormalized. Renaming a user
/// must cascade here or the post is orphaned for ownership checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author: String,
    pub title: String,
    pub content: String,
    pub image_url: Option<String>,
    pub likes: Vec<Uuid>,
    pub comments: Vec<Comment>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post with empty likes and comments.
    pub fn new(author: String, title: String, content: String, image_url: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            author,
            title,
            content,
            image_url,
            likes: Vec::new(),
            comments: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Toggle `user_id` in the likes set. Returns true if the post is liked
    /// by the user after the call. The set holds at most one entry per user.
    pub fn toggle_like(&mut self, user_id: Uuid) -> bool {
        if self.likes.contains(&user_id) {
            self.likes.retain(|id| *id != user_id);
            false
        } else {
            self.likes.push(user_id);
            true
        }
    }

    /// Append a comment by `user_id` and return its sub-record id.
    pub fn add_comment(&mut self, user_id: Uuid, text: String) -> Uuid {
        let comment = Comment::new(user_id, text);
        let id = comment.id;
        self.comments.push(comment);
        id
    }

    pub fn find_comment(&self, comment_id: Uuid) -> Option<&Comment> {
        self.comments.iter().find(|c| c.id == comment_id)
    }

    /// Remove exactly the comment with `comment_id`, if present.
    pub fn remove_comment(&mut self, comment_id: Uuid) -> Option<Comment> {
        let idx = self.comments.iter().position(|c| c.id == comment_id)?;
        Some(self.comments.remove(idx))
    }
}
