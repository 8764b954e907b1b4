//! Post entity for SeaORM.
//!
//! Likes and comments live inside the post row as JSONB documents, mirroring
//! the embedded document model: they are not independently addressable once
//! the post is gone, and each post mutation is a single-row write.

use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{FromJsonQueryResult, Set};
use serde::{Deserialize, Serialize};

use blogify_core::domain::Comment;

/// A comment sub-document. Stores the commenter's stable id, never their
/// username.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentDoc {
    pub id: Uuid,
    pub user_id: Uuid,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// The embedded, ordered comment list.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct CommentList(pub Vec<CommentDoc>);

/// The embedded likes set (user stable ids, at most one entry per user).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct LikeSet(pub Vec<Uuid>);

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "posts")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Author *username*, denormalized. Renames cascade here.
    pub author: String,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub content: String,
    pub image_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary")]
    pub likes: LikeSet,
    #[sea_orm(column_type = "JsonBinary")]
    pub comments: CommentList,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl From<CommentDoc> for Comment {
    fn from(doc: CommentDoc) -> Self {
        Self {
            id: doc.id,
            user_id: doc.user_id,
            text: doc.text,
            created_at: doc.created_at,
        }
    }
}

impl From<Comment> for CommentDoc {
    fn from(comment: Comment) -> Self {
        Self {
            id: comment.id,
            user_id: comment.user_id,
            text: comment.text,
            created_at: comment.created_at,
        }
    }
}

/// Conversion from SeaORM Model to Domain Post.
impl From<Model> for blogify_core::domain::Post {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            author: model.author,
            title: model.title,
            content: model.content,
            image_url: model.image_url,
            likes: model.likes.0,
            comments: model.comments.0.into_iter().map(Into::into).collect(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain Post to SeaORM ActiveModel.
impl From<blogify_core::domain::Post> for ActiveModel {
    fn from(post: blogify_core::domain::Post) -> Self {
        Self {
            id: Set(post.id),
            author: Set(post.author),
            title: Set(post.title),
            content: Set(post.content),
            image_url: Set(post.image_url),
            likes: Set(LikeSet(post.likes)),
            comments: Set(CommentList(
                post.comments.into_iter().map(Into::into).collect(),
            )),
            created_at: Set(post.created_at.into()),
            updated_at: Set(post.updated_at.into()),
        }
    }
}
