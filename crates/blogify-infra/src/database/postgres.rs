//! PostgreSQL repository implementations.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DbConn, DbErr, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use blogify_core::domain::{Post, User};
use blogify_core::error::RepoError;
use blogify_core::ports::{PostPage, PostRepository, UserRepository};

use super::entity::post::{self, CommentList, Entity as PostEntity, LikeSet};
use super::entity::user::{self, Entity as UserEntity};

fn map_db_err(e: DbErr) -> RepoError {
    let err_str = e.to_string();
    if err_str.contains("duplicate") || err_str.contains("unique") {
        RepoError::Constraint("Entity already exists".to_string())
    } else {
        RepoError::Query(err_str)
    }
}

/// PostgreSQL user repository. The connection pool is shared between the
/// repositories, so it is held behind an `Arc`.
pub struct PostgresUserRepository {
    db: Arc<DbConn>,
}

impl PostgresUserRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(user::Column::Username.eq(username))
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        // Mask email for logging to avoid PII in logs
        let masked = if let Some(at_pos) = email.find('@') {
            let (local, domain) = email.split_at(at_pos);
            let masked_local = if local.len() > 1 {
                format!("{}***", &local[..1])
            } else {
                "***".to_string()
            };
            format!("{}{}", masked_local, domain)
        } else {
            "***".to_string()
        };
        tracing::debug!(user_email = %masked, "Finding user by email");

        let result = UserEntity::find()
            .filter(user::Column::Email.eq(email))
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn find_by_username_or_email(&self, handle: &str) -> Result<Option<User>, RepoError> {
        let result = UserEntity::find()
            .filter(
                Condition::any()
                    .add(user::Column::Username.eq(handle))
                    .add(user::Column::Email.eq(handle)),
            )
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: User) -> Result<User, RepoError> {
        let exists = UserEntity::find_by_id(entity.id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .is_some();

        let active_model: user::ActiveModel = entity.into();
        let model = if exists {
            active_model.update(self.db.as_ref()).await.map_err(map_db_err)?
        } else {
            active_model.insert(self.db.as_ref()).await.map_err(map_db_err)?
        };

        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = UserEntity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, RepoError> {
        let result = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.into_iter().map(Into::into).collect())
    }
}

/// PostgreSQL post repository.
pub struct PostgresPostRepository {
    db: Arc<DbConn>,
}

impl PostgresPostRepository {
    pub fn new(db: Arc<DbConn>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PostRepository for PostgresPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let result = PostEntity::find_by_id(id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.map(Into::into))
    }

    async fn save(&self, entity: Post) -> Result<Post, RepoError> {
        let exists = PostEntity::find_by_id(entity.id)
            .one(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?
            .is_some();

        let active_model: post::ActiveModel = entity.into();
        let model = if exists {
            active_model.update(self.db.as_ref()).await.map_err(map_db_err)?
        } else {
            active_model.insert(self.db.as_ref()).await.map_err(map_db_err)?
        };

        Ok(model.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let result = PostEntity::delete_by_id(id)
            .exec(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        if result.rows_affected == 0 {
            return Err(RepoError::NotFound);
        }

        Ok(())
    }

    async fn list_recent(&self, page: u64, page_size: u64) -> Result<PostPage, RepoError> {
        let paginator = PostEntity::find()
            .order_by_desc(post::Column::CreatedAt)
            .paginate(self.db.as_ref(), page_size);

        let total_pages = paginator
            .num_pages()
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        // fetch_page is 0-based; the API is 1-based.
        let models = paginator
            .fetch_page(page.saturating_sub(1))
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(PostPage {
            posts: models.into_iter().map(Into::into).collect(),
            total_pages,
            current_page: page,
        })
    }

    async fn rename_author(&self, old: &str, new: &str) -> Result<u64, RepoError> {
        let result = PostEntity::update_many()
            .col_expr(post::Column::Author, Expr::value(new))
            .filter(post::Column::Author.eq(old))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.rows_affected)
    }

    async fn delete_by_author(&self, author: &str) -> Result<u64, RepoError> {
        let result = PostEntity::delete_many()
            .filter(post::Column::Author.eq(author))
            .exec(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        Ok(result.rows_affected)
    }

    async fn remove_comments_by_user(&self, user_id: Uuid) -> Result<u64, RepoError> {
        // The embedded arrays are not indexed; this walks every post row.
        let models = PostEntity::find()
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        let mut touched = 0;
        for model in models {
            if model.comments.0.iter().any(|c| c.user_id == user_id) {
                let filtered = CommentList(
                    model
                        .comments
                        .0
                        .iter()
                        .filter(|c| c.user_id != user_id)
                        .cloned()
                        .collect(),
                );
                let mut active_model = model.into_active_model();
                active_model.comments = Set(filtered);
                active_model
                    .update(self.db.as_ref())
                    .await
                    .map_err(|e| RepoError::Query(e.to_string()))?;
                touched += 1;
            }
        }

        Ok(touched)
    }

    async fn remove_likes_by_user(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let models = PostEntity::find()
            .all(self.db.as_ref())
            .await
            .map_err(|e| RepoError::Query(e.to_string()))?;

        let mut touched = 0;
        for model in models {
            if model.likes.0.contains(&user_id) {
                let filtered = LikeSet(
                    model
                        .likes
                        .0
                        .iter()
                        .copied()
                        .filter(|id| *id != user_id)
                        .collect(),
                );
                let mut active_model = model.into_active_model();
                active_model.likes = Set(filtered);
                active_model
                    .update(self.db.as_ref())
                    .await
                    .map_err(|e| RepoError::Query(e.to_string()))?;
                touched += 1;
            }
        }

        Ok(touched)
    }
}
