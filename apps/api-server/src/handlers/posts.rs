//! Post handlers - CRUD plus likes and comments.

use actix_web::{HttpResponse, web};
use serde::Deserialize;
use uuid::Uuid;

use blogify_core::service::{NewPost, PostChanges};
use blogify_shared::ApiResponse;
use blogify_shared::dto::{AddCommentRequest, CreatePostRequest, UpdatePostRequest};

use crate::middleware::auth::Authenticated;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// Feed pagination query. Defaults match the client's infinite scroll.
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
}

/// GET /api/posts - public
pub async fn list_posts(
    state: web::Data<AppState>,
    query: web::Query<FeedQuery>,
) -> AppResult<HttpResponse> {
    let page = query.page.unwrap_or(1);
    let limit = query.limit.unwrap_or(6);

    let feed = state.content.list_posts(page, limit).await?;

    Ok(HttpResponse::Ok().json(feed))
}

/// GET /api/posts/{id} - public
pub async fn get_post(state: web::Data<AppState>, path: web::Path<Uuid>) -> AppResult<HttpResponse> {
    let post = state.content.get_post(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts - any authenticated user
pub async fn create_post(
    state: web::Data<AppState>,
    auth: Authenticated,
    body: web::Json<CreatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let post = state
        .content
        .create_post(
            &auth,
            NewPost {
                title: req.title,
                content: req.content,
                image_url: req.image_url,
            },
        )
        .await?;

    Ok(HttpResponse::Created().json(post))
}

/// PUT /api/posts/{id} - owner or admin
pub async fn update_post(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<Uuid>,
    body: web::Json<UpdatePostRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let post = state
        .content
        .update_post(
            &auth,
            path.into_inner(),
            PostChanges {
                title: req.title,
                content: req.content,
                image_url: req.image_url,
            },
        )
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id} - owner or admin
pub async fn delete_post(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    state.content.delete_post(&auth, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message((), "Post deleted successfully")))
}

/// POST /api/posts/{id}/like - any authenticated user
pub async fn toggle_like(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let post = state.content.toggle_like(&auth, path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(post))
}

/// POST /api/posts/{id}/comment - any authenticated user
pub async fn add_comment(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<Uuid>,
    body: web::Json<AddCommentRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let post = state
        .content
        .add_comment(&auth, path.into_inner(), req.text)
        .await?;

    Ok(HttpResponse::Ok().json(post))
}

/// DELETE /api/posts/{id}/comment/{comment_id} - comment owner or admin
pub async fn delete_comment(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<(Uuid, Uuid)>,
) -> AppResult<HttpResponse> {
    let (post_id, comment_id) = path.into_inner();

    let post = state
        .content
        .delete_comment(&auth, post_id, comment_id)
        .await?;

    Ok(HttpResponse::Ok().json(post))
}
