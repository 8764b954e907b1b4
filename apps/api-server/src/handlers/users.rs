//! Admin user-management handlers.
//!
//! Authorization happens in the accounts service; these handlers only shape
//! the HTTP surface.

use actix_web::{HttpResponse, web};
use uuid::Uuid;

use blogify_shared::ApiResponse;
use blogify_shared::dto::{ResetPasswordRequest, UserResponse};

use crate::handlers::user_response;
use crate::middleware::auth::Authenticated;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// GET /api/users - admin only
pub async fn list_users(state: web::Data<AppState>, auth: Authenticated) -> AppResult<HttpResponse> {
    let users = state.accounts.list_users(&auth).await?;

    let users: Vec<UserResponse> = users.iter().map(user_response).collect();
    Ok(HttpResponse::Ok().json(users))
}

/// DELETE /api/users/{id} - admin only, non-self
pub async fn delete_user(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<Uuid>,
) -> AppResult<HttpResponse> {
    let target_id = path.into_inner();

    state.accounts.admin_delete_user(&auth, target_id).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        (),
        "User and related content deleted successfully",
    )))
}

/// PUT /api/users/{id}/reset-password - admin only
pub async fn reset_password(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<Uuid>,
    body: web::Json<ResetPasswordRequest>,
) -> AppResult<HttpResponse> {
    let target_id = path.into_inner();
    let req = body.into_inner();

    state
        .accounts
        .reset_password(&auth, target_id, &req.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        (),
        "Password reset successfully",
    )))
}
