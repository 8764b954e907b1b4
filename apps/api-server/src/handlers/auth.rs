//! Authentication and account self-service handlers.

use actix_web::{HttpResponse, web};
use std::sync::Arc;

use blogify_core::ports::TokenService;
use blogify_shared::ApiResponse;
use blogify_shared::dto::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterRequest, SyncPostsRequest,
    SyncPostsResponse, UpdateAvatarRequest, UpdateUsernameRequest,
};

use crate::handlers::user_response;
use crate::middleware::auth::Authenticated;
use crate::middleware::error::AppResult;
use crate::state::AppState;

/// POST /api/auth/register
pub async fn register(
    state: web::Data<AppState>,
    body: web::Json<RegisterRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state
        .accounts
        .register(&req.username, &req.email, &req.password)
        .await?;

    Ok(HttpResponse::Created().json(ApiResponse::ok_with_message(
        user_response(&user),
        "User registered",
    )))
}

/// POST /api/auth/login
pub async fn login(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    body: web::Json<LoginRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let outcome = state.accounts.login(&req.username, &req.password).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token: outcome.token,
        token_type: "Bearer".to_string(),
        expires_in: token_service.expiration_seconds() as u64,
    }))
}

/// GET /api/auth/me - Protected route
///
/// Echoes the verified claim set. After a rename this reflects the token, not
/// the store; clients re-login (or use the fresh token) to see the new name.
pub async fn me(auth: Authenticated) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "id": auth.id,
        "username": auth.username,
        "email": auth.email,
        "isAdmin": auth.is_admin,
    })))
}

/// PUT /api/auth/change-password
pub async fn change_password(
    state: web::Data<AppState>,
    auth: Authenticated,
    body: web::Json<ChangePasswordRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    state
        .accounts
        .change_password(&auth, &req.current_password, &req.new_password)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message((), "Password updated successfully")))
}

/// PUT /api/auth/update-username
///
/// Returns a fresh token: the old one carries the stale username.
pub async fn update_username(
    state: web::Data<AppState>,
    token_service: web::Data<Arc<dyn TokenService>>,
    auth: Authenticated,
    body: web::Json<UpdateUsernameRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let outcome = state
        .accounts
        .rename_username(&auth, &req.new_username)
        .await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        AuthResponse {
            access_token: outcome.token,
            token_type: "Bearer".to_string(),
            expires_in: token_service.expiration_seconds() as u64,
        },
        "Username updated successfully",
    )))
}

/// PUT /api/auth/sync-posts
pub async fn sync_posts(
    state: web::Data<AppState>,
    auth: Authenticated,
    body: web::Json<SyncPostsRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let modified = state.accounts.sync_posts(&auth, &req.old_username).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        SyncPostsResponse { modified },
        "Posts synced",
    )))
}

/// PUT /api/auth/update-avatar
pub async fn update_avatar(
    state: web::Data<AppState>,
    auth: Authenticated,
    body: web::Json<UpdateAvatarRequest>,
) -> AppResult<HttpResponse> {
    let req = body.into_inner();

    let user = state.accounts.update_avatar(&auth, &req.avatar).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        user_response(&user),
        "Avatar updated",
    )))
}

/// DELETE /api/auth/delete-account
pub async fn delete_account(
    state: web::Data<AppState>,
    auth: Authenticated,
) -> AppResult<HttpResponse> {
    state.accounts.delete_account(&auth).await?;

    Ok(HttpResponse::Ok().json(ApiResponse::ok_with_message(
        (),
        "User and related content deleted successfully",
    )))
}
