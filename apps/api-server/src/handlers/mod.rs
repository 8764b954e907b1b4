//! HTTP handlers and route configuration.

mod auth;
mod health;
mod posts;
mod users;

use actix_web::web;
use blogify_core::domain::User;
use blogify_shared::dto::UserResponse;

/// Configure all application routes.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            // Public routes
            .route("/health", web::get().to(health::health_check))
            // Auth routes
            .service(
                web::scope("/auth")
                    .route("/register", web::post().to(auth::register))
                    .route("/login", web::post().to(auth::login))
                    .route("/me", web::get().to(auth::me))
                    .route("/change-password", web::put().to(auth::change_password))
                    .route("/update-username", web::put().to(auth::update_username))
                    .route("/sync-posts", web::put().to(auth::sync_posts))
                    .route("/update-avatar", web::put().to(auth::update_avatar))
                    .route("/delete-account", web::delete().to(auth::delete_account)),
            )
            // Admin user management
            .service(
                web::scope("/users")
                    .route("", web::get().to(users::list_users))
                    .route("/{id}", web::delete().to(users::delete_user))
                    .route("/{id}/reset-password", web::put().to(users::reset_password)),
            )
            // Post routes
            .service(
                web::scope("/posts")
                    .route("", web::get().to(posts::list_posts))
                    .route("", web::post().to(posts::create_post))
                    .route("/{id}", web::get().to(posts::get_post))
                    .route("/{id}", web::put().to(posts::update_post))
                    .route("/{id}", web::delete().to(posts::delete_post))
                    .route("/{id}/like", web::post().to(posts::toggle_like))
                    .route("/{id}/comment", web::post().to(posts::add_comment))
                    .route(
                        "/{id}/comment/{comment_id}",
                        web::delete().to(posts::delete_comment),
                    ),
            ),
    );
}

/// Render a user for clients. The password hash never leaves the server.
pub(crate) fn user_response(user: &User) -> UserResponse {
    UserResponse {
        id: user.id.to_string(),
        username: user.username.clone(),
        email: user.email.clone(),
        is_admin: user.is_admin,
        avatar: user.avatar.clone(),
        created_at: user.created_at.to_rfc3339(),
    }
}
