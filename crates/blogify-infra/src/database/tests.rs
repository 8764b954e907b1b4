//! Service-level tests over the in-memory repositories: the ownership rules,
//! the rename/delete cascades, and the repository query mapping.

use std::sync::Arc;

use sea_orm::{DatabaseBackend, MockDatabase};
use uuid::Uuid;

use blogify_core::access::Identity;
use blogify_core::error::DomainError;
use blogify_core::ports::{PostRepository, TokenService, UserRepository};
use blogify_core::service::{AccountService, ContentService, NewPost, PostChanges, PostView};

use super::entity::post;
use super::memory::{MemoryPostRepository, MemoryUserRepository};
use super::postgres::PostgresPostRepository;
use crate::auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

const PASSWORD: &str = "password123";

struct TestApp {
    users: Arc<MemoryUserRepository>,
    posts: Arc<MemoryPostRepository>,
    tokens: Arc<JwtTokenService>,
    accounts: AccountService,
    content: ContentService,
}

fn test_app() -> TestApp {
    let users = Arc::new(MemoryUserRepository::new());
    let posts = Arc::new(MemoryPostRepository::new());
    let tokens = Arc::new(JwtTokenService::new(JwtConfig {
        secret: "test-secret-key".to_string(),
        expiration_hours: 1,
        issuer: "test-issuer".to_string(),
    }));
    let passwords = Arc::new(Argon2PasswordService::new());

    let accounts = AccountService::new(
        users.clone(),
        posts.clone(),
        passwords,
        tokens.clone(),
    );
    let content = ContentService::new(posts.clone(), users.clone());

    TestApp {
        users,
        posts,
        tokens,
        accounts,
        content,
    }
}

impl TestApp {
    async fn login(&self, handle: &str) -> Identity {
        let outcome = self.accounts.login(handle, PASSWORD).await.unwrap();
        self.tokens.validate_token(&outcome.token).unwrap().into()
    }

    async fn signup(&self, username: &str) -> Identity {
        self.accounts
            .register(username, &format!("{username}@example.com"), PASSWORD)
            .await
            .unwrap();
        self.login(username).await
    }

    async fn signup_admin(&self, username: &str) -> Identity {
        self.accounts
            .register(username, &format!("{username}@example.com"), PASSWORD)
            .await
            .unwrap();
        let mut user = self
            .users
            .find_by_username(username)
            .await
            .unwrap()
            .unwrap();
        user.is_admin = true;
        self.users.save(user).await.unwrap();
        self.login(username).await
    }

    async fn new_post(&self, identity: &Identity, title: &str) -> PostView {
        self.content
            .create_post(
                identity,
                NewPost {
                    title: title.to_string(),
                    content: "content".to_string(),
                    image_url: None,
                },
            )
            .await
            .unwrap()
    }
}

#[tokio::test]
async fn register_then_login() {
    let app = test_app();
    let user = app
        .accounts
        .register("alice", "alice@example.com", PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.username, "alice");
    assert!(!user.is_admin);
    // Only the hash is stored.
    assert_ne!(user.password_hash, PASSWORD);

    let outcome = app.accounts.login("alice", PASSWORD).await.unwrap();
    let claims = app.tokens.validate_token(&outcome.token).unwrap();
    assert_eq!(claims.user_id, user.id);
    assert_eq!(claims.username, "alice");
    assert!(!claims.is_admin);
}

#[tokio::test]
async fn login_accepts_email_as_handle() {
    let app = test_app();
    app.signup("alice").await;

    let outcome = app.accounts.login("alice@example.com", PASSWORD).await;
    assert!(outcome.is_ok());
}

#[tokio::test]
async fn login_failure_is_uniform() {
    let app = test_app();
    app.signup("alice").await;

    let no_such_user = app.accounts.login("nobody", PASSWORD).await;
    let wrong_password = app.accounts.login("alice", "wrong-password").await;

    assert!(matches!(no_such_user, Err(DomainError::Unauthorized)));
    assert!(matches!(wrong_password, Err(DomainError::Unauthorized)));
}

#[tokio::test]
async fn duplicate_username_conflicts() {
    let app = test_app();
    app.accounts
        .register("alice", "alice@example.com", PASSWORD)
        .await
        .unwrap();

    let result = app
        .accounts
        .register("alice", "other@example.com", PASSWORD)
        .await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = test_app();
    app.accounts
        .register("alice", "alice@example.com", PASSWORD)
        .await
        .unwrap();

    let result = app
        .accounts
        .register("alice2", "alice@example.com", PASSWORD)
        .await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));
}

#[tokio::test]
async fn post_author_comes_from_the_token() {
    let app = test_app();
    let alice = app.signup("alice").await;

    let view = app.new_post(&alice, "Hello").await;
    assert_eq!(view.author.username, "alice");
    assert_eq!(view.author.id, Some(alice.id));
    assert!(view.likes.is_empty());
    assert!(view.comments.is_empty());
}

#[tokio::test]
async fn non_owner_cannot_update_or_delete_post() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let view = app.new_post(&alice, "Hello").await;

    let update = app
        .content
        .update_post(
            &bob,
            view.id,
            PostChanges {
                title: Some("Hijacked".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(update, Err(DomainError::Forbidden)));

    let delete = app.content.delete_post(&bob, view.id).await;
    assert!(matches!(delete, Err(DomainError::Forbidden)));

    // Untouched.
    let post = app.content.get_post(view.id).await.unwrap();
    assert_eq!(post.title, "Hello");
}

#[tokio::test]
async fn admin_can_update_and_delete_any_post() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let root = app.signup_admin("root").await;

    let view = app.new_post(&alice, "Hello").await;

    let updated = app
        .content
        .update_post(
            &root,
            view.id,
            PostChanges {
                content: Some("moderated".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.content, "moderated");
    // Author is immune to updates, including by admins.
    assert_eq!(updated.author.username, "alice");

    app.content.delete_post(&root, view.id).await.unwrap();
    let gone = app.content.get_post(view.id).await;
    assert!(matches!(gone, Err(DomainError::NotFound("post"))));
}

#[tokio::test]
async fn partial_update_keeps_unspecified_fields() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let view = app.new_post(&alice, "Hello").await;

    let updated = app
        .content
        .update_post(
            &alice,
            view.id,
            PostChanges {
                title: Some("Hello again".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(updated.title, "Hello again");
    assert_eq!(updated.content, "content");
    assert_eq!(updated.image_url, None);
}

#[tokio::test]
async fn missing_post_is_not_found() {
    let app = test_app();
    let alice = app.signup("alice").await;

    let id = Uuid::new_v4();
    assert!(matches!(
        app.content.get_post(id).await,
        Err(DomainError::NotFound("post"))
    ));
    assert!(matches!(
        app.content.toggle_like(&alice, id).await,
        Err(DomainError::NotFound("post"))
    ));
    assert!(matches!(
        app.content.add_comment(&alice, id, "hi".into()).await,
        Err(DomainError::NotFound("post"))
    ));
}

#[tokio::test]
async fn double_like_toggle_restores_original_set() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let view = app.new_post(&alice, "Hello").await;

    let liked = app.content.toggle_like(&bob, view.id).await.unwrap();
    assert_eq!(liked.likes, vec![bob.id]);

    let unliked = app.content.toggle_like(&bob, view.id).await.unwrap();
    assert!(unliked.likes.is_empty());
}

#[tokio::test]
async fn comment_deletion_is_owner_by_stable_id_or_admin() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let carol = app.signup("carol").await;
    let root = app.signup_admin("root").await;

    let view = app.new_post(&alice, "Hello").await;
    let commented = app
        .content
        .add_comment(&bob, view.id, "first!".into())
        .await
        .unwrap();
    let comment_id = commented.comments[0].id;
    assert_eq!(commented.comments[0].user.id, bob.id);
    assert_eq!(commented.comments[0].user.username.as_deref(), Some("bob"));

    // Neither another user nor the post owner may remove bob's comment.
    for caller in [&carol, &alice] {
        let result = app
            .content
            .delete_comment(caller, view.id, comment_id)
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden)));
    }
    let unchanged = app.content.get_post(view.id).await.unwrap();
    assert_eq!(unchanged.comments.len(), 1);

    // The comment author can.
    let removed = app
        .content
        .delete_comment(&bob, view.id, comment_id)
        .await
        .unwrap();
    assert!(removed.comments.is_empty());

    // And an admin can remove anyone's.
    let commented = app
        .content
        .add_comment(&bob, view.id, "again".into())
        .await
        .unwrap();
    let removed = app
        .content
        .delete_comment(&root, view.id, commented.comments[0].id)
        .await
        .unwrap();
    assert!(removed.comments.is_empty());
}

#[tokio::test]
async fn deleting_missing_comment_is_not_found() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let view = app.new_post(&alice, "Hello").await;

    let result = app
        .content
        .delete_comment(&alice, view.id, Uuid::new_v4())
        .await;
    assert!(matches!(result, Err(DomainError::NotFound("comment"))));
}

#[tokio::test]
async fn rename_cascades_to_every_post_and_refreshes_token() {
    let app = test_app();
    let bob = app.signup("bob").await;
    let first = app.new_post(&bob, "one").await;
    let second = app.new_post(&bob, "two").await;

    let outcome = app.accounts.rename_username(&bob, "bobby").await.unwrap();
    assert_eq!(outcome.user.username, "bobby");
    assert_eq!(outcome.posts_updated, 2);

    // No post is left with the stale author.
    for id in [first.id, second.id] {
        let post = app.posts.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(post.author, "bobby");
    }

    let claims = app.tokens.validate_token(&outcome.token).unwrap();
    assert_eq!(claims.username, "bobby");
}

#[tokio::test]
async fn rename_to_taken_username_conflicts() {
    let app = test_app();
    app.signup("alice").await;
    let bob = app.signup("bob").await;

    let result = app.accounts.rename_username(&bob, "alice").await;
    assert!(matches!(result, Err(DomainError::Conflict(_))));

    // Renaming to one's own current username is a no-op, not a conflict.
    assert!(app.accounts.rename_username(&bob, "bob").await.is_ok());
}

#[tokio::test]
async fn stale_token_after_rename_is_forbidden_until_reissue() {
    let app = test_app();
    let bob = app.signup("bob").await;
    let view = app.new_post(&bob, "Hello").await;

    let outcome = app.accounts.rename_username(&bob, "bobby").await.unwrap();

    // The old token still identifies the same stable id, but the post is now
    // authored as "bobby", so the username-based ownership check rejects it.
    let stale = bob;
    let result = app
        .content
        .update_post(
            &stale,
            view.id,
            PostChanges {
                title: Some("Edited".to_string()),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden)));

    // The fresh token works.
    let fresh: Identity = app.tokens.validate_token(&outcome.token).unwrap().into();
    let updated = app
        .content
        .update_post(
            &fresh,
            view.id,
            PostChanges {
                title: Some("Edited".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.title, "Edited");
}

#[tokio::test]
async fn sync_posts_repairs_an_interrupted_rename() {
    let app = test_app();
    let bob = app.signup("bob").await;
    let view = app.new_post(&bob, "Hello").await;

    // Simulate a rename cascade that died between the user update and the
    // post update: the user record changes, the post keeps the old author.
    let mut user = app.users.find_by_id(bob.id).await.unwrap().unwrap();
    user.username = "bobby".to_string();
    app.users.save(user).await.unwrap();

    let orphan = app.posts.find_by_id(view.id).await.unwrap().unwrap();
    assert_eq!(orphan.author, "bob");

    let fresh = app.login("bobby").await;
    let repaired = app.accounts.sync_posts(&fresh, "bob").await.unwrap();
    assert_eq!(repaired, 1);

    let post = app.posts.find_by_id(view.id).await.unwrap().unwrap();
    assert_eq!(post.author, "bobby");

    // Re-running is safe and a no-op.
    assert_eq!(app.accounts.sync_posts(&fresh, "bob").await.unwrap(), 0);
}

#[tokio::test]
async fn sync_posts_rejects_stale_non_admin_tokens() {
    let app = test_app();
    let bob = app.signup("bob").await;
    app.accounts.rename_username(&bob, "bobby").await.unwrap();

    // `bob` is now a stale token for this account.
    let result = app.accounts.sync_posts(&bob, "bob").await;
    assert!(matches!(result, Err(DomainError::Forbidden)));
}

#[tokio::test]
async fn delete_account_cascades_posts_comments_and_likes() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let own = app.new_post(&bob, "bob's post").await;
    let other = app.new_post(&alice, "alice's post").await;
    app.content
        .add_comment(&bob, other.id, "nice".into())
        .await
        .unwrap();
    app.content.toggle_like(&bob, other.id).await.unwrap();

    app.accounts.delete_account(&bob).await.unwrap();

    assert!(app.users.find_by_id(bob.id).await.unwrap().is_none());
    assert!(app.posts.find_by_id(own.id).await.unwrap().is_none());

    let remaining = app.posts.find_by_id(other.id).await.unwrap().unwrap();
    assert!(remaining.comments.iter().all(|c| c.user_id != bob.id));
    assert!(!remaining.likes.contains(&bob.id));
}

#[tokio::test]
async fn admin_deleting_author_removes_their_posts() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let root = app.signup_admin("root").await;

    let view = app.new_post(&alice, "Hello").await;

    app.accounts.admin_delete_user(&root, alice.id).await.unwrap();

    assert!(app.posts.find_by_id(view.id).await.unwrap().is_none());
    assert!(app.users.find_by_id(alice.id).await.unwrap().is_none());
}

#[tokio::test]
async fn interrupted_deletion_is_finished_by_reissuing_the_delete() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let root = app.signup_admin("root").await;

    let own = app.new_post(&alice, "alice's post").await;
    let other = app.new_post(&bob, "bob's post").await;
    app.content
        .add_comment(&alice, other.id, "hi".into())
        .await
        .unwrap();
    app.content.toggle_like(&alice, other.id).await.unwrap();

    // Simulate a deletion that crashed after the post cascade: alice's own
    // posts are gone, her comments/likes and user row are still there.
    app.posts.delete_by_author("alice").await.unwrap();
    assert!(app.posts.find_by_id(own.id).await.unwrap().is_none());
    assert!(app.users.find_by_id(alice.id).await.unwrap().is_some());

    // Re-issuing the delete finds the account and finishes the job.
    app.accounts.admin_delete_user(&root, alice.id).await.unwrap();

    assert!(app.users.find_by_id(alice.id).await.unwrap().is_none());
    let remaining = app.posts.find_by_id(other.id).await.unwrap().unwrap();
    assert!(remaining.comments.is_empty());
    assert!(remaining.likes.is_empty());
}

#[tokio::test]
async fn admin_delete_user_refuses_self_and_non_admins() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let root = app.signup_admin("root").await;

    // Self-deletion must go through the self-service path.
    let result = app.accounts.admin_delete_user(&root, root.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden)));

    let result = app.accounts.admin_delete_user(&alice, bob.id).await;
    assert!(matches!(result, Err(DomainError::Forbidden)));
    assert!(app.users.find_by_id(bob.id).await.unwrap().is_some());
}

#[tokio::test]
async fn change_password_requires_the_current_one() {
    let app = test_app();
    let alice = app.signup("alice").await;

    let result = app
        .accounts
        .change_password(&alice, "wrong-password", "new-password-1")
        .await;
    assert!(matches!(result, Err(DomainError::Unauthorized)));

    app.accounts
        .change_password(&alice, PASSWORD, "new-password-1")
        .await
        .unwrap();

    assert!(matches!(
        app.accounts.login("alice", PASSWORD).await,
        Err(DomainError::Unauthorized)
    ));
    assert!(app.accounts.login("alice", "new-password-1").await.is_ok());
}

#[tokio::test]
async fn reset_password_is_admin_only() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;
    let root = app.signup_admin("root").await;

    let result = app
        .accounts
        .reset_password(&bob, alice.id, "new-password-1")
        .await;
    assert!(matches!(result, Err(DomainError::Forbidden)));

    app.accounts
        .reset_password(&root, alice.id, "new-password-1")
        .await
        .unwrap();
    assert!(app.accounts.login("alice", "new-password-1").await.is_ok());
}

#[tokio::test]
async fn list_users_is_admin_only() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let root = app.signup_admin("root").await;

    assert!(matches!(
        app.accounts.list_users(&alice).await,
        Err(DomainError::Forbidden)
    ));

    let users = app.accounts.list_users(&root).await.unwrap();
    assert_eq!(users.len(), 2);
}

#[tokio::test]
async fn update_avatar_sets_the_reference() {
    let app = test_app();
    let alice = app.signup("alice").await;

    let user = app
        .accounts
        .update_avatar(&alice, "https://cdn.example.com/a.png")
        .await
        .unwrap();
    assert_eq!(user.avatar.as_deref(), Some("https://cdn.example.com/a.png"));
}

#[tokio::test]
async fn feed_is_newest_first_and_paginated() {
    let app = test_app();
    let alice = app.signup("alice").await;

    for i in 0..7 {
        app.new_post(&alice, &format!("post {i}")).await;
        // Distinct timestamps for a stable order.
        tokio::time::sleep(std::time::Duration::from_millis(2)).await;
    }

    let first = app.content.list_posts(1, 3).await.unwrap();
    assert_eq!(first.total_pages, 3);
    assert_eq!(first.current_page, 1);
    assert_eq!(first.posts.len(), 3);
    assert_eq!(first.posts[0].title, "post 6");

    let last = app.content.list_posts(3, 3).await.unwrap();
    assert_eq!(last.posts.len(), 1);
    assert_eq!(last.posts[0].title, "post 0");
}

#[tokio::test]
async fn deleted_commenter_renders_without_username() {
    let app = test_app();
    let alice = app.signup("alice").await;
    let bob = app.signup("bob").await;

    let view = app.new_post(&alice, "Hello").await;
    app.content
        .add_comment(&bob, view.id, "hi".into())
        .await
        .unwrap();

    // Simulate a deletion whose comment cascade has not run yet.
    app.users.delete(bob.id).await.unwrap();

    let post = app.content.get_post(view.id).await.unwrap();
    assert_eq!(post.comments[0].user.id, bob.id);
    assert_eq!(post.comments[0].user.username, None);
}

#[tokio::test]
async fn postgres_repo_maps_post_rows() {
    // Mock the query results against the SeaORM model.
    let post_id = Uuid::new_v4();
    let user_id = Uuid::new_v4();
    let now = chrono::Utc::now();

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![post::Model {
            id: post_id,
            author: "alice".to_owned(),
            title: "Test Post".to_owned(),
            content: "Content".to_owned(),
            image_url: None,
            likes: post::LikeSet(vec![user_id]),
            comments: post::CommentList(vec![post::CommentDoc {
                id: Uuid::new_v4(),
                user_id,
                text: "first!".to_owned(),
                created_at: now,
            }]),
            created_at: now.into(),
            updated_at: now.into(),
        }]])
        .into_connection();

    let repo = PostgresPostRepository::new(Arc::new(db));

    let result = repo.find_by_id(post_id).await.unwrap();

    let post = result.unwrap();
    assert_eq!(post.id, post_id);
    assert_eq!(post.author, "alice");
    assert_eq!(post.likes, vec![user_id]);
    assert_eq!(post.comments.len(), 1);
    assert_eq!(post.comments[0].user_id, user_id);
}
