//! In-memory repositories using a HashMap with async RwLock.
//!
//! These are the fallback when no database is configured (data is lost on
//! process restart) and the substrate for the service-level tests.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use blogify_core::domain::{Post, User};
use blogify_core::error::RepoError;
use blogify_core::ports::{PostPage, PostRepository, UserRepository};

/// In-memory user repository.
pub struct MemoryUserRepository {
    store: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.get(&id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.username == username).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username_or_email(&self, handle: &str) -> Result<Option<User>, RepoError> {
        let store = self.store.read().await;
        Ok(store
            .values()
            .find(|u| u.username == handle || u.email == handle)
            .cloned())
    }

    async fn save(&self, user: User) -> Result<User, RepoError> {
        let mut store = self.store.write().await;

        // Same unique constraints the users table enforces.
        let taken = store
            .values()
            .any(|u| u.id != user.id && (u.username == user.username || u.email == user.email));
        if taken {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        store.insert(user.id, user.clone());
        Ok(user)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }

    async fn list_all(&self) -> Result<Vec<User>, RepoError> {
        let store = self.store.read().await;
        let mut users: Vec<User> = store.values().cloned().collect();
        users.sort_by_key(|u| u.created_at);
        Ok(users)
    }
}

/// In-memory post repository.
pub struct MemoryPostRepository {
    store: RwLock<HashMap<Uuid, Post>>,
}

impl MemoryPostRepository {
    pub fn new() -> Self {
        Self {
            store: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for MemoryPostRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PostRepository for MemoryPostRepository {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        let store = self.store.read().await;
        Ok(store.get(&id).cloned())
    }

    async fn save(&self, post: Post) -> Result<Post, RepoError> {
        let mut store = self.store.write().await;
        store.insert(post.id, post.clone());
        Ok(post)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut store = self.store.write().await;
        store.remove(&id).map(|_| ()).ok_or(RepoError::NotFound)
    }

    async fn list_recent(&self, page: u64, page_size: u64) -> Result<PostPage, RepoError> {
        let store = self.store.read().await;
        let mut posts: Vec<Post> = store.values().cloned().collect();
        posts.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        let total = posts.len() as u64;
        let total_pages = total.div_ceil(page_size);
        let skip = ((page - 1) * page_size) as usize;
        let posts = posts
            .into_iter()
            .skip(skip)
            .take(page_size as usize)
            .collect();

        Ok(PostPage {
            posts,
            total_pages,
            current_page: page,
        })
    }

    async fn rename_author(&self, old: &str, new: &str) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let mut touched = 0;
        for post in store.values_mut() {
            if post.author == old {
                post.author = new.to_string();
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn delete_by_author(&self, author: &str) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let before = store.len();
        store.retain(|_, post| post.author != author);
        Ok((before - store.len()) as u64)
    }

    async fn remove_comments_by_user(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let mut touched = 0;
        for post in store.values_mut() {
            if post.comments.iter().any(|c| c.user_id == user_id) {
                post.comments.retain(|c| c.user_id != user_id);
                touched += 1;
            }
        }
        Ok(touched)
    }

    async fn remove_likes_by_user(&self, user_id: Uuid) -> Result<u64, RepoError> {
        let mut store = self.store.write().await;
        let mut touched = 0;
        for post in store.values_mut() {
            if post.likes.contains(&user_id) {
                post.likes.retain(|id| *id != user_id);
                touched += 1;
            }
        }
        Ok(touched)
    }
}
