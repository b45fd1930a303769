use std::{
    collections::{BTreeSet, HashMap},
    sync::Arc,
};

use async_trait::async_trait;

use crate::{error::AppResult, models::User, password};

/// UserStore Trait
///
/// The credentials store consumed by the authentication layer. Only lookup is needed:
/// records are created at startup and never change while the server runs.
///
/// **Send + Sync + async_trait** make `Arc<dyn UserStore>` shareable across Axum's tasks
/// and leave room for a store that actually awaits I/O.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn lookup(&self, username: &str) -> Option<User>;
}

/// UserStoreState
///
/// The shared handle placed in `AppState`.
pub type UserStoreState = Arc<dyn UserStore>;

/// InMemoryUserStore
///
/// A read-only map from username to `User`, built once at process start.
#[derive(Debug, Default)]
pub struct InMemoryUserStore {
    users: HashMap<String, User>,
}

impl InMemoryUserStore {
    /// Builds a store from records, keying each by its own `username`.
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.username.clone(), user))
                .collect(),
        }
    }

    /// demo
    ///
    /// The hard-coded demo accounts. Passwords are hashed here, at startup, so the
    /// plain values never sit in the store.
    ///
    /// - `root` / `admin_password`: roles `admin`, `user`
    /// - `jane` / `user_password`: role `user`
    pub fn demo() -> AppResult<Self> {
        let users = vec![
            user("root", "admin_password", &["admin", "user"])?,
            user("jane", "user_password", &["user"])?,
        ];
        tracing::debug!(count = users.len(), "Seeded demo user store");
        Ok(Self::new(users))
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

fn user(username: &str, plain_password: &str, roles: &[&str]) -> AppResult<User> {
    Ok(User {
        username: username.to_string(),
        password_hash: password::hash_password(plain_password)?,
        roles: roles.iter().map(|role| role.to_string()).collect::<BTreeSet<_>>(),
    })
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn lookup(&self, username: &str) -> Option<User> {
        self.users.get(username).cloned()
    }
}
