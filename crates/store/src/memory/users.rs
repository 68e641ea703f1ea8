use std::sync::Arc;

use async_trait::async_trait;
use common::UserId;
use domain::{EmailAddress, User};
use tokio::sync::RwLock;

use crate::{Result, StoreError, repository::UserRepository};

#[derive(Clone, Default)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<Vec<User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of stored users, deleted ones included.
    pub async fn count(&self) -> usize {
        self.users.read().await.len()
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_id(&self, id: UserId) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.id() == id && !u.is_deleted())
            .cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<User>> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .find(|u| u.email() == email && !u.is_deleted())
            .cloned())
    }

    async fn save(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;

        for existing in users.iter() {
            if existing.id() == user.id() {
                return Err(StoreError::duplicate("User", user.id()));
            }
            if existing.email() == user.email() {
                return Err(StoreError::duplicate("User", user.email()));
            }
        }

        users.push(user.clone());
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<()> {
        let mut users = self.users.write().await;

        if users
            .iter()
            .any(|u| u.id() != user.id() && u.email() == user.email())
        {
            return Err(StoreError::duplicate("User", user.email()));
        }

        let slot = users
            .iter_mut()
            .find(|u| u.id() == user.id())
            .ok_or_else(|| StoreError::not_found("User", user.id()))?;
        *slot = user.clone();
        Ok(())
    }
}
