//! Account persistence.
//!
//! [`AccountStore`] is the contract the pipeline needs from a database.
//! [`MemoryAccountStore`] implements it in process; a relational backend
//! plugs in by implementing the same trait.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::password::Credential;

/// A stored account. Emails are always lower-cased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub password_hash: Credential,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Fields for a new account. The store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub username: String,
    pub email: String,
    pub password_hash: Credential,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct AccountChanges {
    pub username: Option<String>,
    pub email: Option<String>,
}

/// Column with a uniqueness constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
}

impl std::fmt::Display for UniqueField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UniqueField::Username => f.write_str("username"),
            UniqueField::Email => f.write_str("email"),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Another account already holds this value.
    #[error("{0} already taken")]
    Duplicate(UniqueField),

    /// The backend could not complete the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<Account>, StoreError>;

    /// `email` must already be lower-cased.
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError>;

    /// All accounts ordered by id.
    async fn list(&self) -> Result<Vec<Account>, StoreError>;

    /// Inserts `account`, enforcing unique username and email.
    async fn insert(&self, account: NewAccount, now: DateTime<Utc>) -> Result<Account, StoreError>;

    /// Applies `changes` to account `id`. Returns `None` if it does not exist.
    async fn update(
        &self,
        id: u64,
        changes: AccountChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError>;

    /// Removes account `id`. Returns `false` if it did not exist.
    async fn delete(&self, id: u64) -> Result<bool, StoreError>;
}

#[derive(Debug, Default)]
struct MemoryState {
    accounts: BTreeMap<u64, Account>,
    last_id: u64,
}

impl MemoryState {
    fn conflict(&self, exclude: Option<u64>, username: Option<&str>, email: Option<&str>) -> Option<UniqueField> {
        self.accounts
            .values()
            .filter(|a| Some(a.id) != exclude)
            .find_map(|a| {
                if email.is_some_and(|e| a.email == e) {
                    Some(UniqueField::Email)
                } else if username.is_some_and(|u| a.username == u) {
                    Some(UniqueField::Username)
                } else {
                    None
                }
            })
    }
}

/// In-process store. Ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryAccountStore {
    state: RwLock<MemoryState>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<Account>, StoreError> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let state = self.state.read().await;
        Ok(state.accounts.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<Account>, StoreError> {
        let state = self.state.read().await;
        Ok(state.accounts.values().find(|a| a.username == username).cloned())
    }

    async fn list(&self) -> Result<Vec<Account>, StoreError> {
        Ok(self.state.read().await.accounts.values().cloned().collect())
    }

    async fn insert(&self, account: NewAccount, now: DateTime<Utc>) -> Result<Account, StoreError> {
        let mut state = self.state.write().await;
        if let Some(field) = state.conflict(None, Some(&account.username), Some(&account.email)) {
            return Err(StoreError::Duplicate(field));
        }

        state.last_id += 1;
        let stored = Account {
            id: state.last_id,
            username: account.username,
            email: account.email,
            password_hash: account.password_hash,
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn update(
        &self,
        id: u64,
        changes: AccountChanges,
        now: DateTime<Utc>,
    ) -> Result<Option<Account>, StoreError> {
        let mut state = self.state.write().await;
        if !state.accounts.contains_key(&id) {
            return Ok(None);
        }
        if let Some(field) = state.conflict(Some(id), changes.username.as_deref(), changes.email.as_deref()) {
            return Err(StoreError::Duplicate(field));
        }

        let Some(account) = state.accounts.get_mut(&id) else {
            return Ok(None);
        };
        if let Some(username) = changes.username {
            account.username = username;
        }
        if let Some(email) = changes.email {
            account.email = email;
        }
        account.updated_at = now;
        Ok(Some(account.clone()))
    }

    async fn delete(&self, id: u64) -> Result<bool, StoreError> {
        Ok(self.state.write().await.accounts.remove(&id).is_some())
    }
}
