//! In-memory account store for development and testing.
//!
//! All maps sit behind a single lock, so the uniqueness check and the write
//! of `create`/`update_identity` happen as one step.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::account::errors::AccountError;
use crate::account::errors::IdentityField;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

#[derive(Default)]
struct Accounts {
    by_id: HashMap<AccountId, Account>,
    by_username: HashMap<Username, AccountId>,
    by_email: HashMap<EmailAddress, AccountId>,
}

impl Accounts {
    /// Field that another account (not `own_id`) already holds, if any.
    fn collision(&self, account: &Account, own_id: Option<&AccountId>) -> Option<IdentityField> {
        let taken_by_other = |holder: Option<&AccountId>| match holder {
            Some(holder) => Some(holder) != own_id,
            None => false,
        };

        if taken_by_other(self.by_username.get(&account.username)) {
            Some(IdentityField::Username)
        } else if taken_by_other(self.by_email.get(&account.email)) {
            Some(IdentityField::Email)
        } else {
            None
        }
    }
}

#[derive(Default)]
pub struct InMemoryAccountRepository {
    accounts: RwLock<Accounts>,
}

impl InMemoryAccountRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AccountRepository for InMemoryAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, AccountError> {
        let mut accounts = self.accounts.write().await;

        if let Some(field) = accounts.collision(&account, None) {
            return Err(AccountError::DuplicateIdentity(field));
        }

        accounts
            .by_username
            .insert(account.username.clone(), account.id);
        accounts.by_email.insert(account.email.clone(), account.id);
        accounts.by_id.insert(account.id, account.clone());

        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        Ok(self.accounts.read().await.by_id.get(id).cloned())
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError> {
        let accounts = self.accounts.read().await;

        Ok(accounts
            .by_email
            .get(email)
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }

    async fn find_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<Option<Account>, AccountError> {
        let accounts = self.accounts.read().await;

        Ok(accounts
            .by_email
            .get(email)
            .or_else(|| accounts.by_username.get(username))
            .and_then(|id| accounts.by_id.get(id))
            .cloned())
    }

    async fn update_identity(&self, account: Account) -> Result<Account, AccountError> {
        let mut accounts = self.accounts.write().await;

        let Some(mut stored) = accounts.by_id.get(&account.id).cloned() else {
            return Err(AccountError::NotFound(account.id.to_string()));
        };

        if let Some(field) = accounts.collision(&account, Some(&account.id)) {
            return Err(AccountError::DuplicateIdentity(field));
        }

        accounts.by_username.remove(&stored.username);
        accounts.by_email.remove(&stored.email);

        stored.username = account.username;
        stored.email = account.email;
        stored.updated_at = account.updated_at;

        accounts
            .by_username
            .insert(stored.username.clone(), stored.id);
        accounts.by_email.insert(stored.email.clone(), stored.id);
        accounts.by_id.insert(stored.id, stored.clone());

        Ok(stored)
    }

    async fn update_password_hash(
        &self,
        id: &AccountId,
        password_hash: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let mut accounts = self.accounts.write().await;

        let stored = accounts
            .by_id
            .get_mut(id)
            .ok_or_else(|| AccountError::NotFound(id.to_string()))?;
        stored.password_hash = password_hash;
        stored.updated_at = updated_at;

        Ok(())
    }
}
