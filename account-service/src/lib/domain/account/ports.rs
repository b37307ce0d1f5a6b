use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AccountView;
use crate::account::models::AuthSession;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::EmailAddress;
use crate::account::models::Identity;
use crate::account::models::LoginCommand;
use crate::account::models::RegisterCommand;
use crate::account::models::UpdateProfileCommand;
use crate::account::models::Username;

/// Port for account and authentication operations.
#[async_trait]
pub trait AccountServicePort: Send + Sync + 'static {
    /// Register a new account and issue its first token.
    ///
    /// # Errors
    /// * `InvalidPassword` - Password violates the configured policy
    /// * `DuplicateIdentity` - Username or email is already taken
    /// * `StoreUnavailable` - Backing store failed
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, AccountError>;

    /// Verify email and password and issue a token.
    ///
    /// # Errors
    /// * `InvalidCredentials` - No such account, or wrong password
    /// * `StoreUnavailable` - Backing store failed
    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AccountError>;

    /// Exchange a valid token for a fresh one bound to the same account.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed, forged, or names no account
    /// * `ExpiredToken` - Token has expired
    async fn refresh(&self, token: &str) -> Result<String, AccountError>;

    /// Acknowledge a logout.
    ///
    /// Tokens are stateless; the presented token stays valid until it expires.
    async fn logout(&self) -> Result<(), AccountError>;

    /// Verify a token and return the identity it carries.
    ///
    /// # Errors
    /// * `InvalidToken` - Token is malformed, forged, or has a bad subject
    /// * `ExpiredToken` - Token has expired
    fn verify_token(&self, token: &str) -> Result<Identity, AccountError>;

    /// Retrieve the public view of an account.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    async fn get_account(&self, id: &AccountId) -> Result<AccountView, AccountError>;

    /// Update username and/or email.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DuplicateIdentity` - New username or email is already taken
    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<AccountView, AccountError>;

    /// Replace the password after checking the current one.
    ///
    /// # Errors
    /// * `InvalidCredentials` - Current password is wrong
    /// * `InvalidPassword` - New password violates the configured policy
    /// * `NotFound` - Account does not exist
    async fn change_password(
        &self,
        id: &AccountId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError>;
}

/// Keyed account store.
///
/// Implementations must reject a `create` or `update_identity` that would
/// leave two accounts sharing a username or email, even under concurrent
/// writers.
#[async_trait]
pub trait AccountRepository: Send + Sync + 'static {
    /// Persist a new account.
    ///
    /// # Errors
    /// * `DuplicateIdentity` - Username or email is already taken
    /// * `StoreUnavailable` - Store operation failed
    async fn create(&self, account: Account) -> Result<Account, AccountError>;

    /// Retrieve account by identifier.
    ///
    /// # Errors
    /// * `StoreUnavailable` - Store operation failed
    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError>;

    /// Retrieve account by email address.
    ///
    /// # Errors
    /// * `StoreUnavailable` - Store operation failed
    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError>;

    /// Retrieve any account holding either the email or the username.
    ///
    /// # Errors
    /// * `StoreUnavailable` - Store operation failed
    async fn find_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<Option<Account>, AccountError>;

    /// Persist the username and email of an existing account.
    ///
    /// Only `username`, `email` and `updated_at` are written; the stored
    /// password hash is left as is. Returns the account as stored.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `DuplicateIdentity` - New username or email is already taken
    /// * `StoreUnavailable` - Store operation failed
    async fn update_identity(&self, account: Account) -> Result<Account, AccountError>;

    /// Replace the password hash of an existing account.
    ///
    /// # Errors
    /// * `NotFound` - Account does not exist
    /// * `StoreUnavailable` - Store operation failed
    async fn update_password_hash(
        &self,
        id: &AccountId,
        password_hash: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AccountError>;
}
