use std::sync::Arc;
use std::sync::OnceLock;

use async_trait::async_trait;
use auth::AuthenticationError;
use auth::Authenticator;
use auth::PasswordError;
use chrono::Utc;

use crate::account::errors::AccountError;
use crate::account::errors::IdentityField;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::AccountView;
use crate::account::models::AuthSession;
use crate::account::models::ChangePasswordCommand;
use crate::account::models::EmailAddress;
use crate::account::models::Identity;
use crate::account::models::LoginCommand;
use crate::account::models::PasswordPolicy;
use crate::account::models::RegisterCommand;
use crate::account::models::Role;
use crate::account::models::UpdateProfileCommand;
use crate::account::ports::AccountRepository;
use crate::account::ports::AccountServicePort;

/// Domain service implementation for account and authentication operations.
///
/// Argon2 work runs on the blocking pool so a slow hash never holds an async
/// worker.
pub struct AccountService<AR>
where
    AR: AccountRepository,
{
    repository: Arc<AR>,
    authenticator: Arc<Authenticator>,
    password_policy: PasswordPolicy,
    // Verified against when the email is unknown, so both login failures cost one hash.
    decoy_hash: Arc<OnceLock<String>>,
}

impl<AR> AccountService<AR>
where
    AR: AccountRepository,
{
    /// Create a new account service with injected dependencies.
    ///
    /// # Arguments
    /// * `repository` - Account store implementation
    /// * `authenticator` - Password hashing and token signing
    /// * `password_policy` - Rules for accepting new passwords
    pub fn new(
        repository: Arc<AR>,
        authenticator: Arc<Authenticator>,
        password_policy: PasswordPolicy,
    ) -> Self {
        Self {
            repository,
            authenticator,
            password_policy,
            decoy_hash: Arc::new(OnceLock::new()),
        }
    }

    async fn hash_password(&self, password: String) -> Result<String, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.hash_password(&password))
            .await
            .map_err(|e| AccountError::Unknown(format!("Hashing task failed: {}", e)))?
            .map_err(AccountError::from)
    }

    async fn password_matches(
        &self,
        password: String,
        stored_hash: String,
    ) -> Result<bool, AccountError> {
        let authenticator = Arc::clone(&self.authenticator);

        tokio::task::spawn_blocking(move || authenticator.verify_password(&password, &stored_hash))
            .await
            .map_err(|e| AccountError::Unknown(format!("Verification task failed: {}", e)))
    }

    async fn burn_decoy_verification(&self, password: String) {
        let authenticator = Arc::clone(&self.authenticator);
        let decoy_hash = Arc::clone(&self.decoy_hash);

        let result = tokio::task::spawn_blocking(move || {
            // A failed hash is not cached; the next unknown-email login retries.
            let hash = match decoy_hash.get() {
                Some(hash) => hash,
                None => {
                    let hash = authenticator.hash_password("decoy")?;
                    decoy_hash.get_or_init(|| hash)
                }
            };
            authenticator.verify_password(&password, hash);
            Ok::<(), PasswordError>(())
        })
        .await;

        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!(error = %e, "Decoy hash generation failed"),
            Err(e) => tracing::error!(error = %e, "Decoy verification task failed"),
        }
    }

    async fn find_existing(&self, id: &AccountId) -> Result<Account, AccountError> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(AccountError::NotFound(id.to_string()))
    }

    fn issue_token(&self, id: &AccountId) -> Result<String, AccountError> {
        self.authenticator
            .generate_token(&id.to_string())
            .map_err(AccountError::from)
    }
}

#[async_trait]
impl<AR> AccountServicePort for AccountService<AR>
where
    AR: AccountRepository,
{
    async fn register(&self, command: RegisterCommand) -> Result<AuthSession, AccountError> {
        self.password_policy.check(&command.password)?;

        if let Some(existing) = self
            .repository
            .find_by_email_or_username(&command.email, &command.username)
            .await?
        {
            let field = if existing.username == command.username {
                IdentityField::Username
            } else {
                IdentityField::Email
            };
            return Err(AccountError::DuplicateIdentity(field));
        }

        let password_hash = self.hash_password(command.password).await?;

        let now = Utc::now();
        let account = Account {
            id: AccountId::new(),
            username: command.username,
            email: command.email,
            password_hash,
            role: Role::default(),
            created_at: now,
            updated_at: now,
        };

        // The store re-checks uniqueness; a racing registration surfaces here.
        let created = self.repository.create(account).await?;
        tracing::info!(account_id = %created.id, "Account registered");

        let token = self.issue_token(&created.id)?;

        Ok(AuthSession {
            token,
            account: created.view(),
        })
    }

    async fn login(&self, command: LoginCommand) -> Result<AuthSession, AccountError> {
        let Ok(email) = EmailAddress::new(command.email) else {
            return Err(AccountError::InvalidCredentials);
        };

        let Some(account) = self.repository.find_by_email(&email).await? else {
            self.burn_decoy_verification(command.password).await;
            tracing::debug!("Login rejected");
            return Err(AccountError::InvalidCredentials);
        };

        let authenticator = Arc::clone(&self.authenticator);
        let stored_hash = account.password_hash.clone();
        let subject = account.id.to_string();
        let password = command.password;

        let result = tokio::task::spawn_blocking(move || {
            authenticator.authenticate(&password, &stored_hash, &subject)
        })
        .await
        .map_err(|e| AccountError::Unknown(format!("Verification task failed: {}", e)))?;

        let result = result.map_err(|e| match e {
            AuthenticationError::InvalidCredentials => {
                tracing::debug!("Login rejected");
                AccountError::InvalidCredentials
            }
            AuthenticationError::JwtError(err) => AccountError::from(err),
        })?;

        tracing::info!(account_id = %account.id, "Account logged in");

        Ok(AuthSession {
            token: result.access_token,
            account: account.view(),
        })
    }

    async fn refresh(&self, token: &str) -> Result<String, AccountError> {
        let identity = self.verify_token(token)?;

        if self
            .repository
            .find_by_id(&identity.account_id)
            .await?
            .is_none()
        {
            tracing::debug!(account_id = %identity.account_id, "Refresh for unknown account");
            return Err(AccountError::InvalidToken);
        }

        self.issue_token(&identity.account_id)
    }

    async fn logout(&self) -> Result<(), AccountError> {
        Ok(())
    }

    fn verify_token(&self, token: &str) -> Result<Identity, AccountError> {
        let claims = self.authenticator.validate_token(token)?;

        let account_id =
            AccountId::from_string(claims.subject()).map_err(|_| AccountError::InvalidToken)?;

        Ok(Identity { account_id })
    }

    async fn get_account(&self, id: &AccountId) -> Result<AccountView, AccountError> {
        self.find_existing(id).await.map(|account| account.view())
    }

    async fn update_profile(
        &self,
        id: &AccountId,
        command: UpdateProfileCommand,
    ) -> Result<AccountView, AccountError> {
        let mut account = self.find_existing(id).await?;

        if command.username.is_none() && command.email.is_none() {
            return Ok(account.view());
        }

        if let Some(new_username) = command.username {
            account.username = new_username;
        }

        if let Some(new_email) = command.email {
            account.email = new_email;
        }

        account.updated_at = Utc::now();

        let updated = self.repository.update_identity(account).await?;
        Ok(updated.view())
    }

    async fn change_password(
        &self,
        id: &AccountId,
        command: ChangePasswordCommand,
    ) -> Result<(), AccountError> {
        self.password_policy.check(&command.new_password)?;

        let account = self.find_existing(id).await?;

        if !self
            .password_matches(command.current_password, account.password_hash)
            .await?
        {
            return Err(AccountError::InvalidCredentials);
        }

        let password_hash = self.hash_password(command.new_password).await?;

        self.repository
            .update_password_hash(id, password_hash, Utc::now())
            .await?;
        tracing::info!(account_id = %id, "Password changed");

        Ok(())
    }
}
