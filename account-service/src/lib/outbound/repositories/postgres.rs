use async_trait::async_trait;
use chrono::DateTime;
use chrono::Utc;
use sqlx::FromRow;
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::errors::AccountError;
use crate::account::errors::IdentityField;
use crate::account::models::Account;
use crate::account::models::AccountId;
use crate::account::models::EmailAddress;
use crate::account::models::Username;
use crate::account::ports::AccountRepository;

const SELECT_ACCOUNT: &str = r#"
    SELECT id, username, email, password_hash, role, created_at, updated_at
    FROM accounts
"#;

#[derive(FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    password_hash: String,
    role: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<AccountRow> for Account {
    type Error = AccountError;

    fn try_from(r: AccountRow) -> Result<Self, Self::Error> {
        Ok(Account {
            id: AccountId(r.id),
            username: Username::new(r.username)?,
            email: EmailAddress::new(r.email)?,
            password_hash: r.password_hash,
            role: r.role.parse()?,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

pub struct PostgresAccountRepository {
    pool: PgPool,
}

impl PostgresAccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_one_where(
        &self,
        clause: &str,
        binds: &[&str],
    ) -> Result<Option<Account>, AccountError> {
        let sql = format!("{} WHERE {} LIMIT 1", SELECT_ACCOUNT, clause);
        let mut query = sqlx::query_as::<_, AccountRow>(&sql);
        for bind in binds {
            query = query.bind(*bind);
        }

        query
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(Account::try_from)
            .transpose()
    }
}

fn store_error(e: sqlx::Error) -> AccountError {
    tracing::error!(error = %e, "Account store operation failed");
    AccountError::StoreUnavailable(e.to_string())
}

fn write_error(e: sqlx::Error) -> AccountError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            if db_err.constraint() == Some("accounts_username_key") {
                return AccountError::DuplicateIdentity(IdentityField::Username);
            }
            if db_err.constraint() == Some("accounts_email_key") {
                return AccountError::DuplicateIdentity(IdentityField::Email);
            }
        }
    }
    store_error(e)
}

#[async_trait]
impl AccountRepository for PostgresAccountRepository {
    async fn create(&self, account: Account) -> Result<Account, AccountError> {
        sqlx::query(
            r#"
            INSERT INTO accounts (id, username, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(account.id.0)
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(&account.password_hash)
        .bind(account.role.as_str())
        .bind(account.created_at)
        .bind(account.updated_at)
        .execute(&self.pool)
        .await
        .map_err(write_error)?;

        Ok(account)
    }

    async fn find_by_id(&self, id: &AccountId) -> Result<Option<Account>, AccountError> {
        let sql = format!("{} WHERE id = $1", SELECT_ACCOUNT);

        sqlx::query_as::<_, AccountRow>(&sql)
            .bind(id.0)
            .fetch_optional(&self.pool)
            .await
            .map_err(store_error)?
            .map(Account::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &EmailAddress) -> Result<Option<Account>, AccountError> {
        self.fetch_one_where("email = $1", &[email.as_str()]).await
    }

    async fn find_by_email_or_username(
        &self,
        email: &EmailAddress,
        username: &Username,
    ) -> Result<Option<Account>, AccountError> {
        self.fetch_one_where(
            "email = $1 OR username = $2",
            &[email.as_str(), username.as_str()],
        )
        .await
    }

    async fn update_identity(&self, account: Account) -> Result<Account, AccountError> {
        sqlx::query_as::<_, AccountRow>(
            r#"
            UPDATE accounts
            SET username = $2, email = $3, updated_at = $4
            WHERE id = $1
            RETURNING id, username, email, password_hash, role, created_at, updated_at
            "#,
        )
        .bind(account.id.0)
        .bind(account.username.as_str())
        .bind(account.email.as_str())
        .bind(account.updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(write_error)?
        .ok_or_else(|| AccountError::NotFound(account.id.to_string()))
        .and_then(Account::try_from)
    }

    async fn update_password_hash(
        &self,
        id: &AccountId,
        password_hash: String,
        updated_at: DateTime<Utc>,
    ) -> Result<(), AccountError> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET password_hash = $2, updated_at = $3
            WHERE id = $1
            "#,
        )
        .bind(id.0)
        .bind(password_hash)
        .bind(updated_at)
        .execute(&self.pool)
        .await
        .map_err(store_error)?;

        if result.rows_affected() == 0 {
            return Err(AccountError::NotFound(id.to_string()));
        }

        Ok(())
    }
}
