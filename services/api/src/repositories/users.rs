//! User repository for account storage and credentials

use anyhow::Result;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use crate::models::{ModerationUpdate, NewUser, ReferredUser, UpdateProfile, User, WalletEntryType};

/// Outcome of a registration attempt
pub enum RegisterOutcome {
    Created(User),
    Duplicate,
}

/// Outcome of a profile update
pub enum ProfileOutcome {
    Updated(User),
    Duplicate,
    Missing,
}

/// User repository
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create the account, its wallet and the welcome-bonus ledger entry in
    /// one transaction. When the signup came through a referral link the
    /// referrer is credited and alerted in the same transaction.
    pub async fn register(
        &self,
        new_user: &NewUser,
        signup_bonus: i64,
        referral_bonus: i64,
    ) -> Result<RegisterOutcome> {
        info!("Registering new user: {}", new_user.username);

        let password_hash = hash_password(&new_user.password)?;

        let mut tx = self.pool.begin().await?;

        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, email, password_hash, referral_code, referred_by)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&password_hash)
        .bind(&new_user.referral_code)
        .bind(new_user.referred_by)
        .fetch_one(&mut *tx)
        .await;

        let user = match inserted {
            Ok(user) => user,
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                tx.rollback().await?;
                return Ok(RegisterOutcome::Duplicate);
            }
            Err(e) => return Err(e.into()),
        };

        sqlx::query("INSERT INTO wallets (user_id, balance) VALUES ($1, $2)")
            .bind(user.id)
            .bind(signup_bonus)
            .execute(&mut *tx)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO wallet_entries (user_id, entry_type, amount, description)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(user.id)
        .bind(WalletEntryType::RegistrationBonus)
        .bind(signup_bonus)
        .bind("Welcome bonus")
        .execute(&mut *tx)
        .await?;

        if let Some(referrer_id) = new_user.referred_by {
            sqlx::query(
                "UPDATE wallets SET balance = balance + $2, updated_at = NOW() WHERE user_id = $1",
            )
            .bind(referrer_id)
            .bind(referral_bonus)
            .execute(&mut *tx)
            .await?;

            sqlx::query(
                r#"
                INSERT INTO wallet_entries (user_id, entry_type, amount, description)
                VALUES ($1, $2, $3, $4)
                "#,
            )
            .bind(referrer_id)
            .bind(WalletEntryType::ReferralBonus)
            .bind(referral_bonus)
            .bind(format!("Referral bonus for inviting {}", new_user.username))
            .execute(&mut *tx)
            .await?;

            sqlx::query("INSERT INTO alerts (user_id, message) VALUES ($1, $2)")
                .bind(referrer_id)
                .bind(format!(
                    "{} joined with your referral code! +{} tokens",
                    new_user.username, referral_bonus
                ))
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(RegisterOutcome::Created(user))
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find a user by username or email
    pub async fn find_by_username_or_email(&self, username_or_email: &str) -> Result<Option<User>> {
        let user =
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = $1 OR email = $1")
                .bind(username_or_email)
                .fetch_optional(&self.pool)
                .await?;

        Ok(user)
    }

    /// Find a user by referral code
    pub async fn find_by_referral_code(&self, code: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE referral_code = $1")
            .bind(code)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Verify a user's password
    pub fn verify_password(&self, user: &User, password: &str) -> Result<bool> {
        let parsed_hash = PasswordHash::new(&user.password_hash)
            .map_err(|e| anyhow::anyhow!("Failed to parse password hash: {}", e))?;

        let argon2 = Argon2::default();
        let result = argon2.verify_password(password.as_bytes(), &parsed_hash);

        Ok(result.is_ok())
    }

    /// List users, newest first, with the total count for pagination
    pub async fn list(&self, page: i64, per_page: i64) -> Result<(Vec<User>, i64)> {
        let offset = (page - 1).max(0) * per_page;

        let users = sqlx::query_as::<_, User>(
            "SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2",
        )
        .bind(per_page)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok((users, total))
    }

    /// Update the caller's own profile fields
    pub async fn update_profile(&self, id: Uuid, update: &UpdateProfile) -> Result<ProfileOutcome> {
        let result = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET username = COALESCE($2, username),
                email = COALESCE($3, email),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.username.as_deref())
        .bind(update.email.as_deref())
        .fetch_optional(&self.pool)
        .await;

        match result {
            Ok(Some(user)) => Ok(ProfileOutcome::Updated(user)),
            Ok(None) => Ok(ProfileOutcome::Missing),
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Ok(ProfileOutcome::Duplicate)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Apply admin moderation flags; absent fields are left untouched
    pub async fn set_moderation(
        &self,
        id: Uuid,
        update: &ModerationUpdate,
    ) -> Result<Option<User>> {
        info!("Updating moderation flags for user: {}", id);

        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_verified = COALESCE($2, is_verified),
                is_suspended = COALESCE($3, is_suspended),
                is_banned = COALESCE($4, is_banned),
                is_seed = COALESCE($5, is_seed),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.is_verified)
        .bind(update.is_suspended)
        .bind(update.is_banned)
        .bind(update.is_seed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Delete a user account
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Users who signed up with this user's referral code, newest first
    pub async fn referred_users(&self, id: Uuid) -> Result<Vec<ReferredUser>> {
        let referred = sqlx::query_as::<_, ReferredUser>(
            r#"
            SELECT username, created_at AS joined_at
            FROM users
            WHERE referred_by = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(referred)
    }
}

/// Hash a password with a fresh salt
fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))?
        .to_string();

    Ok(hash)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("hunter2!A").unwrap();
        let parsed = PasswordHash::new(&hash).unwrap();

        assert!(
            Argon2::default()
                .verify_password(b"hunter2!A", &parsed)
                .is_ok()
        );
        assert!(
            Argon2::default()
                .verify_password(b"wrong password", &parsed)
                .is_err()
        );
    }

    #[tokio::test]
    #[ignore = "requires a running PostgreSQL instance"]
    async fn registration_credits_both_sides_of_a_referral() -> Result<()> {
        let config = common::config::AppConfig::load()?;
        let pool = common::database::init_pool(&config.database).await?;
        common::database::run_migrations(&pool).await?;

        let repo = UserRepository::new(pool.clone());
        let suffix = Uuid::new_v4().simple().to_string();

        let referrer = NewUser {
            username: format!("ref_{suffix}"),
            email: format!("ref_{suffix}@example.com"),
            password: "hunter2!A".to_string(),
            referral_code: format!("RC{suffix}"),
            referred_by: None,
        };
        let RegisterOutcome::Created(referrer) = repo.register(&referrer, 10, 5).await? else {
            panic!("referrer registration should succeed");
        };

        let invited = NewUser {
            username: format!("inv_{suffix}"),
            email: format!("inv_{suffix}@example.com"),
            password: "hunter2!A".to_string(),
            referral_code: format!("IC{suffix}"),
            referred_by: Some(referrer.id),
        };
        let RegisterOutcome::Created(invited) = repo.register(&invited, 10, 5).await? else {
            panic!("invited registration should succeed");
        };

        // Signup bonus plus the referral bonus for bringing someone in
        let referrer_balance: i64 =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(referrer.id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(referrer_balance, 15);

        let invited_balance: i64 =
            sqlx::query_scalar("SELECT balance FROM wallets WHERE user_id = $1")
                .bind(invited.id)
                .fetch_one(&pool)
                .await?;
        assert_eq!(invited_balance, 10);

        // A taken username rolls the whole registration back
        let duplicate = NewUser {
            username: format!("ref_{suffix}"),
            email: format!("other_{suffix}@example.com"),
            password: "hunter2!A".to_string(),
            referral_code: format!("DC{suffix}"),
            referred_by: None,
        };
        assert!(matches!(
            repo.register(&duplicate, 10, 5).await?,
            RegisterOutcome::Duplicate
        ));

        let referred = repo.referred_users(referrer.id).await?;
        assert_eq!(referred.len(), 1);
        assert_eq!(referred[0].username, invited.username);

        Ok(())
    }
}
