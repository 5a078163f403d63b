use eyre::WrapErr;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::{Sqlite, Transaction};

use models::{Role, User, UserRow};

use crate::SqlitePool;

const USER_COLUMNS: &str =
    "id, email, name, role, booster_rating, booster_completed_orders, created_at";

pub async fn insert_user(
    pool: &SqlitePool,
    email: &str,
    name: &str,
    role: Role,
    created_at: i64,
) -> eyre::Result<User> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "INSERT INTO users (email, name, role, created_at)
         VALUES (?1, ?2, ?3, ?4)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(email)
    .bind(name)
    .bind(role.as_str())
    .bind(created_at)
    .fetch_one(pool)
    .await
    .wrap_err("insert user")?;

    User::try_from(row)
}

pub async fn get_user(pool: &SqlitePool, id: i64) -> eyre::Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(&format!(
        "SELECT {USER_COLUMNS} FROM users WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await
    .wrap_err("get user")?;

    row.map(User::try_from).transpose()
}

/// Only the SHA-256 of a token is stored; the raw value is shown once.
pub fn hash_token(raw: &str) -> String {
    hex::encode(Sha256::digest(raw.as_bytes()))
}

pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Create a new API token for `user_id` and return it in plain text.
pub async fn issue_token(pool: &SqlitePool, user_id: i64, created_at: i64) -> eyre::Result<String> {
    let token = generate_token();

    sqlx::query("INSERT INTO api_tokens (token_hash, user_id, created_at) VALUES (?1, ?2, ?3)")
        .bind(hash_token(&token))
        .bind(user_id)
        .bind(created_at)
        .execute(pool)
        .await
        .wrap_err("insert api token")?;

    Ok(token)
}

pub async fn find_user_by_token(pool: &SqlitePool, raw_token: &str) -> eyre::Result<Option<User>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT u.id, u.email, u.name, u.role, u.booster_rating, u.booster_completed_orders, u.created_at
         FROM api_tokens t
         JOIN users u ON u.id = t.user_id
         WHERE t.token_hash = ?",
    )
    .bind(hash_token(raw_token))
    .fetch_optional(pool)
    .await
    .wrap_err("find user by token")?;

    row.map(User::try_from).transpose()
}

/// Recompute a booster's average feedback and rated order count.
pub(crate) async fn refresh_booster_stats(
    tx: &mut Transaction<'_, Sqlite>,
    booster_id: i64,
) -> eyre::Result<()> {
    let (average, rated): (Option<f64>, i64) = sqlx::query_as(
        "SELECT AVG(feedback_rating), COUNT(feedback_rating)
         FROM orders
         WHERE booster_id = ? AND feedback_rating IS NOT NULL",
    )
    .bind(booster_id)
    .fetch_one(&mut **tx)
    .await
    .wrap_err("aggregate booster feedback")?;

    sqlx::query(
        "UPDATE users SET booster_rating = ?1, booster_completed_orders = ?2 WHERE id = ?3",
    )
    .bind(average)
    .bind(rated)
    .bind(booster_id)
    .execute(&mut **tx)
    .await
    .wrap_err("update booster stats")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_hash_is_stable_hex() {
        let hash = hash_token("secret");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_token("secret"));
        assert_ne!(hash, hash_token("Secret"));
    }

    #[test]
    fn generated_tokens_differ() {
        let a = generate_token();
        let b = generate_token();
        assert_eq!(a.len(), 64);
        assert_ne!(a, b);
    }
}
