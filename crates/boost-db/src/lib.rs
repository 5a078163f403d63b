use std::str::FromStr;

use eyre::WrapErr;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Pool, Sqlite};

pub mod messages;
pub mod orders;
pub mod users;

pub use messages::{
    get_message, insert_message, list_messages, mark_message_read, mark_order_messages_read,
    unread_count,
};
pub use orders::{
    accept_order, get_order, insert_order, list_available_orders, list_orders, list_timeline,
    record_feedback, update_order, AvailableOrderFilter, OrderFilter,
};
pub use users::{
    find_user_by_token, generate_token, get_user, hash_token, insert_user, issue_token,
};

pub type SqlitePool = Pool<Sqlite>;

pub async fn connect(database_url: &str) -> eyre::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(database_url)
        .wrap_err("parse database url")?
        .create_if_missing(true)
        .foreign_keys(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal);

    SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await
        .wrap_err("connect sqlite")
}

pub async fn migrate(pool: &SqlitePool) -> eyre::Result<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .wrap_err("run migrations")?;
    Ok(())
}

pub async fn ping(pool: &SqlitePool) -> eyre::Result<()> {
    sqlx::query("SELECT 1")
        .execute(pool)
        .await
        .wrap_err("ping database")?;
    Ok(())
}
