// Credential store: thin async data-access functions over the SQLite pool.
//
// All mutations are single-row writes keyed by primary key, so no
// transactions or application-level locking are needed; the one logical
// compare-and-swap (concurrent first logins for the same subject) is an
// atomic INSERT .. ON CONFLICT DO UPDATE in `users`.

pub mod credentials;
pub mod projects;
pub mod sessions;
pub mod users;

#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
    use std::str::FromStr;

    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("valid sqlite url")
        .foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("in-memory pool");
    crate::common::migrations::run_migrations(&pool)
        .await
        .expect("migrations");
    pool
}
