//! User operations

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::debug;

use crate::auth::models::User;
use crate::common::safe_email_log;

/// Fields applied on every successful OIDC login.
#[derive(Debug, Clone)]
pub struct UpsertUserOnLogin {
    pub user_id: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
}

/// Create-or-update a user at login time, keyed by the provider subject.
///
/// The insert and the fallback update are one atomic statement, so two
/// concurrent first logins for the same subject produce exactly one row.
/// Mutable fields (name, picture) only overwrite when the new claim is
/// present; `last_login_at` and `updated_at` are always touched.
///
/// A user who registered locally with the same email is linked instead of
/// duplicated: the email-unique violation falls back to an update of that
/// row.
pub async fn upsert_user_on_login(
    pool: &SqlitePool,
    input: &UpsertUserOnLogin,
) -> Result<User, sqlx::Error> {
    let now = Utc::now().timestamp_millis();
    let email = input.email.to_lowercase();

    let result = sqlx::query(
        r#"
        INSERT INTO users (id, email, name, picture, provider, created_at, updated_at, last_login_at)
        VALUES (?, ?, ?, ?, 'oidc', ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            name = COALESCE(excluded.name, users.name),
            picture = COALESCE(excluded.picture, users.picture),
            last_login_at = excluded.last_login_at,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&input.user_id)
    .bind(&email)
    .bind(input.name.as_deref())
    .bind(input.picture.as_deref())
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await;

    match result {
        Ok(_) => {
            sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
                .bind(&input.user_id)
                .fetch_one(pool)
                .await
        }
        Err(e) if is_unique_violation(&e) => {
            // Same email, different subject: an account registered locally
            // before the first federated login. Link onto the email row.
            debug!(
                email = %safe_email_log(&email),
                "Linking federated login onto existing account by email"
            );
            sqlx::query(
                r#"
                UPDATE users SET
                    name = COALESCE(?, name),
                    picture = COALESCE(?, picture),
                    last_login_at = ?,
                    updated_at = ?
                WHERE email = ?
                "#,
            )
            .bind(input.name.as_deref())
            .bind(input.picture.as_deref())
            .bind(now)
            .bind(now)
            .bind(&email)
            .execute(pool)
            .await?;

            sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
                .bind(&email)
                .fetch_one(pool)
                .await
        }
        Err(e) => Err(e),
    }
}

/// Create a locally registered (email + password) user.
pub async fn create_local_user(
    pool: &SqlitePool,
    id: &str,
    email: &str,
    name: Option<&str>,
    password_hash: &str,
) -> Result<User, sqlx::Error> {
    let now = Utc::now().timestamp_millis();

    sqlx::query(
        r#"
        INSERT INTO users (id, email, name, password_hash, provider, created_at, updated_at, last_login_at)
        VALUES (?, ?, ?, ?, 'local', ?, ?, ?)
        "#,
    )
    .bind(id)
    .bind(email.to_lowercase())
    .bind(name)
    .bind(password_hash)
    .bind(now)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Key/index lookup; absence is None, never an error.
pub async fn find_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email.to_lowercase())
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_id(pool: &SqlitePool, user_id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Update display fields from the profile settings page. Absent fields are
/// left untouched.
pub async fn update_user_profile(
    pool: &SqlitePool,
    user_id: &str,
    name: Option<&str>,
    picture: Option<&str>,
) -> Result<Option<User>, sqlx::Error> {
    let now = Utc::now().timestamp_millis();

    sqlx::query(
        r#"
        UPDATE users SET
            name = COALESCE(?, name),
            picture = COALESCE(?, picture),
            updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(name)
    .bind(picture)
    .bind(now)
    .bind(user_id)
    .execute(pool)
    .await?;

    get_user_by_id(pool, user_id).await
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db) => db.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_pool;

    fn login_input(sub: &str, email: &str) -> UpsertUserOnLogin {
        UpsertUserOnLogin {
            user_id: sub.to_string(),
            email: email.to_string(),
            name: Some("Avery Creator".to_string()),
            picture: None,
        }
    }

    #[tokio::test]
    async fn test_upsert_creates_then_updates_single_row() {
        let pool = test_pool().await;
        let input = login_input("sub-001", "Avery@Example.com");

        let first = upsert_user_on_login(&pool, &input).await.unwrap();
        assert_eq!(first.email, "avery@example.com");
        assert_eq!(first.provider.as_deref(), Some("oidc"));

        let second = upsert_user_on_login(&pool, &input).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.created_at, first.created_at);

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_upsert_is_idempotent_under_concurrent_logins() {
        let pool = test_pool().await;
        let input = login_input("sub-race", "race@example.com");

        let attempts = (0..8).map(|_| upsert_user_on_login(&pool, &input));
        let results = futures::future::join_all(attempts).await;
        for result in results {
            assert_eq!(result.unwrap().id, "sub-race");
        }

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_upsert_preserves_fields_absent_from_claims() {
        let pool = test_pool().await;
        let mut input = login_input("sub-002", "keep@example.com");
        input.picture = Some("https://cdn.example.com/avatar.png".to_string());
        upsert_user_on_login(&pool, &input).await.unwrap();

        input.name = None;
        input.picture = None;
        let updated = upsert_user_on_login(&pool, &input).await.unwrap();
        assert_eq!(updated.name.as_deref(), Some("Avery Creator"));
        assert_eq!(
            updated.picture.as_deref(),
            Some("https://cdn.example.com/avatar.png")
        );
    }

    #[tokio::test]
    async fn test_federated_login_links_onto_local_account_by_email() {
        let pool = test_pool().await;
        create_local_user(&pool, "U_LOCAL1", "shared@example.com", None, "$argon2id$fake")
            .await
            .unwrap();

        let linked = upsert_user_on_login(&pool, &login_input("sub-external", "shared@example.com"))
            .await
            .unwrap();
        assert_eq!(linked.id, "U_LOCAL1");
        assert_eq!(linked.name.as_deref(), Some("Avery Creator"));

        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count.0, 1);
    }

    #[tokio::test]
    async fn test_lookups_return_none_when_absent() {
        let pool = test_pool().await;
        assert!(find_user_by_email(&pool, "ghost@example.com")
            .await
            .unwrap()
            .is_none());
        assert!(get_user_by_id(&pool, "missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_user_profile_touches_only_given_fields() {
        let pool = test_pool().await;
        upsert_user_on_login(&pool, &login_input("sub-003", "edit@example.com"))
            .await
            .unwrap();

        let updated = update_user_profile(&pool, "sub-003", None, Some("/avatars/new.png"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.name.as_deref(), Some("Avery Creator"));
        assert_eq!(updated.picture.as_deref(), Some("/avatars/new.png"));
    }
}
