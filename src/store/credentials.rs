//! Social credential operations
//!
//! One row per (user, platform). Callers hand in an already-validated
//! platform key and credential document; a second upsert for the same
//! platform overwrites rather than duplicates.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::profile::models::SocialCredentialRow;

pub async fn get_social_credentials(
    pool: &SqlitePool,
    user_id: &str,
) -> Result<Vec<SocialCredentialRow>, sqlx::Error> {
    sqlx::query_as::<_, SocialCredentialRow>(
        "SELECT * FROM social_credentials WHERE user_id = ? ORDER BY platform",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn get_social_credential(
    pool: &SqlitePool,
    user_id: &str,
    platform: &str,
) -> Result<Option<SocialCredentialRow>, sqlx::Error> {
    sqlx::query_as::<_, SocialCredentialRow>(
        "SELECT * FROM social_credentials WHERE user_id = ? AND platform = ?",
    )
    .bind(user_id)
    .bind(platform)
    .fetch_optional(pool)
    .await
}

pub async fn upsert_social_credential(
    pool: &SqlitePool,
    user_id: &str,
    platform: &str,
    data: &serde_json::Value,
) -> Result<SocialCredentialRow, sqlx::Error> {
    let now = Utc::now().timestamp_millis();
    let data_json = data.to_string();

    sqlx::query(
        r#"
        INSERT INTO social_credentials (user_id, platform, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id, platform) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(user_id)
    .bind(platform)
    .bind(&data_json)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, SocialCredentialRow>(
        "SELECT * FROM social_credentials WHERE user_id = ? AND platform = ?",
    )
    .bind(user_id)
    .bind(platform)
    .fetch_one(pool)
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::models::Platform;
    use crate::store::test_pool;
    use crate::store::users::{upsert_user_on_login, UpsertUserOnLogin};
    use serde_json::json;

    async fn seed_user(pool: &SqlitePool, sub: &str) {
        upsert_user_on_login(
            pool,
            &UpsertUserOnLogin {
                user_id: sub.to_string(),
                email: format!("{}@example.com", sub),
                name: None,
                picture: None,
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_roundtrip_and_overwrite() {
        let pool = test_pool().await;
        seed_user(&pool, "sub-creds").await;

        upsert_social_credential(&pool, "sub-creds", "linkedin", &json!({"a": 1}))
            .await
            .unwrap();
        let rows = get_social_credentials(&pool, "sub-creds").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].platform, "linkedin");
        let data: serde_json::Value = serde_json::from_str(&rows[0].data).unwrap();
        assert_eq!(data["a"], 1);

        // Second upsert overwrites rather than duplicates
        upsert_social_credential(&pool, "sub-creds", "linkedin", &json!({"a": 2}))
            .await
            .unwrap();
        let rows = get_social_credentials(&pool, "sub-creds").await.unwrap();
        assert_eq!(rows.len(), 1);
        let data: serde_json::Value = serde_json::from_str(&rows[0].data).unwrap();
        assert_eq!(data["a"], 2);
    }

    #[tokio::test]
    async fn test_twitter_normalizes_to_x_key() {
        let pool = test_pool().await;
        seed_user(&pool, "sub-norm").await;

        // Handlers parse the platform before it reaches the store
        let platform = Platform::parse("twitter").unwrap();
        upsert_social_credential(
            &pool,
            "sub-norm",
            platform.as_str(),
            &json!({"access_token": "tok"}),
        )
        .await
        .unwrap();

        let row = get_social_credential(&pool, "sub-norm", "x")
            .await
            .unwrap()
            .expect("stored under x");
        assert_eq!(row.platform, "x");
    }

    #[tokio::test]
    async fn test_deleting_user_cascades_to_credentials() {
        let pool = test_pool().await;
        seed_user(&pool, "sub-gone").await;
        upsert_social_credential(&pool, "sub-gone", "youtube", &json!({"access_token": "t"}))
            .await
            .unwrap();

        sqlx::query("DELETE FROM users WHERE id = ?")
            .bind("sub-gone")
            .execute(&pool)
            .await
            .unwrap();

        let rows = get_social_credentials(&pool, "sub-gone").await.unwrap();
        assert!(rows.is_empty());
    }
}
