//! Project operations, scoped to the owning user

use chrono::Utc;
use sqlx::SqlitePool;

use crate::common::generate_project_id;
use crate::projects::models::{CreateProjectRequest, Project};

pub async fn list_projects(pool: &SqlitePool, user_id: &str) -> Result<Vec<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>(
        "SELECT * FROM projects WHERE user_id = ? ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn create_project(
    pool: &SqlitePool,
    user_id: &str,
    request: &CreateProjectRequest,
) -> Result<Project, sqlx::Error> {
    let id = generate_project_id();
    let now = Utc::now().timestamp_millis();

    sqlx::query(
        r#"
        INSERT INTO projects (id, user_id, title, description, cover_url, content_url, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(&request.title)
    .bind(request.description.as_deref())
    .bind(request.cover_url.as_deref())
    .bind(request.content_url.as_deref())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ?")
        .bind(&id)
        .fetch_one(pool)
        .await
}

/// Scoped to the owner: another user's project id reads as absent.
pub async fn get_project(
    pool: &SqlitePool,
    user_id: &str,
    project_id: &str,
) -> Result<Option<Project>, sqlx::Error> {
    sqlx::query_as::<_, Project>("SELECT * FROM projects WHERE id = ? AND user_id = ?")
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
}

/// Returns false when nothing was deleted (unknown id or foreign owner).
pub async fn delete_project(
    pool: &SqlitePool,
    user_id: &str,
    project_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM projects WHERE id = ? AND user_id = ?")
        .bind(project_id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::test_pool;
    use crate::store::users::{upsert_user_on_login, UpsertUserOnLogin};

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

    fn request(title: &str) -> CreateProjectRequest {
        CreateProjectRequest {
            title: title.to_string(),
            description: Some("A launch teaser".to_string()),
            cover_url: None,
            content_url: None,
        }
    }

    #[tokio::test]
    async fn test_create_list_delete() {
        let pool = test_pool().await;
        seed_user(&pool, "sub-proj").await;

        let first = create_project(&pool, "sub-proj", &request("Spring drop"))
            .await
            .unwrap();
        create_project(&pool, "sub-proj", &request("Summer drop"))
            .await
            .unwrap();

        let listed = list_projects(&pool, "sub-proj").await.unwrap();
        assert_eq!(listed.len(), 2);

        assert!(delete_project(&pool, "sub-proj", &first.id).await.unwrap());
        assert!(!delete_project(&pool, "sub-proj", &first.id).await.unwrap());
        assert_eq!(list_projects(&pool, "sub-proj").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_projects_are_owner_scoped() {
        let pool = test_pool().await;
        seed_user(&pool, "sub-owner").await;
        seed_user(&pool, "sub-other").await;

        let project = create_project(&pool, "sub-owner", &request("Private cut"))
            .await
            .unwrap();

        assert!(get_project(&pool, "sub-other", &project.id)
            .await
            .unwrap()
            .is_none());
        assert!(!delete_project(&pool, "sub-other", &project.id)
            .await
            .unwrap());
        assert!(get_project(&pool, "sub-owner", &project.id)
            .await
            .unwrap()
            .is_some());
    }
}
