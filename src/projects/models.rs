//! Project data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Content project database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Project {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub cover_url: Option<String>,
    pub content_url: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// POST /api/projects request body
#[derive(Deserialize, Debug)]
pub struct CreateProjectRequest {
    pub title: String,
    pub description: Option<String>,
    #[serde(rename = "coverUrl")]
    pub cover_url: Option<String>,
    #[serde(rename = "contentUrl")]
    pub content_url: Option<String>,
}
