//! Database operations for the `sites` table.

use brandlens_core::{SiteProfile, SiteRecord};
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `sites` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SiteRow {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub url: String,
    pub description: String,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

impl From<SiteRow> for SiteRecord {
    fn from(row: SiteRow) -> Self {
        SiteRecord {
            id: row.id,
            owner_id: row.owner_id,
            profile: SiteProfile {
                name: row.name,
                url: row.url,
                description: row.description,
                language: row.language,
            },
            created_at: row.created_at,
        }
    }
}

/// Register a site for an owner and return the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including when the owner
/// already has a site with the same url.
pub async fn insert_site(
    pool: &PgPool,
    owner_id: i64,
    profile: &SiteProfile,
) -> Result<SiteRow, DbError> {
    let row = sqlx::query_as::<_, SiteRow>(
        "INSERT INTO sites (owner_id, name, url, description, language) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING id, owner_id, name, url, description, language, created_at",
    )
    .bind(owner_id)
    .bind(&profile.name)
    .bind(&profile.url)
    .bind(&profile.description)
    .bind(&profile.language)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Find an owner's site by its exact url. Returns `None` when absent.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_site_by_url(
    pool: &PgPool,
    owner_id: i64,
    url: &str,
) -> Result<Option<SiteRow>, DbError> {
    let row = sqlx::query_as::<_, SiteRow>(
        "SELECT id, owner_id, name, url, description, language, created_at \
         FROM sites \
         WHERE owner_id = $1 AND url = $2",
    )
    .bind(owner_id)
    .bind(url)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}

/// Fetch an owner's site by id. Returns `None` when the site does not exist
/// or belongs to another owner.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_site(pool: &PgPool, owner_id: i64, id: i64) -> Result<Option<SiteRow>, DbError> {
    let row = sqlx::query_as::<_, SiteRow>(
        "SELECT id, owner_id, name, url, description, language, created_at \
         FROM sites \
         WHERE id = $1 AND owner_id = $2",
    )
    .bind(id)
    .bind(owner_id)
    .fetch_optional(pool)
    .await?;

    Ok(row)
}
