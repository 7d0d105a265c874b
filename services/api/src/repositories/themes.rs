//! Theme repository for database operations

use anyhow::Result;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{NewTheme, Theme, UpdateTheme};

/// Theme repository
#[derive(Clone)]
pub struct ThemeRepository {
    pool: PgPool,
}

impl ThemeRepository {
    /// Create a new theme repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new theme
    pub async fn create(&self, new_theme: &NewTheme) -> Result<Theme> {
        let theme = sqlx::query_as::<_, Theme>(
            r#"
            INSERT INTO themes (name, description, image_url)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(&new_theme.name)
        .bind(new_theme.description.as_deref())
        .bind(new_theme.image_url.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(theme)
    }

    /// Get all themes, newest first
    pub async fn list(&self) -> Result<Vec<Theme>> {
        let themes = sqlx::query_as::<_, Theme>("SELECT * FROM themes ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(themes)
    }

    /// Find a theme by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Theme>> {
        let theme = sqlx::query_as::<_, Theme>("SELECT * FROM themes WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(theme)
    }

    /// Update a theme
    pub async fn update(&self, id: Uuid, update: &UpdateTheme) -> Result<Option<Theme>> {
        let theme = sqlx::query_as::<_, Theme>(
            r#"
            UPDATE themes
            SET name = COALESCE($2, name),
                description = COALESCE($3, description),
                image_url = COALESCE($4, image_url),
                updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(update.name.as_deref())
        .bind(update.description.as_deref())
        .bind(update.image_url.as_deref())
        .fetch_optional(&self.pool)
        .await?;

        Ok(theme)
    }

    /// Delete a theme
    pub async fn delete(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM themes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
