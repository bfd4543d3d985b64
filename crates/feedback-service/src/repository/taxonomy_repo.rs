//! 分类、标签、反馈类型仓储

use async_trait::async_trait;
use sqlx::PgPool;

use super::traits::TaxonomyRepositoryTrait;
use crate::error::Result;
use crate::models::{
    Category, CategoryKind, CategoryPatch, FeedbackType, NewCategory, NewTag, Tag, TagPatch,
};

pub struct TaxonomyRepository {
    pool: PgPool,
}

impl TaxonomyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TaxonomyRepositoryTrait for TaxonomyRepository {
    // ==================== 分类 ====================

    async fn list_categories(&self) -> Result<Vec<Category>> {
        let categories =
            sqlx::query_as::<_, Category>("SELECT id, name, kind FROM categories ORDER BY id")
                .fetch_all(&self.pool)
                .await?;

        Ok(categories)
    }

    async fn get_category(&self, id: i64) -> Result<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name, kind FROM categories WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    async fn find_category_by_kind(&self, kind: CategoryKind) -> Result<Option<Category>> {
        let category =
            sqlx::query_as::<_, Category>("SELECT id, name, kind FROM categories WHERE kind = $1")
                .bind(kind)
                .fetch_optional(&self.pool)
                .await?;

        Ok(category)
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category> {
        let created = sqlx::query_as::<_, Category>(
            "INSERT INTO categories (name, kind) VALUES ($1, $2) RETURNING id, name, kind",
        )
        .bind(&category.name)
        .bind(category.kind)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_category(&self, id: i64, patch: &CategoryPatch) -> Result<Option<Category>> {
        let updated = sqlx::query_as::<_, Category>(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                kind = COALESCE($3, kind)
            WHERE id = $1
            RETURNING id, name, kind
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.kind)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_category(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== 标签 ====================

    async fn list_tags(&self, category_id: Option<i64>) -> Result<Vec<Tag>> {
        let tags = sqlx::query_as::<_, Tag>(
            r#"
            SELECT id, name, category_id
            FROM tags
            WHERE ($1::BIGINT IS NULL OR category_id = $1)
            ORDER BY id
            "#,
        )
        .bind(category_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(tags)
    }

    async fn get_tag(&self, id: i64) -> Result<Option<Tag>> {
        let tag = sqlx::query_as::<_, Tag>("SELECT id, name, category_id FROM tags WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(tag)
    }

    async fn create_tag(&self, tag: &NewTag) -> Result<Tag> {
        let created = sqlx::query_as::<_, Tag>(
            "INSERT INTO tags (name, category_id) VALUES ($1, $2) RETURNING id, name, category_id",
        )
        .bind(&tag.name)
        .bind(tag.category_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_tag(&self, id: i64, patch: &TagPatch) -> Result<Option<Tag>> {
        let updated = sqlx::query_as::<_, Tag>(
            r#"
            UPDATE tags
            SET name = COALESCE($2, name),
                category_id = COALESCE($3, category_id)
            WHERE id = $1
            RETURNING id, name, category_id
            "#,
        )
        .bind(id)
        .bind(&patch.name)
        .bind(patch.category_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_tag(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM tags WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    // ==================== 反馈类型 ====================

    async fn list_feedback_types(&self) -> Result<Vec<FeedbackType>> {
        let types = sqlx::query_as::<_, FeedbackType>("SELECT id, name FROM feedback_types ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(types)
    }

    async fn get_feedback_type(&self, id: i64) -> Result<Option<FeedbackType>> {
        let feedback_type =
            sqlx::query_as::<_, FeedbackType>("SELECT id, name FROM feedback_types WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(feedback_type)
    }

    async fn create_feedback_type(&self, name: &str) -> Result<FeedbackType> {
        let created = sqlx::query_as::<_, FeedbackType>(
            "INSERT INTO feedback_types (name) VALUES ($1) RETURNING id, name",
        )
        .bind(name)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_feedback_type(&self, id: i64, name: &str) -> Result<Option<FeedbackType>> {
        let updated = sqlx::query_as::<_, FeedbackType>(
            "UPDATE feedback_types SET name = $2 WHERE id = $1 RETURNING id, name",
        )
        .bind(id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_feedback_type(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feedback_types WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
