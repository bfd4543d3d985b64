//! 评价分类体系管理：分类、标签、反馈类型

use std::sync::Arc;

use tracing::info;

use crate::error::{FeedbackError, Result};
use crate::models::{
    Category, CategoryKind, CategoryPatch, FeedbackType, NewCategory, NewTag, Tag, TagPatch,
};
use crate::repository::TaxonomyRepositoryTrait;
use crate::service::user_service::required_name;

pub struct TaxonomyService {
    repo: Arc<dyn TaxonomyRepositoryTrait>,
}

impl TaxonomyService {
    pub fn new(repo: Arc<dyn TaxonomyRepositoryTrait>) -> Self {
        Self { repo }
    }

    // ==================== 分类 ====================

    pub async fn list_categories(&self) -> Result<Vec<Category>> {
        self.repo.list_categories().await
    }

    pub async fn get_category(&self, id: i64) -> Result<Category> {
        self.repo
            .get_category(id)
            .await?
            .ok_or_else(|| FeedbackError::not_found("category", id))
    }

    pub async fn create_category(&self, name: &str, kind: Option<CategoryKind>) -> Result<Category> {
        let category = self
            .repo
            .create_category(&NewCategory {
                name: required_name("name", name)?,
                kind,
            })
            .await?;
        info!(category_id = category.id, "分类已创建");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        id: i64,
        name: Option<&str>,
        kind: Option<CategoryKind>,
    ) -> Result<Category> {
        let patch = CategoryPatch {
            name: name.map(|n| required_name("name", n)).transpose()?,
            kind,
        };
        self.repo
            .update_category(id, &patch)
            .await?
            .ok_or_else(|| FeedbackError::not_found("category", id))
    }

    /// 删除分类会级联删除其下标签
    pub async fn delete_category(&self, id: i64) -> Result<()> {
        if !self.repo.delete_category(id).await? {
            return Err(FeedbackError::not_found("category", id));
        }
        info!(category_id = id, "分类已删除");
        Ok(())
    }

    // ==================== 标签 ====================

    pub async fn list_tags(&self) -> Result<Vec<Tag>> {
        self.repo.list_tags(None).await
    }

    pub async fn tags_by_category(&self, category_id: i64) -> Result<Vec<Tag>> {
        self.get_category(category_id).await?;
        self.repo.list_tags(Some(category_id)).await
    }

    pub async fn get_tag(&self, id: i64) -> Result<Tag> {
        self.repo
            .get_tag(id)
            .await?
            .ok_or_else(|| FeedbackError::not_found("tag", id))
    }

    async fn ensure_category(&self, category_id: i64) -> Result<()> {
        if self.repo.get_category(category_id).await?.is_none() {
            return Err(FeedbackError::Validation(format!(
                "分类不存在: {category_id}"
            )));
        }
        Ok(())
    }

    pub async fn create_tag(&self, name: &str, category_id: i64) -> Result<Tag> {
        let name = required_name("name", name)?;
        self.ensure_category(category_id).await?;
        let tag = self.repo.create_tag(&NewTag { name, category_id }).await?;
        info!(tag_id = tag.id, category_id = category_id, "标签已创建");
        Ok(tag)
    }

    pub async fn update_tag(
        &self,
        id: i64,
        name: Option<&str>,
        category_id: Option<i64>,
    ) -> Result<Tag> {
        let patch = TagPatch {
            name: name.map(|n| required_name("name", n)).transpose()?,
            category_id,
        };
        if let Some(category_id) = patch.category_id {
            self.ensure_category(category_id).await?;
        }
        self.repo
            .update_tag(id, &patch)
            .await?
            .ok_or_else(|| FeedbackError::not_found("tag", id))
    }

    pub async fn delete_tag(&self, id: i64) -> Result<()> {
        if !self.repo.delete_tag(id).await? {
            return Err(FeedbackError::not_found("tag", id));
        }
        Ok(())
    }

    // ==================== 反馈类型 ====================

    pub async fn list_feedback_types(&self) -> Result<Vec<FeedbackType>> {
        self.repo.list_feedback_types().await
    }

    pub async fn get_feedback_type(&self, id: i64) -> Result<FeedbackType> {
        self.repo
            .get_feedback_type(id)
            .await?
            .ok_or_else(|| FeedbackError::not_found("feedback_type", id))
    }

    pub async fn create_feedback_type(&self, name: &str) -> Result<FeedbackType> {
        let name = required_name("name", name)?;
        self.repo.create_feedback_type(&name).await
    }

    pub async fn update_feedback_type(&self, id: i64, name: &str) -> Result<FeedbackType> {
        let name = required_name("name", name)?;
        self.repo
            .update_feedback_type(id, &name)
            .await?
            .ok_or_else(|| FeedbackError::not_found("feedback_type", id))
    }

    pub async fn delete_feedback_type(&self, id: i64) -> Result<()> {
        if !self.repo.delete_feedback_type(id).await? {
            return Err(FeedbackError::not_found("feedback_type", id));
        }
        Ok(())
    }
}
