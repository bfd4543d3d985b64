//! 评价分类体系：分类、标签、反馈类型

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::enums::CategoryKind;

/// 评价分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// 未绑定编码的分类不参与 CSAT 与标签统计
    pub kind: Option<CategoryKind>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub kind: Option<CategoryKind>,
}

#[derive(Debug, Clone, Default)]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub kind: Option<CategoryKind>,
}

/// 标签，必须归属一个分类
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Tag {
    pub id: i64,
    pub name: String,
    pub category_id: i64,
}

#[derive(Debug, Clone)]
pub struct NewTag {
    pub name: String,
    pub category_id: i64,
}

#[derive(Debug, Clone, Default)]
pub struct TagPatch {
    pub name: Option<String>,
    pub category_id: Option<i64>,
}

/// 反馈类型（如“菜品”、“服务速度”）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct FeedbackType {
    pub id: i64,
    pub name: String,
}
