//! 游标分页
//!
//! 游标是上一页最后一行的 id。用户列表的下一页按 `(排序键, id)` 的键集顺序从游标行之后开始，
//! 任意排序字段下连续翻页都不重不漏；游标行已被删除时返回错误而不是空页。
//! 评论列表按反馈 id（即创建顺序）翻页，游标行被删除不影响后续页。

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::FeedbackError;

pub const DEFAULT_PAGE_LIMIT: i64 = 20;
pub const MAX_PAGE_LIMIT: i64 = 100;

/// 将客户端传入的 limit 约束到 [1, MAX_PAGE_LIMIT]
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_PAGE_LIMIT)
        .clamp(1, MAX_PAGE_LIMIT)
}

/// 游标分页结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CursorPage<T> {
    pub items: Vec<T>,
    /// 为空表示已到末尾
    pub next_cursor: Option<i64>,
}

impl<T> CursorPage<T> {
    /// 仓储按 `limit` 条查询；满页时以最后一行 id 作为下一页游标
    pub fn from_rows(items: Vec<T>, limit: i64, id_of: impl Fn(&T) -> i64) -> Self {
        let next_cursor = if limit > 0 && items.len() as i64 >= limit {
            items.last().map(&id_of)
        } else {
            None
        };
        Self { items, next_cursor }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> CursorPage<U> {
        CursorPage {
            items: self.items.into_iter().map(f).collect(),
            next_cursor: self.next_cursor,
        }
    }
}

/// 用户列表可排序字段（白名单）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserSortField {
    #[default]
    Id,
    FirstName,
    SecondName,
    Email,
    RoleId,
    Active,
}

impl UserSortField {
    /// 对应的数据库列名，只会返回白名单中的常量
    pub fn column(&self) -> &'static str {
        match self {
            Self::Id => "id",
            Self::FirstName => "first_name",
            Self::SecondName => "second_name",
            Self::Email => "email",
            Self::RoleId => "role_id",
            Self::Active => "active",
        }
    }
}

impl fmt::Display for UserSortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

impl FromStr for UserSortField {
    type Err = FeedbackError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "first_name" => Ok(Self::FirstName),
            "second_name" => Ok(Self::SecondName),
            "email" => Ok(Self::Email),
            "role_id" => Ok(Self::RoleId),
            "active" => Ok(Self::Active),
            other => Err(FeedbackError::InvalidSortField(other.to_string())),
        }
    }
}

/// 用户列表查询
#[derive(Debug, Clone, PartialEq)]
pub struct UserListQuery {
    pub limit: i64,
    pub cursor: Option<i64>,
    pub role_id: Option<i64>,
    pub active: Option<bool>,
    pub sort_by: UserSortField,
    pub ascending: bool,
}

impl Default for UserListQuery {
    fn default() -> Self {
        Self {
            limit: DEFAULT_PAGE_LIMIT,
            cursor: None,
            role_id: None,
            active: None,
            sort_by: UserSortField::Id,
            ascending: true,
        }
    }
}

impl UserListQuery {
    /// 从原始查询参数构建；未知排序字段返回 `InvalidSortField`
    pub fn parse(
        limit: Option<i64>,
        cursor: Option<i64>,
        role_id: Option<i64>,
        active: Option<bool>,
        sort_by: Option<&str>,
        ascending: Option<bool>,
    ) -> Result<Self, FeedbackError> {
        let sort_by = match sort_by.map(str::trim).filter(|s| !s.is_empty()) {
            Some(field) => field.parse()?,
            None => UserSortField::default(),
        };
        Ok(Self {
            limit: clamp_limit(limit),
            cursor,
            role_id,
            active,
            sort_by,
            ascending: ascending.unwrap_or(true),
        })
    }
}

/// 评论列表查询
///
/// 日期区间按自然日闭区间过滤，按反馈 id 排序。未留评论的评分同样列出。
#[derive(Debug, Clone, PartialEq)]
pub struct CommentQuery {
    pub cursor: Option<i64>,
    pub limit: i64,
    pub waiter_id: Option<i64>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub ascending: bool,
}

impl Default for CommentQuery {
    fn default() -> Self {
        Self {
            cursor: None,
            limit: DEFAULT_PAGE_LIMIT,
            waiter_id: None,
            start: None,
            end: None,
            ascending: false,
        }
    }
}

impl CommentQuery {
    pub fn validate(&self) -> Result<(), FeedbackError> {
        if let (Some(start), Some(end)) = (self.start, self.end) {
            if start > end {
                return Err(FeedbackError::Validation(format!(
                    "开始日期 {start} 晚于结束日期 {end}"
                )));
            }
        }
        Ok(())
    }

    /// 起始时刻（含）
    pub fn starts_at(&self) -> Option<DateTime<Utc>> {
        self.start
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    /// 结束日期次日零点（不含），使 end 当天整天被包含
    pub fn ends_before(&self) -> Option<DateTime<Utc>> {
        self.end
            .and_then(|d| d.checked_add_days(Days::new(1)))
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|dt| dt.and_utc())
    }

    pub fn matches(&self, waiter_id: i64, created_at: DateTime<Utc>) -> bool {
        self.waiter_id.is_none_or(|w| w == waiter_id)
            && self.starts_at().is_none_or(|s| created_at >= s)
            && self.ends_before().is_none_or(|e| created_at < e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None), DEFAULT_PAGE_LIMIT);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-5)), 1);
        assert_eq!(clamp_limit(Some(50)), 50);
        assert_eq!(clamp_limit(Some(10_000)), MAX_PAGE_LIMIT);
    }

    #[test]
    fn test_next_cursor_only_on_full_page() {
        let page = CursorPage::from_rows(vec![1i64, 2, 3], 3, |v| *v);
        assert_eq!(page.next_cursor, Some(3));

        let page = CursorPage::from_rows(vec![1i64, 2], 3, |v| *v);
        assert_eq!(page.next_cursor, None);

        let page = CursorPage::from_rows(Vec::<i64>::new(), 3, |v| *v);
        assert_eq!(page.next_cursor, None);
    }

    #[test]
    fn test_sort_field_whitelist() {
        assert_eq!("email".parse::<UserSortField>().unwrap(), UserSortField::Email);
        let err = "hashed_password".parse::<UserSortField>().unwrap_err();
        assert!(matches!(err, FeedbackError::InvalidSortField(f) if f == "hashed_password"));
        assert!("id; DROP TABLE users".parse::<UserSortField>().is_err());
    }

    #[test]
    fn test_user_query_parse_defaults() {
        let q = UserListQuery::parse(Some(500), None, None, Some(true), None, None).unwrap();
        assert_eq!(q.limit, MAX_PAGE_LIMIT);
        assert_eq!(q.sort_by, UserSortField::Id);
        assert!(q.ascending);
        assert_eq!(q.active, Some(true));
    }

    #[test]
    fn test_comment_range_is_inclusive() {
        let q = CommentQuery {
            start: NaiveDate::from_ymd_opt(2025, 3, 1),
            end: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        let morning = "2025-03-01T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        let night = "2025-03-01T23:59:59Z".parse::<DateTime<Utc>>().unwrap();
        let next_day = "2025-03-02T00:00:00Z".parse::<DateTime<Utc>>().unwrap();
        assert!(q.matches(1, morning));
        assert!(q.matches(1, night));
        assert!(!q.matches(1, next_day));
    }

    #[test]
    fn test_comment_range_order_validated() {
        let q = CommentQuery {
            start: NaiveDate::from_ymd_opt(2025, 3, 2),
            end: NaiveDate::from_ymd_opt(2025, 3, 1),
            ..Default::default()
        };
        assert!(q.validate().is_err());
    }
}
