//! 枚举类型定义
//!
//! 所有枚举都支持数据库（sqlx）和 JSON（serde）序列化

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// 角色能力
///
/// 在定义角色时确定，权限判断只看能力，不看角色名称。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RoleCapability {
    Admin,
    Manager,
    Staff,
}

/// 操作权限
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    ManageUsers,
    ReviewRegistrations,
    ManageTaxonomy,
    ManageNotifications,
    DeleteFeedback,
    ViewFeedback,
    ViewStats,
}

impl RoleCapability {
    pub fn allows(self, permission: Permission) -> bool {
        match self {
            Self::Admin => true,
            Self::Manager | Self::Staff => {
                matches!(permission, Permission::ViewFeedback | Permission::ViewStats)
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Manager => "manager",
            Self::Staff => "staff",
        }
    }
}

impl fmt::Display for RoleCapability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 注册申请状态
///
/// pending 是唯一可以流转的状态，approved / rejected 均为终态。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum RegistrationStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl RegistrationStatus {
    pub fn is_pending(self) -> bool {
        self == Self::Pending
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

impl fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审批决定
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationDecision {
    Approve,
    Reject,
}

impl RegistrationDecision {
    pub fn target_status(self) -> RegistrationStatus {
        match self {
            Self::Approve => RegistrationStatus::Approved,
            Self::Reject => RegistrationStatus::Rejected,
        }
    }
}

impl FromStr for RegistrationDecision {
    type Err = String;

    /// 同时接受动作（approve）与目标状态（approved）两种写法
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "approve" | "approved" => Ok(Self::Approve),
            "reject" | "rejected" => Ok(Self::Reject),
            other => Err(format!("未知的审批决定: {other}")),
        }
    }
}

/// 评价分类的稳定编码
///
/// 替代按名称字符串查找分类，统计与推送只依赖编码。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "varchar", rename_all = "lowercase")]
pub enum CategoryKind {
    Positive,
    Neutral,
    Negative,
}

impl CategoryKind {
    pub const ALL: [CategoryKind; 3] = [Self::Positive, Self::Neutral, Self::Negative];

    /// 按评分推导分类：4-5 正面，3 中性，其余负面
    pub fn from_score(score: i32) -> Self {
        match score {
            4.. => Self::Positive,
            3 => Self::Neutral,
            _ => Self::Negative,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Neutral => "neutral",
            Self::Negative => "negative",
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_admin_manages_users() {
        assert!(RoleCapability::Admin.allows(Permission::ManageUsers));
        assert!(!RoleCapability::Manager.allows(Permission::ManageUsers));
        assert!(!RoleCapability::Staff.allows(Permission::ManageNotifications));
        assert!(RoleCapability::Manager.allows(Permission::ViewStats));
        assert!(RoleCapability::Staff.allows(Permission::ViewFeedback));
    }

    #[test]
    fn test_category_kind_from_score() {
        assert_eq!(CategoryKind::from_score(5), CategoryKind::Positive);
        assert_eq!(CategoryKind::from_score(4), CategoryKind::Positive);
        assert_eq!(CategoryKind::from_score(3), CategoryKind::Neutral);
        assert_eq!(CategoryKind::from_score(2), CategoryKind::Negative);
        assert_eq!(CategoryKind::from_score(1), CategoryKind::Negative);
    }

    #[test]
    fn test_decision_parsing() {
        assert_eq!(
            "approved".parse::<RegistrationDecision>().unwrap(),
            RegistrationDecision::Approve
        );
        assert_eq!(
            "Reject".parse::<RegistrationDecision>().unwrap(),
            RegistrationDecision::Reject
        );
        assert!("pending".parse::<RegistrationDecision>().is_err());
    }

    #[test]
    fn test_serde_lowercase() {
        assert_eq!(
            serde_json::to_string(&RoleCapability::Admin).unwrap(),
            "\"admin\""
        );
        assert_eq!(
            serde_json::from_str::<CategoryKind>("\"negative\"").unwrap(),
            CategoryKind::Negative
        );
    }
}
