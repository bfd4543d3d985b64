//! 数据库仓储层
//!
//! 提供所有实体的数据访问接口，封装 SQL 操作细节。
//!
//! ## 设计原则
//!
//! - 仓储只负责数据持久化，业务校验留在服务层
//! - 多表写入（反馈聚合、重置令牌消费、注册审批）在仓储内部以单事务完成
//! - 分页游标按 `(排序键, id)` 键集定位，排序列只来自白名单
//! - 定义 trait 接口以支持 mock 测试与内存实现

mod account_repo;
mod feedback_repo;
mod taxonomy_repo;
mod traits;
mod user_repo;

pub use account_repo::{PasswordResetRepository, RegistrationRepository};
pub use feedback_repo::FeedbackRepository;
pub use taxonomy_repo::TaxonomyRepository;
pub use traits::*;
pub use user_repo::{RoleRepository, UserRepository};
