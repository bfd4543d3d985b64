//! 领域模型定义

mod enums;
mod feedback;
mod taxonomy;
mod user;

pub use enums::*;
pub use feedback::*;
pub use taxonomy::*;
pub use user::*;
