//! 用户与角色仓储

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};

use super::traits::{RoleRepositoryTrait, UserRepositoryTrait};
use crate::error::{FeedbackError, Result};
use crate::models::{NewUser, Role, User, UserPatch};
use crate::pagination::UserListQuery;

const USER_COLUMNS: &str = "id, first_name, second_name, email, hashed_password, role_id, active";

/// 用户仓储
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// 构建用户分页查询
///
/// 游标定位到 `(排序列, id)` 的键集位置：排序列取自白名单，其余参数全部绑定。
fn build_list_query(query: &UserListQuery) -> QueryBuilder<'_, Postgres> {
    let column = query.sort_by.column();
    let (cmp, dir) = if query.ascending {
        (">", "ASC")
    } else {
        ("<", "DESC")
    };

    let mut qb = QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE TRUE"));

    if let Some(role_id) = query.role_id {
        qb.push(" AND role_id = ").push_bind(role_id);
    }
    if let Some(active) = query.active {
        qb.push(" AND active = ").push_bind(active);
    }
    if let Some(cursor) = query.cursor {
        qb.push(format!(
            " AND ({column}, id) {cmp} (SELECT {column}, id FROM users WHERE id = "
        ))
        .push_bind(cursor)
        .push(")");
    }

    qb.push(format!(" ORDER BY {column} {dir}, id {dir} LIMIT "))
        .push_bind(query.limit);

    qb
}

#[async_trait]
impl UserRepositoryTrait for UserRepository {
    async fn get_user(&self, id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_users(&self, query: &UserListQuery) -> Result<Vec<User>> {
        let users = build_list_query(query)
            .build_query_as::<User>()
            .fetch_all(&self.pool)
            .await?;

        // 空页可能是游标行已被删除，与真正翻到末尾区分开
        if let (true, Some(cursor)) = (users.is_empty(), query.cursor) {
            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
                    .bind(cursor)
                    .fetch_one(&self.pool)
                    .await?;
            if !exists {
                return Err(FeedbackError::stale_cursor(cursor));
            }
        }

        Ok(users)
    }

    async fn create_user(&self, user: &NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (first_name, second_name, email, hashed_password, role_id, active)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.first_name)
        .bind(&user.second_name)
        .bind(&user.email)
        .bind(&user.hashed_password)
        .bind(user.role_id)
        .bind(user.active)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn update_user(&self, id: i64, patch: &UserPatch) -> Result<Option<User>> {
        let updated = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET first_name = COALESCE($2, first_name),
                second_name = COALESCE($3, second_name),
                email = COALESCE($4, email),
                hashed_password = COALESCE($5, hashed_password),
                role_id = COALESCE($6, role_id),
                active = COALESCE($7, active)
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&patch.first_name)
        .bind(&patch.second_name)
        .bind(&patch.email)
        .bind(&patch.hashed_password)
        .bind(patch.role_id)
        .bind(patch.active)
        .fetch_optional(&self.pool)
        .await?;

        Ok(updated)
    }

    async fn delete_user(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// 角色仓储
pub struct RoleRepository {
    pool: PgPool,
}

impl RoleRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RoleRepositoryTrait for RoleRepository {
    async fn list_roles(&self) -> Result<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>("SELECT id, name, capability FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(roles)
    }

    async fn get_role(&self, id: i64) -> Result<Option<Role>> {
        let role =
            sqlx::query_as::<_, Role>("SELECT id, name, capability FROM roles WHERE id = $1")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pagination::UserSortField;

    #[test]
    fn test_list_query_without_cursor() {
        let query = UserListQuery {
            limit: 10,
            ..Default::default()
        };
        let qb = build_list_query(&query);
        let sql = qb.sql();
        assert!(sql.contains("ORDER BY id ASC, id ASC LIMIT $1"));
        assert!(!sql.contains("SELECT id, id"));
    }

    #[test]
    fn test_list_query_with_cursor_and_filters() {
        let query = UserListQuery {
            limit: 5,
            cursor: Some(17),
            role_id: Some(2),
            active: Some(true),
            sort_by: UserSortField::SecondName,
            ascending: false,
        };
        let qb = build_list_query(&query);
        let sql = qb.sql();
        assert!(sql.contains("role_id = $1"));
        assert!(sql.contains("active = $2"));
        assert!(sql.contains(
            "(second_name, id) < (SELECT second_name, id FROM users WHERE id = $3)"
        ));
        assert!(sql.contains("ORDER BY second_name DESC, id DESC LIMIT $4"));
    }
}
