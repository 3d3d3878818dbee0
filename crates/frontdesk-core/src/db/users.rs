//! Staff user database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{constraint, decode, Database, DbError, DbResult};
use crate::models::{Department, Role, User};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, department, schedule, is_active, created_at";

impl Database {
    /// Insert a new user, returning its ID.
    pub fn insert_user(&self, user: &User) -> DbResult<i64> {
        self.conn
            .execute(
                r#"
                INSERT INTO users (
                    name, email, password_hash, role, department,
                    schedule, is_active, created_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                "#,
                params![
                    user.name,
                    user.email,
                    user.password_hash,
                    user.role.as_str(),
                    user.department.map(Department::as_str),
                    user.schedule,
                    user.is_active,
                    user.created_at,
                ],
            )
            .map_err(|e| constraint(e, "user"))?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Update profile fields of an existing user (not the credential).
    pub fn update_user(&self, user: &User) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute(
                r#"
                UPDATE users SET
                    name = ?2,
                    email = ?3,
                    department = ?4,
                    schedule = ?5,
                    is_active = ?6
                WHERE id = ?1
                "#,
                params![
                    user.id,
                    user.name,
                    user.email,
                    user.department.map(Department::as_str),
                    user.schedule,
                    user.is_active,
                ],
            )
            .map_err(|e| constraint(e, "user"))?;
        Ok(rows_affected > 0)
    }

    /// Replace a user's encoded credential.
    pub fn set_password_hash(&self, user_id: i64, password_hash: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE users SET password_hash = ?2 WHERE id = ?1",
            params![user_id, password_hash],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a user by ID.
    pub fn get_user(&self, user_id: i64) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE id = ?", USER_COLUMNS),
                [user_id],
                user_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Get a user by login email.
    pub fn get_user_by_email(&self, email: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!("SELECT {} FROM users WHERE email = ?", USER_COLUMNS),
                [email],
                user_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// Find a doctor by display name (first registered wins on duplicates).
    pub fn find_doctor_by_name(&self, name: &str) -> DbResult<Option<User>> {
        self.conn
            .query_row(
                &format!(
                    "SELECT {} FROM users WHERE name = ? AND role = 'doctor' ORDER BY id LIMIT 1",
                    USER_COLUMNS
                ),
                [name],
                user_row,
            )
            .optional()?
            .map(|row| row.try_into())
            .transpose()
    }

    /// List users holding any of the given roles.
    pub fn list_users_with_roles(&self, roles: &[Role]) -> DbResult<Vec<User>> {
        let mut users = Vec::new();
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM users WHERE role = ? ORDER BY id",
            USER_COLUMNS
        ))?;
        for role in roles {
            let rows = stmt.query_map([role.as_str()], user_row)?;
            for row in rows {
                users.push(row?.try_into()?);
            }
        }
        users.sort_by_key(|u: &User| u.id);
        Ok(users)
    }

    /// List doctors, optionally restricted to one department.
    pub fn list_doctors(&self, department: Option<Department>) -> DbResult<Vec<User>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {} FROM users
            WHERE role = 'doctor' AND (?1 IS NULL OR department = ?1)
            ORDER BY id
            "#,
            USER_COLUMNS
        ))?;
        let rows = stmt.query_map([department.map(Department::as_str)], user_row)?;

        let mut users = Vec::new();
        for row in rows {
            users.push(row?.try_into()?);
        }
        Ok(users)
    }

    /// Count users with a role.
    pub fn count_users_with_role(&self, role: Role) -> DbResult<i64> {
        Ok(self.conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = ?",
            [role.as_str()],
            |row| row.get(0),
        )?)
    }

    /// Delete the user row only. Dependents must already be gone.
    pub(crate) fn delete_user_row(&self, user_id: i64) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM users WHERE id = ?", [user_id])
            .map_err(|e| constraint(e, "user still referenced"))?;
        Ok(rows_affected > 0)
    }
}

/// Intermediate row struct for database mapping.
struct UserRow {
    id: i64,
    name: String,
    email: String,
    password_hash: String,
    role: String,
    department: Option<String>,
    schedule: Option<String>,
    is_active: bool,
    created_at: String,
}

fn user_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: row.get(4)?,
        department: row.get(5)?,
        schedule: row.get(6)?,
        is_active: row.get(7)?,
        created_at: row.get(8)?,
    })
}

impl TryFrom<UserRow> for User {
    type Error = DbError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let role = decode(&row.role, Role::parse, "role")?;
        let department = row
            .department
            .as_deref()
            .map(|d| decode(d, Department::parse, "department"))
            .transpose()?;

        Ok(User {
            id: row.id,
            name: row.name,
            email: row.email,
            password_hash: row.password_hash,
            role,
            department,
            schedule: row.schedule,
            is_active: row.is_active,
            created_at: row.created_at,
        })
    }
}
