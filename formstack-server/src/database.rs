use crate::error::{AppError, AppResult};
use crate::slots::{answer_columns, question_columns, SlotColumn, SlotField, SlotRow, SlotState};
use chrono::Utc;
use formstack_models::{Role, TypeTag, User, UserInfo};
use rusqlite::{
    params, types::Value as SqlValue, Connection, OptionalExtension, TransactionBehavior,
};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

mod forms;
mod jira;
mod templates;

pub use forms::StoredForm;
pub use templates::{StoredTemplate, TemplateDraft};

pub type DbConnection = Arc<Mutex<Connection>>;

pub struct Database {
    connection: DbConnection,
}

/// The caller a template query runs on behalf of.
#[derive(Debug, Clone, Copy, Default)]
pub struct Viewer {
    pub user_id: Option<i64>,
    pub is_admin: bool,
}

impl Viewer {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn from_user(user: Option<&UserInfo>) -> Self {
        match user {
            Some(user) => Self {
                user_id: Some(user.id),
                is_admin: user.is_admin(),
            },
            None => Self::anonymous(),
        }
    }

    // No row has a negative id, so anonymous viewers match no author
    fn id_param(&self) -> i64 {
        self.user_id.unwrap_or(-1)
    }
}

#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub id: i64,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: i64,
    pub revoked_at: Option<i64>,
    pub replaced_by: Option<i64>,
    pub created_at: i64,
}

impl Database {
    pub fn new(db_path: &Path) -> AppResult<Self> {
        // Ensure the database directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        Self::from_connection(Connection::open(db_path)?)
    }

    pub fn in_memory() -> AppResult<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> AppResult<Self> {
        // Enable foreign key constraints (SQLite3 has them disabled by default)
        conn.execute("PRAGMA foreign_keys = ON", [])?;

        let database = Database {
            connection: Arc::new(Mutex::new(conn)),
        };

        database.run_migrations()?;

        Ok(database)
    }

    fn conn(&self) -> AppResult<MutexGuard<'_, Connection>> {
        self.connection
            .lock()
            .map_err(|e| AppError::Internal(format!("Failed to acquire database lock: {e}")))
    }

    fn run_migrations(&self) -> AppResult<()> {
        let conn = self.conn()?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password_hash TEXT NOT NULL,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                is_blocked INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                last_login_at INTEGER
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS refresh_tokens (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                token_hash TEXT NOT NULL UNIQUE,
                expires_at INTEGER NOT NULL,
                revoked_at INTEGER,
                replaced_by INTEGER,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_refresh_tokens_user_id ON refresh_tokens(user_id)",
            [],
        )?;

        // Question slots are stored as flat columns, one per slot field
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS templates (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    author_id INTEGER NOT NULL,
                    title TEXT NOT NULL,
                    description TEXT NOT NULL DEFAULT '',
                    topic TEXT NOT NULL DEFAULT '',
                    tags TEXT NOT NULL DEFAULT '[]',
                    mode TEXT NOT NULL DEFAULT 'public' CHECK (mode IN ('public', 'private')),
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    {},
                    FOREIGN KEY (author_id) REFERENCES users (id) ON DELETE CASCADE
                )",
                column_definitions(&question_columns())
            ),
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_templates_author_id ON templates(author_id)",
            [],
        )?;

        // Full-text index over template metadata, rowid = templates.id
        conn.execute(
            "CREATE VIRTUAL TABLE IF NOT EXISTS templates_fts
             USING fts5(title, description, topic, tags)",
            [],
        )?;

        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS forms (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    template_id INTEGER NOT NULL,
                    user_id INTEGER NOT NULL,
                    created_at INTEGER NOT NULL,
                    updated_at INTEGER NOT NULL,
                    {},
                    FOREIGN KEY (template_id) REFERENCES templates (id) ON DELETE CASCADE,
                    FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE
                )",
                column_definitions(&answer_columns())
            ),
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_forms_template_id ON forms(template_id)",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_forms_user_id ON forms(user_id)",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS jira_tickets (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL,
                issue_key TEXT NOT NULL,
                url TEXT NOT NULL,
                summary TEXT NOT NULL,
                priority TEXT NOT NULL,
                template_id INTEGER,
                created_at INTEGER NOT NULL,
                FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
                FOREIGN KEY (template_id) REFERENCES templates (id) ON DELETE SET NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_jira_tickets_user_id ON jira_tickets(user_id)",
            [],
        )?;

        Ok(())
    }

    // User Methods

    pub fn create_user(&self, user: &User) -> AppResult<i64> {
        let conn = self.conn()?;
        let id = insert_user(&conn, user)?;

        tracing::info!("Created user: {} ({})", user.name, id);
        Ok(id)
    }

    /// Creates a self-registered account. The first account in an empty
    /// database is made an admin; the count and insert share one transaction.
    pub fn register_user(&self, user: &mut User) -> AppResult<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: i64 = tx.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        if existing == 0 {
            user.role = Role::Admin;
        }
        let id = insert_user(&tx, user)?;
        tx.commit()?;

        if user.role == Role::Admin {
            tracing::info!("First registered user {} is granted the admin role", user.name);
        }
        tracing::info!("Created user: {} ({})", user.name, id);
        Ok(id)
    }

    pub fn get_user_by_id(&self, id: i64) -> AppResult<User> {
        self.find_user("id = ?", rusqlite::types::Value::Integer(id))?
            .ok_or_else(|| AppError::NotFound(format!("User not found: {id}")))
    }

    pub fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        self.find_user("email = ?", email.to_string().into())
    }

    pub fn get_user_by_name(&self, name: &str) -> AppResult<Option<User>> {
        self.find_user("name = ?", name.to_string().into())
    }

    fn find_user(&self, predicate: &str, value: SqlValue) -> AppResult<Option<User>> {
        let conn = self.conn()?;

        let user = conn
            .query_row(
                &format!("SELECT {USER_COLUMNS} FROM users WHERE {predicate}"),
                [value],
                user_from_row,
            )
            .optional()?;

        Ok(user)
    }

    pub fn get_all_users(&self) -> AppResult<Vec<User>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;
        let users = stmt
            .query_map([], user_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(users)
    }

    pub fn count_users(&self) -> AppResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))?;
        Ok(count)
    }

    /// Admins that can still sign in; blocked admins do not count.
    pub fn count_active_admins(&self) -> AppResult<i64> {
        let conn = self.conn()?;
        let count = conn.query_row(
            "SELECT COUNT(*) FROM users WHERE role = 'admin' AND is_blocked = 0",
            [],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    pub fn set_user_role(&self, id: i64, role: Role) -> AppResult<()> {
        let conn = self.conn()?;

        let updated = conn.execute(
            "UPDATE users SET role = ?, updated_at = ? WHERE id = ?",
            params![role.as_str(), Utc::now().timestamp(), id],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("User not found: {id}")));
        }

        tracing::info!("Set role of user {} to {}", id, role.as_str());
        Ok(())
    }

    /// Blocking a user also revokes their refresh tokens.
    pub fn set_user_blocked(&self, id: i64, is_blocked: bool) -> AppResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let updated = tx.execute(
            "UPDATE users SET is_blocked = ?, updated_at = ? WHERE id = ?",
            params![is_blocked, Utc::now().timestamp(), id],
        )?;
        if updated == 0 {
            return Err(AppError::NotFound(format!("User not found: {id}")));
        }

        if is_blocked {
            tx.execute(
                "UPDATE refresh_tokens SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL",
                params![Utc::now().timestamp(), id],
            )?;
        }

        tx.commit()?;
        tracing::info!("Set blocked={} for user {}", is_blocked, id);
        Ok(())
    }

    pub fn record_login(&self, id: i64) -> AppResult<()> {
        let conn = self.conn()?;
        conn.execute(
            "UPDATE users SET last_login_at = ? WHERE id = ?",
            params![Utc::now().timestamp(), id],
        )?;
        Ok(())
    }

    /// Deletes a user together with their templates, forms and tokens.
    pub fn delete_user(&self, id: i64) -> AppResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        // The FTS table has no foreign key, clear it before the cascade runs
        tx.execute(
            "DELETE FROM templates_fts WHERE rowid IN (SELECT id FROM templates WHERE author_id = ?)",
            [id],
        )?;
        let deleted = tx.execute("DELETE FROM users WHERE id = ?", [id])?;
        if deleted == 0 {
            return Err(AppError::NotFound(format!("User not found: {id}")));
        }

        tx.commit()?;
        tracing::info!("Deleted user: {}", id);
        Ok(())
    }

    // Refresh Token Methods

    pub fn create_refresh_token(
        &self,
        user_id: i64,
        token_hash: &str,
        expires_at: i64,
    ) -> AppResult<i64> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?)",
            params![user_id, token_hash, expires_at, Utc::now().timestamp()],
        )?;

        Ok(conn.last_insert_rowid())
    }

    pub fn get_refresh_token_by_hash(&self, token_hash: &str) -> AppResult<Option<RefreshTokenRecord>> {
        let conn = self.conn()?;

        let record = conn
            .query_row(
                "SELECT id, user_id, token_hash, expires_at, revoked_at, replaced_by, created_at
                 FROM refresh_tokens WHERE token_hash = ?",
                [token_hash],
                |row| {
                    Ok(RefreshTokenRecord {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        token_hash: row.get(2)?,
                        expires_at: row.get(3)?,
                        revoked_at: row.get(4)?,
                        replaced_by: row.get(5)?,
                        created_at: row.get(6)?,
                    })
                },
            )
            .optional()?;

        Ok(record)
    }

    /// Revokes `previous_id` and issues its successor atomically.
    /// Fails if `previous_id` was revoked concurrently.
    pub fn rotate_refresh_token(
        &self,
        previous_id: i64,
        user_id: i64,
        token_hash: &str,
        expires_at: i64,
    ) -> AppResult<i64> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = Utc::now().timestamp();

        tx.execute(
            "INSERT INTO refresh_tokens (user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?)",
            params![user_id, token_hash, expires_at, now],
        )?;
        let new_id = tx.last_insert_rowid();

        let revoked = tx.execute(
            "UPDATE refresh_tokens SET revoked_at = ?, replaced_by = ?
             WHERE id = ? AND revoked_at IS NULL",
            params![now, new_id, previous_id],
        )?;
        if revoked == 0 {
            return Err(AppError::Unauthorized(
                "Refresh token has already been used".to_string(),
            ));
        }

        tx.commit()?;
        Ok(new_id)
    }

    pub fn revoke_refresh_token(&self, id: i64) -> AppResult<bool> {
        let conn = self.conn()?;
        let revoked = conn.execute(
            "UPDATE refresh_tokens SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL",
            params![Utc::now().timestamp(), id],
        )?;
        Ok(revoked > 0)
    }

    pub fn revoke_all_refresh_tokens(&self, user_id: i64) -> AppResult<usize> {
        let conn = self.conn()?;
        let revoked = conn.execute(
            "UPDATE refresh_tokens SET revoked_at = ? WHERE user_id = ? AND revoked_at IS NULL",
            params![Utc::now().timestamp(), user_id],
        )?;
        Ok(revoked)
    }
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, is_blocked, created_at, updated_at, last_login_at";

fn user_from_row(row: &rusqlite::Row) -> rusqlite::Result<User> {
    let role: String = row.get(4)?;
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        role: Role::parse(&role).unwrap_or_default(),
        is_blocked: row.get(5)?,
        created_at: row.get(6)?,
        updated_at: row.get(7)?,
        last_login_at: row.get(8)?,
    })
}

fn is_constraint_violation(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(e, _) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

// Slot column helpers

fn insert_user(conn: &Connection, user: &User) -> AppResult<i64> {
    conn.execute(
        "INSERT INTO users (name, email, password_hash, role, is_blocked, created_at, updated_at, last_login_at)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            user.name,
            user.email,
            user.password_hash,
            user.role.as_str(),
            user.is_blocked,
            user.created_at,
            user.updated_at,
            user.last_login_at,
        ],
    )
    .map_err(|e| {
        if is_constraint_violation(&e) {
            AppError::Conflict("Username or email already registered".to_string())
        } else {
            AppError::Database(e)
        }
    })?;

    Ok(conn.last_insert_rowid())
}

fn column_definitions(columns: &[SlotColumn]) -> String {
    columns
        .iter()
        .map(|c| format!("{} {}", c.name, column_type(c)))
        .collect::<Vec<_>>()
        .join(",\n                    ")
}

fn column_type(column: &SlotColumn) -> String {
    match (column.field, column.tag) {
        (SlotField::State, _) => format!(
            "TEXT NOT NULL DEFAULT '{}'",
            SlotState::NotPresent.as_str()
        ),
        (SlotField::Answer, TypeTag::Int | TypeTag::Bool) => "INTEGER".to_string(),
        _ => "TEXT".to_string(),
    }
}

fn column_list(columns: &[SlotColumn]) -> String {
    columns
        .iter()
        .map(|c| c.name.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn to_sql_value(value: &Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(b) => SqlValue::Integer(i64::from(*b)),
        Value::Number(n) => n
            .as_i64()
            .map(SqlValue::Integer)
            .or_else(|| n.as_f64().map(SqlValue::Real))
            .unwrap_or(SqlValue::Null),
        Value::String(s) => SqlValue::Text(s.clone()),
        other => SqlValue::Text(other.to_string()),
    }
}

fn from_sql_value(value: SqlValue, column: &SlotColumn) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) if column.field == SlotField::Answer && column.tag == TypeTag::Bool => {
            Value::Bool(i != 0)
        }
        SqlValue::Integer(i) => Value::from(i),
        SqlValue::Real(f) => serde_json::Number::from_f64(f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        SqlValue::Text(s) => Value::String(s),
        SqlValue::Blob(_) => Value::Null,
    }
}

/// One value per column; slots missing from `row` are written as unset.
fn slot_values(row: &SlotRow, columns: &[SlotColumn]) -> Vec<SqlValue> {
    columns
        .iter()
        .map(|column| match row.get(&column.name) {
            Some(value) => to_sql_value(value),
            None if column.field == SlotField::State => {
                SqlValue::Text(SlotState::NotPresent.as_str().to_string())
            }
            None => SqlValue::Null,
        })
        .collect()
}

fn read_slot_row(
    row: &rusqlite::Row,
    offset: usize,
    columns: &[SlotColumn],
) -> rusqlite::Result<SlotRow> {
    let mut slots = SlotRow::new();
    for (i, column) in columns.iter().enumerate() {
        let value: SqlValue = row.get(offset + i)?;
        slots.insert(column.name.clone(), from_sql_value(value, column));
    }
    Ok(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::hash_refresh_token;
    use std::sync::Barrier;

    fn user(db: &Database, name: &str) -> i64 {
        let user = User::new(
            name.to_string(),
            format!("{name}@example.com"),
            "hash".to_string(),
        );
        db.create_user(&user).unwrap()
    }

    #[test]
    fn test_user_crud() {
        let db = Database::in_memory().unwrap();
        let id = user(&db, "alice");

        let fetched = db.get_user_by_id(id).unwrap();
        assert_eq!(fetched.name, "alice");
        assert_eq!(fetched.role, Role::User);
        assert!(!fetched.is_blocked);

        // Email lookups ignore case
        assert!(db.get_user_by_email("ALICE@example.com").unwrap().is_some());
        assert!(db.get_user_by_name("bob").unwrap().is_none());

        db.set_user_role(id, Role::Admin).unwrap();
        assert_eq!(db.count_active_admins().unwrap(), 1);
        db.set_user_blocked(id, true).unwrap();
        assert_eq!(db.count_active_admins().unwrap(), 0);

        db.delete_user(id).unwrap();
        assert!(matches!(db.get_user_by_id(id), Err(AppError::NotFound(_))));
        assert_eq!(db.count_users().unwrap(), 0);
    }

    #[test]
    fn test_only_first_registration_becomes_admin() {
        let db = Database::in_memory().unwrap();

        let mut first = User::new("alice".into(), "alice@example.com".into(), "hash".into());
        let first_id = db.register_user(&mut first).unwrap();
        let mut second = User::new("bob".into(), "bob@example.com".into(), "hash".into());
        let second_id = db.register_user(&mut second).unwrap();

        assert_eq!(first.role, Role::Admin);
        assert_eq!(db.get_user_by_id(first_id).unwrap().role, Role::Admin);
        assert_eq!(second.role, Role::User);
        assert_eq!(db.get_user_by_id(second_id).unwrap().role, Role::User);
    }

    #[test]
    fn test_concurrent_first_registrations_yield_one_admin() {
        let db = Arc::new(Database::in_memory().unwrap());
        let barrier = Arc::new(Barrier::new(6));

        let handles: Vec<_> = (0..6)
            .map(|i| {
                let db = Arc::clone(&db);
                let barrier = Arc::clone(&barrier);
                std::thread::spawn(move || {
                    let mut user =
                        User::new(format!("user{i}"), format!("user{i}@example.com"), "hash".into());
                    barrier.wait();
                    db.register_user(&mut user).unwrap()
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(db.count_users().unwrap(), 6);
        assert_eq!(db.count_active_admins().unwrap(), 1);
    }

    #[test]
    fn test_duplicate_user_is_conflict() {
        let db = Database::in_memory().unwrap();
        user(&db, "alice");

        let duplicate = User::new("alice".into(), "other@example.com".into(), "hash".into());
        assert!(matches!(db.create_user(&duplicate), Err(AppError::Conflict(_))));
    }

    #[test]
    fn test_refresh_token_rotation() {
        let db = Database::in_memory().unwrap();
        let user_id = user(&db, "alice");
        let expires = Utc::now().timestamp() + 60;

        let first = db
            .create_refresh_token(user_id, &hash_refresh_token("one"), expires)
            .unwrap();
        let second = db
            .rotate_refresh_token(first, user_id, &hash_refresh_token("two"), expires)
            .unwrap();

        let old = db
            .get_refresh_token_by_hash(&hash_refresh_token("one"))
            .unwrap()
            .unwrap();
        assert!(old.revoked_at.is_some());
        assert_eq!(old.replaced_by, Some(second));

        // Rotating the same token twice fails and leaves no extra token behind
        let again = db.rotate_refresh_token(first, user_id, &hash_refresh_token("three"), expires);
        assert!(matches!(again, Err(AppError::Unauthorized(_))));
        assert!(db
            .get_refresh_token_by_hash(&hash_refresh_token("three"))
            .unwrap()
            .is_none());

        assert_eq!(db.revoke_all_refresh_tokens(user_id).unwrap(), 1);
    }

    #[test]
    fn test_blocking_revokes_tokens() {
        let db = Database::in_memory().unwrap();
        let user_id = user(&db, "alice");
        db.create_refresh_token(user_id, &hash_refresh_token("t"), Utc::now().timestamp() + 60)
            .unwrap();

        db.set_user_blocked(user_id, true).unwrap();

        assert!(db.get_user_by_id(user_id).unwrap().is_blocked);
        let record = db
            .get_refresh_token_by_hash(&hash_refresh_token("t"))
            .unwrap()
            .unwrap();
        assert!(record.revoked_at.is_some());
    }

    #[test]
    fn test_sql_value_conversion() {
        let bool_answer = SlotColumn {
            name: "customBool1Answer".into(),
            tag: TypeTag::Bool,
            field: SlotField::Answer,
        };
        let int_answer = SlotColumn {
            name: "customInt1Answer".into(),
            tag: TypeTag::Int,
            field: SlotField::Answer,
        };

        assert_eq!(to_sql_value(&Value::Bool(true)), SqlValue::Integer(1));
        assert_eq!(from_sql_value(SqlValue::Integer(1), &bool_answer), Value::Bool(true));
        assert_eq!(from_sql_value(SqlValue::Integer(0), &bool_answer), Value::Bool(false));
        assert_eq!(from_sql_value(SqlValue::Integer(7), &int_answer), Value::from(7));
        assert_eq!(from_sql_value(SqlValue::Null, &int_answer), Value::Null);
    }

    #[test]
    fn test_unset_slots_are_written_as_not_present() {
        let columns = question_columns();
        let values = slot_values(&SlotRow::new(), &columns);

        for (column, value) in columns.iter().zip(values) {
            match column.field {
                SlotField::State => assert_eq!(value, SqlValue::Text("NOT_PRESENT".into())),
                _ => assert_eq!(value, SqlValue::Null),
            }
        }
    }
}
