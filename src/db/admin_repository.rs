use crate::{errors::PublicationError, models::admin::Admin};
use chrono::{DateTime, NaiveDateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};

pub struct AdminRepository<'a> {
    conn: &'a Connection,
}

impl<'a> AdminRepository<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    pub fn find_admin_by_email(&self, email: &str) -> Result<Option<Admin>, PublicationError> {
        self.conn
            .query_row(
                "SELECT id, email, password_hash, created_at FROM admins WHERE email = ?1",
                params![email],
                |row| {
                    let created_at_str: Option<String> = row.get(3)?;
                    let created_at = created_at_str.and_then(|s| {
                        NaiveDateTime::parse_from_str(&s, "%Y-%m-%d %H:%M:%S")
                            .ok()
                            .map(|dt| DateTime::<Utc>::from_naive_utc_and_offset(dt, Utc))
                    });
                    Ok(Admin {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        password_hash: row.get(2)?,
                        created_at,
                    })
                },
            )
            .optional()
            .map_err(|e| PublicationError::DatabaseError(e.to_string()))
    }

    // Used for seeding at startup.
    pub fn create_admin(&self, email: &str, password_hash: &str) -> Result<i64, PublicationError> {
        self.conn
            .execute(
                "INSERT INTO admins (email, password_hash) VALUES (?1, ?2)",
                params![email, password_hash],
            )
            .map(|_| self.conn.last_insert_rowid())
            .map_err(|e| PublicationError::DatabaseError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::schema::create_tables;

    #[test]
    fn created_admin_is_found_by_email() {
        let conn = Connection::open_in_memory().unwrap();
        create_tables(&conn).unwrap();

        let repo = AdminRepository::new(&conn);
        repo.create_admin("admin@example.org", "$2b$12$hash").unwrap();

        let admin = repo.find_admin_by_email("admin@example.org").unwrap().unwrap();
        assert_eq!(admin.email, "admin@example.org");
        assert!(admin.created_at.is_some());
        assert!(repo.find_admin_by_email("nobody@example.org").unwrap().is_none());
    }
}
