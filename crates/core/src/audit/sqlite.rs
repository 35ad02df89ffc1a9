use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

use super::{AuditError, AuditEvent, AuditQuery, AuditRecord, AuditStore};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS audit_trail (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    recorded_at TEXT NOT NULL,
    event_type TEXT NOT NULL,
    ticket_id TEXT,
    session_kind TEXT,
    failure_kind TEXT,
    event TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_trail_recorded_at ON audit_trail(recorded_at);
CREATE INDEX IF NOT EXISTS idx_audit_trail_ticket_id ON audit_trail(ticket_id);
CREATE INDEX IF NOT EXISTS idx_audit_trail_failure_kind ON audit_trail(failure_kind)
    WHERE failure_kind IS NOT NULL;
"#;

/// Fixed width, so string order is time order.
fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn db_err(e: rusqlite::Error) -> AuditError {
    AuditError::Database(e.to_string())
}

/// Audit trail kept in its own SQLite table. Only the event JSON is
/// authoritative; the other columns are rebuilt from it on read.
pub struct SqliteAuditStore {
    conn: Mutex<Connection>,
}

impl SqliteAuditStore {
    pub fn new(path: &Path) -> Result<Self, AuditError> {
        Self::init(Connection::open(path).map_err(db_err)?)
    }

    pub fn in_memory() -> Result<Self, AuditError> {
        Self::init(Connection::open_in_memory().map_err(db_err)?)
    }

    fn init(conn: Connection) -> Result<Self, AuditError> {
        conn.execute_batch(SCHEMA).map_err(db_err)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, AuditError> {
        self.conn
            .lock()
            .map_err(|_| AuditError::Database("connection lock poisoned".to_string()))
    }

    /// WHERE clause for `query` and the values bound to its placeholders.
    fn conditions(query: &AuditQuery) -> (String, Vec<Value>) {
        let mut clauses = Vec::new();
        let mut values = Vec::new();

        let mut push = |clause: &'static str, value: String| {
            clauses.push(clause);
            values.push(Value::Text(value));
        };

        if let Some(ticket_id) = &query.ticket_id {
            push("ticket_id = ?", ticket_id.clone());
        }
        if let Some(event_type) = &query.event_type {
            push("event_type = ?", event_type.clone());
        }
        if let Some(session_kind) = query.session_kind {
            push("session_kind = ?", session_kind.as_str().to_string());
        }
        if let Some(kind) = query.failure_kind {
            push("failure_kind = ?", kind.as_str().to_string());
        }
        if let Some(since) = &query.since {
            push("recorded_at >= ?", format_timestamp(since));
        }
        if let Some(until) = &query.until {
            push("recorded_at <= ?", format_timestamp(until));
        }

        if clauses.is_empty() {
            (String::new(), values)
        } else {
            (format!("WHERE {}", clauses.join(" AND ")), values)
        }
    }

    fn row_parts(row: &Row<'_>) -> rusqlite::Result<(i64, String, String)> {
        Ok((row.get(0)?, row.get(1)?, row.get(2)?))
    }
}

impl AuditStore for SqliteAuditStore {
    fn append(&self, records: &[AuditRecord]) -> Result<(), AuditError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(db_err)?;
        {
            let mut stmt = tx
                .prepare_cached(
                    "INSERT INTO audit_trail (recorded_at, event_type, ticket_id, session_kind, failure_kind, event)
                     VALUES (?, ?, ?, ?, ?, ?)",
                )
                .map_err(db_err)?;

            for record in records {
                let event = serde_json::to_string(&record.event)
                    .map_err(|e| AuditError::Serialization(e.to_string()))?;
                stmt.execute(params![
                    format_timestamp(&record.recorded_at),
                    record.event_type,
                    record.ticket_id,
                    record.session_kind.map(|k| k.as_str()),
                    record.failure_kind.map(|k| k.as_str()),
                    event,
                ])
                .map_err(db_err)?;
            }
        }
        tx.commit().map_err(db_err)
    }

    fn query(&self, query: &AuditQuery) -> Result<Vec<AuditRecord>, AuditError> {
        let conn = self.conn()?;
        let (where_clause, mut values) = Self::conditions(query);
        values.push(Value::Integer(query.limit));
        values.push(Value::Integer(query.offset));

        let sql = format!(
            "SELECT id, recorded_at, event FROM audit_trail {} ORDER BY recorded_at DESC, id DESC LIMIT ? OFFSET ?",
            where_clause
        );
        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(params_from_iter(values), Self::row_parts)
            .map_err(db_err)?;

        let mut records = Vec::new();
        for row in rows {
            let (id, recorded_at, event) = row.map_err(db_err)?;
            let recorded_at = DateTime::parse_from_rfc3339(&recorded_at)
                .map_err(|e| AuditError::Database(format!("Invalid timestamp: {}", e)))?
                .with_timezone(&Utc);
            let event: AuditEvent = serde_json::from_str(&event)
                .map_err(|e| AuditError::Serialization(e.to_string()))?;

            let mut record = AuditRecord::from_event(event, recorded_at);
            record.id = id;
            records.push(record);
        }
        Ok(records)
    }

    fn count(&self, query: &AuditQuery) -> Result<i64, AuditError> {
        let conn = self.conn()?;
        let (where_clause, values) = Self::conditions(query);
        let sql = format!("SELECT COUNT(*) FROM audit_trail {}", where_clause);
        conn.query_row(&sql, params_from_iter(values), |row| row.get(0))
            .map_err(db_err)
    }
}
