//! SQLite-backed ticket store implementation.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection};

use super::{
    ClassificationResult, EscalationReason, NewTicket, Priority, RoutingDecision, SessionKind,
    Ticket, TicketError, TicketFilter, TicketStore, TicketSubmission,
};

const SELECT_COLUMNS: &str = "id, created_at, title, description, session_kind, category, confidence, model_priority, queue, escalated, escalation_reason, priority";

/// SQLite-backed ticket store.
pub struct SqliteTicketStore {
    conn: Mutex<Connection>,
}

impl SqliteTicketStore {
    /// Create a new SQLite ticket store, creating the database file and tables if needed.
    pub fn new(path: &Path) -> Result<Self, TicketError> {
        let conn = Connection::open(path).map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory SQLite ticket store (useful for testing).
    pub fn in_memory() -> Result<Self, TicketError> {
        let conn =
            Connection::open_in_memory().map_err(|e| TicketError::Database(e.to_string()))?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), TicketError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS tickets (
                id TEXT PRIMARY KEY,
                created_at TEXT NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                session_kind TEXT NOT NULL,
                category TEXT NOT NULL,
                confidence REAL NOT NULL,
                model_priority TEXT,
                queue TEXT NOT NULL,
                escalated INTEGER NOT NULL,
                escalation_reason TEXT,
                priority TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_tickets_created_at ON tickets(created_at);
            CREATE INDEX IF NOT EXISTS idx_tickets_queue ON tickets(queue);
            CREATE INDEX IF NOT EXISTS idx_tickets_category ON tickets(category);
            "#,
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, TicketError> {
        self.conn
            .lock()
            .map_err(|_| TicketError::Database("connection lock poisoned".to_string()))
    }

    fn build_where_clause(filter: &TicketFilter) -> (String, Vec<Box<dyn rusqlite::ToSql>>) {
        let mut conditions = Vec::new();
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(ref queue) = filter.queue {
            conditions.push("queue = ?");
            params.push(Box::new(queue.clone()));
        }

        if let Some(ref category) = filter.category {
            conditions.push("category = ?");
            params.push(Box::new(category.clone()));
        }

        if let Some(escalated) = filter.escalated {
            conditions.push("escalated = ?");
            params.push(Box::new(escalated));
        }

        if let Some(session_kind) = filter.session_kind {
            conditions.push("session_kind = ?");
            params.push(Box::new(session_kind.as_str()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };

        (where_clause, params)
    }

    fn row_to_ticket(row: &rusqlite::Row) -> rusqlite::Result<Ticket> {
        let id: String = row.get(0)?;
        let created_at_str: String = row.get(1)?;
        let title: String = row.get(2)?;
        let description: String = row.get(3)?;
        let session_kind_str: String = row.get(4)?;
        let category: String = row.get(5)?;
        let confidence: f64 = row.get(6)?;
        let model_priority_str: Option<String> = row.get(7)?;
        let queue: String = row.get(8)?;
        let escalated: bool = row.get(9)?;
        let escalation_reason_str: Option<String> = row.get(10)?;
        let priority_str: String = row.get(11)?;

        let created_at = DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| conversion_error(1, e))?;

        let session_kind: SessionKind = session_kind_str
            .parse()
            .map_err(|e: String| conversion_error(4, e))?;

        let submission = TicketSubmission::new(title, description, session_kind)
            .map_err(|e| conversion_error(2, e))?;

        let model_priority = model_priority_str
            .map(|p| p.parse::<Priority>())
            .transpose()
            .map_err(|e| conversion_error(7, e))?;

        let escalation_reason = escalation_reason_str
            .map(|r| r.parse::<EscalationReason>())
            .transpose()
            .map_err(|e| conversion_error(10, e))?;

        let priority: Priority = priority_str
            .parse()
            .map_err(|e: String| conversion_error(11, e))?;

        Ok(Ticket {
            id,
            submission,
            classification: ClassificationResult {
                category,
                confidence,
                priority: model_priority,
            },
            routing: RoutingDecision {
                destination_queue: queue,
                escalated,
                escalation_reason,
            },
            priority,
            created_at,
        })
    }
}

fn conversion_error(
    column: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.into())
}

impl TicketStore for SqliteTicketStore {
    fn insert(&self, ticket: NewTicket) -> Result<Ticket, TicketError> {
        let conn = self.conn()?;

        let id = uuid::Uuid::new_v4().to_string();
        // Stored with fixed microsecond precision so text ordering matches time ordering.
        let now = Utc::now().trunc_subsecs(6);

        conn.execute(
            &format!(
                "INSERT INTO tickets ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                SELECT_COLUMNS
            ),
            params![
                id,
                now.to_rfc3339_opts(SecondsFormat::Micros, true),
                ticket.submission.title(),
                ticket.submission.description(),
                ticket.submission.session_kind().as_str(),
                ticket.classification.category,
                ticket.classification.confidence,
                ticket.classification.priority.map(|p| p.as_str()),
                ticket.routing.destination_queue,
                ticket.routing.escalated,
                ticket.routing.escalation_reason.map(|r| r.as_str()),
                ticket.priority.as_str(),
            ],
        )
        .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(Ticket {
            id,
            submission: ticket.submission,
            classification: ticket.classification,
            routing: ticket.routing,
            priority: ticket.priority,
            created_at: now,
        })
    }

    fn get(&self, id: &str) -> Result<Option<Ticket>, TicketError> {
        let conn = self.conn()?;

        let result = conn.query_row(
            &format!("SELECT {} FROM tickets WHERE id = ?", SELECT_COLUMNS),
            params![id],
            Self::row_to_ticket,
        );

        match result {
            Ok(ticket) => Ok(Some(ticket)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(TicketError::Database(e.to_string())),
        }
    }

    fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>, TicketError> {
        let conn = self.conn()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!(
            "SELECT {} FROM tickets {} ORDER BY created_at DESC, rowid DESC LIMIT ? OFFSET ?",
            SELECT_COLUMNS, where_clause
        );

        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut all_params: Vec<Box<dyn rusqlite::ToSql>> = params;
        all_params.push(Box::new(filter.limit));
        all_params.push(Box::new(filter.offset));

        let param_refs: Vec<&dyn rusqlite::ToSql> = all_params.iter().map(|p| p.as_ref()).collect();

        let rows = stmt
            .query_map(param_refs.as_slice(), Self::row_to_ticket)
            .map_err(|e| TicketError::Database(e.to_string()))?;

        let mut tickets = Vec::new();
        for row_result in rows {
            let ticket = row_result.map_err(|e| TicketError::Database(e.to_string()))?;
            tickets.push(ticket);
        }

        Ok(tickets)
    }

    fn count(&self, filter: &TicketFilter) -> Result<i64, TicketError> {
        let conn = self.conn()?;

        let (where_clause, params) = Self::build_where_clause(filter);

        let sql = format!("SELECT COUNT(*) FROM tickets {}", where_clause);

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();

        let count: i64 = conn
            .query_row(&sql, param_refs.as_slice(), |row| row.get(0))
            .map_err(|e| TicketError::Database(e.to_string()))?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_store() -> SqliteTicketStore {
        SqliteTicketStore::in_memory().unwrap()
    }

    fn new_ticket(category: &str, queue: &str, session_kind: SessionKind) -> NewTicket {
        NewTicket {
            submission: TicketSubmission::new(
                "Cannot access Outlook",
                "Error on login",
                session_kind,
            )
            .unwrap(),
            classification: ClassificationResult::new(category, 0.92),
            routing: RoutingDecision::to_queue(queue),
            priority: Priority::Medium,
        }
    }

    fn escalated_ticket() -> NewTicket {
        NewTicket {
            submission: TicketSubmission::new("Slow wifi", "Drops every hour", SessionKind::Guest)
                .unwrap(),
            classification: ClassificationResult::new("network", 0.3).with_priority(Priority::High),
            routing: RoutingDecision::escalate("triage", EscalationReason::LowConfidence),
            priority: Priority::High,
        }
    }

    #[test]
    fn test_insert_assigns_id() {
        let store = create_test_store();
        let ticket = store
            .insert(new_ticket("email", "email", SessionKind::Employee))
            .unwrap();

        assert!(!ticket.id.is_empty());
        assert_eq!(ticket.routing.destination_queue, "email");
        assert_eq!(ticket.submission.title(), "Cannot access Outlook");
    }

    #[test]
    fn test_insert_assigns_unique_ids() {
        let store = create_test_store();
        let a = store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();
        let b = store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_get_returns_stored_classification_and_routing() {
        let store = create_test_store();
        let created = store.insert(escalated_ticket()).unwrap();

        let fetched = store.get(&created.id).unwrap().unwrap();
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.classification, created.classification);
        assert_eq!(fetched.routing, created.routing);
        assert_eq!(fetched.priority, Priority::High);
        assert_eq!(fetched.submission, created.submission);
        assert_eq!(fetched.created_at, created.created_at);
    }

    #[test]
    fn test_get_nonexistent_ticket() {
        let store = create_test_store();
        assert!(store.get("nonexistent-id").unwrap().is_none());
    }

    #[test]
    fn test_list_tickets() {
        let store = create_test_store();
        for _ in 0..3 {
            store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();
        }

        let tickets = store.list(&TicketFilter::new()).unwrap();
        assert_eq!(tickets.len(), 3);
    }

    #[test]
    fn test_list_newest_first() {
        let store = create_test_store();
        let first = store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();
        let second = store.insert(new_ticket("network", "network", SessionKind::Guest)).unwrap();

        let tickets = store.list(&TicketFilter::new()).unwrap();
        assert_eq!(tickets[0].id, second.id);
        assert_eq!(tickets[1].id, first.id);
    }

    #[test]
    fn test_list_with_queue_filter() {
        let store = create_test_store();
        store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();
        store.insert(escalated_ticket()).unwrap();

        let tickets = store.list(&TicketFilter::new().with_queue("triage")).unwrap();
        assert_eq!(tickets.len(), 1);
        assert!(tickets[0].routing.escalated);
    }

    #[test]
    fn test_list_with_escalated_and_category_filters() {
        let store = create_test_store();
        store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();
        store.insert(new_ticket("network", "network", SessionKind::Guest)).unwrap();
        store.insert(escalated_ticket()).unwrap();

        let not_escalated = store
            .list(&TicketFilter::new().with_escalated(false))
            .unwrap();
        assert_eq!(not_escalated.len(), 2);

        let network = store
            .list(&TicketFilter::new().with_category("network"))
            .unwrap();
        assert_eq!(network.len(), 2);
    }

    #[test]
    fn test_list_with_session_kind_filter() {
        let store = create_test_store();
        store.insert(new_ticket("email", "email", SessionKind::Employee)).unwrap();
        store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();

        let tickets = store
            .list(&TicketFilter::new().with_session_kind(SessionKind::Employee))
            .unwrap();
        assert_eq!(tickets.len(), 1);
        assert_eq!(tickets[0].submission.session_kind(), SessionKind::Employee);
    }

    #[test]
    fn test_list_pagination() {
        let store = create_test_store();
        for _ in 0..5 {
            store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();
        }

        let page = |offset| {
            store
                .list(&TicketFilter::new().with_limit(2).with_offset(offset))
                .unwrap()
                .len()
        };
        assert_eq!(page(0), 2);
        assert_eq!(page(2), 2);
        assert_eq!(page(4), 1);
    }

    #[test]
    fn test_count_with_filter() {
        let store = create_test_store();
        store.insert(new_ticket("email", "email", SessionKind::Guest)).unwrap();
        store.insert(escalated_ticket()).unwrap();
        store.insert(escalated_ticket()).unwrap();

        assert_eq!(store.count(&TicketFilter::new()).unwrap(), 3);
        assert_eq!(
            store
                .count(&TicketFilter::new().with_escalated(true).with_limit(1))
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_file_based_store_survives_reopen() {
        let temp_dir = tempfile::tempdir().unwrap();
        let db_path = temp_dir.path().join("tickets.db");

        let id = {
            let store = SqliteTicketStore::new(&db_path).unwrap();
            store.insert(escalated_ticket()).unwrap().id
        };

        assert!(db_path.exists());

        let reopened = SqliteTicketStore::new(&db_path).unwrap();
        let fetched = reopened.get(&id).unwrap().unwrap();
        assert_eq!(fetched.classification.category, "network");
        assert_eq!(
            fetched.routing.escalation_reason,
            Some(EscalationReason::LowConfidence)
        );
    }
}
