//! Ticket storage: create, load, query, and conditionally update tickets.

use jiff::Timestamp;
use rusqlite::{Connection, OptionalExtension, Row, TransactionBehavior};
use tracing::debug;
use uuid::Uuid;

use crate::model::{Note, Rating, Resolution, Status, Submitter, Ticket};

use super::{Mutation, Result, Storage, StorageError, TicketFilter, TicketStore};

const TICKET_COLUMNS: &str = "id, submission_type, status, department, priority, category, \
     rating, submitter_name, submitter_email, subject, body, submitted_at, \
     resolution, resolved_by, resolved_at";

impl Storage {
    /// Persists a newly submitted ticket, including any notes it carries.
    pub fn create_ticket(&self, ticket: &Ticket) -> Result<()> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if load_status(&tx, ticket.id)?.is_some() {
            return Err(StorageError::TicketAlreadyExists(ticket.id));
        }

        let (resolution, resolved_by, resolved_at) = serialize_resolution(ticket.resolution.as_ref());
        tx.execute(
            &format!(
                "INSERT INTO ticket ({TICKET_COLUMNS})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
            ),
            rusqlite::params![
                ticket.id.to_string(),
                ticket.submission_type.as_str(),
                ticket.status.as_str(),
                &ticket.department,
                ticket.priority.as_str(),
                &ticket.category,
                ticket.rating.map(Rating::get),
                &ticket.submitted_by.name,
                &ticket.submitted_by.email,
                &ticket.subject,
                &ticket.body,
                ticket.submitted_at.to_string(),
                resolution,
                resolved_by,
                resolved_at,
            ],
        )?;
        append_notes(&tx, ticket.id, &ticket.notes)?;
        tx.commit()?;

        debug!(ticket = %ticket.id, department = %ticket.department, "ticket created");
        Ok(())
    }
}

impl TicketStore for Storage {
    fn find_by_id(&self, id: Uuid) -> Result<Ticket> {
        let conn = self.open_db()?;
        load_ticket(&conn, id)
    }

    fn query(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let conn = self.open_db()?;

        // Exact-match columns narrow in SQL; the rest is filtered on the
        // loaded tickets so matching stays identical to `TicketFilter::matches`.
        let mut clauses = Vec::new();
        let mut params: Vec<&str> = Vec::new();
        if let Some(status) = filter.status {
            params.push(status.as_str());
            clauses.push(format!("status = ?{}", params.len()));
        }
        if let Some(kind) = filter.submission_type {
            params.push(kind.as_str());
            clauses.push(format!("submission_type = ?{}", params.len()));
        }

        let mut sql = format!("SELECT {TICKET_COLUMNS} FROM ticket");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }

        let rows = {
            let mut stmt = conn.prepare(&sql)?;
            stmt.query_map(rusqlite::params_from_iter(params), TicketRow::read)?
                .collect::<rusqlite::Result<Vec<_>>>()?
        };

        let mut tickets = Vec::new();
        for row in rows {
            let id = parse_id(&row.id)?;
            let ticket = row.into_ticket(load_notes(&conn, id)?)?;
            if filter.matches(&ticket) {
                tickets.push(ticket);
            }
        }
        tickets.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(tickets)
    }

    fn conditional_update(
        &self,
        id: Uuid,
        expected: Status,
        mutation: &Mutation,
    ) -> Result<Ticket> {
        let mut conn = self.open_db()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let actual = load_status(&tx, id)?.ok_or(StorageError::TicketNotFound(id))?;
        if actual != expected {
            return Err(StorageError::Conflict {
                id,
                expected,
                actual,
            });
        }

        // Only the columns the mutation changed are written, so fields a
        // concurrent writer set at the same status survive.
        let resolved_at = mutation
            .resolution
            .as_ref()
            .map(|r| r.resolved_at.to_string());
        let mut columns: Vec<(&str, &str)> = Vec::new();
        if let Some(status) = mutation.status {
            columns.push(("status", status.as_str()));
        }
        if let Some(priority) = mutation.priority {
            columns.push(("priority", priority.as_str()));
        }
        if let (Some(r), Some(at)) = (&mutation.resolution, &resolved_at) {
            columns.push(("resolution", r.message.as_str()));
            columns.push(("resolved_by", r.resolved_by.as_str()));
            columns.push(("resolved_at", at.as_str()));
        }
        if !columns.is_empty() {
            let assignments: Vec<String> = columns
                .iter()
                .enumerate()
                .map(|(i, (column, _))| format!("{column} = ?{}", i + 1))
                .collect();
            let sql = format!(
                "UPDATE ticket SET {} WHERE id = ?{}",
                assignments.join(", "),
                columns.len() + 1
            );
            let id = id.to_string();
            let params = columns.iter().map(|(_, value)| *value).chain([id.as_str()]);
            tx.execute(&sql, rusqlite::params_from_iter(params))?;
        }
        append_notes(&tx, id, &mutation.appended_notes)?;
        tx.commit()?;

        load_ticket(&conn, id)
    }
}

/// Raw column values of one ticket row, before validation.
struct TicketRow {
    id: String,
    submission_type: String,
    status: String,
    department: String,
    priority: String,
    category: String,
    rating: Option<i64>,
    submitter_name: String,
    submitter_email: String,
    subject: String,
    body: String,
    submitted_at: String,
    resolution: Option<String>,
    resolved_by: Option<String>,
    resolved_at: Option<String>,
}

impl TicketRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            submission_type: row.get(1)?,
            status: row.get(2)?,
            department: row.get(3)?,
            priority: row.get(4)?,
            category: row.get(5)?,
            rating: row.get(6)?,
            submitter_name: row.get(7)?,
            submitter_email: row.get(8)?,
            subject: row.get(9)?,
            body: row.get(10)?,
            submitted_at: row.get(11)?,
            resolution: row.get(12)?,
            resolved_by: row.get(13)?,
            resolved_at: row.get(14)?,
        })
    }

    fn into_ticket(self, notes: Vec<Note>) -> Result<Ticket> {
        let rating = self
            .rating
            .map(|r| {
                u8::try_from(r)
                    .ok()
                    .and_then(Rating::new)
                    .ok_or_else(|| StorageError::Corrupt(format!("invalid rating: {r}")))
            })
            .transpose()?;
        let status = parse_enum(&self.status)?;
        let resolution = deserialize_resolution(
            self.resolution,
            self.resolved_by,
            self.resolved_at.as_deref(),
        )?;
        if (status == Status::Resolved) != resolution.is_some() {
            return Err(StorageError::Corrupt(format!(
                "ticket {} is {status} but resolution is {}",
                self.id,
                if resolution.is_some() { "set" } else { "missing" }
            )));
        }

        Ok(Ticket {
            id: parse_id(&self.id)?,
            submission_type: parse_enum(&self.submission_type)?,
            status,
            department: self.department,
            priority: parse_enum(&self.priority)?,
            category: self.category,
            rating,
            submitted_by: Submitter {
                name: self.submitter_name,
                email: self.submitter_email,
            },
            subject: self.subject,
            body: self.body,
            submitted_at: parse_timestamp("submitted_at", &self.submitted_at)?,
            notes,
            resolution,
        })
    }
}

fn load_ticket(conn: &Connection, id: Uuid) -> Result<Ticket> {
    let row = conn
        .query_row(
            &format!("SELECT {TICKET_COLUMNS} FROM ticket WHERE id = ?1"),
            [id.to_string()],
            TicketRow::read,
        )
        .optional()?
        .ok_or(StorageError::TicketNotFound(id))?;
    row.into_ticket(load_notes(conn, id)?)
}

fn load_status(conn: &Connection, id: Uuid) -> Result<Option<Status>> {
    let status: Option<String> = conn
        .query_row(
            "SELECT status FROM ticket WHERE id = ?1",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    status.as_deref().map(parse_enum).transpose()
}

/// Loads a ticket's notes in the order they were written.
fn load_notes(conn: &Connection, id: Uuid) -> Result<Vec<Note>> {
    let mut stmt = conn.prepare(
        "SELECT admin_name, message, created_at FROM note WHERE ticket_id = ?1 ORDER BY seq",
    )?;
    let rows = stmt
        .query_map([id.to_string()], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
            ))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    rows.into_iter()
        .map(|(admin_name, message, created_at)| {
            Ok(Note {
                admin_name,
                message,
                timestamp: parse_timestamp("note created_at", &created_at)?,
            })
        })
        .collect()
}

/// Inserts notes after the last persisted one.
fn append_notes(conn: &Connection, id: Uuid, notes: &[Note]) -> Result<()> {
    if notes.is_empty() {
        return Ok(());
    }
    let last: i64 = conn.query_row(
        "SELECT COALESCE(MAX(seq), 0) FROM note WHERE ticket_id = ?1",
        [id.to_string()],
        |row| row.get(0),
    )?;
    let mut stmt = conn.prepare(
        "INSERT INTO note (ticket_id, seq, admin_name, message, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for (seq, note) in (last + 1..).zip(notes) {
        stmt.execute(rusqlite::params![
            id.to_string(),
            seq,
            &note.admin_name,
            &note.message,
            note.timestamp.to_string(),
        ])?;
    }
    Ok(())
}

/// Converts a resolution to its three nullable columns.
fn serialize_resolution(
    resolution: Option<&Resolution>,
) -> (Option<&str>, Option<&str>, Option<String>) {
    match resolution {
        Some(r) => (
            Some(r.message.as_str()),
            Some(r.resolved_by.as_str()),
            Some(r.resolved_at.to_string()),
        ),
        None => (None, None, None),
    }
}

/// Rebuilds a resolution; the three columns are set together or not at all.
fn deserialize_resolution(
    message: Option<String>,
    resolved_by: Option<String>,
    resolved_at: Option<&str>,
) -> Result<Option<Resolution>> {
    match (message, resolved_by, resolved_at) {
        (None, None, None) => Ok(None),
        (Some(message), Some(resolved_by), Some(resolved_at)) => Ok(Some(Resolution {
            message,
            resolved_by,
            resolved_at: parse_timestamp("resolved_at", resolved_at)?,
        })),
        _ => Err(StorageError::Corrupt(
            "resolution, resolved_by, and resolved_at must be set together".into(),
        )),
    }
}

fn parse_id(s: &str) -> Result<Uuid> {
    s.parse::<Uuid>()
        .map_err(|e| StorageError::Corrupt(format!("invalid ticket id: {e}")))
}

fn parse_timestamp(column: &str, s: &str) -> Result<Timestamp> {
    s.parse::<Timestamp>()
        .map_err(|e| StorageError::Corrupt(format!("invalid {column}: {e}")))
}

fn parse_enum<T>(s: &str) -> Result<T>
where
    T: std::str::FromStr<Err = crate::model::ParseEnumError>,
{
    s.parse::<T>()
        .map_err(|e| StorageError::Corrupt(e.to_string()))
}
