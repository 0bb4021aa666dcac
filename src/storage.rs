//! Local persistence for tickets and their audit trail.
//!
//! All tickets live in one `SQLite` database under the storage root:
//!
//! ```text
//! <root>/
//!   tickets.sqlite   # ticket + note tables
//! ```
//!
//! Notes are stored in their own table and only ever inserted.
//! Status changes go through [`TicketStore::conditional_update`], which
//! refuses to write when the persisted status is not the one the caller
//! read, so two admins acting on the same stale snapshot cannot both win.

mod filter;
mod mutation;
mod ticket;

use std::{fs, io, path::PathBuf, time::Duration};

use rusqlite::Connection;
use uuid::Uuid;

use crate::model::{Status, Ticket};

pub use filter::TicketFilter;
pub use mutation::Mutation;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("ticket not found: {0}")]
    TicketNotFound(Uuid),

    #[error("ticket already exists: {0}")]
    TicketAlreadyExists(Uuid),

    /// Another writer changed the ticket since the caller read it.
    #[error("ticket {id} was changed concurrently: expected {expected}, found {actual}")]
    Conflict {
        id: Uuid,
        expected: Status,
        actual: Status,
    },

    #[error("corrupt ticket data: {0}")]
    Corrupt(String),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = core::result::Result<T, StorageError>;

/// What the lifecycle boundary needs from a ticket store.
pub trait TicketStore {
    fn find_by_id(&self, id: Uuid) -> Result<Ticket>;

    /// Tickets matching the filter, newest first.
    fn query(&self, filter: &TicketFilter) -> Result<Vec<Ticket>>;

    /// Applies `mutation` only if the persisted status is still `expected`.
    /// Fields the mutation leaves as `None` keep their stored values.
    ///
    /// Returns the ticket as stored after the write, or
    /// [`StorageError::Conflict`] without writing anything.
    fn conditional_update(&self, id: Uuid, expected: Status, mutation: &Mutation)
    -> Result<Ticket>;
}

const DB_FILE: &str = "tickets.sqlite";

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS ticket (
        id              TEXT PRIMARY KEY,
        submission_type TEXT NOT NULL,
        status          TEXT NOT NULL,
        department      TEXT NOT NULL,
        priority        TEXT NOT NULL,
        category        TEXT NOT NULL,
        rating          INTEGER,
        submitter_name  TEXT NOT NULL,
        submitter_email TEXT NOT NULL,
        subject         TEXT NOT NULL,
        body            TEXT NOT NULL,
        submitted_at    TEXT NOT NULL,
        resolution      TEXT,
        resolved_by     TEXT,
        resolved_at     TEXT
    );

    CREATE TABLE IF NOT EXISTS note (
        ticket_id  TEXT NOT NULL REFERENCES ticket(id),
        seq        INTEGER NOT NULL,
        admin_name TEXT NOT NULL,
        message    TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (ticket_id, seq)
    );
";

/// `SQLite`-backed ticket storage.
pub struct Storage {
    root: PathBuf,
}

impl Storage {
    /// Creates a new storage instance rooted at the given directory.
    ///
    /// The directory and database schema are created if they don't exist.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        let storage = Self { root };
        storage.open_db()?.execute_batch(SCHEMA)?;
        Ok(storage)
    }

    /// Returns the default storage root: `~/.concerns/`.
    pub fn default_root() -> Option<PathBuf> {
        dirs::home_dir().map(|h| h.join(".concerns"))
    }

    fn open_db(&self) -> Result<Connection> {
        let conn = Connection::open(self.root.join(DB_FILE))?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        Ok(conn)
    }
}
