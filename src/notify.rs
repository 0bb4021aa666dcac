//! Notification dispatch: turning intents into outbound messages.
//!
//! The lifecycle engine only describes notifications. A dispatcher delivers
//! them. The one shipped here appends each intent to an outbox file
//! (`outbox.jsonl`) for a mailer process to drain; composing and sending the
//! email happens there.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

// Traits must be in scope for `.lines()` on `BufReader` and `.write_all()` on `File`.
use io::{BufRead, Write};

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::NotificationIntent;

/// Errors that can occur while handing an intent to its transport.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    #[error("ticket {0} has no submitter email to notify")]
    NoRecipient(uuid::Uuid),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Acknowledgement that a dispatcher accepted an intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ack {
    pub accepted_at: Timestamp,
}

pub trait NotificationDispatcher {
    fn send(&self, intent: &NotificationIntent) -> Result<Ack, DeliveryError>;
}

/// One line of the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutboxEntry {
    pub queued_at: Timestamp,
    pub intent: NotificationIntent,
}

/// Queues intents as JSONL lines in an append-only file.
pub struct OutboxDispatcher {
    path: PathBuf,
}

impl OutboxDispatcher {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every queued entry in the order it was queued.
    ///
    /// A missing outbox is an empty one.
    pub fn load(&self) -> Result<Vec<OutboxEntry>, DeliveryError> {
        let file = match fs::File::open(&self.path) {
            Ok(f) => f,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let reader = io::BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let line = line?;
            if !line.is_empty() {
                entries.push(serde_json::from_str(&line)?);
            }
        }
        Ok(entries)
    }
}

impl NotificationDispatcher for OutboxDispatcher {
    fn send(&self, intent: &NotificationIntent) -> Result<Ack, DeliveryError> {
        if intent.recipient.email.trim().is_empty() {
            return Err(DeliveryError::NoRecipient(intent.ticket_id));
        }
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entry = OutboxEntry {
            queued_at: Timestamp::now(),
            intent: intent.clone(),
        };
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;

        debug!(ticket = %intent.ticket_id, kind = ?intent.kind(), "notification queued");
        Ok(Ack {
            accepted_at: entry.queued_at,
        })
    }
}
