//! The desk: where an admin surface applies lifecycle operations.
//!
//! A desk pairs a department scope with a store and a dispatcher and runs
//! each operation the same way:
//!
//! 1. Load the current snapshot (and check it is visible to this surface).
//! 2. Run the pure lifecycle operation.
//! 3. If nothing changed, stop: no write, no notification.
//! 4. Write the mutation, conditional on the status the snapshot had.
//! 5. Only after the write commits, dispatch the intent.
//!
//! A failed write is never followed by a dispatch. A failed dispatch never
//! undoes the write; it comes back as a warning on the [`Outcome`].
//! Because every call starts from a fresh read, retrying an operation that
//! already committed sees the new state and cannot notify twice.

use jiff::Timestamp;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::lifecycle::{self, Action, LifecycleError, Transition};
use crate::model::{NotificationIntent, Priority, Status, Ticket};
use crate::notify::{Ack, DeliveryError, NotificationDispatcher};
use crate::scope::{DepartmentScope, is_visible_to};
use crate::storage::{Mutation, StorageError, TicketFilter, TicketStore};

#[derive(Debug, thiserror::Error)]
pub enum DeskError {
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    #[error(transparent)]
    Storage(#[from] StorageError),

    /// The ticket belongs to a department outside this surface's scope.
    #[error("ticket {0} is not visible from this desk")]
    NotVisible(Uuid),
}

impl DeskError {
    /// Whether re-reading the ticket and retrying may succeed.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Conflict { .. }))
    }
}

pub type Result<T> = core::result::Result<T, DeskError>;

/// What happened to the notification for a committed change.
#[derive(Debug)]
pub enum Delivery {
    /// Nothing to tell the submitter.
    NotRequired,

    Sent(Ack),

    /// The change stands; the submitter was not told.
    Failed(DeliveryError),
}

/// The result of a desk operation.
#[derive(Debug)]
pub struct Outcome {
    /// The ticket as persisted after the operation.
    pub ticket: Ticket,

    /// Set when the operation changed the ticket.
    pub changed: bool,

    pub intent: Option<NotificationIntent>,

    pub delivery: Delivery,
}

impl Outcome {
    fn unchanged(ticket: Ticket) -> Self {
        Self {
            ticket,
            changed: false,
            intent: None,
            delivery: Delivery::NotRequired,
        }
    }

    /// A message to surface to the admin when delivery failed.
    pub fn warning(&self) -> Option<String> {
        match &self.delivery {
            Delivery::Failed(e) => Some(format!(
                "ticket {} was updated, but the submitter could not be notified: {e}",
                self.ticket.short_id()
            )),
            _ => None,
        }
    }
}

/// An admin surface bound to a department scope.
pub struct Desk<'a, S, D> {
    store: &'a S,
    dispatcher: &'a D,
    scope: DepartmentScope,
}

impl<'a, S: TicketStore, D: NotificationDispatcher> Desk<'a, S, D> {
    pub fn new(store: &'a S, dispatcher: &'a D, scope: DepartmentScope) -> Self {
        Self {
            store,
            dispatcher,
            scope,
        }
    }

    pub fn scope(&self) -> &DepartmentScope {
        &self.scope
    }

    /// Tickets matching `filter` that this surface may see, newest first.
    pub fn list(&self, filter: &TicketFilter) -> Result<Vec<Ticket>> {
        let tickets = self.store.query(filter)?;
        Ok(tickets
            .into_iter()
            .filter(|t| is_visible_to(t, &self.scope))
            .collect())
    }

    /// Loads a ticket without side effects.
    pub fn find(&self, id: Uuid) -> Result<Ticket> {
        let ticket = self.store.find_by_id(id)?;
        if !is_visible_to(&ticket, &self.scope) {
            return Err(DeskError::NotVisible(id));
        }
        Ok(ticket)
    }

    /// Opens a ticket for review, moving it out of pending on first view.
    pub fn open(&self, id: Uuid, actor: &str, now: Timestamp) -> Result<Outcome> {
        self.apply(id, Action::OpenForReview, |t| {
            lifecycle::open_for_review(t, actor, now)
        })
    }

    pub fn set_status(
        &self,
        id: Uuid,
        status: Status,
        actor: &str,
        now: Timestamp,
    ) -> Result<Outcome> {
        self.apply(id, Action::SetStatus(status), |t| {
            lifecycle::set_status(t, status, actor, now)
        })
    }

    pub fn resolve(&self, id: Uuid, message: &str, actor: &str, now: Timestamp) -> Result<Outcome> {
        self.apply(id, Action::Resolve, |t| {
            lifecycle::resolve(t, message, actor, now)
        })
    }

    pub fn add_note(&self, id: Uuid, message: &str, actor: &str, now: Timestamp) -> Result<Outcome> {
        self.apply(id, Action::AddNote, |t| {
            lifecycle::add_note(t, message, actor, now)
        })
    }

    pub fn set_priority(&self, id: Uuid, priority: Priority, actor: &str) -> Result<Outcome> {
        self.apply(id, Action::SetPriority, |t| {
            lifecycle::set_priority(t, priority, actor)
        })
    }

    fn apply<F>(&self, id: Uuid, action: Action, op: F) -> Result<Outcome>
    where
        F: FnOnce(&Ticket) -> core::result::Result<Transition, LifecycleError>,
    {
        let snapshot = self.find(id)?;
        let transition = op(&snapshot)?;
        if transition.is_noop() {
            debug!(ticket = %id, %action, status = %snapshot.status, "no change");
            return Ok(Outcome::unchanged(snapshot));
        }

        let mutation = Mutation::between(&snapshot, &transition.ticket);
        let ticket = self
            .store
            .conditional_update(id, snapshot.status, &mutation)
            .inspect_err(|e| {
                if let StorageError::Conflict { actual, .. } = e {
                    warn!(ticket = %id, %action, expected = %snapshot.status, %actual, "concurrent update rejected");
                }
            })?;
        info!(ticket = %id, %action, from = %snapshot.status, to = %ticket.status, "ticket updated");

        let delivery = match &transition.intent {
            None => Delivery::NotRequired,
            Some(intent) => match self.dispatcher.send(intent) {
                Ok(ack) => Delivery::Sent(ack),
                Err(e) => {
                    warn!(ticket = %id, kind = ?intent.kind(), error = %e, "notification failed; change kept");
                    Delivery::Failed(e)
                }
            },
        };

        Ok(Outcome {
            ticket,
            changed: true,
            intent: transition.intent,
            delivery,
        })
    }
}
