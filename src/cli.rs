//! CLI interface for Concerns.
//!
//! A thin admin surface over the lifecycle engine. Each subcommand is
//! non-interactive: arguments in, text out. The surface (`--surface`)
//! decides which departments' tickets are visible; the actor (`--as`)
//! is recorded on every change.
//!
//! Ticket arguments take a full UUID or an unambiguous prefix.

mod format;

use clap::{Parser, Subcommand, ValueEnum};
use jiff::{Timestamp, civil::Date, tz::TimeZone};
use uuid::Uuid;

use concerns::config::Config;
use concerns::desk::{Desk, DeskError, Outcome};
use concerns::identity::resolve_actor;
use concerns::model::{Priority, Rating, Status, Submission, SubmissionType, Submitter, Ticket};
use concerns::notify::OutboxDispatcher;
use concerns::storage::{Storage, TicketFilter};

use format::{format_change, format_detail, format_outbox_entry, format_row};

/// Concerns: track assistance requests and feedback across departments.
#[derive(Debug, Parser)]
#[command(name = "concerns", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    /// Admin surface to act from: `admin`, `merchant`, `motorpool`,
    /// or any surface defined in the config file.
    #[arg(long, global = true, default_value = "admin")]
    surface: String,

    /// Who is acting. Falls back to `CONCERNS_ACTOR`, then `default-actor`.
    #[arg(long = "as", global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow: handling a concern
  1. concerns --surface motorpool list --status pending
  2. concerns --surface motorpool --as jdelacruz show a3b
     → first view moves the ticket to in_progress
  3. concerns --as jdelacruz note a3b "Called the dispatcher"
  4. concerns --as jdelacruz resolve a3b "Fixed the shuttle schedule"

Every change queues one notification to the submitter in the outbox:
  concerns outbox"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Record a new ticket as its submitter would.
    Submit {
        #[command(subcommand)]
        kind: SubmitKind,
    },

    /// List tickets visible from this surface, newest first.
    List {
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        #[arg(long = "type", value_enum)]
        kind: Option<KindArg>,

        /// Case-insensitive text to look for.
        #[arg(long)]
        search: Option<String>,

        /// Only tickets submitted on or after this date (YYYY-MM-DD).
        #[arg(long)]
        since: Option<String>,

        /// Only tickets submitted on or before this date (YYYY-MM-DD).
        #[arg(long)]
        until: Option<String>,
    },

    /// Show a ticket. Opening a pending ticket marks it in progress.
    Show { ticket: String },

    /// Move a ticket to in-progress or close it.
    Status {
        ticket: String,

        #[arg(value_enum)]
        status: SetStatusArg,
    },

    /// Resolve a ticket. The message is sent to the submitter.
    Resolve { ticket: String, message: String },

    /// Add a note to a ticket's audit trail.
    Note { ticket: String, message: String },

    /// Change a ticket's priority.
    Priority {
        ticket: String,

        #[arg(value_enum)]
        level: PriorityArg,
    },

    /// List notifications waiting in the outbox.
    Outbox,
}

#[derive(Debug, Subcommand)]
pub enum SubmitKind {
    /// A request for help.
    Assistance {
        #[command(flatten)]
        details: SubmitArgs,

        #[arg(long, value_enum, default_value = "low")]
        priority: PriorityArg,
    },

    /// A rated comment.
    Feedback {
        #[command(flatten)]
        details: SubmitArgs,

        /// Score from 1 to 5.
        #[arg(long)]
        rating: u8,
    },
}

#[derive(Debug, clap::Args)]
pub struct SubmitArgs {
    /// Office the ticket is reported to, e.g. "Merchant Office".
    #[arg(long)]
    department: String,

    #[arg(long, default_value = "general")]
    category: String,

    /// Submitter's name.
    #[arg(long)]
    name: String,

    /// Submitter's email; notifications go here.
    #[arg(long)]
    email: String,

    subject: String,

    #[arg(long, default_value = "")]
    body: String,
}

impl SubmitArgs {
    fn into_submission(self) -> Submission {
        Submission {
            department: self.department,
            category: self.category,
            submitted_by: Submitter {
                name: self.name,
                email: self.email,
            },
            subject: self.subject,
            body: self.body,
        }
    }
}

/// CLI-facing status, mapped to the domain `Status`.
#[derive(Debug, Clone, ValueEnum)]
pub enum StatusArg {
    Pending,
    InProgress,
    Resolved,
    Closed,
}

impl StatusArg {
    fn to_domain(&self) -> Status {
        match self {
            Self::Pending => Status::Pending,
            Self::InProgress => Status::InProgress,
            Self::Resolved => Status::Resolved,
            Self::Closed => Status::Closed,
        }
    }
}

/// Statuses an admin may set directly. Resolving has its own command.
#[derive(Debug, Clone, ValueEnum)]
pub enum SetStatusArg {
    InProgress,
    Closed,
}

impl SetStatusArg {
    fn to_domain(&self) -> Status {
        match self {
            Self::InProgress => Status::InProgress,
            Self::Closed => Status::Closed,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum KindArg {
    Assistance,
    Feedback,
}

impl KindArg {
    fn to_domain(&self) -> SubmissionType {
        match self {
            Self::Assistance => SubmissionType::Assistance,
            Self::Feedback => SubmissionType::Feedback,
        }
    }
}

#[derive(Debug, Clone, ValueEnum)]
pub enum PriorityArg {
    Low,
    Medium,
    High,
    Urgent,
}

impl PriorityArg {
    fn to_domain(&self) -> Priority {
        match self {
            Self::Low => Priority::Low,
            Self::Medium => Priority::Medium,
            Self::High => Priority::High,
            Self::Urgent => Priority::Urgent,
        }
    }
}

type AdminDesk<'a> = Desk<'a, Storage, OutboxDispatcher>;

/// Run the CLI, returning an error message on failure.
pub fn run(config: &Config, storage: &Storage, outbox: &OutboxDispatcher) -> Result<(), String> {
    let cli = Cli::parse();
    let scope = config.surface(&cli.surface)?;
    let desk = Desk::new(storage, outbox, scope);
    let now = Timestamp::now();
    let actor = || resolve_actor(cli.actor.as_deref(), config);

    match cli.command {
        Command::Submit { kind } => cmd_submit(storage, kind, now),
        Command::List {
            status,
            kind,
            search,
            since,
            until,
        } => {
            let filter = TicketFilter {
                status: status.as_ref().map(StatusArg::to_domain),
                submission_type: kind.as_ref().map(KindArg::to_domain),
                search_text: search,
                submitted_after: since.as_deref().map(start_of_day).transpose()?,
                submitted_before: until.as_deref().map(end_of_day).transpose()?,
                ..TicketFilter::default()
            };
            cmd_list(&desk, &filter, now)
        }
        Command::Show { ref ticket } => {
            let id = resolve_ticket(&desk, ticket)?;
            let outcome = desk.open(id, &actor()?, now).map_err(describe_error)?;
            report(&outcome);
            println!("{}", format_detail(&outcome.ticket, now));
            Ok(())
        }
        Command::Status {
            ref ticket,
            ref status,
        } => {
            let id = resolve_ticket(&desk, ticket)?;
            let outcome = desk
                .set_status(id, status.to_domain(), &actor()?, now)
                .map_err(describe_error)?;
            report(&outcome);
            Ok(())
        }
        Command::Resolve {
            ref ticket,
            ref message,
        } => {
            let id = resolve_ticket(&desk, ticket)?;
            let outcome = desk
                .resolve(id, message, &actor()?, now)
                .map_err(describe_error)?;
            report(&outcome);
            Ok(())
        }
        Command::Note {
            ref ticket,
            ref message,
        } => {
            let id = resolve_ticket(&desk, ticket)?;
            let outcome = desk
                .add_note(id, message, &actor()?, now)
                .map_err(describe_error)?;
            report(&outcome);
            Ok(())
        }
        Command::Priority {
            ref ticket,
            ref level,
        } => {
            let id = resolve_ticket(&desk, ticket)?;
            let outcome = desk
                .set_priority(id, level.to_domain(), &actor()?)
                .map_err(describe_error)?;
            report(&outcome);
            Ok(())
        }
        Command::Outbox => cmd_outbox(outbox),
    }
}

fn cmd_submit(storage: &Storage, kind: SubmitKind, now: Timestamp) -> Result<(), String> {
    let ticket = match kind {
        SubmitKind::Assistance { details, priority } => {
            Ticket::new_assistance(details.into_submission(), priority.to_domain(), now)
        }
        SubmitKind::Feedback { details, rating } => {
            let rating = Rating::try_from(rating)?;
            Ticket::new_feedback(details.into_submission(), rating, now)
        }
    };

    storage
        .create_ticket(&ticket)
        .map_err(|e| format!("failed to create ticket: {e}"))?;

    println!("{}", ticket.id);
    Ok(())
}

fn cmd_list(desk: &AdminDesk<'_>, filter: &TicketFilter, now: Timestamp) -> Result<(), String> {
    let tickets = desk.list(filter).map_err(describe_error)?;

    if tickets.is_empty() {
        println!("No tickets");
        return Ok(());
    }

    for ticket in &tickets {
        println!("{}", format_row(ticket, now));
    }

    Ok(())
}

fn cmd_outbox(outbox: &OutboxDispatcher) -> Result<(), String> {
    let entries = outbox
        .load()
        .map_err(|e| format!("failed to read {}: {e}", outbox.path().display()))?;

    if entries.is_empty() {
        println!("Outbox is empty");
        return Ok(());
    }

    for entry in &entries {
        println!("{}", format_outbox_entry(entry));
    }

    Ok(())
}

/// Print what changed, and any delivery warning, to stderr.
fn report(outcome: &Outcome) {
    if outcome.changed {
        eprintln!("{}", format_change(outcome));
    }
    if let Some(warning) = outcome.warning() {
        eprintln!("Warning: {warning}");
    }
}

fn describe_error(e: DeskError) -> String {
    if e.is_conflict() {
        format!("{e}\nSomeone else changed this ticket; run the command again to act on its current state.")
    } else {
        e.to_string()
    }
}

/// Resolve a ticket reference (full UUID or unambiguous prefix) to an id.
fn resolve_ticket(desk: &AdminDesk<'_>, reference: &str) -> Result<Uuid, String> {
    // Try full UUID first.
    if let Ok(id) = reference.parse::<Uuid>() {
        return Ok(id);
    }

    // Try as a prefix match against every ticket this surface can see.
    let tickets = desk
        .list(&TicketFilter::default())
        .map_err(|e| format!("failed to list tickets: {e}"))?;

    let matches: Vec<&Ticket> = tickets
        .iter()
        .filter(|t| t.id.to_string().starts_with(reference))
        .collect();

    match matches.as_slice() {
        [] => Err(format!("no ticket matching '{reference}'")),
        [ticket] => Ok(ticket.id),
        _ => {
            let ids: Vec<String> = matches.iter().map(|t| t.short_id()).collect();
            Err(format!(
                "'{reference}' is ambiguous; it matches {} tickets: {}",
                matches.len(),
                ids.join(", ")
            ))
        }
    }
}

fn parse_date(s: &str) -> Result<Date, String> {
    s.parse::<Date>()
        .map_err(|e| format!("invalid date '{s}' (expected YYYY-MM-DD): {e}"))
}

/// Midnight at the start of the given local date.
fn start_of_day(s: &str) -> Result<Timestamp, String> {
    midnight(parse_date(s)?)
}

/// Midnight after the given local date, so the whole day is included.
fn end_of_day(s: &str) -> Result<Timestamp, String> {
    let next = parse_date(s)?
        .tomorrow()
        .map_err(|e| format!("date out of range: {e}"))?;
    midnight(next)
}

fn midnight(date: Date) -> Result<Timestamp, String> {
    date.to_zoned(TimeZone::system())
        .map(|z| z.timestamp())
        .map_err(|e| format!("cannot place {date} in the local time zone: {e}"))
}
