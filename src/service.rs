//! Ticket lifecycle rules.
//!
//! Status moves `OPEN -> IN_PROGRESS -> CLOSED`. A closed ticket keeps its
//! status forever and is the only kind of ticket accepting feedback.

use std::{collections::HashMap, sync::Arc};

use derive_more::{Display, Error as StdError, From};
use itertools::Itertools as _;
use time::OffsetDateTime;

use crate::db::{
    self,
    comment,
    feedback::{self, Rating},
    ticket::{self, AgentId, Priority, Status},
    Comment, Feedback, Store, Ticket,
};

const DEFAULT_CATEGORY: &str = "unknown";

#[derive(Clone)]
pub struct Tickets {
    store: Arc<dyn Store>,
}

/// Ticket together with everything it owns.
#[derive(Clone, Debug)]
pub struct Details {
    pub ticket: Ticket,
    pub comments: Vec<Comment>,
    pub feedback: Option<Feedback>,
}

pub struct NewTicket {
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub priority: Priority,
}

/// Fields left as `None` stay untouched.
#[derive(Default)]
pub struct TicketChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
}

#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[display("store failure: {_0}")]
    #[from]
    Store(db::Error),
    #[display("Ticket not found with id: {_0}")]
    TicketNotFound(#[error(not(source))] ticket::Id),
    #[display("Closed tickets cannot be modified")]
    TicketClosed,
    #[display("Feedback only allowed on closed tickets")]
    TicketNotClosed,
    #[display("Feedback already submitted for this ticket")]
    FeedbackAlreadySubmitted,
    #[display("Agent ID is required")]
    AgentRequired,
}

impl Tickets {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn create(&self, new: NewTicket) -> Result<Details, Error> {
        let category = new
            .category
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_owned());

        let ticket = Ticket {
            id: ticket::Id::new(),
            title: new.title,
            description: new.description,
            category,
            priority: new.priority,
            status: Status::Open,
            assigned_agent: None,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store.add_ticket(&ticket).await?;

        tracing::info!(ticket.id = %ticket.id, "ticket created");

        Ok(Details {
            ticket,
            comments: Vec::new(),
            feedback: None,
        })
    }

    pub async fn get(&self, id: ticket::Id) -> Result<Details, Error> {
        let ticket = self.find(id).await?;
        self.details(ticket).await
    }

    /// All tickets, oldest first, with their comments and feedback.
    pub async fn list(&self) -> Result<Vec<Details>, Error> {
        let tickets = self.store.get_tickets().await?;
        if tickets.is_empty() {
            return Ok(Vec::new());
        }

        let ids = tickets.iter().map(|t| t.id).collect::<Vec<_>>();
        let (comments, feedback) = futures::try_join!(
            self.store.get_comments_by_ticket_ids(&ids),
            self.store.get_feedback_by_ticket_ids(&ids),
        )?;
        let mut comments = comments.into_iter().into_group_map_by(|c| c.ticket);
        let mut feedback = feedback
            .into_iter()
            .map(|f| (f.ticket, f))
            .collect::<HashMap<_, _>>();

        Ok(tickets
            .into_iter()
            .map(|ticket| Details {
                comments: comments.remove(&ticket.id).unwrap_or_default(),
                feedback: feedback.remove(&ticket.id),
                ticket,
            })
            .collect())
    }

    /// Applies the supplied fields whatever the ticket status is.
    pub async fn update(
        &self,
        id: ticket::Id,
        changes: TicketChanges,
    ) -> Result<Details, Error> {
        let mut ticket = self.find(id).await?;

        if let Some(title) = changes.title {
            ticket.title = title;
        }
        if let Some(description) = changes.description {
            ticket.description = description;
        }
        if let Some(priority) = changes.priority {
            ticket.priority = priority;
        }
        if let Some(category) = changes.category {
            ticket.category = category;
        }
        self.save(&ticket).await?;

        tracing::info!(ticket.id = %id, "ticket updated");

        self.details(ticket).await
    }

    pub async fn assign(
        &self,
        id: ticket::Id,
        agent: Option<AgentId>,
    ) -> Result<Details, Error> {
        let mut ticket = self.find(id).await?;
        let agent = agent.ok_or(Error::AgentRequired)?;

        ticket.assigned_agent = Some(agent);
        ticket.status = Status::InProgress;
        self.save(&ticket).await?;

        tracing::info!(ticket.id = %id, agent.id = %agent, "ticket assigned");

        self.details(ticket).await
    }

    pub async fn delete(&self, id: ticket::Id) -> Result<(), Error> {
        if !self.store.delete_ticket(id).await? {
            return Err(Error::TicketNotFound(id));
        }

        tracing::info!(ticket.id = %id, "ticket deleted");

        Ok(())
    }

    pub async fn add_comment(
        &self,
        id: ticket::Id,
        content: String,
        author: Option<String>,
    ) -> Result<Comment, Error> {
        let ticket = self.find(id).await?;

        let comment = Comment {
            id: comment::Id::new(),
            ticket: ticket.id,
            content,
            author,
            created_at: OffsetDateTime::now_utc(),
        };
        self.store
            .add_comment(&comment)
            .await
            .map_err(|e| Self::child_write_error(id, e))?;

        tracing::info!(
            ticket.id = %id,
            comment.id = %comment.id,
            "comment added"
        );

        Ok(comment)
    }

    /// Raises the priority by one level. Already urgent tickets stay as they
    /// are.
    pub async fn escalate_priority(
        &self,
        id: ticket::Id,
    ) -> Result<Details, Error> {
        let mut ticket = self.find(id).await?;

        let previous = ticket.priority;
        ticket.priority = previous.escalated();
        self.save(&ticket).await?;

        tracing::info!(
            ticket.id = %id,
            from = ?previous,
            to = ?ticket.priority,
            "ticket escalated"
        );

        self.details(ticket).await
    }

    pub async fn update_status(
        &self,
        id: ticket::Id,
        status: Status,
    ) -> Result<Details, Error> {
        let mut ticket = self.find(id).await?;
        if ticket.status == Status::Closed {
            return Err(Error::TicketClosed);
        }

        ticket.status = status;
        self.save(&ticket).await?;

        tracing::info!(ticket.id = %id, status = ?status, "status changed");

        self.details(ticket).await
    }

    /// Uniqueness of feedback is left to the store.
    pub async fn submit_feedback(
        &self,
        id: ticket::Id,
        rating: Rating,
        comments: Option<String>,
    ) -> Result<Feedback, Error> {
        let ticket = self.find(id).await?;
        if ticket.status != Status::Closed {
            return Err(Error::TicketNotClosed);
        }

        let feedback = Feedback {
            id: feedback::Id::new(),
            ticket: ticket.id,
            rating,
            comments,
            submitted_at: OffsetDateTime::now_utc(),
        };
        self.store
            .add_feedback(&feedback)
            .await
            .map_err(|e| Self::child_write_error(id, e))?;

        tracing::info!(
            ticket.id = %id,
            rating = %rating,
            "feedback submitted"
        );

        Ok(feedback)
    }

    /// Fails instead of resurrecting a ticket deleted after it had been read.
    async fn save(&self, ticket: &Ticket) -> Result<(), Error> {
        if !self.store.replace_ticket(ticket).await? {
            return Err(Error::TicketNotFound(ticket.id));
        }
        Ok(())
    }

    async fn find(&self, id: ticket::Id) -> Result<Ticket, Error> {
        self.store
            .get_ticket_by_id(id)
            .await?
            .ok_or(Error::TicketNotFound(id))
    }

    async fn details(&self, ticket: Ticket) -> Result<Details, Error> {
        let ids = [ticket.id];
        let (comments, feedback) = futures::try_join!(
            self.store.get_comments_by_ticket_ids(&ids),
            self.store.get_feedback_by_ticket_ids(&ids),
        )?;
        Ok(Details {
            ticket,
            comments,
            feedback: feedback.into_iter().next(),
        })
    }

    fn child_write_error(id: ticket::Id, e: db::Error) -> Error {
        match e {
            // The ticket was deleted after it had been read.
            db::Error::ForeignKeyViolation => Error::TicketNotFound(id),
            db::Error::UniqueViolation => Error::FeedbackAlreadySubmitted,
            e => Error::Store(e),
        }
    }
}
