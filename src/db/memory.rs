use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use super::{ticket, Comment, Error, Feedback, Store, Ticket};

/// [`Store`] keeping everything in process memory.
///
/// Mirrors the constraints of the PostgreSQL schema: children need an
/// existing ticket, a ticket has at most one feedback, and deleting a ticket
/// deletes its children.
#[derive(Default)]
pub struct Memory {
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    tickets: HashMap<ticket::Id, Ticket>,
    comments: HashMap<ticket::Id, Vec<Comment>>,
    feedback: HashMap<ticket::Id, Feedback>,
}

#[async_trait]
impl Store for Memory {
    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error> {
        Ok(self.state.lock().await.tickets.get(&id).cloned())
    }

    async fn get_tickets(&self) -> Result<Vec<Ticket>, Error> {
        let mut tickets = self
            .state
            .lock()
            .await
            .tickets
            .values()
            .cloned()
            .collect::<Vec<_>>();
        tickets.sort_by_key(|t| (t.created_at, t.id));
        Ok(tickets)
    }

    async fn add_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        self.state
            .lock()
            .await
            .tickets
            .insert(ticket.id, ticket.clone());
        Ok(())
    }

    async fn replace_ticket(&self, ticket: &Ticket) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        let Some(stored) = state.tickets.get_mut(&ticket.id) else {
            return Ok(false);
        };
        *stored = ticket.clone();
        Ok(true)
    }

    async fn delete_ticket(&self, id: ticket::Id) -> Result<bool, Error> {
        let mut state = self.state.lock().await;
        if state.tickets.remove(&id).is_none() {
            return Ok(false);
        }
        state.comments.remove(&id);
        state.feedback.remove(&id);
        Ok(true)
    }

    async fn get_comments_by_ticket_ids(
        &self,
        ticket_ids: &[ticket::Id],
    ) -> Result<Vec<Comment>, Error> {
        // Comments are appended in creation order.
        let state = self.state.lock().await;
        Ok(ticket_ids
            .iter()
            .filter_map(|id| state.comments.get(id))
            .flatten()
            .cloned()
            .collect())
    }

    async fn add_comment(&self, comment: &Comment) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if !state.tickets.contains_key(&comment.ticket) {
            return Err(Error::ForeignKeyViolation);
        }
        state
            .comments
            .entry(comment.ticket)
            .or_default()
            .push(comment.clone());
        Ok(())
    }

    async fn get_feedback_by_ticket_ids(
        &self,
        ticket_ids: &[ticket::Id],
    ) -> Result<Vec<Feedback>, Error> {
        let state = self.state.lock().await;
        Ok(ticket_ids
            .iter()
            .filter_map(|id| state.feedback.get(id))
            .cloned()
            .collect())
    }

    async fn add_feedback(&self, feedback: &Feedback) -> Result<(), Error> {
        let mut state = self.state.lock().await;
        if !state.tickets.contains_key(&feedback.ticket) {
            return Err(Error::ForeignKeyViolation);
        }
        if state.feedback.contains_key(&feedback.ticket) {
            return Err(Error::UniqueViolation);
        }
        state.feedback.insert(feedback.ticket, feedback.clone());
        Ok(())
    }
}
