use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{api, service};

pub use crate::db::ticket::{AgentId, Id, Priority, Status};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub status: Status,
    pub assigned_agent_id: Option<AgentId>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    pub comments: Vec<api::Comment>,
    pub feedback: Option<api::Feedback>,
}

impl From<service::Details> for Ticket {
    fn from(details: service::Details) -> Self {
        let service::Details {
            ticket,
            comments,
            feedback,
        } = details;
        Self {
            id: ticket.id,
            title: ticket.title,
            description: ticket.description,
            category: ticket.category,
            priority: ticket.priority,
            status: ticket.status,
            assigned_agent_id: ticket.assigned_agent,
            created_at: ticket.created_at,
            comments: comments.into_iter().map(api::Comment::from).collect(),
            feedback: feedback.map(api::Feedback::from),
        }
    }
}
