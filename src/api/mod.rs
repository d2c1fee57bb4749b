pub mod comment;
pub mod feedback;
pub mod ticket;

use serde::{Deserialize, Serialize};

pub use self::{comment::Comment, feedback::Feedback, ticket::Ticket};

/// Body of every failed response.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Error {
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
}

impl Error {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            errors: None,
        }
    }
}
