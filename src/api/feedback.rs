use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db;

pub use crate::db::feedback::{Id, Rating};

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub id: Id,
    pub rating: Rating,
    pub comments: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub submitted_at: OffsetDateTime,
}

impl From<db::Feedback> for Feedback {
    fn from(feedback: db::Feedback) -> Self {
        Self {
            id: feedback.id,
            rating: feedback.rating,
            comments: feedback.comments,
            submitted_at: feedback.submitted_at,
        }
    }
}
