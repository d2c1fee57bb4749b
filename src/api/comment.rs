use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::db;

pub use crate::db::comment::Id;

#[derive(Clone, Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: Id,
    pub content: String,
    pub author: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<db::Comment> for Comment {
    fn from(comment: db::Comment) -> Self {
        Self {
            id: comment.id,
            content: comment.content,
            author: comment.author,
            created_at: comment.created_at,
        }
    }
}
