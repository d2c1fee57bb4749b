use time::OffsetDateTime;
use tokio_postgres::{Error, Row};

use super::{ticket, Client};

#[derive(Clone, Debug)]
pub struct Comment {
    pub id: Id,
    pub ticket: ticket::Id,
    pub content: String,
    pub author: Option<String>,
    pub created_at: OffsetDateTime,
}

uuid_id!(Id);

impl From<&Row> for Comment {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            ticket: row.get("ticket_id"),
            content: row.get("content"),
            author: row.get("author"),
            created_at: row.get("created_at"),
        }
    }
}

impl Client {
    pub async fn select_comments(
        &self,
        ticket_ids: &[ticket::Id],
    ) -> Result<Vec<Comment>, Error> {
        const SQL: &str = "\
            SELECT id, ticket_id, content, author, created_at \
            FROM comments \
            WHERE ticket_id IN (SELECT unnest($1::UUID[])) \
            ORDER BY created_at ASC, \
                     id ASC";
        Ok(self
            .0
            .query(SQL, &[&ticket_ids])
            .await?
            .iter()
            .map(Comment::from)
            .collect())
    }

    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO comments (id, ticket_id, content, author, created_at) \
            VALUES ($1, $2, $3, $4, $5)";

        self.0
            .execute(
                SQL,
                &[
                    &comment.id,
                    &comment.ticket,
                    &comment.content,
                    &comment.author,
                    &comment.created_at,
                ],
            )
            .await
            .map(drop)
    }
}
