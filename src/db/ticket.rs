use std::error::Error as StdError;

use derive_more::{Display, From};
use enum_utils::TryFromRepr;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Error, Row,
};

use super::Client;

#[derive(Clone, Debug)]
pub struct Ticket {
    pub id: Id,
    pub title: String,
    pub description: String,
    pub category: String,
    pub priority: Priority,
    pub status: Status,
    pub assigned_agent: Option<AgentId>,
    pub created_at: OffsetDateTime,
}

uuid_id!(Id);

/// Identifier of a support agent, owned by an external directory.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    From,
    Hash,
    PartialEq,
    Serialize,
)]
pub struct AgentId(i64);

impl FromSql<'_> for AgentId {
    accepts!(INT8);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        i64::from_sql(ty, raw).map(Self)
    }
}

impl ToSql for AgentId {
    accepts!(INT8);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        self.0.to_sql(ty, out)
    }
}

#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
    TryFromRepr,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Priority {
    Low = 1,
    Medium = 2,
    High = 3,
    Urgent = 4,
}

impl Priority {
    /// Next priority level, or the same one if it is already the highest.
    pub fn escalated(self) -> Self {
        Self::try_from(self as u8 + 1).unwrap_or(self)
    }
}

impl FromSql<'_> for Priority {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let priority = Self::try_from(repr).map_err(|_| "invalid priority")?;
        Ok(priority)
    }
}

impl ToSql for Priority {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from((*self) as u8);
        repr.to_sql(ty, out)
    }
}

#[derive(
    Clone, Copy, Debug, Deserialize, Eq, TryFromRepr, PartialEq, Serialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum Status {
    /// Nobody works on the ticket yet.
    Open = 1,

    /// An agent is assigned and works on the ticket.
    InProgress = 2,

    /// Work is finished. The status is final and feedback may be left.
    Closed = 3,
}

impl FromSql<'_> for Status {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let repr = u8::try_from(repr)?;
        let status = Self::try_from(repr).map_err(|_| "invalid status")?;
        Ok(status)
    }
}

impl ToSql for Status {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from((*self) as u8);
        repr.to_sql(ty, out)
    }
}

impl From<&Row> for Ticket {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            title: row.get("title"),
            description: row.get("description"),
            category: row.get("category"),
            priority: row.get("priority"),
            status: row.get("status"),
            assigned_agent: row.get("assigned_agent_id"),
            created_at: row.get("created_at"),
        }
    }
}

impl Client {
    pub async fn select_ticket(
        &self,
        id: Id,
    ) -> Result<Option<Ticket>, Error> {
        const SQL: &str = "\
            SELECT id, title, description, category, \
                   priority, status, assigned_agent_id, \
                   created_at \
            FROM tickets \
            WHERE id = $1";
        Ok(self.0.query_opt(SQL, &[&id]).await?.as_ref().map(Ticket::from))
    }

    pub async fn select_tickets(&self) -> Result<Vec<Ticket>, Error> {
        const SQL: &str = "\
            SELECT id, title, description, category, \
                   priority, status, assigned_agent_id, \
                   created_at \
            FROM tickets \
            ORDER BY created_at ASC, \
                     id ASC";
        Ok(self.0.query(SQL, &[]).await?.iter().map(Ticket::from).collect())
    }

    pub async fn insert_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO tickets (id, title, description, category, \
                                 priority, status, assigned_agent_id, \
                                 created_at) \
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)";

        self.0
            .execute(
                SQL,
                &[
                    &ticket.id,
                    &ticket.title,
                    &ticket.description,
                    &ticket.category,
                    &ticket.priority,
                    &ticket.status,
                    &ticket.assigned_agent,
                    &ticket.created_at,
                ],
            )
            .await
            .map(drop)
    }

    /// Returns `false` if the ticket no longer exists.
    pub async fn update_ticket(&self, ticket: &Ticket) -> Result<bool, Error> {
        const SQL: &str = "\
            UPDATE tickets \
            SET title = $2, \
                description = $3, \
                category = $4, \
                priority = $5, \
                status = $6, \
                assigned_agent_id = $7 \
            WHERE id = $1";

        let updated = self
            .0
            .execute(
                SQL,
                &[
                    &ticket.id,
                    &ticket.title,
                    &ticket.description,
                    &ticket.category,
                    &ticket.priority,
                    &ticket.status,
                    &ticket.assigned_agent,
                ],
            )
            .await?;
        Ok(updated > 0)
    }

    /// Comments and feedback go away through `ON DELETE CASCADE`.
    pub async fn remove_ticket(&self, id: Id) -> Result<bool, Error> {
        const SQL: &str = "DELETE FROM tickets WHERE id = $1";
        Ok(self.0.execute(SQL, &[&id]).await? > 0)
    }
}
