use std::error::Error as StdError;

use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio_postgres::{
    types::{
        accepts, private::BytesMut, to_sql_checked, FromSql, IsNull, ToSql,
        Type,
    },
    Error, Row,
};

use super::{ticket, Client};

#[derive(Clone, Debug)]
pub struct Feedback {
    pub id: Id,
    pub ticket: ticket::Id,
    pub rating: Rating,
    pub comments: Option<String>,
    pub submitted_at: OffsetDateTime,
}

uuid_id!(Id);

/// Satisfaction score from 1 to 5 inclusive.
#[derive(
    Clone,
    Copy,
    Debug,
    Deserialize,
    Display,
    Eq,
    Ord,
    PartialEq,
    PartialOrd,
    Serialize,
)]
#[serde(try_from = "u8")]
pub struct Rating(u8);

impl Rating {
    pub const MIN: u8 = 1;
    pub const MAX: u8 = 5;

    pub fn new(value: i64) -> Option<Self> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<u8> for Rating {
    type Error = &'static str;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value.into()).ok_or("rating must be between 1 and 5")
    }
}

impl FromSql<'_> for Rating {
    accepts!(INT2);

    fn from_sql(
        ty: &Type,
        raw: &[u8],
    ) -> Result<Self, Box<dyn StdError + Sync + Send>> {
        let repr = i16::from_sql(ty, raw)?;
        let rating = Self::new(repr.into()).ok_or("invalid rating")?;
        Ok(rating)
    }
}

impl ToSql for Rating {
    accepts!(INT2);

    to_sql_checked!();

    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn StdError + Sync + Send>> {
        i16::from(self.0).to_sql(ty, out)
    }
}

impl From<&Row> for Feedback {
    fn from(row: &Row) -> Self {
        Self {
            id: row.get("id"),
            ticket: row.get("ticket_id"),
            rating: row.get("rating"),
            comments: row.get("comments"),
            submitted_at: row.get("submitted_at"),
        }
    }
}

impl Client {
    pub async fn select_feedback(
        &self,
        ticket_ids: &[ticket::Id],
    ) -> Result<Vec<Feedback>, Error> {
        const SQL: &str = "\
            SELECT id, ticket_id, rating, comments, submitted_at \
            FROM feedback \
            WHERE ticket_id IN (SELECT unnest($1::UUID[]))";
        Ok(self
            .0
            .query(SQL, &[&ticket_ids])
            .await?
            .iter()
            .map(Feedback::from)
            .collect())
    }

    /// Fails with a unique violation if the ticket already has feedback.
    pub async fn insert_feedback(
        &self,
        feedback: &Feedback,
    ) -> Result<(), Error> {
        const SQL: &str = "\
            INSERT INTO feedback (id, ticket_id, rating, comments, \
                                  submitted_at) \
            VALUES ($1, $2, $3, $4, $5)";

        self.0
            .execute(
                SQL,
                &[
                    &feedback.id,
                    &feedback.ticket,
                    &feedback.rating,
                    &feedback.comments,
                    &feedback.submitted_at,
                ],
            )
            .await
            .map(drop)
    }
}
