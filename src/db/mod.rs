/// Declares a UUID-backed identifier usable as a query parameter.
macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone,
            Copy,
            Debug,
            Default,
            serde::Deserialize,
            derive_more::Display,
            Eq,
            Hash,
            Ord,
            PartialEq,
            PartialOrd,
            serde::Serialize,
        )]
        pub struct $name(uuid::Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(uuid::Uuid::new_v4())
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.parse().map(Self)
            }
        }

        impl From<u128> for $name {
            fn from(value: u128) -> Self {
                Self(uuid::Uuid::from_u128(value))
            }
        }

        impl tokio_postgres::types::FromSql<'_> for $name {
            tokio_postgres::types::accepts!(UUID);

            fn from_sql(
                ty: &tokio_postgres::types::Type,
                raw: &[u8],
            ) -> Result<
                Self,
                Box<dyn std::error::Error + Sync + Send>,
            > {
                <uuid::Uuid as tokio_postgres::types::FromSql>::from_sql(ty, raw)
                    .map(Self)
            }
        }

        impl tokio_postgres::types::ToSql for $name {
            tokio_postgres::types::accepts!(UUID);

            tokio_postgres::types::to_sql_checked!();

            fn to_sql(
                &self,
                ty: &tokio_postgres::types::Type,
                out: &mut tokio_postgres::types::private::BytesMut,
            ) -> Result<
                tokio_postgres::types::IsNull,
                Box<dyn std::error::Error + Sync + Send>,
            > {
                tokio_postgres::types::ToSql::to_sql(&self.0, ty, out)
            }
        }
    };
}

pub mod comment;
pub mod feedback;
pub mod memory;
pub mod ticket;

use async_trait::async_trait;
use derive_more::{Display, Error as StdError, From};
use tokio_postgres::{error::SqlState, tls::NoTlsStream, NoTls, Socket};

use crate::config;

pub use self::{
    comment::Comment, feedback::Feedback, memory::Memory, ticket::Ticket,
};

const SCHEMA: &str = include_str!("schema.sql");

pub type Connection = tokio_postgres::Connection<Socket, NoTlsStream>;

pub async fn connect(
    config: &config::Db,
) -> Result<(Client, Connection), Error> {
    let mut pg_config = config.url.parse::<tokio_postgres::Config>()?;
    pg_config.connect_timeout(config.connect_timeout);
    let (client, connection) = pg_config.connect(NoTls).await?;
    Ok((Client(client), connection))
}

pub struct Client(tokio_postgres::Client);

impl Client {
    /// Creates missing tables. Safe to run on every start.
    pub async fn migrate(&self) -> Result<(), Error> {
        self.0.batch_execute(SCHEMA).await.map_err(Error::from)
    }
}

#[derive(Debug, Display, From, StdError)]
pub enum Error {
    #[display("postgres: {_0}")]
    #[from]
    Postgres(tokio_postgres::Error),
    /// A row referenced a ticket that does not exist.
    #[display("foreign key violation")]
    ForeignKeyViolation,
    /// A one-per-ticket row already exists.
    #[display("unique violation")]
    UniqueViolation,
}

impl Error {
    fn classify(e: tokio_postgres::Error) -> Self {
        match e.code() {
            Some(code) if *code == SqlState::FOREIGN_KEY_VIOLATION => {
                Self::ForeignKeyViolation
            }
            Some(code) if *code == SqlState::UNIQUE_VIOLATION => {
                Self::UniqueViolation
            }
            _ => Self::Postgres(e),
        }
    }
}

/// Ticket persistence used by the lifecycle service.
///
/// Writes of comments and feedback report a missing owner as
/// [`Error::ForeignKeyViolation`], and a second feedback for the same ticket
/// as [`Error::UniqueViolation`].
#[async_trait]
pub trait Store: Send + Sync {
    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error>;

    /// All tickets, oldest first.
    async fn get_tickets(&self) -> Result<Vec<Ticket>, Error>;

    async fn add_ticket(&self, ticket: &Ticket) -> Result<(), Error>;

    /// Overwrites an existing ticket.
    ///
    /// Returns `false` if there was no such ticket, leaving the store as is.
    async fn replace_ticket(&self, ticket: &Ticket) -> Result<bool, Error>;

    /// Removes a ticket together with its comments and feedback.
    ///
    /// Returns `false` if there was no such ticket.
    async fn delete_ticket(&self, id: ticket::Id) -> Result<bool, Error>;

    /// Comments of the given tickets, oldest first.
    async fn get_comments_by_ticket_ids(
        &self,
        ticket_ids: &[ticket::Id],
    ) -> Result<Vec<Comment>, Error>;

    async fn add_comment(&self, comment: &Comment) -> Result<(), Error>;

    async fn get_feedback_by_ticket_ids(
        &self,
        ticket_ids: &[ticket::Id],
    ) -> Result<Vec<Feedback>, Error>;

    async fn add_feedback(&self, feedback: &Feedback) -> Result<(), Error>;
}

#[async_trait]
impl Store for Client {
    async fn get_ticket_by_id(
        &self,
        id: ticket::Id,
    ) -> Result<Option<Ticket>, Error> {
        Ok(self.select_ticket(id).await?)
    }

    async fn get_tickets(&self) -> Result<Vec<Ticket>, Error> {
        Ok(self.select_tickets().await?)
    }

    async fn add_ticket(&self, ticket: &Ticket) -> Result<(), Error> {
        Ok(self.insert_ticket(ticket).await?)
    }

    async fn replace_ticket(&self, ticket: &Ticket) -> Result<bool, Error> {
        Ok(self.update_ticket(ticket).await?)
    }

    async fn delete_ticket(&self, id: ticket::Id) -> Result<bool, Error> {
        Ok(self.remove_ticket(id).await?)
    }

    async fn get_comments_by_ticket_ids(
        &self,
        ticket_ids: &[ticket::Id],
    ) -> Result<Vec<Comment>, Error> {
        Ok(self.select_comments(ticket_ids).await?)
    }

    async fn add_comment(&self, comment: &Comment) -> Result<(), Error> {
        self.insert_comment(comment).await.map_err(Error::classify)
    }

    async fn get_feedback_by_ticket_ids(
        &self,
        ticket_ids: &[ticket::Id],
    ) -> Result<Vec<Feedback>, Error> {
        Ok(self.select_feedback(ticket_ids).await?)
    }

    async fn add_feedback(&self, feedback: &Feedback) -> Result<(), Error> {
        self.insert_feedback(feedback).await.map_err(Error::classify)
    }
}
