use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path, State},
    http::{request, StatusCode},
    response::{IntoResponse as _, Response},
    Json,
};
use axum_extra::extract::WithRejection;
use serde::Deserialize;

use super::{auth::Principal, error::Violations, Error, SharedAppState};
use crate::{api, service};

type Body<T> = WithRejection<Json<T>, Error>;

/// The `:id` path segment, echoed back when it is not a ticket id.
pub struct TicketPath(api::ticket::Id);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for TicketPath {
    type Rejection = Error;

    async fn from_request_parts(
        parts: &mut request::Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Path(raw) =
            Path::<String>::from_request_parts(parts, state).await?;
        raw.parse().map(Self).map_err(|_| Error::InvalidId(raw))
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketInput {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    priority: Option<api::ticket::Priority>,
}

impl CreateTicketInput {
    fn validate(self) -> Result<service::NewTicket, Error> {
        let mut v = Violations::default();
        let title = v.not_blank("title", "Title is mandatory", self.title);
        let description = v.not_blank(
            "description",
            "Description is mandatory",
            self.description,
        );
        let priority =
            v.required("priority", "Priority is mandatory", self.priority);
        v.check(|| {
            Some(service::NewTicket {
                title: title?,
                description: description?,
                category: self.category,
                priority: priority?,
            })
        })
    }
}

pub async fn create_ticket(
    State(state): State<SharedAppState>,
    _: Principal,
    WithRejection(Json(input), _): Body<CreateTicketInput>,
) -> Result<(StatusCode, Json<api::Ticket>), Error> {
    let new = input.validate()?;
    let details = state
        .tickets
        .create(new)
        .await
        .map_err(Error::during("creating ticket"))?;
    Ok((StatusCode::CREATED, Json(details.into())))
}

pub async fn get_ticket(
    State(state): State<SharedAppState>,
    _: Principal,
    TicketPath(id): TicketPath,
) -> Result<Json<api::Ticket>, Error> {
    let details = state
        .tickets
        .get(id)
        .await
        .map_err(Error::during("retrieving ticket"))?;
    Ok(Json(details.into()))
}

pub async fn list_tickets(
    State(state): State<SharedAppState>,
    _: Principal,
) -> Result<Response, Error> {
    let tickets = state
        .tickets
        .list()
        .await
        .map_err(Error::during("retrieving tickets"))?;
    if tickets.is_empty() {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }
    let tickets = tickets.into_iter().map(api::Ticket::from).collect::<Vec<_>>();
    Ok(Json(tickets).into_response())
}

pub async fn delete_ticket(
    State(state): State<SharedAppState>,
    _: Principal,
    TicketPath(id): TicketPath,
) -> Result<&'static str, Error> {
    state
        .tickets
        .delete(id)
        .await
        .map_err(Error::during("deleting ticket"))?;
    Ok("Ticket deleted successfully")
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTicketInput {
    title: Option<String>,
    description: Option<String>,
    priority: Option<api::ticket::Priority>,
    category: Option<String>,
}

impl UpdateTicketInput {
    fn validate(self) -> Result<service::TicketChanges, Error> {
        let mut v = Violations::default();
        if self.title.as_deref().is_some_and(|t| t.trim().is_empty()) {
            v.push("title", "Title must not be blank");
        }
        if self
            .description
            .as_deref()
            .is_some_and(|d| d.trim().is_empty())
        {
            v.push("description", "Description must not be blank");
        }
        v.check(|| {
            Some(service::TicketChanges {
                title: self.title,
                description: self.description,
                priority: self.priority,
                category: self.category,
            })
        })
    }
}

pub async fn update_ticket(
    State(state): State<SharedAppState>,
    _: Principal,
    TicketPath(id): TicketPath,
    WithRejection(Json(input), _): Body<UpdateTicketInput>,
) -> Result<Json<api::Ticket>, Error> {
    let changes = input.validate()?;
    let details = state
        .tickets
        .update(id, changes)
        .await
        .map_err(Error::during("updating ticket"))?;
    Ok(Json(details.into()))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignTicketInput {
    assigned_agent_id: Option<api::ticket::AgentId>,
}

/// A missing agent id is reported by the service, after the ticket lookup.
pub async fn assign_ticket(
    State(state): State<SharedAppState>,
    _: Principal,
    TicketPath(id): TicketPath,
    WithRejection(Json(input), _): Body<AssignTicketInput>,
) -> Result<Json<api::Ticket>, Error> {
    let details = state
        .tickets
        .assign(id, input.assigned_agent_id)
        .await
        .map_err(Error::during("assigning ticket"))?;
    Ok(Json(details.into()))
}

#[derive(Deserialize)]
pub struct AddCommentInput {
    content: Option<String>,
    author: Option<String>,
}

pub async fn add_comment(
    State(state): State<SharedAppState>,
    _: Principal,
    TicketPath(id): TicketPath,
    WithRejection(Json(input), _): Body<AddCommentInput>,
) -> Result<(StatusCode, Json<api::Comment>), Error> {
    let mut v = Violations::default();
    let content = v.not_blank("content", "Content is mandatory", input.content);
    let content = v.check(|| content)?;

    let comment = state
        .tickets
        .add_comment(id, content, input.author)
        .await
        .map_err(Error::during("adding comment"))?;
    Ok((StatusCode::CREATED, Json(comment.into())))
}

pub async fn escalate_ticket(
    State(state): State<SharedAppState>,
    _: Principal,
    TicketPath(id): TicketPath,
) -> Result<Json<api::Ticket>, Error> {
    let details = state
        .tickets
        .escalate_priority(id)
        .await
        .map_err(Error::during("escalating ticket"))?;
    Ok(Json(details.into()))
}

#[derive(Deserialize)]
pub struct UpdateStatusInput {
    status: Option<api::ticket::Status>,
}

pub async fn update_status(
    State(state): State<SharedAppState>,
    _: Principal,
    TicketPath(id): TicketPath,
    WithRejection(Json(input), _): Body<UpdateStatusInput>,
) -> Result<Json<api::Ticket>, Error> {
    let mut v = Violations::default();
    let status = v.required("status", "Status is mandatory", input.status);
    let status = v.check(|| status)?;

    let details = state
        .tickets
        .update_status(id, status)
        .await
        .map_err(Error::during("updating ticket status"))?;
    Ok(Json(details.into()))
}

#[derive(Deserialize)]
pub struct SubmitFeedbackInput {
    rating: Option<i64>,
    comments: Option<String>,
}

pub async fn submit_feedback(
    State(state): State<SharedAppState>,
    _: Principal,
    TicketPath(id): TicketPath,
    WithRejection(Json(input), _): Body<SubmitFeedbackInput>,
) -> Result<(StatusCode, Json<api::Feedback>), Error> {
    let mut v = Violations::default();
    let rating = v
        .required("rating", "Rating is mandatory", input.rating)
        .and_then(|r| {
            let rating = api::feedback::Rating::new(r);
            if rating.is_none() {
                v.push("rating", "Rating must be between 1 and 5");
            }
            rating
        });
    let rating = v.check(|| rating)?;

    let feedback = state
        .tickets
        .submit_feedback(id, rating, input.comments)
        .await
        .map_err(Error::during("submitting feedback"))?;
    Ok((StatusCode::CREATED, Json(feedback.into())))
}
