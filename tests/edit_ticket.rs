pub mod common;

use reqwest::StatusCode;
use serde_json::json;
use support_desk::api::{
    self,
    ticket::{AgentId, Priority, Status},
};

#[tokio::test]
async fn updates_given_fields_only() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;

    let ticket = client
        .update_ticket(
            ticket.id,
            json!({ "title": "Ticket 2", "category": "access" }),
        )
        .await
        .unwrap();
    assert_eq!(ticket.title, "Ticket 2");
    assert_eq!(ticket.description, "Description of Ticket 1");
    assert_eq!(ticket.category, "access");
    assert_eq!(ticket.priority, Priority::High);
    assert_eq!(ticket.status, Status::Open);
}

#[tokio::test]
async fn updates_priority() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;

    let ticket = client
        .update_ticket(ticket.id, json!({ "priority": "LOW" }))
        .await
        .unwrap();
    assert_eq!(ticket.priority, Priority::Low);
    assert_eq!(ticket.title, "Ticket 1");
}

#[tokio::test]
async fn updates_closed_ticket() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;
    client.update_status(ticket.id, "CLOSED").await.unwrap();

    let ticket = client
        .update_ticket(ticket.id, json!({ "description": "Follow-up" }))
        .await
        .unwrap();
    assert_eq!(ticket.description, "Follow-up");
    assert_eq!(ticket.status, Status::Closed);
}

#[tokio::test]
async fn cant_blank_title() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;

    let rejected = client
        .update_ticket(ticket.id, json!({ "title": "" }))
        .await
        .unwrap_err();
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        rejected.error.unwrap().errors.unwrap(),
        ["title: Title must not be blank"],
    );
}

#[tokio::test]
async fn cant_update_unknown_ticket() {
    let rejected = common::Client::spawn()
        .await
        .update_ticket(api::ticket::Id::from(1), json!({ "title": "Ticket 2" }))
        .await
        .unwrap_err();
    assert_eq!(rejected.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn assigns_agent() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;

    let ticket = client
        .assign_ticket(ticket.id, json!({ "assignedAgentId": 42 }))
        .await
        .unwrap();
    assert_eq!(ticket.assigned_agent_id, Some(AgentId::from(42)));
    assert_eq!(ticket.status, Status::InProgress);
}

#[tokio::test]
async fn cant_assign_without_agent() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;

    let rejected = client
        .assign_ticket(ticket.id, json!({}))
        .await
        .unwrap_err();
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
    assert_eq!(rejected.error.unwrap().message, "Agent ID is required");

    let ticket = client.get_ticket(ticket.id).await.unwrap();
    assert_eq!(ticket.assigned_agent_id, None);
    assert_eq!(ticket.status, Status::Open);
}

#[tokio::test]
async fn cant_assign_unknown_ticket() {
    let rejected = common::Client::spawn()
        .await
        .assign_ticket(api::ticket::Id::from(1), json!({ "assignedAgentId": 1 }))
        .await
        .unwrap_err();
    assert_eq!(rejected.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn escalates_priority() {
    let client = common::Client::spawn().await;
    let ticket = client
        .create_ticket(json!({
            "title": "Ticket 1",
            "description": "Description 1",
            "priority": "LOW",
        }))
        .await
        .unwrap();

    let ticket = client.escalate_ticket(ticket.id).await.unwrap();
    assert_eq!(ticket.priority, Priority::Medium);
    let ticket = client.escalate_ticket(ticket.id).await.unwrap();
    assert_eq!(ticket.priority, Priority::High);
}

#[tokio::test]
async fn escalation_keeps_urgent() {
    let client = common::Client::spawn().await;
    let ticket = client
        .create_ticket(json!({
            "title": "Ticket 1",
            "description": "Description 1",
            "priority": "URGENT",
        }))
        .await
        .unwrap();

    let escalated = client.escalate_ticket(ticket.id).await.unwrap();
    assert_eq!(escalated.priority, Priority::Urgent);
    assert_eq!(escalated.status, ticket.status);
    assert_eq!(escalated.title, ticket.title);
}

#[tokio::test]
async fn cant_escalate_unknown_ticket() {
    let rejected = common::Client::spawn()
        .await
        .escalate_ticket(api::ticket::Id::from(1))
        .await
        .unwrap_err();
    assert_eq!(rejected.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn changes_status() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;

    let ticket = client.update_status(ticket.id, "IN_PROGRESS").await.unwrap();
    assert_eq!(ticket.status, Status::InProgress);
    let ticket = client.update_status(ticket.id, "CLOSED").await.unwrap();
    assert_eq!(ticket.status, Status::Closed);
}

#[tokio::test]
async fn cant_change_status_when_closed() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;
    client.update_status(ticket.id, "CLOSED").await.unwrap();

    for status in ["OPEN", "IN_PROGRESS", "CLOSED"] {
        let rejected = client.update_status(ticket.id, status).await.unwrap_err();
        assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
        assert_eq!(
            rejected.error.unwrap().message,
            "Closed tickets cannot be modified",
        );
    }
}

#[tokio::test]
async fn cant_change_status_to_unknown_value() {
    let client = common::Client::spawn().await;
    let ticket = client.add_ticket("Ticket 1").await;

    let rejected = client
        .update_status(ticket.id, "RESOLVED")
        .await
        .unwrap_err();
    assert_eq!(rejected.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn cant_change_status_of_unknown_ticket() {
    let rejected = common::Client::spawn()
        .await
        .update_status(api::ticket::Id::from(1), "CLOSED")
        .await
        .unwrap_err();
    assert_eq!(rejected.status, StatusCode::NOT_FOUND);
}
