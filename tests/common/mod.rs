use std::sync::Arc;

use reqwest::{RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use support_desk::{api, config, db, http, service};
use tokio::net::TcpListener;

pub const API_KEY: &str = "test-key";

/// Failed response as seen by the client.
#[derive(Debug)]
pub struct Rejected {
    pub status: StatusCode,
    pub error: Option<api::Error>,
}

pub struct Client {
    inner: reqwest::Client,
    base_url: String,
    pub api_key: Option<String>,
}

impl Client {
    /// Starts a fresh server backed by an empty in-memory store.
    pub async fn spawn() -> Self {
        Self::spawn_with(Arc::new(db::Memory::default())).await
    }

    pub async fn spawn_with(store: Arc<dyn db::Store>) -> Self {
        let app = http::router(
            http::AppState {
                tickets: service::Tickets::new(store),
                api_key: http::ApiKey::new(API_KEY),
            },
            &config::Cors::default(),
        )
        .expect("invalid CORS config");

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind a listener");
        let addr = listener.local_addr().expect("no local address");
        tokio::spawn(async move {
            axum::serve(listener, app).await.expect("server failed");
        });

        Self {
            inner: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
            api_key: Some(API_KEY.to_owned()),
        }
    }

    pub fn with_api_key(mut self, key: Option<&str>) -> Self {
        self.api_key = key.map(str::to_owned);
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    fn authorized(&self, mut req: RequestBuilder) -> RequestBuilder {
        if let Some(key) = &self.api_key {
            req = req.header("X-API-KEY", key);
        }
        req
    }

    async fn send<T: DeserializeOwned>(
        &self,
        req: RequestBuilder,
    ) -> Result<T, Rejected> {
        let res = self
            .authorized(req)
            .send()
            .await
            .expect("failed to send a request");
        let status = res.status();
        if !status.is_success() {
            return Err(Rejected {
                status,
                error: res.json::<api::Error>().await.ok(),
            });
        }
        Ok(res.json::<T>().await.expect("failed to get a response"))
    }

    pub async fn get_raw(&self, path: &str) -> reqwest::Response {
        self.authorized(self.inner.get(self.url(path)))
            .send()
            .await
            .expect("failed to send a request")
    }

    pub async fn post_raw(&self, path: &str, body: Value) -> reqwest::Response {
        self.authorized(self.inner.post(self.url(path)).json(&body))
            .send()
            .await
            .expect("failed to send a request")
    }

    pub async fn create_ticket(
        &self,
        body: Value,
    ) -> Result<api::Ticket, Rejected> {
        self.send(self.inner.post(self.url("/tickets")).json(&body))
            .await
    }

    /// Creates a `HIGH` priority ticket without category.
    pub async fn add_ticket(&self, title: &str) -> api::Ticket {
        self.create_ticket(json!({
            "title": title,
            "description": format!("Description of {title}"),
            "priority": "HIGH",
        }))
        .await
        .expect("failed to create a ticket")
    }

    pub async fn get_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<api::Ticket, Rejected> {
        self.send(self.inner.get(self.url(&format!("/tickets/{id}"))))
            .await
    }

    /// `None` stands for `204 No Content`.
    pub async fn list_tickets(
        &self,
    ) -> Result<Option<Vec<api::Ticket>>, Rejected> {
        let res = self.get_raw("/tickets").await;
        match res.status() {
            StatusCode::NO_CONTENT => Ok(None),
            StatusCode::OK => Ok(Some(
                res.json().await.expect("failed to get a response"),
            )),
            status => Err(Rejected {
                status,
                error: res.json().await.ok(),
            }),
        }
    }

    pub async fn delete_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<String, Rejected> {
        let res = self
            .authorized(self.inner.delete(self.url(&format!("/tickets/{id}"))))
            .send()
            .await
            .expect("failed to send a request");
        let status = res.status();
        if !status.is_success() {
            return Err(Rejected {
                status,
                error: res.json().await.ok(),
            });
        }
        Ok(res.text().await.expect("failed to get a response"))
    }

    pub async fn update_ticket(
        &self,
        id: api::ticket::Id,
        body: Value,
    ) -> Result<api::Ticket, Rejected> {
        self.send(
            self.inner
                .patch(self.url(&format!("/tickets/{id}")))
                .json(&body),
        )
        .await
    }

    pub async fn assign_ticket(
        &self,
        id: api::ticket::Id,
        body: Value,
    ) -> Result<api::Ticket, Rejected> {
        self.send(
            self.inner
                .patch(self.url(&format!("/tickets/{id}/assign")))
                .json(&body),
        )
        .await
    }

    pub async fn add_comment(
        &self,
        id: api::ticket::Id,
        body: Value,
    ) -> Result<api::Comment, Rejected> {
        self.send(
            self.inner
                .post(self.url(&format!("/tickets/{id}/comments")))
                .json(&body),
        )
        .await
    }

    pub async fn escalate_ticket(
        &self,
        id: api::ticket::Id,
    ) -> Result<api::Ticket, Rejected> {
        self.send(
            self.inner
                .patch(self.url(&format!("/tickets/{id}/escalate"))),
        )
        .await
    }

    pub async fn update_status(
        &self,
        id: api::ticket::Id,
        status: &str,
    ) -> Result<api::Ticket, Rejected> {
        self.send(
            self.inner
                .patch(self.url(&format!("/tickets/{id}/status")))
                .json(&json!({ "status": status })),
        )
        .await
    }

    pub async fn submit_feedback(
        &self,
        id: api::ticket::Id,
        body: Value,
    ) -> Result<api::Feedback, Rejected> {
        self.send(
            self.inner
                .post(self.url(&format!("/tickets/{id}/feedback")))
                .json(&body),
        )
        .await
    }
}
