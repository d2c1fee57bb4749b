use std::{net, time};

use serde::Deserialize;

#[derive(Deserialize)]
pub struct Config {
    /// Tickets are kept in memory when no database is configured.
    pub db: Option<Db>,
    pub http: Http,
    pub auth: Auth,
}

#[derive(Deserialize)]
pub struct Db {
    pub url: String,
    #[serde(default = "default_connect_timeout", with = "humantime_serde")]
    pub connect_timeout: time::Duration,
}

fn default_connect_timeout() -> time::Duration {
    time::Duration::from_secs(5)
}

#[derive(Deserialize)]
pub struct Http {
    pub server: Server,
    #[serde(default)]
    pub cors: Cors,
}

#[derive(Deserialize)]
pub struct Server {
    pub addr: net::SocketAddr,
}

#[derive(Default, Deserialize)]
pub struct Cors {
    pub allowed_origins: Vec<String>,
}

#[derive(Deserialize)]
pub struct Auth {
    pub api_key: String,
}
