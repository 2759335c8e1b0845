use crate::assets::read_embedded_json;
use crate::error::{FastLegendError, FlResult};
use crate::leaderboard::LeaderboardEntry;
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where leaderboard snapshots come from
pub trait LeaderboardService: Send + 'static {
    fn fetch_entries(&self) -> FlResult<Vec<LeaderboardEntry>>;
}

/// Creates user accounts that give the local player a leaderboard identity
pub trait RegistrationService {
    fn register(&self, registration: &Registration) -> FlResult<RegistrationOutcome>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: String,
    pub mobile_number: String,
    pub country: String,
}

impl Registration {
    pub fn new(username: &str, mobile_number: &str, country: &str) -> FlResult<Self> {
        let username = username.trim();
        let mobile_number = mobile_number.trim();
        if username.is_empty() || mobile_number.is_empty() {
            return Err(FastLegendError::Validation(
                "username and mobile number are required".to_string(),
            ));
        }
        Ok(Self {
            username: username.to_string(),
            mobile_number: mobile_number.to_string(),
            country: country.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationOutcome {
    Registered,
    /// the mobile number already belongs to an account
    Duplicate,
}

#[derive(Debug, Deserialize)]
struct LeaderboardPayload {
    entries: Vec<LeaderboardEntry>,
}

/// Parse a `{ "entries": [...] }` leaderboard payload
pub fn parse_leaderboard(body: &str) -> FlResult<Vec<LeaderboardEntry>> {
    let payload: LeaderboardPayload = serde_json::from_str(body)?;
    Ok(payload.entries)
}

/// Blocking client for the leaderboard and user endpoints
#[derive(Debug, Clone)]
pub struct HttpClient {
    base_url: String,
    client: Client,
}

impl HttpClient {
    pub fn new(base_url: impl Into<String>) -> FlResult<Self> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl LeaderboardService for HttpClient {
    fn fetch_entries(&self) -> FlResult<Vec<LeaderboardEntry>> {
        let url = self.url("/api/leaderboard");
        debug!(%url, "fetching leaderboard");

        let response = self.client.get(&url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FastLegendError::Status {
                status: status.as_u16(),
                url,
            });
        }

        let body = response.text()?;
        parse_leaderboard(&body)
    }
}

impl RegistrationService for HttpClient {
    fn register(&self, registration: &Registration) -> FlResult<RegistrationOutcome> {
        let url = self.url("/api/users");
        debug!(%url, username = %registration.username, "registering user");

        let response = self.client.post(&url).json(registration).send()?;
        match response.status() {
            StatusCode::CONFLICT => {
                info!(username = %registration.username, "registration rejected as duplicate");
                Ok(RegistrationOutcome::Duplicate)
            }
            status if status.is_success() => Ok(RegistrationOutcome::Registered),
            status => Err(FastLegendError::Status {
                status: status.as_u16(),
                url,
            }),
        }
    }
}

/// Fixed entries, used when no leaderboard server is configured
#[derive(Debug, Clone, Default)]
pub struct StaticLeaderboard {
    entries: Vec<LeaderboardEntry>,
}

impl StaticLeaderboard {
    pub fn new(entries: Vec<LeaderboardEntry>) -> Self {
        Self { entries }
    }

    /// Sample board bundled with the binary
    pub fn embedded() -> FlResult<Self> {
        let payload: LeaderboardPayload = read_embedded_json("leaderboard.json")?;
        Ok(Self::new(payload.entries))
    }
}

impl LeaderboardService for StaticLeaderboard {
    fn fetch_entries(&self) -> FlResult<Vec<LeaderboardEntry>> {
        Ok(self.entries.clone())
    }
}
