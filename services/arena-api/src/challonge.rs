//! Challonge bracket service client.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChallongeError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("challonge returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallongeTournament {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_challonge_url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChallongeParticipant {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub final_rank: Option<i64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChallongeParticipant {
    /// Unranked participants sort last.
    pub fn rank(&self) -> i64 {
        self.final_rank.filter(|r| *r > 0).unwrap_or(999)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TournamentEnvelope {
    tournament: ChallongeTournament,
}

#[derive(Debug, Serialize, Deserialize)]
struct ParticipantEnvelope {
    participant: ChallongeParticipant,
}

#[derive(Debug, Clone)]
pub struct NewBracket {
    pub name: String,
    pub game: String,
    pub entry_fee_sol: f64,
}

#[async_trait]
pub trait BracketService: Send + Sync {
    /// Raw tournament list, passed through to clients.
    async fn list_tournaments(&self) -> Result<Value, ChallongeError>;
    async fn create_tournament(&self, new: &NewBracket) -> Result<ChallongeTournament, ChallongeError>;
    async fn get_tournament(&self, id: &str) -> Result<ChallongeTournament, ChallongeError>;
    async fn list_participants(&self, id: &str) -> Result<Vec<ChallongeParticipant>, ChallongeError>;
}

pub struct ChallongeClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl ChallongeClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn read<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ChallongeError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ChallongeError::Status { status: status.as_u16(), body });
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl BracketService for ChallongeClient {
    async fn list_tournaments(&self) -> Result<Value, ChallongeError> {
        let response = self
            .http
            .get(format!("{}/tournaments.json", self.base_url))
            .query(&[("api_key", &self.api_key)])
            .send()
            .await?;
        Self::read(response).await
    }

    async fn create_tournament(&self, new: &NewBracket) -> Result<ChallongeTournament, ChallongeError> {
        let body = json!({
            "api_key": self.api_key,
            "tournament": {
                "name": new.name,
                "game_name": new.game,
                "tournament_type": "single elimination",
                "description": format!("Entry Fee: {} SOL", new.entry_fee_sol),
                "open_signup": true,
                "hold_third_place_match": false,
            },
        });
        let response = self
            .http
            .post(format!("{}/tournaments.json", self.base_url))
            .json(&body)
            .send()
            .await?;
        let envelope: TournamentEnvelope = Self::read(response).await?;
        tracing::info!(challonge_id = envelope.tournament.id, name = %new.name, "bracket created");
        Ok(envelope.tournament)
    }

    async fn get_tournament(&self, id: &str) -> Result<ChallongeTournament, ChallongeError> {
        let response = self
            .http
            .get(format!("{}/tournaments/{id}.json", self.base_url))
            .query(&[("api_key", &self.api_key)])
            .header("Cache-Control", "no-cache, no-store, must-revalidate")
            .send()
            .await?;
        let envelope: TournamentEnvelope = Self::read(response).await?;
        Ok(envelope.tournament)
    }

    async fn list_participants(&self, id: &str) -> Result<Vec<ChallongeParticipant>, ChallongeError> {
        let response = self
            .http
            .get(format!("{}/tournaments/{id}/participants.json", self.base_url))
            .query(&[("api_key", &self.api_key)])
            .send()
            .await?;
        let rows: Vec<ParticipantEnvelope> = Self::read(response).await?;
        Ok(rows.into_iter().map(|r| r.participant).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participants_parse_from_envelopes() {
        let raw = r#"[
            {"participant": {"id": 1, "name": "alice", "final_rank": 2, "seed": 1}},
            {"participant": {"id": 2, "name": "bob", "final_rank": null}}
        ]"#;
        let rows: Vec<ParticipantEnvelope> = serde_json::from_str(raw).unwrap();
        let people: Vec<_> = rows.into_iter().map(|r| r.participant).collect();

        assert_eq!(people[0].rank(), 2);
        assert_eq!(people[1].rank(), 999);
        assert_eq!(people[0].extra.get("seed"), Some(&json!(1)));
    }

    #[test]
    fn tournament_keeps_unknown_fields() {
        let raw = r#"{"tournament": {"id": 42, "name": "Cup", "state": "pending",
                      "full_challonge_url": "https://challonge.com/cup", "game_name": "Valorant"}}"#;
        let envelope: TournamentEnvelope = serde_json::from_str(raw).unwrap();
        assert_eq!(envelope.tournament.id, 42);
        assert_eq!(envelope.tournament.state.as_deref(), Some("pending"));

        let back = serde_json::to_value(&envelope.tournament).unwrap();
        assert_eq!(back["game_name"], "Valorant");
    }
}
