//! Score board request handling for the two games.
//!
//! `Leaderboard::handle` turns a `Request` into a JSON `Response` the way the
//! hosted endpoint answers `GET` / `POST /api/leaderboard`. Storage sits behind
//! `ScoreStore`, a tiny sorted-set interface; `MemoryStore` implements it in
//! process. Nothing here touches the running games.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::game::ActiveGame;

pub const DEFAULT_LIMIT: usize = 10;
pub const MAX_LIMIT: usize = 25;
/// Entries kept per game after each submission.
pub const MAX_ENTRIES: usize = 200;
pub const MAX_NAME_CHARS: usize = 18;

pub const URL_VAR: &str = "KV_REST_API_URL";
pub const TOKEN_VAR: &str = "KV_REST_API_TOKEN";

/// Connection details for the hosted key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub url: String,
    pub token: String,
}

impl StoreConfig {
    /// Both variables must be present and non-empty.
    pub fn from_env() -> Option<Self> {
        Self::from_vars(std::env::var(URL_VAR).ok(), std::env::var(TOKEN_VAR).ok())
    }

    pub fn from_vars(url: Option<String>, token: Option<String>) -> Option<Self> {
        match (url, token) {
            (Some(url), Some(token)) if !url.is_empty() && !token.is_empty() => {
                Some(Self { url, token })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub score: u64,
}

/// Sorted-set storage keyed by board (`leaderboard:<game>`).
pub trait ScoreStore {
    fn score(&self, board: &str, name: &str) -> Result<Option<u64>>;
    /// Insert or overwrite `name`'s score.
    fn set(&mut self, board: &str, name: &str, score: u64) -> Result<()>;
    /// Highest first; equal scores in the order they were last set.
    fn top(&self, board: &str, limit: usize) -> Result<Vec<Entry>>;
    /// Drop the lowest ranked entries until at most `keep` remain.
    fn trim(&mut self, board: &str, keep: usize) -> Result<()>;
}

#[derive(Debug, Clone)]
struct Record {
    name: String,
    score: u64,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    boards: HashMap<String, Vec<Record>>,
    seq: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self, board: &str) -> usize {
        self.boards.get(board).map_or(0, Vec::len)
    }

    fn ranked(&self, board: &str) -> Vec<&Record> {
        let mut records: Vec<&Record> = self
            .boards
            .get(board)
            .map(|v| v.iter().collect())
            .unwrap_or_default();
        records.sort_by(|a, b| b.score.cmp(&a.score).then(a.seq.cmp(&b.seq)));
        records
    }
}

impl ScoreStore for MemoryStore {
    fn score(&self, board: &str, name: &str) -> Result<Option<u64>> {
        Ok(self
            .boards
            .get(board)
            .and_then(|v| v.iter().find(|r| r.name == name))
            .map(|r| r.score))
    }

    fn set(&mut self, board: &str, name: &str, score: u64) -> Result<()> {
        self.seq += 1;
        let seq = self.seq;
        let records = self.boards.entry(board.to_string()).or_default();
        match records.iter_mut().find(|r| r.name == name) {
            Some(record) => {
                record.score = score;
                record.seq = seq;
            }
            None => records.push(Record {
                name: name.to_string(),
                score,
                seq,
            }),
        }
        Ok(())
    }

    fn top(&self, board: &str, limit: usize) -> Result<Vec<Entry>> {
        Ok(self
            .ranked(board)
            .into_iter()
            .take(limit)
            .map(|r| Entry {
                name: r.name.clone(),
                score: r.score,
            })
            .collect())
    }

    fn trim(&mut self, board: &str, keep: usize) -> Result<()> {
        if self.len(board) <= keep {
            return Ok(());
        }
        let survivors: Vec<Record> = self
            .ranked(board)
            .into_iter()
            .take(keep)
            .cloned()
            .collect();
        self.boards.insert(board.to_string(), survivors);
        Ok(())
    }
}

/// Client mistakes and missing storage. Backend failures are plain
/// `anyhow::Error`s and answer 500.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    Unconfigured,
    MethodNotAllowed,
    MalformedBody,
    InvalidGame,
    InvalidName,
    InvalidScore,
}

impl Rejection {
    pub fn status(&self) -> u16 {
        match self {
            Rejection::Unconfigured => 503,
            Rejection::MethodNotAllowed => 405,
            _ => 400,
        }
    }

    fn body(&self) -> Value {
        match self {
            Rejection::Unconfigured => json!({
                "error": self.to_string(),
                "hint": format!("Set {URL_VAR} and {TOKEN_VAR} to enable global scores."),
            }),
            _ => json!({ "error": self.to_string() }),
        }
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Rejection::Unconfigured => "Leaderboard database not configured",
            Rejection::MethodNotAllowed => "Method not allowed.",
            Rejection::MalformedBody => "Body must be a JSON object.",
            Rejection::InvalidGame => "Invalid game. Use flappy or cricket.",
            Rejection::InvalidName => "Name is required (1-18 chars).",
            Rejection::InvalidScore => "Score must be a non-negative integer.",
        })
    }
}

impl std::error::Error for Rejection {}

#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: String,
    pub query: HashMap<String, String>,
    pub body: Option<String>,
}

impl Request {
    pub fn get(query: &[(&str, &str)]) -> Self {
        Self {
            method: "GET".into(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
            body: None,
        }
    }

    pub fn post(body: impl Into<String>) -> Self {
        Self {
            method: "POST".into(),
            query: HashMap::new(),
            body: Some(body.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }
}

/// A validated submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub game: ActiveGame,
    pub name: String,
    pub score: u64,
}

impl Submission {
    pub fn parse(body: &str) -> Result<Self, Rejection> {
        let body = if body.trim().is_empty() { "{}" } else { body };
        let value: Value = serde_json::from_str(body).map_err(|_| Rejection::MalformedBody)?;
        let fields = value.as_object().ok_or(Rejection::MalformedBody)?;

        let game = field_text(fields.get("game"))
            .parse::<ActiveGame>()
            .map_err(|_| Rejection::InvalidGame)?;

        let name = field_text(fields.get("name")).trim().to_string();
        if name.is_empty() || name.chars().count() > MAX_NAME_CHARS {
            return Err(Rejection::InvalidName);
        }

        let score = fields
            .get("score")
            .and_then(field_number)
            .filter(|s| s.is_finite())
            .map(f64::floor)
            .filter(|s| *s >= 0.0)
            .ok_or(Rejection::InvalidScore)?;

        Ok(Self {
            game,
            name,
            score: score as u64,
        })
    }
}

fn field_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

fn field_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn board_key(game: ActiveGame) -> String {
    format!("leaderboard:{}", game.as_str())
}

/// Floor and clamp to `1..=MAX_LIMIT`; anything unreadable means the default.
pub fn parse_limit(raw: Option<&str>) -> usize {
    raw.filter(|s| !s.is_empty())
        .and_then(|s| s.trim().parse::<f64>().ok())
        .filter(|n| n.is_finite())
        .map(|n| n.floor().clamp(1.0, MAX_LIMIT as f64) as usize)
        .unwrap_or(DEFAULT_LIMIT)
}

enum Failure {
    Rejected(Rejection),
    Backend(anyhow::Error),
}

impl From<Rejection> for Failure {
    fn from(r: Rejection) -> Self {
        Failure::Rejected(r)
    }
}

impl From<anyhow::Error> for Failure {
    fn from(e: anyhow::Error) -> Self {
        Failure::Backend(e)
    }
}

pub struct Leaderboard<S> {
    store: Option<S>,
}

impl<S: ScoreStore> Leaderboard<S> {
    pub fn new(store: S) -> Self {
        Self { store: Some(store) }
    }

    /// Open storage only when `config` is present.
    pub fn from_config(config: Option<StoreConfig>, open: impl FnOnce(StoreConfig) -> S) -> Self {
        Self {
            store: config.map(open),
        }
    }

    /// Storage configured from `KV_REST_API_URL` / `KV_REST_API_TOKEN`; without
    /// them every request answers 503.
    pub fn from_env(open: impl FnOnce(StoreConfig) -> S) -> Self {
        let config = StoreConfig::from_env();
        if config.is_none() {
            crate::console_warn!("leaderboard storage not configured ({URL_VAR}, {TOKEN_VAR})");
        }
        Self::from_config(config, open)
    }

    pub fn handle(&mut self, req: &Request) -> Response {
        match self.dispatch(req) {
            Ok(resp) => resp,
            Err(Failure::Rejected(r)) => Response {
                status: r.status(),
                body: r.body(),
            },
            Err(Failure::Backend(err)) => {
                crate::console_warn!("leaderboard backend failure: {:#}", err);
                Response {
                    status: 500,
                    body: json!({
                        "error": "Leaderboard request failed",
                        "detail": format!("{:#}", err),
                    }),
                }
            }
        }
    }

    fn dispatch(&mut self, req: &Request) -> Result<Response, Failure> {
        let store = self.store.as_mut().ok_or(Rejection::Unconfigured)?;
        match req.method.to_ascii_uppercase().as_str() {
            "GET" => Ok(top_scores(store, req)?),
            "POST" => Ok(submit(store, req.body.as_deref().unwrap_or(""))?),
            _ => Err(Rejection::MethodNotAllowed.into()),
        }
    }
}

fn top_scores<S: ScoreStore>(store: &S, req: &Request) -> Result<Response, Failure> {
    let game = match req.query.get("game").filter(|g| !g.is_empty()) {
        Some(raw) => raw
            .parse::<ActiveGame>()
            .map_err(|_| Rejection::InvalidGame)?,
        None => ActiveGame::Flappy,
    };
    let limit = parse_limit(req.query.get("limit").map(String::as_str));
    let entries = store.top(&board_key(game), limit)?;
    Ok(Response::ok(json!({
        "game": game.as_str(),
        "entries": entries,
    })))
}

fn submit<S: ScoreStore>(store: &mut S, body: &str) -> Result<Response, Failure> {
    let sub = Submission::parse(body)?;
    let key = board_key(sub.game);

    let updated = match store.score(&key, &sub.name)? {
        Some(best) => sub.score > best,
        None => true,
    };
    if updated {
        store.set(&key, &sub.name, sub.score)?;
    }
    store.trim(&key, MAX_ENTRIES)?;

    Ok(Response::ok(json!({
        "ok": true,
        "game": sub.game.as_str(),
        "name": sub.name,
        "score": sub.score,
        "updated": updated,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    #[derive(Debug, Default)]
    struct OfflineStore;

    impl ScoreStore for OfflineStore {
        fn score(&self, _board: &str, _name: &str) -> Result<Option<u64>> {
            bail!("store offline")
        }
        fn set(&mut self, _board: &str, _name: &str, _score: u64) -> Result<()> {
            bail!("store offline")
        }
        fn top(&self, _board: &str, _limit: usize) -> Result<Vec<Entry>> {
            bail!("store offline")
        }
        fn trim(&mut self, _board: &str, _keep: usize) -> Result<()> {
            bail!("store offline")
        }
    }

    fn board() -> Leaderboard<MemoryStore> {
        Leaderboard::new(MemoryStore::new())
    }

    #[test]
    fn test_limit_is_floored_and_clamped() {
        assert_eq!(parse_limit(None), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("")), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("abc")), DEFAULT_LIMIT);
        assert_eq!(parse_limit(Some("0")), 1);
        assert_eq!(parse_limit(Some("-4")), 1);
        assert_eq!(parse_limit(Some("7.9")), 7);
        assert_eq!(parse_limit(Some("500")), MAX_LIMIT);
    }

    #[test]
    fn test_submission_validation() {
        let ok = Submission::parse(r#"{"game":"Cricket","name":"  ana ","score":41.7}"#).unwrap();
        assert_eq!(ok.game, ActiveGame::Cricket);
        assert_eq!(ok.name, "ana");
        assert_eq!(ok.score, 41);

        assert_eq!(
            Submission::parse(r#"{"game":"snake","name":"a","score":1}"#),
            Err(Rejection::InvalidGame)
        );
        assert_eq!(
            Submission::parse(r#"{"game":"flappy","name":"   ","score":1}"#),
            Err(Rejection::InvalidName)
        );
        assert_eq!(
            Submission::parse(r#"{"game":"flappy","name":"abcdefghijklmnopqrs","score":1}"#),
            Err(Rejection::InvalidName)
        );
        assert_eq!(
            Submission::parse(r#"{"game":"flappy","name":"a","score":-1}"#),
            Err(Rejection::InvalidScore)
        );
        assert_eq!(
            Submission::parse(r#"{"game":"flappy","name":"a"}"#),
            Err(Rejection::InvalidScore)
        );
        assert_eq!(Submission::parse("[1,2"), Err(Rejection::MalformedBody));
        // Empty body reads as `{}`; game is the first thing checked.
        assert_eq!(Submission::parse(""), Err(Rejection::InvalidGame));
    }

    #[test]
    fn test_numeric_strings_count_as_scores() {
        let sub = Submission::parse(r#"{"game":"flappy","name":"bo","score":"12"}"#).unwrap();
        assert_eq!(sub.score, 12);
    }

    #[test]
    fn test_unconfigured_answers_503() {
        let mut lb: Leaderboard<MemoryStore> = Leaderboard::from_config(None, |_| MemoryStore::new());
        let resp = lb.handle(&Request::get(&[]));
        assert_eq!(resp.status, 503);
        assert_eq!(resp.body["error"], "Leaderboard database not configured");
    }

    #[test]
    fn test_other_methods_answer_405() {
        let mut lb = board();
        let req = Request {
            method: "DELETE".into(),
            ..Request::default()
        };
        assert_eq!(lb.handle(&req).status, 405);
    }

    #[test]
    fn test_get_defaults_to_flappy() {
        let mut lb = board();
        let resp = lb.handle(&Request::get(&[]));
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body["game"], "flappy");
        assert_eq!(resp.body["entries"], json!([]));
    }

    #[test]
    fn test_get_rejects_unknown_game() {
        let mut lb = board();
        assert_eq!(lb.handle(&Request::get(&[("game", "pong")])).status, 400);
    }

    #[test]
    fn test_equal_scores_rank_by_earliest_update() {
        let mut lb = board();
        for name in ["first", "second"] {
            let body = format!(r#"{{"game":"flappy","name":"{name}","score":9}}"#);
            assert_eq!(lb.handle(&Request::post(body)).status, 200);
        }
        let resp = lb.handle(&Request::get(&[("game", "flappy")]));
        assert_eq!(resp.body["entries"][0]["name"], "first");
        assert_eq!(resp.body["entries"][1]["name"], "second");
    }

    #[test]
    fn test_board_is_trimmed_to_capacity() {
        let mut store = MemoryStore::new();
        for i in 0..(MAX_ENTRIES as u64 + 5) {
            store.set("leaderboard:flappy", &format!("p{i}"), i).unwrap();
        }
        store.trim("leaderboard:flappy", MAX_ENTRIES).unwrap();
        assert_eq!(store.len("leaderboard:flappy"), MAX_ENTRIES);
        // The five lowest are gone.
        assert_eq!(store.score("leaderboard:flappy", "p4").unwrap(), None);
        assert_eq!(store.score("leaderboard:flappy", "p5").unwrap(), Some(5));
    }

    #[test]
    fn test_backend_failure_answers_500_with_detail() {
        let mut lb = Leaderboard::new(OfflineStore);
        let resp = lb.handle(&Request::get(&[("game", "cricket")]));
        assert_eq!(resp.status, 500);
        assert_eq!(resp.body["error"], "Leaderboard request failed");
        assert_eq!(resp.body["detail"], "store offline");
    }

    #[test]
    fn test_config_needs_both_vars() {
        assert!(StoreConfig::from_vars(Some("u".into()), None).is_none());
        assert!(StoreConfig::from_vars(Some("u".into()), Some(String::new())).is_none());
        assert_eq!(
            StoreConfig::from_vars(Some("u".into()), Some("t".into())),
            Some(StoreConfig {
                url: "u".into(),
                token: "t".into()
            })
        );
    }
}
