// Leaderboard request handling against the in-memory store.
#![cfg(feature = "leaderboard")]

use pose_arcade::leaderboard::{Leaderboard, MemoryStore, Request, StoreConfig};
use serde_json::json;

fn post(lb: &mut Leaderboard<MemoryStore>, game: &str, name: &str, score: f64) -> serde_json::Value {
    let body = json!({ "game": game, "name": name, "score": score }).to_string();
    let resp = lb.handle(&Request::post(body));
    assert_eq!(resp.status, 200, "unexpected response {}", resp.body);
    resp.body
}

fn configured() -> Leaderboard<MemoryStore> {
    let config = StoreConfig::from_vars(Some("https://kv.local".into()), Some("token".into()));
    Leaderboard::from_config(config, |_| MemoryStore::new())
}

#[test]
fn only_improvements_are_stored() {
    let mut lb = configured();
    assert_eq!(post(&mut lb, "flappy", "mo", 12.0)["updated"], true);
    assert_eq!(post(&mut lb, "flappy", "mo", 7.0)["updated"], false);
    assert_eq!(post(&mut lb, "flappy", "mo", 12.0)["updated"], false);

    let body = post(&mut lb, "flappy", "mo", 30.9);
    assert_eq!(body["updated"], true);
    assert_eq!(body["score"], 30);
    assert_eq!(body["ok"], true);

    let resp = lb.handle(&Request::get(&[("game", "flappy")]));
    assert_eq!(resp.body["entries"], json!([{ "name": "mo", "score": 30 }]));
}

#[test]
fn get_returns_entries_highest_first() {
    let mut lb = configured();
    post(&mut lb, "cricket", "ana", 18.0);
    post(&mut lb, "cricket", "bo", 44.0);
    post(&mut lb, "cricket", "cy", 27.0);
    post(&mut lb, "flappy", "dee", 99.0);

    let resp = lb.handle(&Request::get(&[("game", "CRICKET"), ("limit", "2")]));
    assert_eq!(resp.status, 200);
    assert_eq!(resp.body["game"], "cricket");
    assert_eq!(
        resp.body["entries"],
        json!([{ "name": "bo", "score": 44 }, { "name": "cy", "score": 27 }])
    );
}

#[test]
fn games_keep_separate_boards() {
    let mut lb = configured();
    post(&mut lb, "cricket", "ana", 5.0);
    let body = post(&mut lb, "flappy", "ana", 3.0);
    assert_eq!(body["updated"], true);
}

#[test]
fn invalid_submissions_are_400() {
    let mut lb = configured();
    for body in [
        json!({ "game": "tennis", "name": "a", "score": 1 }),
        json!({ "game": "flappy", "name": "", "score": 1 }),
        json!({ "game": "flappy", "name": "a", "score": -3 }),
        json!({ "game": "flappy", "name": "a", "score": "lots" }),
    ] {
        let resp = lb.handle(&Request::post(body.to_string()));
        assert_eq!(resp.status, 400, "{} should be rejected", body);
        assert!(resp.body["error"].is_string());
    }
    let resp = lb.handle(&Request::get(&[("game", "flappy")]));
    assert_eq!(resp.body["entries"], json!([]));
}
