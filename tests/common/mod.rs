//! Shared fixtures for the wiremock-backed integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use serde_json::{json, Value};
use wiremock::{Request, Respond, ResponseTemplate};

use galias::api::client::DirectoryClient;
use galias::api::retry::RetryPolicy;

pub fn test_client(base_uri: &str) -> DirectoryClient {
    DirectoryClient::with_config(base_uri, base_uri, RetryPolicy::for_testing())
}

pub fn group_json(email: &str) -> Value {
    json!({
        "id": format!("id-{email}"),
        "email": email,
        "name": format!("Alias {email}"),
        "description": ""
    })
}

pub fn member_json(email: &str) -> Value {
    json!({
        "id": format!("id-{email}"),
        "email": email,
        "role": "MEMBER",
        "type": "USER"
    })
}

pub fn group_page(groups: Vec<Value>, next_page_token: Option<&str>) -> Value {
    let mut page = json!({ "kind": "admin#directory#groups", "groups": groups });
    if let Some(token) = next_page_token {
        page["nextPageToken"] = json!(token);
    }
    page
}

pub fn member_page(members: Vec<Value>, next_page_token: Option<&str>) -> Value {
    let mut page = json!({ "kind": "admin#directory#members", "members": members });
    if let Some(token) = next_page_token {
        page["nextPageToken"] = json!(token);
    }
    page
}

pub fn not_found_body(message: &str) -> Value {
    json!({
        "error": {
            "code": 404,
            "message": message,
            "errors": [{ "reason": "notFound", "message": message }]
        }
    })
}

pub fn rate_limited_body() -> Value {
    json!({
        "error": {
            "code": 403,
            "message": "User rate limit exceeded.",
            "errors": [{ "reason": "userRateLimitExceeded" }]
        }
    })
}

pub fn duplicate_member_body() -> Value {
    json!({
        "error": {
            "code": 409,
            "message": "Member already exists.",
            "errors": [{ "reason": "duplicate" }]
        }
    })
}

/// Replays a fixed response sequence, repeating the last entry once the
/// sequence is spent.
pub struct SequenceResponder {
    responses: Vec<ResponseTemplate>,
    hits: AtomicUsize,
}

impl SequenceResponder {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        assert!(!responses.is_empty(), "sequence needs at least one response");
        Self {
            responses,
            hits: AtomicUsize::new(0),
        }
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let hit = self.hits.fetch_add(1, Ordering::SeqCst);
        let index = hit.min(self.responses.len() - 1);
        self.responses[index].clone()
    }
}
