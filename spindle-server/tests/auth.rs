use serde_json::json;

#[path = "common.rs"]
mod common;

#[tokio::test]
async fn requests_without_a_token_are_rejected_when_an_api_key_is_configured() {
    let (server, _tmp) = common::build_app(Some("s3cr3t"));

    server
        .post("/api/agents/register")
        .json(&json!({"agent_id": "agent-1", "name": "a", "capabilities": {"can_rip": true, "can_transcode": false}}))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn requests_with_the_wrong_token_are_rejected() {
    let (server, _tmp) = common::build_app(Some("s3cr3t"));

    server
        .post("/api/agents/register")
        .authorization_bearer("wrong")
        .json(&json!({"agent_id": "agent-1", "name": "a", "capabilities": {"can_rip": true, "can_transcode": false}}))
        .await
        .assert_status_unauthorized();
}

#[tokio::test]
async fn requests_with_the_right_token_succeed() {
    let (server, _tmp) = common::build_app(Some("s3cr3t"));

    server
        .post("/api/agents/register")
        .authorization_bearer("s3cr3t")
        .json(&json!({"agent_id": "agent-1", "name": "a", "capabilities": {"can_rip": true, "can_transcode": false}}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn auth_is_disabled_entirely_when_no_api_key_is_configured() {
    let (server, _tmp) = common::build_app(None);

    server
        .post("/api/agents/register")
        .json(&json!({"agent_id": "agent-1", "name": "a", "capabilities": {"can_rip": true, "can_transcode": false}}))
        .await
        .assert_status_ok();
}
