use serde_json::json;

#[path = "common.rs"]
mod common;

#[tokio::test]
async fn agent_register_then_heartbeat_then_empty_job_list() {
    let (server, _tmp) = common::build_app(None);

    let response = server
        .post("/api/agents/register")
        .json(&json!({
            "agent_id": "agent-1",
            "name": "living-room-agent",
            "capabilities": {"can_rip": true, "can_transcode": false},
        }))
        .await;
    response.assert_status_ok();
    let agent: serde_json::Value = response.json();
    assert_eq!(agent["id"], "agent-1");
    assert_eq!(agent["status"], "online");

    server.post("/api/agents/agent-1/heartbeat").await.assert_status_ok();

    let jobs = server.get("/api/agents/agent-1/jobs").await;
    jobs.assert_status_ok();
    let body: serde_json::Value = jobs.json();
    assert!(body["jobs"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn heartbeat_for_unknown_agent_is_not_found() {
    let (server, _tmp) = common::build_app(None);
    let response = server.post("/api/agents/ghost/heartbeat").await;
    response.assert_status_not_ok();
}

#[tokio::test]
async fn remote_worker_jobs_are_filed_under_its_own_id() {
    let (server, _tmp) = common::build_app(None);

    server
        .post("/api/workers/register")
        .json(&json!({
            "worker_id": "worker-1",
            "type": "remote",
            "hostname": "transcode-box",
            "agent_id": null,
            "capabilities": {"hw_encoders": ["nvenc"], "max_concurrent": 2, "codec_support": ["h264", "hevc"]},
        }))
        .await
        .assert_status_ok();

    let jobs = server.get("/api/workers/worker-1/jobs").await;
    jobs.assert_status_ok();
    let body: serde_json::Value = jobs.json();
    assert!(body["jobs"].as_array().unwrap().is_empty());
}
