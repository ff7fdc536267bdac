use serde_json::json;

#[path = "common.rs"]
mod common;

async fn register_remote_worker(server: &axum_test::TestServer, worker_id: &str) {
    server
        .post("/api/workers/register")
        .json(&json!({
            "worker_id": worker_id,
            "type": "remote",
            "hostname": "box",
            "agent_id": null,
            "capabilities": {"hw_encoders": [], "max_concurrent": 1, "codec_support": ["h264"]},
        }))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn transcode_job_create_approve_update_to_completion() {
    let (server, _tmp) = common::build_app(None);
    register_remote_worker(&server, "worker-1").await;

    let create = server
        .post("/api/jobs")
        .json(&json!({
            "disc_id": null,
            "title_index": null,
            "input_file": "/tmp/in.mkv",
            "preset": null,
            "priority": 0,
            "requires_approval": true,
            "thumbnails": [],
            "thumbnail_timestamps": [],
        }))
        .await;
    create.assert_status_ok();
    let job: serde_json::Value = create.json();
    let job_id = job["id"].as_str().unwrap().to_string();
    assert_eq!(job["status"], "pending");

    let approved = server
        .post(&format!("/api/jobs/{job_id}/approve"))
        .json(&json!({"worker_id": "worker-1", "preset": "h264-1080p", "output_name": null}))
        .await;
    approved.assert_status_ok();
    let job: serde_json::Value = approved.json();
    assert_eq!(job["status"], "assigned");

    server
        .patch(&format!("/api/jobs/{job_id}"))
        .json(&json!({"status": "running"}))
        .await
        .assert_status_ok();

    let completed = server
        .patch(&format!("/api/jobs/{job_id}"))
        .json(&json!({"status": "completed", "progress": 100, "output_file": "/library/out.mkv"}))
        .await;
    completed.assert_status_ok();

    let worker_jobs: serde_json::Value = server.get("/api/workers/worker-1/jobs").await.json();
    assert!(worker_jobs["jobs"].as_array().unwrap().is_empty(), "worker slot should be released on completion");
}

#[tokio::test]
async fn approving_a_job_not_awaiting_approval_is_a_bad_request() {
    let (server, _tmp) = common::build_app(None);
    register_remote_worker(&server, "worker-1").await;

    let job: serde_json::Value = server
        .post("/api/jobs")
        .json(&json!({
            "disc_id": null, "title_index": null, "input_file": "/tmp/in.mkv", "preset": null,
            "priority": 0, "requires_approval": false, "thumbnails": [], "thumbnail_timestamps": [],
        }))
        .await
        .json();
    let job_id = job["id"].as_str().unwrap();

    server
        .post(&format!("/api/jobs/{job_id}/approve"))
        .json(&json!({"worker_id": "worker-1", "preset": "h264-1080p", "output_name": null}))
        .await
        .assert_status_bad_request();
}

#[tokio::test]
async fn cancel_then_poll_is_cancelled() {
    let (server, _tmp) = common::build_app(None);

    let job: serde_json::Value = server
        .post("/api/jobs")
        .json(&json!({
            "disc_id": null, "title_index": null, "input_file": "/tmp/in.mkv", "preset": null,
            "priority": 0, "requires_approval": false, "thumbnails": [], "thumbnail_timestamps": [],
        }))
        .await
        .json();
    let job_id = job["id"].as_str().unwrap();

    server.post(&format!("/api/jobs/{job_id}/cancel")).await.assert_status_ok();

    let polled = server.get(&format!("/api/jobs/{job_id}/is-cancelled")).await;
    polled.assert_status_ok();
    let body: serde_json::Value = polled.json();
    assert_eq!(body["cancelled"], true);
}
