use serde_json::json;

#[path = "common.rs"]
mod common;

fn movie_disc_payload() -> serde_json::Value {
    json!({
        "agent_id": "agent-1",
        "drive": "/dev/sr0",
        "disc_name": "SOME_MOVIE_2020",
        "disc_type": "blu_ray",
        "titles": [
            {"index": 0, "name": "title00", "duration_seconds": 6300, "size_bytes": 30_000_000_000u64, "chapters": 12},
            {"index": 1, "name": "title01", "duration_seconds": 45, "size_bytes": 50_000_000u64, "chapters": 1},
        ],
    })
}

#[tokio::test]
async fn detect_then_approve_then_rip_creates_one_job_per_main_title() {
    let (server, _tmp) = common::build_app(None);

    let detected = server.post("/api/discs/detected").json(&movie_disc_payload()).await;
    detected.assert_status_ok();
    let disc: serde_json::Value = detected.json();
    let disc_id = disc["id"].as_str().unwrap().to_string();
    assert_eq!(disc["preview_status"], "pending");

    // Without approval, ripping is refused.
    server
        .post(&format!("/api/discs/{disc_id}/rip"))
        .json(&json!({}))
        .await
        .assert_status_bad_request();

    let approved = server
        .post(&format!("/api/discs/{disc_id}/preview/approve"))
        .json(&json!({"title_edits": []}))
        .await;
    approved.assert_status_ok();
    let disc: serde_json::Value = approved.json();
    assert_eq!(disc["preview_status"], "approved");

    let rip = server.post(&format!("/api/discs/{disc_id}/rip")).json(&json!({})).await;
    rip.assert_status_ok();
    let body: serde_json::Value = rip.json();
    let job_ids = body["job_ids"].as_array().unwrap();
    assert_eq!(job_ids.len(), 1, "the short title should have been filtered as an extra");

    let status = server.get(&format!("/api/discs/{disc_id}/rip-status")).await;
    status.assert_status_ok();
    let status: serde_json::Value = status.json();
    assert_eq!(status["total"], 1);
    assert_eq!(status["completed"], 0);
}

#[tokio::test]
async fn second_rip_is_refused_while_first_is_running() {
    let (server, _tmp) = common::build_app(None);

    let disc: serde_json::Value = server.post("/api/discs/detected").json(&movie_disc_payload()).await.json();
    let disc_id = disc["id"].as_str().unwrap().to_string();
    server
        .post(&format!("/api/discs/{disc_id}/preview/approve"))
        .json(&json!({"title_edits": []}))
        .await
        .assert_status_ok();

    let rip: serde_json::Value = server.post(&format!("/api/discs/{disc_id}/rip")).json(&json!({})).await.json();
    let job_id = rip["job_ids"][0].as_str().unwrap();

    server
        .patch(&format!("/api/jobs/{job_id}"))
        .json(&json!({"status": "running"}))
        .await
        .assert_status_ok();

    server
        .post(&format!("/api/discs/{disc_id}/rip"))
        .json(&json!({}))
        .await
        .assert_status(axum::http::StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn ejecting_an_unknown_drive_is_a_no_op() {
    let (server, _tmp) = common::build_app(None);
    server
        .post("/api/discs/ejected")
        .json(&json!({"agent_id": "agent-1", "drive": "/dev/sr0"}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn redetecting_the_same_drive_updates_the_disc_in_place() {
    let (server, _tmp) = common::build_app(None);

    let first: serde_json::Value = server.post("/api/discs/detected").json(&movie_disc_payload()).await.json();
    let first_id = first["id"].as_str().unwrap().to_string();

    let mut payload = movie_disc_payload();
    payload["disc_name"] = json!("SOME_MOVIE_2020_RESCAN");
    let second = server.post("/api/discs/detected").json(&payload).await;
    second.assert_status_ok();
    let second: serde_json::Value = second.json();

    assert_eq!(second["id"], first_id, "re-detecting the same drive must not allocate a second disc");
    assert_eq!(second["name"], "SOME_MOVIE_2020_RESCAN");

    // the prior disc row was updated, not orphaned
    let fetched = server.get(&format!("/api/discs/{first_id}")).await;
    fetched.assert_status_ok();
    let fetched: serde_json::Value = fetched.json();
    assert_eq!(fetched["name"], "SOME_MOVIE_2020_RESCAN");
}

#[tokio::test]
async fn rip_on_a_rejected_disc_reports_preview_rejected() {
    let (server, _tmp) = common::build_app(None);

    let disc: serde_json::Value = server.post("/api/discs/detected").json(&movie_disc_payload()).await.json();
    let disc_id = disc["id"].as_str().unwrap().to_string();
    server.post(&format!("/api/discs/{disc_id}/preview/reject")).await.assert_status_ok();

    let rip = server.post(&format!("/api/discs/{disc_id}/rip")).json(&json!({})).await;
    rip.assert_status_bad_request();
    let body: serde_json::Value = rip.json();
    assert_eq!(body["error"]["message"], "preview rejected");
}

#[tokio::test]
async fn season_update_is_refused_while_a_job_for_the_disc_is_running() {
    let (server, _tmp) = common::build_app(None);

    let disc: serde_json::Value = server.post("/api/discs/detected").json(&movie_disc_payload()).await.json();
    let disc_id = disc["id"].as_str().unwrap().to_string();
    server
        .post(&format!("/api/discs/{disc_id}/preview/approve"))
        .json(&json!({"title_edits": []}))
        .await
        .assert_status_ok();
    let rip: serde_json::Value = server.post(&format!("/api/discs/{disc_id}/rip")).json(&json!({})).await.json();
    let job_id = rip["job_ids"][0].as_str().unwrap();
    server
        .patch(&format!("/api/jobs/{job_id}"))
        .json(&json!({"status": "running"}))
        .await
        .assert_status_ok();

    server
        .post(&format!("/api/discs/{disc_id}/preview/update-season"))
        .json(&json!({"season_number": 2, "starting_episode": 1}))
        .await
        .assert_status_bad_request();
}
