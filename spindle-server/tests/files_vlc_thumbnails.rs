use serde_json::json;

#[path = "common.rs"]
mod common;

#[tokio::test]
async fn vlc_queue_then_poll_flips_to_sent_then_report_result() {
    let (server, _tmp) = common::build_app(None);

    server
        .post("/api/vlc/queue")
        .json(&json!({"agent_id": "agent-1", "file_path": "/media/preview.mkv", "fullscreen": true}))
        .await
        .assert_status_ok();

    let first_poll: serde_json::Value = server.get("/api/vlc/commands/agent-1").await.json();
    let commands = first_poll["commands"].as_array().unwrap();
    assert_eq!(commands.len(), 1);
    assert_eq!(commands[0]["status"], "sent");
    let command_id = commands[0]["id"].as_str().unwrap().to_string();

    // A second poll finds nothing new to flip.
    let second_poll: serde_json::Value = server.get("/api/vlc/commands/agent-1").await.json();
    assert!(second_poll["commands"].as_array().unwrap().is_empty());

    server
        .post(&format!("/api/vlc/commands/{command_id}/result"))
        .json(&json!({"success": true, "error": null}))
        .await
        .assert_status_ok();
}

#[tokio::test]
async fn upload_stages_file_and_runs_the_organizer() {
    let (server, tmp) = common::build_app(None);

    let bytes = b"not a real video, just test bytes".to_vec();
    let form = axum_test::multipart::MultipartForm::new()
        .add_text("name", "Some.Show.S01E02.mkv")
        .add_part("file", axum_test::multipart::Part::bytes(bytes).file_name("Some.Show.S01E02.mkv"));

    let response = server.post("/api/files/upload").multipart(form).await;
    response.assert_status_ok();
    let body: serde_json::Value = response.json();
    assert_eq!(body["path"], tmp.path().join(".incoming").join("Some.Show.S01E02.mkv").display().to_string());
}

#[tokio::test]
async fn thumbnail_lookup_for_missing_file_is_not_found() {
    let (server, _tmp) = common::build_app(None);
    server.get("/api/thumbnails/some-disc/doesnt-exist.jpg").await.assert_status_not_found();
}
