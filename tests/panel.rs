//! Integration tests for the panel against a mocked daemon.
//! Covers authentication, result rendering, failure surfacing, busy
//! accounting, draft persistence and config round-trips.

use mockito::Matcher;
use ollama_remote_panel::{
    app::AppState,
    drafts::{DraftStore, LAST_MODEL_KEY, LAST_PROMPT_KEY},
    panel::{CallStatus, Intent, Panel},
    remote_api::{ConfigUpdate, RemoteClient},
};
use serde_json::json;
use url::Url;

const TOKEN: &str = "s3cret";

fn client_for(url: &str) -> RemoteClient {
    RemoteClient::new(Url::parse(url).unwrap(), TOKEN)
}

fn token_query() -> Matcher {
    Matcher::UrlEncoded("t".into(), TOKEN.into())
}

fn panel_for(url: &str) -> Panel {
    Panel::new(client_for(url), DraftStore::in_memory(), AppState::new())
}

const LIST_BODY: &str = "NAME            ID              SIZE      MODIFIED\n\
llama3:latest   365c0bd3c000    4.7 GB    2 days ago\n\
qwen2:7b        dd314f039b9d    4.4 GB    3 weeks ago\n";

#[tokio::test]
async fn test_token_sent_in_header_and_query() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/list")
        .match_header("x-token", TOKEN)
        .match_query(token_query())
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(json!({ "output": "", "exitCode": 0 }).to_string())
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let status = panel.execute(Intent::ListModels).await;

    mock.assert_async().await;
    assert_eq!(status, CallStatus::Succeeded { exit_code: Some(0) });
}

#[tokio::test]
async fn test_list_parses_models_and_renders_output() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/list")
        .match_query(token_query())
        .with_status(200)
        .with_body(json!({ "output": LIST_BODY, "exitCode": 0 }).to_string())
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    panel.execute(Intent::ListModels).await;

    let state = panel.state();
    let names: Vec<&str> = state.models.iter().map(|m| m.name.as_str()).collect();
    assert_eq!(names, ["llama3:latest", "qwen2:7b"]);
    assert_eq!(state.models[0].size.as_deref(), Some("4.7 GB"));
    assert!(state.output.starts_with("[list]\nexitCode: 0\n\nNAME"));
    assert_eq!(state.selected, Some(0));
    assert!(!panel.is_busy());
}

#[tokio::test]
async fn test_daemon_error_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/run")
        .match_query(token_query())
        .match_body(Matcher::Json(json!({ "model": "llama3", "prompt": "hi" })))
        .with_status(500)
        .with_body(json!({ "error": "boom", "exitCode": 1 }).to_string())
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let status = panel
        .execute(Intent::RunPrompt {
            model: "llama3".into(),
            prompt: "hi".into(),
        })
        .await;

    assert_eq!(status, CallStatus::Failed);
    let state = panel.state();
    assert_eq!(state.output, "[run]\nERROR: boom\nexitCode: 1");
    assert_eq!(state.notice_text(), Some("boom"));
    assert_eq!(panel.busy_count(), 0);
}

#[tokio::test]
async fn test_non_json_error_falls_back_to_status() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/pull")
        .match_query(token_query())
        .with_status(401)
        .with_body("unauthorized")
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let status = panel
        .execute(Intent::PullModel {
            model: "llama3".into(),
        })
        .await;

    assert_eq!(status, CallStatus::Failed);
    assert_eq!(panel.state().notice_text(), Some("HTTP 401"));
    assert!(panel.state().output.contains("ERROR: HTTP 401"));
}

#[tokio::test]
async fn test_transport_failure_releases_busy() {
    let mut panel = panel_for("http://127.0.0.1:1/");
    let status = panel
        .execute(Intent::RunPrompt {
            model: "llama3".into(),
            prompt: "hi".into(),
        })
        .await;

    assert_eq!(status, CallStatus::Failed);
    let state = panel.state();
    assert!(state.output.starts_with("[run]\nERROR: "));
    assert!(state.output.ends_with("exitCode: 1"));
    assert!(state.notice_text().is_some());
    assert!(!panel.is_busy());
}

#[tokio::test]
async fn test_transport_failure_hides_token() {
    let mut panel = panel_for("http://127.0.0.1:1/");
    let status = panel.execute(Intent::ListModels).await;

    assert_eq!(status, CallStatus::Failed);
    let state = panel.state();
    assert!(state.output.contains("ERROR: "));
    assert!(!state.output.contains(TOKEN));
    let notice = state.notice_text().unwrap();
    assert!(!notice.is_empty());
    assert!(!notice.contains(TOKEN));
}

#[tokio::test]
async fn test_failed_list_keeps_models() {
    let mut server = mockito::Server::new_async().await;
    let ok = server
        .mock("POST", "/api/list")
        .match_query(token_query())
        .with_status(200)
        .with_body(json!({ "output": LIST_BODY, "exitCode": 0 }).to_string())
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    panel.execute(Intent::ListModels).await;
    ok.assert_async().await;
    ok.remove_async().await;
    let before = panel.state().models.clone();
    assert_eq!(before.len(), 2);

    let _down = server
        .mock("POST", "/api/list")
        .match_query(token_query())
        .with_status(503)
        .with_body(json!({ "error": "daemon down" }).to_string())
        .create_async()
        .await;

    let status = panel.execute(Intent::ListModels).await;

    assert_eq!(status, CallStatus::Failed);
    let state = panel.state();
    assert_eq!(state.output, "[list]\nERROR: daemon down\nexitCode: 1");
    assert_eq!(state.notice_text(), Some("daemon down"));
    assert_eq!(state.models, before);
    assert_eq!(panel.busy_count(), 0);
}

#[tokio::test]
async fn test_failed_config_load_is_surfaced() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/config")
        .match_query(token_query())
        .with_status(500)
        .with_body(json!({ "error": "config unreadable" }).to_string())
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let status = panel.execute(Intent::LoadConfig).await;

    assert_eq!(status, CallStatus::Failed);
    let state = panel.state();
    assert_eq!(state.output, "[config]\nERROR: config unreadable\nexitCode: 1");
    assert_eq!(state.notice_text(), Some("config unreadable"));
    assert!(state.config.is_none());
    assert_eq!(panel.busy_count(), 0);
}

#[tokio::test]
async fn test_malformed_success_body_is_empty_result() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/run")
        .match_query(token_query())
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let status = panel
        .execute(Intent::RunPrompt {
            model: "m".into(),
            prompt: "p".into(),
        })
        .await;

    assert_eq!(status, CallStatus::Succeeded { exit_code: None });
    assert_eq!(panel.state().output, "[run]");
}

#[tokio::test]
async fn test_drafts_written_before_call_resolves() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ui-state.json");
    let mut panel = Panel::new(
        client_for("http://127.0.0.1:1/"),
        DraftStore::open(&path),
        AppState::new(),
    );

    let pending = panel.begin(Intent::RunPrompt {
        model: "llama3".into(),
        prompt: "why is the sky blue".into(),
    });

    let on_disk = DraftStore::open(&path);
    assert_eq!(on_disk.get(LAST_MODEL_KEY), "llama3");
    assert_eq!(on_disk.get(LAST_PROMPT_KEY), "why is the sky blue");
    assert!(panel.is_busy());

    let completion = pending.resolve().await;
    panel.finish(completion);
    assert!(!panel.is_busy());
}

#[test]
fn test_drafts_restored_at_startup() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ui-state.json");
    let mut store = DraftStore::open(&path);
    store
        .set_all(&[(LAST_MODEL_KEY, "qwen2:7b"), (LAST_PROMPT_KEY, "hello")])
        .unwrap();

    let panel = Panel::new(
        client_for("http://127.0.0.1:1/"),
        DraftStore::open(&path),
        AppState::new(),
    );
    let state = panel.state();
    assert_eq!(state.run_model, "qwen2:7b");
    assert_eq!(state.pull_model, "qwen2:7b");
    assert_eq!(state.prompt, "hello");
}

#[tokio::test]
async fn test_overlapping_calls_share_busy_count() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/api/run")
        .match_query(token_query())
        .with_status(200)
        .with_body(json!({ "output": "ok", "exitCode": 0 }).to_string())
        .expect(2)
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let first = panel.begin(Intent::RunPrompt {
        model: "a".into(),
        prompt: "1".into(),
    });
    let second = panel.begin(Intent::RunPrompt {
        model: "b".into(),
        prompt: "2".into(),
    });
    assert_eq!(panel.busy_count(), 2);

    let (a, b) = tokio::join!(first.resolve(), second.resolve());
    mock.assert_async().await;
    let done = CallStatus::Succeeded { exit_code: Some(0) };
    assert_eq!(panel.finish(a), done);
    assert!(panel.is_busy());
    assert_eq!(panel.finish(b), done);
    assert_eq!(panel.busy_count(), 0);
}

#[tokio::test]
async fn test_stale_list_result_is_discarded() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/api/list")
        .match_query(token_query())
        .with_status(200)
        .with_body(json!({ "output": LIST_BODY, "exitCode": 0 }).to_string())
        .expect(2)
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let older = panel.begin(Intent::ListModels);
    let newer = panel.begin(Intent::ListModels);
    let (older, newer) = tokio::join!(older.resolve(), newer.resolve());

    assert!(matches!(panel.finish(newer), CallStatus::Succeeded { .. }));
    assert_eq!(panel.finish(older), CallStatus::Discarded);
    assert_eq!(panel.state().models.len(), 2);
    assert!(!panel.is_busy());
}

#[tokio::test]
async fn test_save_config_reloads_snapshot() {
    let mut server = mockito::Server::new_async().await;
    let set = server
        .mock("POST", "/api/config/set")
        .match_query(token_query())
        .match_body(Matcher::Json(json!({ "mode": "native", "unsafe": true })))
        .with_status(200)
        .with_body(r#"{"ok":true}"#)
        .create_async()
        .await;
    let get = server
        .mock("GET", "/api/config")
        .match_query(token_query())
        .with_status(200)
        .with_body(
            json!({
                "configPath": "/home/op/.ollama-remote/config.json",
                "host": "0.0.0.0:8080",
                "mode": "native",
                "selectedMode": "native",
                "unsafe": true
            })
            .to_string(),
        )
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let status = panel
        .execute(Intent::SaveConfig(ConfigUpdate {
            mode: Some("native".into()),
            unsafe_mode: Some(true),
            ..ConfigUpdate::default()
        }))
        .await;

    set.assert_async().await;
    get.assert_async().await;
    assert!(matches!(status, CallStatus::Succeeded { .. }));
    let state = panel.state();
    assert_eq!(state.output, "Saved");
    assert_eq!(state.notice_text(), Some("Saved"));
    assert_eq!(state.host_chip(), "host: 0.0.0.0:8080");
    assert_eq!(state.mode_chip(), "mode: native");
    assert!(state.settings.unsafe_mode);
}

#[tokio::test]
async fn test_rejected_save_skips_reload() {
    let mut server = mockito::Server::new_async().await;
    let _set = server
        .mock("POST", "/api/config/set")
        .match_query(token_query())
        .with_status(403)
        .with_body(json!({ "error": "forbidden" }).to_string())
        .create_async()
        .await;
    let get = server
        .mock("GET", "/api/config")
        .match_query(token_query())
        .expect(0)
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    let status = panel
        .execute(Intent::SaveConfig(ConfigUpdate::default()))
        .await;

    get.assert_async().await;
    assert_eq!(status, CallStatus::Failed);
    assert_eq!(panel.state().output, "[config]\nERROR: forbidden\nexitCode: 1");
    assert!(panel.state().config.is_none());
}

#[tokio::test]
async fn test_load_config_updates_chips() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("GET", "/api/config")
        .match_query(token_query())
        .with_status(200)
        .with_body(json!({ "host": "", "mode": "wrapper" }).to_string())
        .create_async()
        .await;

    let mut panel = panel_for(&server.url());
    assert_eq!(panel.state().mode_chip(), "mode: auto");

    panel.execute(Intent::LoadConfig).await;

    let state = panel.state();
    assert_eq!(state.host_chip(), "host: —");
    assert_eq!(state.mode_chip(), "mode: wrapper");
    assert_eq!(state.output, ollama_remote_panel::app::EMPTY_OUTPUT);
}
