//! End-to-end flow: load the cipher list, pick the custom cipher, edit, audit.

mod common;

use cipherscore::{
    ApiClient, CipherList, Phase, Session, SourceEditor, ViewState, CUSTOM_CIPHER_ID,
    DEFAULT_CUSTOM_SOURCE,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use common::closed_port_uri;
use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

async fn mount_ciphers(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/ciphers"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "xor", "name": "Simple XOR (Test)"},
            {"id": "simon", "name": "Simon-64/128 (NSA Lightweight)"},
            {"id": "custom", "name": "Custom (Paste Code)"}
        ])))
        .mount(server)
        .await;
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

#[tokio::test]
async fn custom_cipher_round_trip() {
    let server = MockServer::start().await;
    mount_ciphers(&server).await;
    Mock::given(method("POST"))
        .and(path("/audit"))
        .and(body_partial_json(json!({"cipher_id": "custom", "rounds": 1000})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cipher_name": "My Experimental Cipher",
            "report": {
                "Avalanche Score": "1.56%",
                "Encryption Speed (ms)": "0.0009 ms",
                "Peak Memory (KB)": "0.33 KB",
                "Attack Status": "Skipped (Lib not found)"
            }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&server.uri()).unwrap();
    let mut session = Session::default();
    session.load_ciphers(&client).await;
    assert!(matches!(
        session.ciphers(),
        CipherList::Loaded(list) if list.iter().any(|c| c.is_custom())
    ));
    assert_eq!(session.selected_cipher(), Some("xor"));

    session.select_cipher(CUSTOM_CIPHER_ID);
    assert!(session.editor_visible());
    assert!(!session.custom_code().trim().is_empty());
    assert_eq!(session.custom_code(), DEFAULT_CUSTOM_SOURCE);

    let mut editor = SourceEditor::new();
    for code in [
        KeyCode::Char('#'),
        KeyCode::Char(' '),
        KeyCode::Char('v'),
        KeyCode::Char('2'),
        KeyCode::Enter,
    ] {
        if let Some(text) = editor.handle_key(session.custom_code(), &key(code)) {
            session.set_custom_code(text);
        }
    }
    let edited = session.custom_code().to_string();
    assert!(edited.starts_with("# v2\nclass MyCustomCipher"));

    assert!(session.submit(&client).await);
    assert_eq!(session.phase(), Phase::Success);
    assert_eq!(session.report_title(), Some("My Experimental Cipher"));
    assert_eq!(session.report().unwrap().summary().avalanche, "1.56%");

    assert_eq!(session.selected_cipher(), Some(CUSTOM_CIPHER_ID));
    assert_eq!(session.custom_code(), edited);
    assert!(session.editor_visible());

    let requests = server.received_requests().await.unwrap();
    let audit = requests
        .iter()
        .find(|r| r.url.path() == "/audit")
        .expect("audit request sent");
    let body: serde_json::Value = serde_json::from_slice(&audit.body).unwrap();
    assert_eq!(body["custom_code"], json!(edited));
}

#[tokio::test]
async fn failed_audit_then_retry_succeeds() {
    let server = MockServer::start().await;
    mount_ciphers(&server).await;
    Mock::given(method("POST"))
        .and(path("/audit"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Cipher ID not found."})),
        )
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/audit"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cipher_name": "Simon",
            "report": {"Avalanche Score": "50.02%"}
        })))
        .mount(&server)
        .await;

    let client = ApiClient::with_base_url(&server.uri()).unwrap();
    let mut session = Session::default();
    session.load_ciphers(&client).await;
    session.select_cipher("simon");

    session.submit(&client).await;
    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(session.error().unwrap().to_string(), "Cipher ID not found.");
    assert!(session.can_submit());

    session.submit(&client).await;
    assert_eq!(session.phase(), Phase::Success);
    assert!(session.error().is_none());
}

#[tokio::test]
async fn unreachable_backend_leaves_ui_usable() {
    let uri = closed_port_uri();

    let client = ApiClient::with_base_url(&uri).unwrap();
    let mut session = Session::new(1000, Some("present".to_string()), None);
    session.load_ciphers(&client).await;
    assert_eq!(session.ciphers(), &CipherList::Failed);
    assert_eq!(
        session.error().unwrap().to_string(),
        "Failed to load ciphers. Is backend running?"
    );

    let mut view = ViewState::default();
    view.handle_key(&mut session, key(KeyCode::Tab));
    view.handle_key(&mut session, key(KeyCode::Right));
    assert_eq!(session.rounds(), 1100);

    session.submit(&client).await;
    assert_eq!(session.phase(), Phase::Failed);
    assert_eq!(
        session.error().unwrap().to_string(),
        "Audit failed due to network or server error."
    );
}
