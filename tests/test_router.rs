//! End-to-end routing through the assembled router, session and memory.

use std::fs;

use falcon_chat::config::Config;
use falcon_chat::llm::providers;
use falcon_chat::memory::{LongTermMemory, ShortTermHistory};
use falcon_chat::router::{Capabilities, ReplyKind, Router, SearchHandler};
use falcon_chat::session::Session;
use serde_json::json;
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Accepts one connection and answers `200 OK`; returns the listener's base URL.
async fn search_stub() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let mut buf = [0u8; 1024];
        let _ = sock.read(&mut buf).await;
        let _ = sock
            .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
            .await;
        let _ = sock.shutdown().await;
    });
    format!("http://{addr}")
}

fn mock_variant(cfg: &Config, search_base: Option<&str>) -> Router {
    let llm = providers::build(&cfg.llm, None).unwrap();
    let search = search_base.map(|base| {
        let client = reqwest::Client::builder().no_proxy().build().unwrap();
        SearchHandler::with_client(format!("{base}/search?q={{query}}"), client)
    });
    Router::new(cfg.router.capabilities, search, llm)
}

fn new_session(cfg: &Config) -> Session {
    Session::new(
        ShortTermHistory::new(cfg.memory.history_cap),
        LongTermMemory::load(cfg.memory.long_term_file.clone()).unwrap(),
    )
}

#[tokio::test]
async fn operator_inputs_never_reach_generation() {
    let dir = TempDir::new().unwrap();
    let cfg = Config::test_default(dir.path());
    let router = mock_variant(&cfg, None);
    let mut session = new_session(&cfg);

    for input in ["2+2", "what is 3*4", "a-b", "10/4", "hello-world"] {
        let reply = router.route(input, &mut session).await;
        assert_eq!(reply.kind, ReplyKind::Arithmetic, "{input}");
        assert!(!reply.text.contains("Mock response"), "{input}: {}", reply.text);
    }
}

#[tokio::test]
async fn two_plus_two() {
    let dir = TempDir::new().unwrap();
    let cfg = Config::test_default(dir.path());
    let router = mock_variant(&cfg, None);
    let mut session = new_session(&cfg);

    let reply = router.route("2+2", &mut session).await;
    assert!(reply.text.contains('4'));
    assert_eq!(session.history.to_vec(), vec!["Q: 2+2", "A: The answer is 4."]);
}

#[tokio::test]
async fn search_cats_embeds_query_in_link() {
    let dir = TempDir::new().unwrap();
    let cfg = Config::test_default(dir.path());
    let base = search_stub().await;
    let router = mock_variant(&cfg, Some(&base));
    let mut session = new_session(&cfg);

    let reply = router.route("search cats", &mut session).await;
    assert_eq!(reply.kind, ReplyKind::Search);
    assert!(reply.text.contains("q=cats"), "{}", reply.text);
    assert!(reply.text.starts_with("Here is a link to the search results: "));
}

#[tokio::test]
async fn search_capability_off_generates_instead() {
    let dir = TempDir::new().unwrap();
    let mut cfg = Config::test_default(dir.path());
    cfg.router.capabilities = Capabilities { arithmetic: true, web_search: false };
    let router = mock_variant(&cfg, None);
    let mut session = new_session(&cfg);

    let reply = router.route("search cats", &mut session).await;
    assert_eq!(reply.kind, ReplyKind::Generated);
    assert_eq!(reply.text, "Mock response for: search cats");
}

#[tokio::test]
async fn history_grows_to_cap_and_clear_spares_memory() {
    let dir = TempDir::new().unwrap();
    let cfg = Config::test_default(dir.path());
    let router = mock_variant(&cfg, None);
    let mut session = new_session(&cfg);
    session.memory.insert("favourite_colour", json!("green"));

    for n in 1..=4usize {
        router.route("hello", &mut session).await;
        assert_eq!(session.history.len(), (2 * n).min(5));
    }

    session.clear_history();
    assert!(session.history.is_empty());
    assert_eq!(session.memory.get("favourite_colour"), Some(&json!("green")));
}

#[test]
fn memory_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let cfg = Config::test_default(dir.path());
    let path = &cfg.memory.long_term_file;

    let empty = LongTermMemory::load(path.clone()).unwrap();
    assert!(empty.as_map().is_empty());

    fs::write(path, r#"{"a":1,"b":[true,null],"c":{"d":"e"}}"#).unwrap();
    let loaded = LongTermMemory::load(path.clone()).unwrap();
    loaded.save().unwrap();
    let reloaded = LongTermMemory::load(path.clone()).unwrap();
    assert_eq!(loaded.as_map(), reloaded.as_map());
}
