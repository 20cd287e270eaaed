//! End-to-end tests: the real MCP server on an ephemeral port, queried
//! through `CatalogClient`.
//!
//! Most tests serve an in-memory store so each one controls its catalog
//! exactly; `test_sqlite_server_end_to_end` runs the full
//! `run_server_with_extensions` path against a seeded SQLite file.

use async_trait::async_trait;
use beverage_mcp::client::CatalogClient;
use beverage_mcp::config::{Config, DbConfig, McpClientConfig};
use beverage_mcp::error::{ConfigurationError, InvokeError};
use beverage_mcp::server::{router, run_server_with_extensions};
use beverage_mcp::sqlite_store::SqliteStore;
use beverage_mcp::{db, migrate};
use beverage_mcp::tools::{Tool, ToolArgs, ToolContext, ToolError, ToolRegistry};
use beverage_mcp_core::models::{Beverage, BeverageDraft};
use beverage_mcp_core::store::memory::InMemoryStore;
use beverage_mcp_core::store::CatalogStore;
use serde_json::{json, Value};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::TempDir;

// ─── Test Tools ─────────────────────────────────────────────────────

/// Replaces a built-in and answers with a fixed text payload.
struct FixedTextTool {
    name: &'static str,
    text: &'static str,
}

#[async_trait]
impl Tool for FixedTextTool {
    fn name(&self) -> &str {
        self.name
    }

    fn description(&self) -> &str {
        "Returns a fixed payload"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
        Ok(self.text.to_string())
    }
}

/// Never answers within any reasonable client timeout.
struct SlowTool;

#[async_trait]
impl Tool for SlowTool {
    fn name(&self) -> &str {
        "list_all"
    }

    fn description(&self) -> &str {
        "Sleeps before answering"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        Ok("[]".to_string())
    }
}

/// Fails the way a broken store would.
struct FailingTool;

#[async_trait]
impl Tool for FailingTool {
    fn name(&self) -> &str {
        "list_all"
    }

    fn description(&self) -> &str {
        "Always fails"
    }

    fn parameters_schema(&self) -> Value {
        json!({ "type": "object", "properties": {} })
    }

    async fn execute(&self, _args: &ToolArgs, _ctx: &ToolContext) -> Result<String, ToolError> {
        Err(ToolError::Store(anyhow::anyhow!("catalog offline")))
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

fn find_free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

async fn wait_for_server(port: u16) {
    let client = reqwest::Client::new();
    let url = format!("http://127.0.0.1:{}/health", port);
    for _ in 0..50 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if let Ok(resp) = client.get(&url).send().await {
            if resp.status().is_success() {
                return;
            }
        }
    }
    panic!("Server did not become ready within 5 seconds");
}

/// Serve `store` with the built-in tools plus `extra`, returning the port.
async fn spawn_server(store: Arc<dyn CatalogStore>, extra: Vec<Box<dyn Tool>>) -> u16 {
    let mut tools = ToolRegistry::with_builtins();
    for t in extra {
        tools.register(t);
    }
    let app = router(store, Arc::new(tools), "/mcp");

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    wait_for_server(port).await;
    port
}

fn client_for(port: u16) -> CatalogClient {
    CatalogClient::new(&McpClientConfig::with_endpoint(format!(
        "http://127.0.0.1:{}/mcp",
        port
    )))
    .unwrap()
}

fn drinks(names: &[(&str, &str)]) -> Arc<dyn CatalogStore> {
    Arc::new(InMemoryStore::with_drafts(
        names
            .iter()
            .map(|(name, category)| BeverageDraft::new(*name, *category)),
    ))
}

fn names(records: &[Beverage]) -> Vec<&str> {
    records.iter().map(|b| b.display_name()).collect()
}

fn args(pairs: &[(&str, Value)]) -> ToolArgs {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}

/// Log sink for asserting on what the client reports.
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

async fn sqlite_store_with(tmp: &TempDir, drafts: &[BeverageDraft]) -> Arc<dyn CatalogStore> {
    let pool = db::connect(&DbConfig {
        path: tmp.path().join("catalog.sqlite"),
    })
    .await
    .unwrap();
    migrate::migrate_schema(&pool).await.unwrap();
    migrate::seed_if_empty(&pool, drafts).await.unwrap();
    Arc::new(SqliteStore::new(pool))
}

// ─── Tests ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_search_by_name_is_case_insensitive_substring() {
    let port = spawn_server(
        drinks(&[("Cola", "Soda"), ("Lemonade", "Juice"), ("Cold Brew", "Coffee")]),
        vec![],
    )
    .await;
    let client = client_for(port);

    let found = client.search_by_name("co").await;
    assert_eq!(names(&found), vec!["Cola", "Cold Brew"]);
}

#[tokio::test]
async fn test_search_results_are_sound_and_complete() {
    let port = spawn_server(
        drinks(&[
            ("Iced Latte", "Coffee"),
            ("Latte Macchiato", "Coffee"),
            ("Lemonade", "Juice"),
            ("Chocolate Milk", "Chocolate"),
            ("oat LATTE", "Coffee"),
        ]),
        vec![],
    )
    .await;
    let client = client_for(port);

    let all = client.get_all().await;
    let found = client.search_by_name("latte").await;

    for b in &found {
        assert!(b.display_name().to_lowercase().contains("latte"));
    }
    let expected: Vec<&Beverage> = all
        .iter()
        .filter(|b| b.display_name().to_lowercase().contains("latte"))
        .collect();
    assert_eq!(found.len(), expected.len());
    assert_eq!(found.len(), 3);
}

#[tokio::test]
async fn test_list_all_is_stable() {
    let port = spawn_server(
        drinks(&[("Kvass", "Traditional"), ("Ayran", "Traditional"), ("Cola", "Soda")]),
        vec![],
    )
    .await;
    let client = client_for(port);

    let first = client.get_all().await;
    let second = client.get_all().await;
    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
    assert!(first.windows(2).all(|w| w[0].id < w[1].id));
}

#[tokio::test]
async fn test_empty_store_lists_nothing() {
    let port = spawn_server(Arc::new(InMemoryStore::new()), vec![]).await;
    let client = client_for(port);

    assert!(client.get_all().await.is_empty());
    assert!(client
        .try_invoke("list_all", &ToolArgs::new())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_unknown_category_is_empty() {
    let port = spawn_server(drinks(&[("Cola", "Soda"), ("Espresso", "Coffee")]), vec![]).await;
    let client = client_for(port);

    assert!(client.filter_by_category("tea").await.is_empty());
    let coffee = client.filter_by_category("COFFEE").await;
    assert_eq!(names(&coffee), vec!["Espresso"]);
}

#[tokio::test]
async fn test_blank_terms_fall_back_to_all() {
    let port = spawn_server(
        drinks(&[("Cola", "Soda"), ("Lemonade", "Juice"), ("Chai", "Tea")]),
        vec![],
    )
    .await;
    let client = client_for(port);

    let all = client.get_all().await;
    assert_eq!(all.len(), 3);
    assert_eq!(client.search_by_name("").await, all);
    assert_eq!(client.search_by_name("   \t").await, all);
    assert_eq!(client.filter_by_category(" ").await, all);
    assert_eq!(client.beverages(Some(" "), None).await, all);
}

#[tokio::test]
async fn test_beverages_selection_policy() {
    let port = spawn_server(
        drinks(&[("Cola", "Soda"), ("Chai", "Tea"), ("Iced Tea", "Tea")]),
        vec![],
    )
    .await;
    let client = client_for(port);

    // search wins over category
    let r = client.beverages(Some("cola"), Some("Tea")).await;
    assert_eq!(names(&r), vec!["Cola"]);

    let r = client.beverages(None, Some("tea")).await;
    assert_eq!(names(&r), vec!["Chai", "Iced Tea"]);

    let r = client.beverages(None, None).await;
    assert_eq!(r.len(), 3);
}

#[tokio::test]
async fn test_unreachable_endpoint_returns_empty() {
    let port = find_free_port();
    let client = client_for(port);

    assert!(client.get_all().await.is_empty());
    assert!(client.search_by_name("cola").await.is_empty());
    let err = client
        .try_invoke("list_all", &ToolArgs::new())
        .await
        .unwrap_err();
    assert!(matches!(err, InvokeError::Connection(_)), "got {:?}", err);
}

#[tokio::test]
async fn test_malformed_payload_returns_empty() {
    let port = spawn_server(
        drinks(&[("Cola", "Soda")]),
        vec![Box::new(FixedTextTool {
            name: "list_all",
            text: "[{\"id\": 1, \"name\": \"Cola\"",
        })],
    )
    .await;
    let client = client_for(port);

    let logs = CapturedLogs::default();
    let sink = logs.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || sink.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);

    assert!(client.get_all().await.is_empty());
    drop(guard);

    let out = logs.contents();
    assert!(out.contains("WARN"), "{}", out);
    assert!(out.contains("list_all"), "{}", out);
    assert!(out.contains("decode"), "{}", out);

    let err = client
        .try_invoke("list_all", &ToolArgs::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "decode");
}

#[tokio::test]
async fn test_key_case_does_not_matter_on_the_wire() {
    let port = spawn_server(
        Arc::new(InMemoryStore::new()),
        vec![
            Box::new(FixedTextTool {
                name: "list_all",
                text: r#"[{"id":7,"name":"Kefir","category":"Fermented","primaryIngredient":"Milk","originRegion":"Caucasus","caloriesPerServing":110}]"#,
            }),
            Box::new(FixedTextTool {
                name: "shouting",
                text: r#"[{"ID":7,"NAME":"Kefir","Category":"Fermented","PRIMARYINGREDIENT":"Milk","OriginRegion":"Caucasus","CALORIESPERSERVING":110}]"#,
            }),
        ],
    )
    .await;
    let client = client_for(port);

    let exact = client.get_all().await;
    let shouted = client.invoke("shouting", &ToolArgs::new()).await;
    assert_eq!(exact.len(), 1);
    assert_eq!(exact, shouted);
}

#[tokio::test]
async fn test_blank_payload_is_empty_not_error() {
    let port = spawn_server(
        Arc::new(InMemoryStore::new()),
        vec![Box::new(FixedTextTool {
            name: "list_all",
            text: "  ",
        })],
    )
    .await;
    let client = client_for(port);

    assert!(client
        .try_invoke("list_all", &ToolArgs::new())
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_remote_errors_are_classified() {
    let port = spawn_server(drinks(&[("Cola", "Soda")]), vec![Box::new(FailingTool)]).await;
    let client = client_for(port);

    // unknown tool
    let err = client
        .try_invoke("no_such_tool", &ToolArgs::new())
        .await
        .unwrap_err();
    assert!(
        matches!(err, InvokeError::RemoteInvocation { code: Some(_), .. }),
        "got {:?}",
        err
    );

    // bad argument
    let err = client
        .try_invoke("get_by_id", &args(&[("id", json!("seven"))]))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "remote_invocation");

    // missing argument
    let err = client
        .try_invoke("search_by_name", &ToolArgs::new())
        .await
        .unwrap_err();
    assert_eq!(err.kind(), "remote_invocation");

    // tool failure surfaces as isError
    let err = client
        .try_invoke("list_all", &ToolArgs::new())
        .await
        .unwrap_err();
    match err {
        InvokeError::RemoteInvocation { code, message } => {
            assert_eq!(code, None);
            assert!(message.contains("catalog offline"));
        }
        other => panic!("unexpected {:?}", other),
    }

    // and the swallowing entry point still yields a list
    assert!(client.invoke("no_such_tool", &ToolArgs::new()).await.is_empty());
}

#[tokio::test]
async fn test_timeout_is_a_connection_error() {
    let port = spawn_server(Arc::new(InMemoryStore::new()), vec![Box::new(SlowTool)]).await;
    let client = CatalogClient::new(&McpClientConfig {
        server_endpoint: Some(format!("http://127.0.0.1:{}/mcp", port)),
        timeout_secs: 1,
    })
    .unwrap();

    let started = std::time::Instant::now();
    let err = client
        .try_invoke("list_all", &ToolArgs::new())
        .await
        .unwrap_err();
    assert!(started.elapsed() < Duration::from_secs(10));
    match err {
        InvokeError::Connection(msg) => assert!(msg.contains("timed out")),
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_typed_convenience_calls() {
    let store = InMemoryStore::new();
    store.insert(
        BeverageDraft::new("Horchata", "Traditional")
            .ingredient("Rice")
            .origin("Mexico")
            .calories(120),
    );
    store.insert(
        BeverageDraft::new("Sikhye", "Traditional")
            .ingredient("Rice")
            .origin("South Korea")
            .calories(140),
    );
    store.insert(BeverageDraft::new("Barley Tea", "Tea").origin("South Korea"));
    let port = spawn_server(Arc::new(store), vec![]).await;
    let client = client_for(port);

    let horchata = client.get_by_id(1).await.unwrap();
    assert_eq!(horchata.name.as_deref(), Some("Horchata"));
    assert_eq!(horchata.calories_per_serving, Some(120));
    assert!(client.get_by_id(99).await.is_none());

    assert_eq!(client.filter_by_ingredient("rice").await.len(), 2);
    assert_eq!(
        names(&client.filter_by_origin("korea").await),
        vec!["Sikhye", "Barley Tea"]
    );
    // unset calories never pass a ceiling
    assert_eq!(
        names(&client.filter_by_max_calories(130).await),
        vec!["Horchata"]
    );
}

#[tokio::test]
async fn test_health_reports_count() {
    let port = spawn_server(drinks(&[("Cola", "Soda"), ("Chai", "Tea")]), vec![]).await;

    let body: Value = reqwest::get(format!("http://127.0.0.1:{}/health", port))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
    assert_eq!(body["beverageCount"], 2);
    assert_eq!(body["mcpEndpoint"], "/mcp");
}

#[tokio::test]
async fn test_missing_endpoint_fails_before_any_call() {
    let err = CatalogClient::new(&McpClientConfig::default()).err().unwrap();
    assert!(matches!(err, ConfigurationError::MissingEndpoint));
}

#[tokio::test]
async fn test_sqlite_filters_fold_case_beyond_ascii() {
    let tmp = TempDir::new().unwrap();
    let store = sqlite_store_with(
        &tmp,
        &[
            BeverageDraft::new("Café de Olla", "Coffee")
                .ingredient("Coffee")
                .origin("México")
                .calories(90),
            BeverageDraft::new("Açaí Smoothie", "Smoothie")
                .ingredient("Açaí")
                .origin("Pará, Brasil")
                .calories(210),
            BeverageDraft::new("ICED CAFÉ", "coffee")
                .ingredient("Espresso")
                .origin("MÉXICO CITY")
                .calories(60),
            BeverageDraft::new("Horchata", "Traditional")
                .ingredient("rice")
                .origin("mexico"),
        ],
    )
    .await;
    let port = spawn_server(store, vec![]).await;
    let client = client_for(port);

    let all = client.get_all().await;
    assert_eq!(all.len(), 4);

    let cases: [(&str, &str, fn(&Beverage) -> Option<&str>); 4] = [
        ("search_by_name", "café", |b| b.name.as_deref()),
        ("filter_by_ingredient", "AÇAÍ", |b| b.primary_ingredient.as_deref()),
        ("filter_by_origin", "méxico", |b| b.origin_region.as_deref()),
        ("filter_by_origin", "MEXICO", |b| b.origin_region.as_deref()),
    ];
    for (tool, term, field) in cases {
        let key = match tool {
            "search_by_name" => "name",
            "filter_by_ingredient" => "ingredient",
            _ => "origin",
        };
        let found = client.invoke(tool, &args(&[(key, json!(term))])).await;
        let needle = term.to_lowercase();
        let expected: Vec<Beverage> = all
            .iter()
            .filter(|b| field(*b).is_some_and(|v| v.to_lowercase().contains(&needle)))
            .cloned()
            .collect();
        assert!(!found.is_empty(), "{} {}", tool, term);
        assert_eq!(found, expected, "{} {}", tool, term);
    }

    assert_eq!(
        names(&client.search_by_name("CAFÉ").await),
        vec!["Café de Olla", "ICED CAFÉ"]
    );
    assert_eq!(
        names(&client.filter_by_category("COFFEE").await),
        vec!["Café de Olla", "ICED CAFÉ"]
    );
    assert_eq!(
        names(&client.filter_by_origin("MÉXICO").await),
        vec!["Café de Olla", "ICED CAFÉ"]
    );
}

#[tokio::test]
async fn test_sqlite_server_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let port = find_free_port();
    let cfg: Config = toml::from_str(&format!(
        r#"
[db]
path = "{}"

[server]
bind = "127.0.0.1:{}"
"#,
        tmp.path().join("bev.sqlite").display(),
        port
    ))
    .unwrap();

    let server_cfg = cfg.clone();
    tokio::spawn(async move {
        let _ = run_server_with_extensions(&server_cfg, ToolRegistry::new()).await;
    });
    wait_for_server(port).await;

    let client = client_for(port);
    let all = client.get_all().await;
    assert_eq!(all.len(), 33);

    let teas = client.filter_by_category("tea").await;
    assert!(teas.iter().all(|b| b.category.as_deref() == Some("Tea")));
    assert!(teas.iter().any(|b| b.display_name() == "Barley Tea"));

    let light = client.filter_by_max_calories(5).await;
    assert!(light
        .iter()
        .all(|b| b.calories_per_serving.is_some_and(|c| c <= 5)));
    assert!(!light.iter().any(|b| b.display_name() == "Barley Tea"));

    let espresso = client.get_by_id(1).await.unwrap();
    assert_eq!(espresso.display_name(), "Espresso");
}
