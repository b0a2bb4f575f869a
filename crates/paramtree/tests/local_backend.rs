use std::sync::Arc;

use paramtree::{LocalStore, ParameterPath, ParameterStore, ParameterTree, RateLimiter};
use pretty_assertions::assert_eq;
use serde_json::json;

struct Fixture {
    _dir: tempfile::TempDir,
    store: Arc<LocalStore>,
    tree: ParameterTree,
}

fn fixture(page_size: usize) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(
        LocalStore::open(dir.path().join("nested/dir/params.db"))
            .unwrap()
            .with_page_size(page_size),
    );
    let tree = ParameterTree::new(store.clone(), RateLimiter::per_second(1000));
    Fixture {
        _dir: dir,
        store,
        tree,
    }
}

fn path(name: &str) -> ParameterPath {
    ParameterPath::parse(name).unwrap()
}

#[tokio::test]
async fn test_write_then_read_round_trips() {
    let fx = fixture(3);
    let config = json!({
        "database": {"host": "db.internal", "port": 5432, "pool": {"min": 1, "max": 8}},
        "hosts": ["a", "b", "c"],
        "zero_padded": "007",
        "enabled": true
    });

    fx.tree.write("svc", &config).await.unwrap();
    assert_eq!(fx.tree.read("svc").await.unwrap(), config);
}

#[tokio::test]
async fn test_values_are_stored_json_encoded_and_plain() {
    let fx = fixture(10);
    fx.tree
        .write("svc", &json!({"num": 1, "text": "1"}))
        .await
        .unwrap();

    assert_eq!(
        fx.store.get_parameter(&path("/svc/num")).await.unwrap(),
        Some("1".to_string())
    );
    assert_eq!(
        fx.store.get_parameter(&path("/svc/text")).await.unwrap(),
        Some("\"1\"".to_string())
    );
    assert!(!fx.store.secure_by_default());
}

#[tokio::test]
async fn test_empty_string_removes_existing_key() {
    let fx = fixture(10);
    fx.tree
        .write("svc", &json!({"keep": 1, "drop": 2}))
        .await
        .unwrap();
    fx.tree
        .write("svc", &json!({"drop": "", "never_existed": ""}))
        .await
        .unwrap();

    assert_eq!(fx.tree.read("svc").await.unwrap(), json!({"keep": 1}));
}

#[tokio::test]
async fn test_overwrite_replaces_values() {
    let fx = fixture(10);
    fx.tree.write("svc", &json!({"level": "info"})).await.unwrap();
    fx.tree.write("svc", &json!({"level": "debug"})).await.unwrap();
    assert_eq!(fx.tree.read("svc").await.unwrap(), json!({"level": "debug"}));
}

#[tokio::test]
async fn test_read_skips_corrupt_values() {
    let fx = fixture(10);
    fx.tree.write("svc", &json!({"good": [1, 2]})).await.unwrap();
    fx.store
        .put_parameter(&path("/svc/bad"), "not-json", true, false)
        .await
        .unwrap();

    assert_eq!(fx.tree.read("svc").await.unwrap(), json!({"good": [1, 2]}));
}

#[tokio::test]
async fn test_delete_removes_only_prefix() {
    let fx = fixture(4);
    let many: serde_json::Map<String, serde_json::Value> =
        (0..25).map(|i| (format!("k{:02}", i), json!(i))).collect();
    fx.tree
        .write("svc", &serde_json::Value::Object(many))
        .await
        .unwrap();
    fx.tree.write("other", &json!({"x": 1})).await.unwrap();

    let summary = fx.tree.delete("svc").await.unwrap();
    assert_eq!(summary.deleted, 25);
    assert_eq!(summary.batches, 3);

    assert_eq!(fx.tree.read("svc").await.unwrap(), json!({}));
    assert_eq!(fx.tree.read("other").await.unwrap(), json!({"x": 1}));
}

#[tokio::test]
async fn test_from_config_opens_local_backend() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = paramconf::ParamConfig::default();
    config.local.db_path = dir.path().join("configured.db");
    config.local.requests_per_second = 50;

    let tree = ParameterTree::from_config(&config).await.unwrap();
    assert_eq!(tree.limiter().requests_per_second(), 50);
    assert_eq!(tree.store().backend(), paramtree::StoreBackend::Local);

    tree.write("app", &json!({"a": 1})).await.unwrap();
    assert_eq!(tree.read("app").await.unwrap(), json!({"a": 1}));
    assert!(config.local.db_path.exists());
}
