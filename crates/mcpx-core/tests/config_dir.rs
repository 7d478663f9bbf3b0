//! Store and cache sharing one configuration directory.

use mcpx_core::{Capability, ConfigStore, ResolvedPaths, SchemaCache, ServerConfig};
use serde_json::{Value, json};
use tempfile::tempdir;

#[test]
fn test_layout_under_config_dir() {
    let temp = tempdir().unwrap();
    let paths = ResolvedPaths::from_config_dir(temp.path().join("mcpx"));

    let mut store = ConfigStore::open(&paths.config_file).unwrap();
    store
        .add_server("time", ServerConfig::new("uvx", vec!["mcp-server-time".into()]))
        .unwrap();
    let cache = SchemaCache::new(&paths.cache_dir);
    cache.save("time", &[Capability::new("now")]).unwrap();

    assert!(paths.config_file.ends_with("mcpx/config.json"));
    assert_eq!(store.path(), paths.config_file.as_path());
    assert!(cache.path_for("time").ends_with("mcpx/cache/time.json"));

    let doc: Value =
        serde_json::from_str(&std::fs::read_to_string(&paths.config_file).unwrap()).unwrap();
    assert_eq!(doc["servers"]["time"]["command"], "uvx");
    assert_eq!(doc["servers"]["time"]["args"], json!(["mcp-server-time"]));
    assert_eq!(doc["cache_schemas"], true);
    assert_eq!(doc["llm"]["model"], "gpt-4o");
}

#[test]
fn test_removing_server_leaves_cache_to_the_caller() {
    let temp = tempdir().unwrap();
    let paths = ResolvedPaths::from_config_dir(temp.path().to_path_buf());
    let mut store = ConfigStore::open(&paths.config_file).unwrap();
    let cache = SchemaCache::new(&paths.cache_dir);

    store
        .add_server("fs", ServerConfig::new("npx", vec!["-y".into(), "server-fs".into()]))
        .unwrap();
    cache.save("fs", &[Capability::new("read_file")]).unwrap();

    assert!(store.remove_server("fs").unwrap());
    assert!(cache.load("fs").is_some());
    cache.invalidate("fs");
    assert!(cache.load("fs").is_none());
}
