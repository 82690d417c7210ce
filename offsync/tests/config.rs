use offsync::{Bucket, Config, ConfigError, StorageKeys};
use pretty_assertions::assert_eq;

#[test]
fn yaml_overrides_only_given_fields() {
    let config = Config::from_yaml(
        r#"
api_prefix: /v1/
bucket_version: v2
static_extensions: [js, css, webp]
skip_waiting: false
storage_keys:
  auth_token: session
"#,
    )
    .unwrap();

    assert_eq!(config.api_prefix, "/v1/");
    assert_eq!(config.static_extensions, vec!["js", "css", "webp"]);
    assert!(!config.skip_waiting);
    assert_eq!(config.shell_root, "/");
    assert_eq!(
        config.storage_keys,
        StorageKeys {
            auth_token: "session".to_owned(),
            ..StorageKeys::default()
        }
    );
    assert_eq!(config.buckets().name(Bucket::StaticAssets).as_str(), "static-assets-v2");
}

#[test]
fn unknown_fields_are_rejected() {
    let error = Config::from_yaml("api_prefx: /api/\n").unwrap_err();
    assert!(matches!(error, ConfigError::Parse(_)));
}

#[test]
fn relative_prefix_is_rejected() {
    let error = Config::from_yaml("api_prefix: api/\n").unwrap_err();
    assert!(matches!(error, ConfigError::InvalidPrefix(prefix) if prefix == "api/"));
}

#[test]
fn builder_validates() {
    let error = Config::builder().shell_root("index.html").build().unwrap_err();
    assert!(matches!(error, ConfigError::InvalidShellRoot(_)));

    let error = Config::builder()
        .static_extensions([".js"])
        .build()
        .unwrap_err();
    assert!(matches!(error, ConfigError::InvalidExtension(ext) if ext == ".js"));

    let error = Config::builder()
        .static_extensions(Vec::<String>::new())
        .build()
        .unwrap_err();
    assert!(matches!(error, ConfigError::InvalidExtension(_)));
}

#[test]
fn defaults_match_the_storefront_client() {
    let config = Config::default();
    assert_eq!(config.api_prefix, "/api/");
    assert_eq!(config.static_extensions.len(), 12);
    assert!(config.manifest.app_shell.contains(&"/products".to_owned()));
    assert_eq!(config.storage_keys.actions, "offline_actions");
    assert_eq!(config.storage_keys.data, "offline_data");
    assert_eq!(config.storage_keys.auth_token, "authToken");
    assert!(config.skip_waiting);
    assert_eq!(config.buckets().name(Bucket::AppShell).as_str(), "app-shell");
}
