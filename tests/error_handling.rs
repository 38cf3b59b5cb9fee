// tests/error_handling.rs

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;

use scenewatch::config::load_and_validate;
use scenewatch::errors::ScenewatchError;

fn config_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{contents}").unwrap();
    file
}

fn expect_config_error(contents: &str) -> String {
    let file = config_file(contents);
    match load_and_validate(file.path()) {
        Err(ScenewatchError::ConfigError(msg)) => msg,
        Err(e) => panic!("Expected ConfigError, got: {:?}", e),
        Ok(_) => panic!("Expected error, got Ok"),
    }
}

#[test]
fn test_full_config_round_trips_into_settings() {
    let file = config_file(
        r#"
[server]
port = 9000
static_dir = "public"

[scenes]
root = "demos"
shared = "common"

[compiler]
cmd = "npx esbuild {dir}/main.js --bundle"
minify = true

[watch]
build_window = "10s"
expiry = "5m"
compile_delay = "500ms"
exclude = ["**/*.min.js", "**/vendor/**"]
"#,
    );

    let cfg = load_and_validate(file.path()).unwrap();
    assert_eq!(cfg.server.port, 9000);
    assert_eq!(cfg.server.host, "127.0.0.1");
    assert_eq!(cfg.scenes.shared, "common");
    assert_eq!(cfg.shared_dir(), std::path::PathBuf::from("demos/common"));
    assert!(cfg.compiler.minify);
    assert_eq!(cfg.watch.timings.build_window, Duration::from_secs(10));
    assert_eq!(cfg.watch.timings.expiry, Duration::from_secs(300));
    assert_eq!(cfg.watch.timings.compile_delay, Duration::from_millis(500));
    assert!(cfg.watch.filter.matches("main.js"));
    assert!(!cfg.watch.filter.matches("vendor/lib.js"));
}

#[test]
fn test_missing_compiler_command_returns_config_error() {
    let msg = expect_config_error(
        r#"
[server]
port = 9000
"#,
    );
    assert!(msg.contains("[compiler].cmd"), "{msg}");
}

#[test]
fn test_bad_duration_names_the_field() {
    let msg = expect_config_error(
        r#"
[compiler]
cmd = "cat main.js"

[watch]
expiry = "two minutes"
"#,
    );
    assert!(msg.contains("expiry"), "{msg}");
}

#[test]
fn test_debounce_longer_than_window_is_rejected() {
    let msg = expect_config_error(
        r#"
[compiler]
cmd = "cat main.js"

[watch]
build_window = "2s"
compile_delay = "3s"
"#,
    );
    assert!(msg.contains("compile_delay"), "{msg}");
}

#[test]
fn test_window_longer_than_expiry_is_rejected() {
    let msg = expect_config_error(
        r#"
[compiler]
cmd = "cat main.js"

[watch]
build_window = "5m"
expiry = "1m"
"#,
    );
    assert!(msg.contains("expiry"), "{msg}");
}

#[test]
fn test_invalid_shared_token_is_rejected() {
    let msg = expect_config_error(
        r#"
[compiler]
cmd = "cat main.js"

[scenes]
shared = "shared/res"
"#,
    );
    assert!(msg.contains("[scenes].shared"), "{msg}");
}

#[test]
fn test_invalid_glob_is_rejected() {
    let msg = expect_config_error(
        r#"
[compiler]
cmd = "cat main.js"

[watch]
include = ["src/[unclosed"]
"#,
    );
    assert!(msg.contains("patterns"), "{msg}");
}

#[test]
fn test_malformed_toml_returns_toml_error() {
    let file = config_file("[compiler\ncmd = ");
    assert!(matches!(
        load_and_validate(file.path()),
        Err(ScenewatchError::TomlError(_))
    ));
}

#[test]
fn test_missing_file_returns_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        load_and_validate(dir.path().join("nope.toml")),
        Err(ScenewatchError::IoError(_))
    ));
}
