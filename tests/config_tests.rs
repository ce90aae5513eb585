//! Integration tests for configuration loading.
//!
//! Config files are written to temporary paths; the extension selects the
//! format the same way it does for `--config`.

use std::io::Write;
use std::time::Duration;

use watch_process::config::{load_config, validate_effective_config, ConfigError};
use watch_process::Platform;

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn test_load_yaml_config() {
    let file = write_config(
        ".yaml",
        "tag: ps.${hostname}\n\
         interval: 10s\n\
         lookup_user:\n  - alice\n  - bob\n\
         platform: mac\n",
    );
    let cfg = load_config(Some(file.path())).unwrap();

    assert_eq!(cfg.tag.as_deref(), Some("ps.${hostname}"));
    assert_eq!(cfg.interval(), Duration::from_secs(10));
    assert_eq!(cfg.timeout(), Duration::from_secs(10));
    assert_eq!(cfg.lookup_user(), Some(vec!["alice".into(), "bob".into()]));
    assert_eq!(cfg.effective_platform(), Platform::Mac);
    // Omitted fields fall back to the defaults.
    assert_eq!(cfg.hostname_command(), "hostname");
    assert!(cfg.types.is_some());
    assert!(validate_effective_config(&cfg).is_ok());
}

#[test]
fn test_load_json_config() {
    let file = write_config(
        ".json",
        r#"{"tag":"ps","command":"cat /tmp/ps.txt","keys":["user","pid","command"],"interval":2,"timeout":"500ms"}"#,
    );
    let cfg = load_config(Some(file.path())).unwrap();

    assert_eq!(cfg.command.as_deref(), Some("cat /tmp/ps.txt"));
    assert_eq!(cfg.effective_keys(Platform::Linux), vec!["user", "pid", "command"]);
    assert_eq!(cfg.interval(), Duration::from_secs(2));
    assert_eq!(cfg.timeout(), Duration::from_millis(500));
}

#[test]
fn test_load_toml_config() {
    let file = write_config(
        ".toml",
        "tag = \"ps.__HOSTNAME__\"\n\
         hostname_command = \"echo box\"\n\
         types = \"pid:integer\"\n\
         platform = \"windows\"\n",
    );
    let cfg = load_config(Some(file.path())).unwrap();

    assert_eq!(cfg.hostname_command(), "echo box");
    assert_eq!(cfg.type_map().unwrap().len(), 1);
    assert_eq!(cfg.effective_platform(), Platform::Windows);
    assert_eq!(cfg.effective_keys(Platform::Windows)[0], "StartTime");
}

#[test]
fn test_missing_file_is_a_read_error() {
    let err = load_config(Some(std::path::Path::new("/nonexistent/watch-process.yaml")))
        .unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn test_invalid_yaml_is_a_parse_error() {
    let file = write_config(".yaml", "tag: [unterminated\n");
    let err = load_config(Some(file.path())).unwrap_err();
    assert!(matches!(err, ConfigError::Parse { .. }));
}

#[test]
fn test_config_without_tag_fails_validation() {
    let file = write_config(".yaml", "interval: 5s\n");
    let cfg = load_config(Some(file.path())).unwrap();
    assert!(matches!(
        validate_effective_config(&cfg),
        Err(ConfigError::MissingTag)
    ));
}
