use std::io::Write;

use spindle_config::coordinator::{CoordinatorArgs, CoordinatorConfig};
use spindle_model::AssignmentStrategy;

fn args_with(database_url: Option<&str>) -> CoordinatorArgs {
    CoordinatorArgs {
        database_url: database_url.map(String::from),
        ..Default::default()
    }
}

#[test]
fn missing_database_url_is_an_error() {
    let err = CoordinatorConfig::resolve(args_with(None)).unwrap_err();
    assert!(err.to_string().contains("database_url"));
}

#[test]
fn cli_value_takes_precedence_over_defaults() {
    let cfg = CoordinatorConfig::resolve(args_with(Some("postgres://localhost/spindle"))).unwrap();
    assert_eq!(cfg.database_url, "postgres://localhost/spindle");
    assert_eq!(cfg.assignment_strategy, AssignmentStrategy::Priority);
    assert!(!cfg.auto_approve_previews);
}

#[test]
fn toml_overlay_fills_in_unset_cli_fields() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        file,
        r#"
        database_url = "postgres://toml-host/spindle"
        assignment_strategy = "load-balance"
        auto_approve_previews = true
        "#
    )
    .unwrap();

    let args = CoordinatorArgs {
        config: Some(file.path().to_path_buf()),
        ..Default::default()
    };
    let cfg = CoordinatorConfig::resolve(args).unwrap();

    assert_eq!(cfg.database_url, "postgres://toml-host/spindle");
    assert_eq!(cfg.assignment_strategy, AssignmentStrategy::LoadBalance);
    assert!(cfg.auto_approve_previews);
}

#[test]
fn cli_value_overrides_toml_value() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"database_url = "postgres://toml-host/spindle""#).unwrap();

    let args = CoordinatorArgs {
        config: Some(file.path().to_path_buf()),
        database_url: Some("postgres://cli-host/spindle".to_string()),
        ..Default::default()
    };
    let cfg = CoordinatorConfig::resolve(args).unwrap();

    assert_eq!(cfg.database_url, "postgres://cli-host/spindle");
}
