//! Command plumbing without a database.

use std::fs;
use std::path::Path;

use cdef_cli::cli::{LookupArgs, RunArgs};
use cdef_cli::commands::{load_settings, lookup, resolve};
use cdef_cli::summary::{classification_table, deployment_table, element_table};

const DEFINITIONS: &str = r#"
[[Flg]]
topComment = "boolean"
[[Flg]]
code = "1"
name = "True"
alias = "yes"
[[Flg]]
code = "0"
name = "False"

[[Secret]]
topComment = "internal only"
useDocumentOnly = true
[[Secret]]
code = "S"
name = "Sealed"
"#;

const DEPLOYMENT: &str = r#"
["$$ALL$$"]
DELETE_FLG = "Flg"

[MEMBER]
SECRET_CODE = "Secret"
"#;

fn workspace(dir: &Path) -> RunArgs {
    fs::write(
        dir.join("cdef.toml"),
        "definition_file = \"classificationDefinitionMap.toml\"\n",
    )
    .expect("write settings");
    fs::write(dir.join("classificationDefinitionMap.toml"), DEFINITIONS).expect("write definitions");
    fs::write(dir.join("classificationDeploymentMap.toml"), DEPLOYMENT).expect("write deployment");
    RunArgs {
        settings: dir.join("cdef.toml"),
        database: None,
        environment: None,
        documentation: false,
        json: false,
    }
}

#[test]
fn literal_run_lists_classifications() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = workspace(dir.path());
    let resolved = resolve(&load_settings(&args).expect("settings")).expect("resolve");

    assert!(resolved.get("Flg").is_some());
    assert!(resolved.get("Secret").is_none());
    let rendered = classification_table(&resolved).to_string();
    assert!(rendered.contains("Flg"));
    assert!(rendered.contains("boolean"));
    assert!(rendered.contains("LOGGING"));
    assert!(!rendered.contains("Secret"));
}

#[test]
fn documentation_flag_keeps_document_only_classifications() {
    let dir = tempfile::tempdir().expect("tempdir");
    let mut args = workspace(dir.path());
    args.documentation = true;
    let resolved = resolve(&load_settings(&args).expect("settings")).expect("resolve");

    assert!(resolved.get("Secret").is_some());
    assert_eq!(
        resolved.classification_name_for("MEMBER", "SECRET_CODE"),
        Some("Secret")
    );
}

#[test]
fn deployment_table_lists_wildcard_and_table_entries() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = workspace(dir.path());
    let resolved = resolve(&load_settings(&args).expect("settings")).expect("resolve");

    let rendered = deployment_table(&resolved).to_string();
    assert!(rendered.contains("$$ALL$$"));
    assert!(rendered.contains("DELETE_FLG"));
    assert!(!rendered.contains("SECRET_CODE"));
    insta::assert_json_snapshot!(resolved.deployment(), @r#"
    {
      "$$ALL$$": {
        "DELETE_FLG": "Flg"
      },
      "MEMBER": {
        "DELETE_FLG": "Flg"
      }
    }
    "#);
}

#[test]
fn lookup_reports_deployed_classification() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = workspace(dir.path());
    let resolved = resolve(&load_settings(&args).expect("settings")).expect("resolve");

    let found = lookup(
        &resolved,
        &LookupArgs {
            table: "purchase".to_string(),
            column: "delete_flg".to_string(),
            db_type: None,
            run: args.clone(),
        },
    );
    assert_eq!(found.classification_name, Some("Flg"));
    let top = found.classification.expect("classification");
    let rendered = element_table(top).to_string();
    assert!(rendered.contains("True"));
    assert!(rendered.contains("yes"));

    let missing = lookup(
        &resolved,
        &LookupArgs {
            table: "MEMBER".to_string(),
            column: "SECRET_CODE".to_string(),
            db_type: None,
            run: args,
        },
    );
    assert!(missing.classification_name.is_none());
}

#[test]
fn missing_settings_file_names_the_path() {
    let dir = tempfile::tempdir().expect("tempdir");
    let args = RunArgs {
        settings: dir.path().join("absent.toml"),
        database: None,
        environment: None,
        documentation: false,
        json: false,
    };
    let error = load_settings(&args).unwrap_err();
    assert!(format!("{error:#}").contains("absent.toml"));
}
