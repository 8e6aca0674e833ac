//! CLI integration tests for the uml-schema binary.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

fn cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("uml-schema"))
}

const MODEL: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<xmi:XMI xmlns:uml="http://schema.omg.org/spec/UML/2.1" xmlns:xmi="http://schema.omg.org/spec/XMI/2.1">
  <uml:Model xmi:type="uml:Model" name="Model">
    <packagedElement xmi:type="uml:Package" name="Kern">
      <packagedElement xmi:type="uml:Class" name="Persoon">
        <ownedAttribute xmi:type="uml:Property" name="bsn" lowerBound="1" upperBound="1">
          <type xmi:idref="EAnone_BSN"/>
        </ownedAttribute>
        <ownedAttribute xmi:type="uml:Property" name="geboortedatum">
          <type xmi:idref="EAnone_Date"/>
        </ownedAttribute>
      </packagedElement>
    </packagedElement>
  </uml:Model>
</xmi:XMI>"#;

// Helper to create a version directory with one model file
fn version_dir(model: &str) -> (TempDir, std::path::PathBuf) {
    let tmp = TempDir::new().unwrap();
    let dir = tmp.path().join("v1.2.0");
    fs::create_dir(&dir).unwrap();
    fs::write(dir.join("model.xml"), model).unwrap();
    (tmp, dir)
}

mod convert_command {
    use super::*;

    #[test]
    fn converts_version_dir() {
        let (_tmp, dir) = version_dir(MODEL);

        cmd()
            .args(["convert", dir.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("1 schemas written for version 1.2.0"));

        let schema = fs::read_to_string(dir.join("schemas/persoon.json")).unwrap();
        assert!(schema.contains(r#""pattern": "^[0-9]{9}$""#));
        assert!(schema.contains(r#""format": "date""#));
        assert!(dir.join("schemas/openapi.json").is_file());
    }

    #[test]
    fn missing_version_dir_argument_is_usage_error() {
        cmd()
            .arg("convert")
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("VERSION_DIR"));
    }

    #[test]
    fn nonexistent_version_dir() {
        cmd()
            .args(["convert", "/nonexistent/v9.9.9"])
            .assert()
            .failure()
            .code(3)
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn no_schemas_produced_exits_one() {
        let (_tmp, dir) = version_dir("<root/>");

        cmd()
            .args(["convert", dir.to_str().unwrap()])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("no schemas produced"));
    }

    #[test]
    fn json_report() {
        let (_tmp, dir) = version_dir(MODEL);

        cmd()
            .args(["convert", dir.to_str().unwrap(), "--json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#""version": "1.2.0""#))
            .stdout(predicate::str::contains(r#""converted": ["#));
    }

    #[test]
    fn reference_mode_and_title() {
        let (_tmp, dir) = version_dir(MODEL);

        cmd()
            .args([
                "convert",
                dir.to_str().unwrap(),
                "--mode",
                "reference",
                "--title",
                "Test API",
                "--compact",
            ])
            .assert()
            .success();

        let api = fs::read_to_string(dir.join("schemas/openapi.json")).unwrap();
        assert!(api.contains(r#""$ref":"./schemas/persoon.json""#));
        assert!(api.contains(r#""title":"Test API""#));
    }

    #[test]
    fn unknown_mode_rejected() {
        let (_tmp, dir) = version_dir(MODEL);

        cmd()
            .args(["convert", dir.to_str().unwrap(), "--mode", "inline"])
            .assert()
            .failure()
            .code(2)
            .stderr(predicate::str::contains("unknown mode"));
    }

    #[test]
    fn quiet_suppresses_info_logs() {
        let (_tmp, dir) = version_dir(MODEL);

        cmd()
            .args(["convert", dir.to_str().unwrap(), "--quiet"])
            .env_remove("RUST_LOG")
            .assert()
            .success()
            .stderr(predicate::str::contains("processing file").not());
    }

    #[test]
    fn logs_skipped_class() {
        let model = MODEL.replace(r#"upperBound="1""#, r#"upperBound="veel""#);
        let (_tmp, dir) = version_dir(&model);
        fs::write(
            dir.join("extra.xml"),
            r#"<xmi:XMI><uml:Model>
                <packagedElement xmi:type="uml:Class" name="Ander"><ownedAttribute name="code"/></packagedElement>
                <packagedElement xmi:type="uml:Class" name="Leeg"/>
            </uml:Model></xmi:XMI>"#,
        )
        .unwrap();

        cmd()
            .args(["convert", dir.to_str().unwrap()])
            .env_remove("RUST_LOG")
            .assert()
            .success()
            .stdout(predicate::str::contains("1 classes skipped"))
            .stderr(predicate::str::contains("skipping class"));

        assert!(dir.join("schemas/ander.json").is_file());
        assert!(!dir.join("schemas/persoon.json").exists());
        assert!(!dir.join("schemas/leeg.json").exists());
    }
}

mod openapi_command {
    use super::*;

    #[test]
    fn rebuilds_openapi() {
        let (_tmp, dir) = version_dir(MODEL);
        cmd()
            .args(["convert", dir.to_str().unwrap()])
            .assert()
            .success();
        fs::remove_file(dir.join("schemas/openapi.json")).unwrap();

        cmd()
            .args(["openapi", dir.to_str().unwrap()])
            .assert()
            .success()
            .stdout(predicate::str::contains("openapi.json"));

        let api = fs::read_to_string(dir.join("schemas/openapi.json")).unwrap();
        assert!(api.contains(r#""Persoon""#));
    }

    #[test]
    fn missing_schemas_dir() {
        let (_tmp, dir) = version_dir(MODEL);

        cmd()
            .args(["openapi", dir.to_str().unwrap()])
            .assert()
            .failure()
            .code(3);
    }
}

mod validate_command {
    use super::*;

    fn generated_schema(dir: &std::path::Path) -> std::path::PathBuf {
        cmd()
            .args(["convert", dir.to_str().unwrap()])
            .assert()
            .success();
        dir.join("schemas/persoon.json")
    }

    #[test]
    fn valid_payload() {
        let (_tmp, dir) = version_dir(MODEL);
        let schema = generated_schema(&dir);
        let payload = dir.join("payload.json");
        fs::write(&payload, r#"{"bsn": "123456789"}"#).unwrap();

        cmd()
            .args([
                "validate",
                payload.to_str().unwrap(),
                "--schema",
                schema.to_str().unwrap(),
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains("Valid"));
    }

    #[test]
    fn invalid_payload_json_output() {
        let (_tmp, dir) = version_dir(MODEL);
        let schema = generated_schema(&dir);
        let payload = dir.join("payload.json");
        fs::write(&payload, r#"{"bsn": "12AB"}"#).unwrap();

        cmd()
            .args([
                "validate",
                payload.to_str().unwrap(),
                "--schema",
                schema.to_str().unwrap(),
                "--json",
            ])
            .assert()
            .failure()
            .code(1)
            .stdout(predicate::str::contains(r#""valid":false"#))
            .stdout(predicate::str::contains("/bsn"));
    }

    #[test]
    fn missing_required_field() {
        let (_tmp, dir) = version_dir(MODEL);
        let schema = generated_schema(&dir);
        let payload = dir.join("payload.json");
        fs::write(&payload, r#"{"geboortedatum": "2000-01-01"}"#).unwrap();

        cmd()
            .args([
                "validate",
                payload.to_str().unwrap(),
                "--schema",
                schema.to_str().unwrap(),
            ])
            .assert()
            .failure()
            .code(1)
            .stderr(predicate::str::contains("Validation failed"));
    }

    #[test]
    fn missing_payload_file() {
        let (_tmp, dir) = version_dir(MODEL);
        let schema = generated_schema(&dir);

        cmd()
            .args([
                "validate",
                "/nonexistent/payload.json",
                "--schema",
                schema.to_str().unwrap(),
            ])
            .assert()
            .failure()
            .code(3)
            .stderr(predicate::str::contains("loading payload"));
    }
}
