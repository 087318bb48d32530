use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::Path;

fn mkchain(config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("mkchain").unwrap();
    cmd.arg("--config").arg(config);
    cmd
}

fn empty_config(dir: &Path) -> std::path::PathBuf {
    let path = dir.join("config.toml");
    fs::write(&path, "").unwrap();
    path
}

fn yaml(path: &Path) -> serde_yaml::Value {
    serde_yaml::from_str(&fs::read_to_string(path).unwrap()).unwrap()
}

#[test]
fn test_version() {
    Command::cargo_bin("mkchain")
        .unwrap()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_invalid_node_count() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    let out = dir.path().join("out");

    for count in ["0", "-3"] {
        mkchain(&config)
            .args(["mychain", "--number-of-nodes", count, "--output-dir"])
            .arg(&out)
            .assert()
            .code(1)
            .stderr(predicate::str::contains(format!(
                "Invalid argument --number-of-nodes {}, must be 1 or more",
                count
            )));
    }

    assert!(!out.exists());
}

#[test]
fn test_offline_run() {
    let dir = tempfile::tempdir().unwrap();
    let config = empty_config(dir.path());
    let out = dir.path().join("generated-values");

    let run = || {
        mkchain(&config)
            .args([
                "mychain",
                "--number-of-nodes",
                "3",
                "--keygen",
                "local",
                "--chain-id",
                "NetXdQprcVkpaWU",
                "--bootstrap-peer",
                "192.168.1.10",
                "--rpc-auth",
                "--output-dir",
            ])
            .arg(&out)
            .assert()
            .success()
            .stdout(predicate::str::contains("Wrote create constants in mychain_values.yaml"))
            .stdout(predicate::str::contains(
                "Wrote invitation constants in mychain_invite_values.yaml",
            ));
    };

    run();
    // A second run replaces the first
    run();

    let creation = yaml(&out.join("mychain_values.yaml"));
    let invitation = yaml(&out.join("mychain_invite_values.yaml"));

    for doc in [&creation, &invitation] {
        assert_eq!(doc["chain_name"].as_str(), Some("mychain"));
        assert_eq!(doc["genesis"]["genesis_chain_id"].as_str(), Some("NetXdQprcVkpaWU"));
        assert_eq!(doc["nodes"].as_sequence().map(|n| n.len()), Some(3));
        assert_eq!(doc["bootstrap_peers"][0].as_str(), Some("192.168.1.10"));
        assert_eq!(doc["accounts"].as_sequence().map(|a| a.len()), Some(4));
    }

    assert_eq!(creation["rpc_auth"].as_bool(), Some(true));
    assert!(invitation.get("rpc_auth").is_none());
    assert_eq!(creation["accounts"][0]["private"].as_bool(), Some(true));
    assert_eq!(invitation["accounts"][0]["private"].as_bool(), Some(false));
    assert_eq!(creation["accounts"][3]["name"].as_str(), Some("genesis"));
}

#[test]
fn test_missing_container_runtime() {
    let dir = tempfile::tempdir().unwrap();
    let config = dir.path().join("config.toml");
    fs::write(&config, "container_runtime = \"mkchain-no-such-runtime\"\n").unwrap();
    let out = dir.path().join("out");

    mkchain(&config)
        .args(["mychain", "--chain-id", "NetXdQprcVkpaWU", "--keygen", "docker", "--output-dir"])
        .arg(&out)
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Binary not found: mkchain-no-such-runtime"));

    assert!(!out.exists());
}

#[test]
fn test_missing_config_file() {
    let dir = tempfile::tempdir().unwrap();

    mkchain(&dir.path().join("nope.toml"))
        .arg("mychain")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Configuration error"));
}
