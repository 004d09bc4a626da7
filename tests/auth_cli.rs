mod common;

use common::Sandbox;
use httpmock::prelude::*;
use predicates::str::contains;
use std::fs;

#[test]
fn auth_login_saves_credentials() {
    let server = MockServer::start();
    let sandbox = Sandbox::new(&server, "");

    sandbox
        .command()
        .args([
            "auth",
            "login",
            "--key",
            "testkey123123",
            "--secret",
            "testsecret123123",
        ])
        .assert()
        .success()
        .stdout(contains("Saved credentials to "))
        .stdout(contains("config.toml"));

    let saved = fs::read_to_string(sandbox.config_path()).expect("config");
    assert!(saved.contains("key = \"testkey123123\""));
    assert!(saved.contains("secret = \"testsecret123123\""));
}

#[test]
fn auth_login_rejects_key_with_spaces() {
    let server = MockServer::start();
    let sandbox = Sandbox::new(&server, "");

    sandbox
        .command()
        .args([
            "auth",
            "login",
            "--key",
            "no spaces are allowed",
            "--secret",
            "testsecret123123",
        ])
        .assert()
        .code(1)
        .stderr(contains("The value may not contain spaces"));
}

#[test]
fn auth_login_without_values_and_no_terminal() {
    let server = MockServer::start();
    let sandbox = Sandbox::new(&server, "");

    sandbox
        .command()
        .args(["auth", "login"])
        .assert()
        .code(1)
        .stderr(contains("Not enough arguments (missing: \"key\")."));
}

#[test]
fn auth_logout_removes_credentials() {
    let server = MockServer::start();
    let sandbox = Sandbox::new(
        &server,
        "[credentials]\nkey = \"testkey123123\"\nsecret = \"testsecret123123\"",
    );

    sandbox
        .command()
        .args(["auth", "logout"])
        .assert()
        .success()
        .stdout(contains("Removed stored credentials."));

    let saved = fs::read_to_string(sandbox.config_path()).expect("config");
    assert!(!saved.contains("testkey123123"));
}
