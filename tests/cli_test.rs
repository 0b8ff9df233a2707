mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::{FakeBackend, spawn_backend};
use predicates::prelude::*;
use std::path::Path;
use std::process::Command;
use std::sync::Arc;
use tempfile::TempDir;

fn shopdesk(session: &Path) -> Command {
    let mut cmd = Command::new(cargo_bin!("shopdesk"));
    cmd.env_remove("SHOPDESK_API_URL")
        .arg("--session-file")
        .arg(session);
    cmd
}

#[test]
fn test_login_whoami_logout() -> Result<(), Box<dyn std::error::Error>> {
    let dir = TempDir::new()?;
    let session = dir.path().join("session.json");

    shopdesk(&session).arg("whoami").assert().success().stdout(
        predicate::str::contains("not logged in").and(predicate::str::contains("cart items: 0")),
    );

    shopdesk(&session)
        .args(["login", "--token", "abc", "--user-id", "7"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged in"));
    assert!(session.exists());

    shopdesk(&session)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("user 7"));

    shopdesk(&session).arg("logout").assert().success();
    shopdesk(&session)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("not logged in"));
    Ok(())
}

#[test]
fn test_login_requires_token() {
    let dir = TempDir::new().unwrap();
    shopdesk(&dir.path().join("session.json"))
        .args(["login", "--token", " "])
        .assert()
        .failure();
}

#[test]
fn test_settle_dry_run_prints_plan() {
    let dir = TempDir::new().unwrap();
    shopdesk(&dir.path().join("session.json"))
        .args(["settle", "--rows", "tests/fixtures/selection.csv", "--dry-run"])
        .assert()
        .success()
        .stdout(predicate::str::contains("order_id,amount,items,order_item_ids"))
        .stdout(predicate::str::contains("1,80,2,10;20"))
        .stdout(predicate::str::contains("2,20,1,3"))
        .stderr(predicate::str::contains("1 row(s) without an order id left out"));
}

#[test]
fn test_settle_dry_run_with_chosen_lines() {
    let dir = TempDir::new().unwrap();
    shopdesk(&dir.path().join("session.json"))
        .args([
            "settle",
            "--rows",
            "tests/fixtures/selection.csv",
            "--lines",
            "3,2",
            "--dry-run",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("2,20,1,3\n1,30,1,20"));
}

#[test]
fn test_settle_rows_without_orders() {
    let dir = TempDir::new().unwrap();
    shopdesk(&dir.path().join("session.json"))
        .args(["settle", "--rows", "tests/fixtures/missing_orders.csv", "--dry-run"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Selected rows are missing order information.",
        ));
}

#[test]
fn test_cart_survives_between_runs() {
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");

    shopdesk(&session)
        .args(["cart", "add", "--product", "3", "--name", "Tea", "--qty", "2", "--price", "4.50"])
        .assert()
        .success();
    shopdesk(&session)
        .args(["cart", "add", "--product", "3", "--name", "Tea", "--price", "4.50"])
        .assert()
        .success();

    shopdesk(&session)
        .args(["cart", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("3\tTea\tx3\t13.5"))
        .stdout(predicate::str::contains("total: 13.5"));

    shopdesk(&session).args(["cart", "clear"]).assert().success();
    shopdesk(&session)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("cart items: 0"));
}

#[test]
fn test_orders_need_a_user() {
    let dir = TempDir::new().unwrap();
    shopdesk(&dir.path().join("session.json"))
        .arg("orders")
        .assert()
        .failure()
        .stderr(predicate::str::contains("No user in session, please log in."));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_shops_against_backend() {
    let url = spawn_backend(Arc::new(FakeBackend::default())).await;
    let dir = TempDir::new().unwrap();
    let session = dir.path().join("session.json");

    tokio::task::spawn_blocking(move || {
        shopdesk(&session)
            .args(["login", "--token", "abc", "--user-id", "7"])
            .assert()
            .success();
        shopdesk(&session)
            .args(["--api-url", &url, "shops"])
            .assert()
            .success()
            .stdout(predicate::str::contains("1\tTea House\tactive"))
            .stdout(predicate::str::contains("2\tSpice Co\tinactive"))
            .stdout(predicate::str::contains("page 1/2"));
    })
    .await
    .unwrap();
}
