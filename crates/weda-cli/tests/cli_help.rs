use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;

#[test]
fn test_help_shows_all_commands() {
    cargo_bin_cmd!("weda")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("register"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"))
        .stdout(predicate::str::contains("status"))
        .stdout(predicate::str::contains("forgot-password"))
        .stdout(predicate::str::contains("products"))
        .stdout(predicate::str::contains("categories"))
        .stdout(predicate::str::contains("config"));
}

#[test]
fn test_products_help_shows_subcommands() {
    cargo_bin_cmd!("weda")
        .args(["products", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("show"));
}

#[test]
fn test_products_list_help_shows_paging_flags() {
    cargo_bin_cmd!("weda")
        .args(["products", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--page"))
        .stdout(predicate::str::contains("--per-page"))
        .stdout(predicate::str::contains("--search"))
        .stdout(predicate::str::contains("--sort"))
        .stdout(predicate::str::contains("--direction"));
}

#[test]
fn test_version_flag() {
    cargo_bin_cmd!("weda")
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("0.1"));
}
