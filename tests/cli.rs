use assert_cmd::Command;
use predicates::prelude::*;

fn cli() -> Command {
    Command::cargo_bin("sql-fragments").unwrap()
}

#[test]
fn test_format_from_stdin() {
    cli()
        .arg("format")
        .write_stdin("select a, b from users where a = 1")
        .assert()
        .success()
        .stdout(predicate::str::contains("    select\n        a,\n        b\n"))
        .stdout(predicate::str::contains("    where\n        a = 1"));
}

#[test]
fn test_format_from_args() {
    cli()
        .args(["format", "select 1 from t", "delete from u"])
        .assert()
        .success()
        .stdout(predicate::str::contains("select"))
        .stdout(predicate::str::contains("delete"));
}

#[test]
fn test_format_indent_option() {
    cli()
        .args(["format", "--indent", "2", "select a from t"])
        .assert()
        .success()
        .stdout("\n  select\n    a\n  from\n    t\n");
}

#[test]
fn test_format_none_style() {
    cli()
        .args(["format", "--style", "none", "select  a from t"])
        .assert()
        .success()
        .stdout("select  a from t\n");
}

#[test]
fn test_empty_input() {
    cli()
        .arg("format")
        .write_stdin("")
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("no SQL input provided"));
}

#[test]
fn test_order_by_with_mapping_and_alias() {
    cli()
        .args(["order-by", "p desc, id", "--map", "p=c1,c2", "--alias", "e"])
        .assert()
        .success()
        .stdout("e.c1 desc, e.c2 desc, e.id\n");
}

#[test]
fn test_order_by_unqualified() {
    cli()
        .args(["order-by", "lower(name) desc, id"])
        .assert()
        .success()
        .stdout("lower(name) desc, id\n");
}

#[test]
fn test_order_by_dialect_drops_nulls_precedence() {
    cli()
        .args(["order-by", "name nulls last", "--dialect", "mysql"])
        .assert()
        .success()
        .stdout("name\n");
}

#[test]
fn test_order_by_syntax_error() {
    cli()
        .args(["order-by", "lower(name"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("unable to translate order-by fragment `lower(name`"));
}

#[test]
fn test_order_by_bad_mapping_rejected() {
    cli()
        .args(["order-by", "name", "--map", "nocolumns"])
        .assert()
        .failure();
}
