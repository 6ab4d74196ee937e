use assert_cmd::prelude::*;
use predicates::prelude::PredicateBooleanExt;
use predicates::str::{contains, diff};
use std::process::Command;

fn mailroom() -> Command {
    Command::cargo_bin("mailroom").unwrap()
}

#[test]
fn runs_without_arguments() {
    let mut cmd = mailroom();
    cmd.assert().success().stdout(contains("mailroom v"));
}

#[test]
fn lists_levels() {
    let mut cmd = mailroom();
    cmd.arg("levels");
    cmd.assert()
        .success()
        .stdout(contains("mail-room"))
        .stdout(contains("subtract-room"))
        .stdout(contains("Equalization Room"))
        .stdout(contains("COPYFROM"));
}

#[test]
fn completes_copy_floor() {
    let mut cmd = mailroom();
    cmd.arg("run")
        .arg("tests/files/copy_floor.hrm")
        .arg("--level")
        .arg("copy-floor")
        .arg("--minimal");
    cmd.assert()
        .success()
        .stdout(diff("1\n4\n7\n"))
        .stderr(contains(
            "Outbox matches the expected output after 6 instructions.",
        ))
        .stderr(contains("Size: 6 commands (challenge 6), met"))
        .stderr(contains("Speed: 6 steps (challenge 6), met"));
}

#[test]
fn completes_subtract_room_with_any_seed() {
    for seed in ["0", "1", "12345"] {
        let mut cmd = mailroom();
        cmd.arg("run")
            .arg("tests/files/subtract_room.hrm")
            .arg("--seed")
            .arg(seed)
            .arg("--minimal");
        cmd.assert()
            .success()
            .stderr(contains("Size: 10 commands (challenge 10), met"));
    }
}

#[test]
fn seed_from_environment() {
    let run = || {
        let mut cmd = mailroom();
        cmd.env("MAILROOM_SEED", "77")
            .arg("run")
            .arg("tests/files/loop.hrm")
            .arg("--level")
            .arg("busy-mail-room")
            .arg("--minimal");
        let output = cmd.output().unwrap();
        assert!(output.status.success());
        output.stdout
    };
    assert_eq!(run(), run());
}

#[test]
fn forgiving_loop_reports_faults_once() {
    let mut cmd = mailroom();
    cmd.arg("run")
        .arg("tests/files/loop.hrm")
        .arg("--level")
        .arg("busy-mail-room")
        .arg("--seed")
        .arg("3")
        .arg("--step-limit")
        .arg("100")
        .arg("--minimal");
    cmd.assert()
        .success()
        .stderr(contains(
            "Outbox matches the expected output after 47 instructions.",
        ))
        .stderr(contains("Fault [runtime::empty_input]"))
        .stderr(contains("Fault [runtime::not_carrying]"))
        .stderr(contains("faults in total"))
        .stderr(contains("Size: 3 commands (challenge 3), met"));
}

#[test]
fn halts_on_success() {
    let mut cmd = mailroom();
    cmd.arg("run")
        .arg("tests/files/loop.hrm")
        .arg("--level")
        .arg("busy-mail-room")
        .arg("--halt-on-success")
        .arg("--minimal");
    cmd.assert()
        .success()
        .stderr(contains("Outbox matches"))
        .stderr(contains("Fault [").not());
}

#[test]
fn wrong_output_fails() {
    let mut cmd = mailroom();
    cmd.arg("run")
        .arg("tests/files/wrong_order.hrm")
        .arg("--level")
        .arg("copy-floor")
        .arg("--minimal");
    cmd.assert()
        .failure()
        .stdout(diff("4\n7\n1\n"))
        .stderr(contains("run::incomplete"));
}

#[test]
fn missing_output_fails() {
    let mut cmd = mailroom();
    cmd.arg("run")
        .arg("tests/files/once.hrm")
        .arg("--level")
        .arg("mail-room")
        .arg("--minimal");
    cmd.assert().failure().stderr(contains("run::incomplete"));
}

#[test]
fn fault_limit_stops_run() {
    let mut cmd = mailroom();
    cmd.arg("run")
        .arg("tests/files/empty_hands.hrm")
        .arg("--level")
        .arg("mail-room")
        .arg("--fault-limit")
        .arg("1")
        .arg("--minimal");
    cmd.assert()
        .failure()
        .stdout(diff(""))
        .stderr(contains("Fault [runtime::not_carrying]"))
        .stderr(contains("run::incomplete"));
}

#[test]
fn fault_limit_from_environment() {
    let mut cmd = mailroom();
    cmd.env("MAILROOM_FAULT_LIMIT", "1")
        .arg("tests/files/empty_hands.hrm");
    cmd.assert()
        .failure()
        .stdout(diff(""))
        .stderr(contains("Fault [runtime::not_carrying]"))
        .stderr(contains("run::incomplete"));
}

#[test]
fn step_limit_from_environment() {
    let mut cmd = mailroom();
    cmd.env("MAILROOM_STEP_LIMIT", "5")
        .arg("run")
        .arg("tests/files/loop.hrm")
        .arg("--level")
        .arg("busy-mail-room")
        .arg("--minimal");
    cmd.assert().failure().stderr(contains("run::incomplete"));
}

#[test]
fn unknown_level() {
    let mut cmd = mailroom();
    cmd.arg("run")
        .arg("tests/files/copy_floor.hrm")
        .arg("--level")
        .arg("boiler-room");
    cmd.assert()
        .failure()
        .stderr(contains("cli::unknown_level"));
}

#[test]
fn parse_errors() {
    let mut cmd = mailroom();
    cmd.arg("run").arg("tests/files/unknown_command.hrm");
    cmd.assert().failure().stderr(contains("parse::mnemonic"));

    let mut cmd = mailroom();
    cmd.arg("run").arg("tests/files/undefined_label.hrm");
    cmd.assert()
        .failure()
        .stderr(contains("parse::undefined_label"));
}

#[test]
fn checks_files() {
    let mut cmd = mailroom();
    cmd.arg("check")
        .arg("tests/files/copy_floor.hrm")
        .arg("--level")
        .arg("copy-floor");
    cmd.assert().success().stdout(contains("no errors found"));

    let mut cmd = mailroom();
    cmd.arg("check").arg("tests/files/subtract_*.hrm");
    cmd.assert().success().stdout(contains("subtract_room.hrm"));
}

#[test]
fn check_rejects_commands_outside_toolbox() {
    let mut cmd = mailroom();
    cmd.arg("check")
        .arg("tests/files/copy_floor.hrm")
        .arg("--level")
        .arg("mail-room");
    cmd.assert()
        .failure()
        .stderr(contains("build::toolbox"))
        .stderr(contains("check::failed"));
}

#[test]
fn check_without_matches() {
    let mut cmd = mailroom();
    cmd.arg("check").arg("tests/files/*.nothing");
    cmd.assert().failure().stderr(contains("check::no_files"));
}
