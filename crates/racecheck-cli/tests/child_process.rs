//! End-to-end tests driving the real `racecheck` binary as a child process.
//!
//! Race-positive expectations need a detector-instrumented build; those
//! tests are skipped unless `RACECHECK_UNDER_TSAN=1` is set, since
//! instrumentation is a build property, not a runtime switch.

use std::process::Command;

use racecheck_harness::{Verifier, DEFECT_EXIT_CODE, REPORT_MARKER};

const BIN: &str = env!("CARGO_BIN_EXE_racecheck");

fn verifier() -> Verifier {
    // Empty ambient args keep the tests hermetic regardless of the
    // environment the suite itself runs under.
    Verifier::new(BIN).with_ambient_args(Vec::new())
}

fn under_tsan() -> bool {
    std::env::var("RACECHECK_UNDER_TSAN").as_deref() == Ok("1")
}

#[test]
fn list_names_every_registered_scenario() {
    let output = Command::new(BIN).arg("list").output().expect("run list");
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    for scenario in racecheck_scenarios::all() {
        assert!(text.contains(scenario.name), "missing {}", scenario.name);
    }
}

#[test]
fn mutex_counter_classifies_clean_with_exact_total() {
    let result = verifier()
        .run_expect_clean("mutex-counter", &[])
        .expect("clean classification");
    result
        .should_contain("x = 100000")
        .and_then(|r| r.should_contain("Begin mutex-counter"))
        .and_then(|r| r.should_contain("End   mutex-counter"))
        .expect("expected child output");
}

#[test]
fn synchronized_scenarios_classify_clean() {
    let verifier = verifier();
    for entry in [
        "atomic-counter",
        "spinlock-counter",
        "locked-byte-array",
        "disjoint-array",
        "string-ops",
        "lazy-init",
    ] {
        verifier
            .run_expect_clean(entry, &[])
            .unwrap_or_else(|err| panic!("{entry} should be clean: {err}"));
    }
}

#[test]
fn publication_holds_across_all_paired_iterations() {
    verifier()
        .run_expect_clean("publication", &[])
        .expect("publication ordering must hold for all 500 iterations");
}

#[test]
fn alloc_churn_accepts_its_scenario_flag() {
    let result = verifier()
        .run_expect_clean("alloc-churn", &["--churn-mb", "8"])
        .expect("clean classification");
    result
        .should_contain("array[0] = 42")
        .expect("published buffer content");
}

#[test]
fn defect_probe_aborts_with_the_distinguished_defect_status() {
    let result = verifier().run("defect-probe", &[]).expect("launch");
    result
        .should_have_exit_code(DEFECT_EXIT_CODE)
        .and_then(|r| r.should_contain("scenario defect in 'defect-probe'"))
        .and_then(|r| r.should_contain("defect probe tripped"))
        .expect("defect contract");
}

#[test]
fn unknown_entry_point_is_an_error_not_a_verdict() {
    let result = verifier().run("no-such-scenario", &[]).expect("launch");
    assert_eq!(result.exit_code, Some(1));
    result
        .should_contain("unknown scenario entry point")
        .expect("diagnostic names the problem");
}

#[test]
fn check_subcommand_reports_a_clean_pass() {
    let output = Command::new(BIN)
        .args(["check", "mutex-counter", "--json"])
        .output()
        .expect("run check");
    assert!(output.status.success());
    let text = String::from_utf8_lossy(&output.stdout);
    assert!(text.contains("\"ok\":true"), "unexpected payload: {text}");
    assert!(text.contains("\"scenario\":\"mutex-counter\""));
}

#[test]
fn racy_counter_is_flagged_under_the_detector() {
    if !under_tsan() {
        eprintln!("skipped: requires an instrumented build (RACECHECK_UNDER_TSAN=1)");
        return;
    }
    let result = verifier()
        .run_expect_flagged("racy-counter", &[])
        .expect("flagged classification");
    result
        .should_contain(REPORT_MARKER)
        .and_then(|r| r.should_match(r"(Read|Write) of size 8 at 0x[0-9a-fA-F]+"))
        .expect("report shape");
}

#[test]
fn racy_publication_is_flagged_under_the_detector() {
    if !under_tsan() {
        eprintln!("skipped: requires an instrumented build (RACECHECK_UNDER_TSAN=1)");
        return;
    }
    verifier()
        .run_expect_flagged("racy-publication", &[])
        .expect("flagged classification");
}
