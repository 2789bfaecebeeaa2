#![allow(dead_code)]

use kodigo::interpreter::{parse_and_run, RunOutcome};

/// Wraps a statement body in the program delimiters.
pub fn wrap(body: &str) -> String {
    format!("BEGIN CODE\n{}\nEND CODE\n", body)
}

/// Runs a program with no input, asserting it recorded no runtime errors,
/// and returns everything it displayed.
pub fn run_ok(body: &str) -> String {
    let outcome = parse_and_run(&wrap(body), "").expect("program should parse and run");
    assert!(
        outcome.errors.is_empty(),
        "unexpected runtime errors: {:?}",
        outcome.errors
    );
    outcome.output
}

/// Runs a program against the given stdin text.
pub fn run_with_input(body: &str, input: &str) -> RunOutcome {
    parse_and_run(&wrap(body), input).expect("program should parse and run")
}

/// Runs a program expected to record at least one recoverable error.
pub fn run_with_errors(body: &str) -> RunOutcome {
    let outcome = parse_and_run(&wrap(body), "").expect("program should parse and run");
    assert!(
        !outcome.errors.is_empty(),
        "expected runtime errors, output was {:?}",
        outcome.output
    );
    outcome
}
