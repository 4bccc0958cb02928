//! Console status lines.

use console::style;
use std::fmt::Display;

const FAILURE_ERRORS: [&str; 3] = [
    "[ERROR] Something went wrong.",
    "Your function may not have been properly registered.",
    "Please remove all traces of the function in API Gateway, Lambda and local.",
];

const FAILURE_ADVICE: [&str; 2] = [
    "If this keeps happening, please manually create your directories as all others,",
    "or ask a senior for help.",
];

/// A phase is starting.
pub fn phase(message: impl Display) {
    println!("\n{}", style(message).yellow());
}

/// A phase finished.
pub fn success(message: impl Display) {
    println!("\n{}", style(message).black().on_green());
}

pub fn warning(message: impl Display) {
    eprintln!("\n{}", style(message).yellow());
}

pub fn duplicate_name() {
    eprintln!(
        "\n{}\n",
        style("[ERROR] This function already exists, please try again.").red()
    );
}

/// Render the error and the fixed operator instructions.
pub fn failure_report(err: &anyhow::Error) -> String {
    let mut report = format!("{err:#}\n");
    for line in FAILURE_ERRORS {
        report.push_str(&format!("\n{}\n", style(line).red()));
    }
    for line in FAILURE_ADVICE {
        report.push_str(&format!("\n{}", style(line).yellow()));
    }
    report
}

pub fn report_failure(err: &anyhow::Error) {
    eprintln!("{}", failure_report(err));
}
