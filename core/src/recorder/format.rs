use crate::trial::TrialOutcome;

pub const PROGRESS_CSV_HEADER: &str = "pair_i,pair_j,success,elapsed_time\n";

const RULE_WIDTH: usize = 80;

/// Line closing every record of the solutions log.
pub const RECORD_SEPARATOR: &str =
    "================================================================================";

pub const SOLUTIONS_BANNER: &str = "Solutions Summary\n\
================================================================================\n\n";

/// Full per-trial artifact: header fields, then stdout, then stderr.
pub fn render_trial_artifact(outcome: &TrialOutcome) -> String {
    let mut out = String::with_capacity(outcome.stdout.len() + outcome.stderr.len() + 512);
    out.push_str(&format!("Pair i: {}\n", outcome.pair.i));
    out.push_str(&format!("Pair j: {}\n", outcome.pair.j));
    out.push_str(&format!("Elapsed time: {:.2}s\n", outcome.elapsed_seconds()));
    out.push_str(&format!("Command: {}\n", outcome.invocation));
    out.push_str(&format!("Status: {}\n", outcome.status));
    if let Some(code) = outcome.exit_code() {
        out.push_str(&format!("Return code: {code}\n"));
    }
    out.push_str(&format!(
        "Solution found: {}\n",
        if outcome.solution_found { "yes" } else { "no" }
    ));
    out.push_str(&"-".repeat(RULE_WIDTH));
    out.push('\n');
    out.push_str("STDOUT:\n");
    out.push_str(&outcome.stdout);
    out.push_str("\nSTDERR:\n");
    out.push_str(&outcome.stderr);
    out
}

/// One solutions-log record, rendered whole so it can be written in a
/// single call.
pub fn render_solution_record(outcome: &TrialOutcome) -> String {
    let mut out = String::with_capacity(outcome.stdout.len() + 160);
    out.push_str(&format!(
        "Pair i={}, j={}: SOLUTION FOUND (time: {:.2}s)\n",
        outcome.pair.i,
        outcome.pair.j,
        outcome.elapsed_seconds()
    ));
    out.push_str(&outcome.stdout);
    out.push('\n');
    out.push_str(RECORD_SEPARATOR);
    out.push_str("\n\n");
    out
}

pub fn render_progress_row(outcome: &TrialOutcome) -> String {
    format!(
        "{},{},{},{:.2}\n",
        outcome.pair.i,
        outcome.pair.j,
        u8::from(outcome.process_succeeded()),
        outcome.elapsed_seconds()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::ParameterPair;
    use crate::trial::ProcessStatus;
    use pretty_assertions::assert_eq;
    use std::time::Duration;

    fn outcome(status: ProcessStatus) -> TrialOutcome {
        TrialOutcome {
            pair: ParameterPair::new(3, 14),
            status,
            elapsed: Duration::from_millis(2_346),
            stdout: "x = 5;\n----------\n".into(),
            stderr: "warning: slow\n".into(),
            solution_found: true,
            invocation: "minizinc -D a=3 -D b=14 m.mzn".into(),
        }
    }

    #[test]
    fn artifact_puts_stdout_before_stderr() {
        let text = render_trial_artifact(&outcome(ProcessStatus::Exited { code: 0 }));
        let out_at = text.find("STDOUT:\nx = 5;").unwrap();
        let err_at = text.find("STDERR:\nwarning: slow").unwrap();
        assert!(out_at < err_at);
        assert!(text.starts_with("Pair i: 3\nPair j: 14\nElapsed time: 2.35s\n"));
        assert!(!text.contains("Return code"));
    }

    #[test]
    fn artifact_reports_exit_code_on_failure() {
        let text = render_trial_artifact(&outcome(ProcessStatus::Exited { code: 2 }));
        assert!(text.contains("Return code: 2\n"));
        assert!(text.contains("Status: exited with code 2\n"));
    }

    #[test]
    fn solution_record_ends_with_separator() {
        let rec = render_solution_record(&outcome(ProcessStatus::Exited { code: 0 }));
        assert!(rec.starts_with("Pair i=3, j=14: SOLUTION FOUND (time: 2.35s)\n"));
        assert!(rec.ends_with(&format!("{RECORD_SEPARATOR}\n\n")));
        assert_eq!(RECORD_SEPARATOR.len(), RULE_WIDTH);
    }

    #[test]
    fn progress_row_uses_numeric_flag() {
        assert_eq!(
            render_progress_row(&outcome(ProcessStatus::Signaled)),
            "3,14,0,2.35\n"
        );
    }
}
