use tracing::{debug, warn};

use crate::checker::{self, DEFAULT_MAX_LINE_CHARS};
use crate::finding::{CheckSummary, Finding, Severity};
use crate::openrouter::ReviewClient;
use crate::remote;

/// Which checks a run performs.
#[derive(Debug, Clone, Copy)]
pub struct CheckOptions {
    pub local: bool,
    pub remote: bool,
    pub max_line_chars: usize,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            local: true,
            remote: false,
            max_line_chars: DEFAULT_MAX_LINE_CHARS,
        }
    }
}

/// Result of one check run. `remote_error` is set when the AI pass was
/// requested but failed; the findings then contain only the local results.
#[derive(Debug, Clone)]
pub struct CheckOutcome {
    pub findings: Vec<Finding>,
    pub summary: CheckSummary,
    pub remote_error: Option<String>,
}

/// Run the selected checks over `text` and return the merged, ordered
/// findings plus aggregate statistics.
///
/// The remote round trip is the only thing here that can take time or fail,
/// and its failure is isolated: it is recorded on the outcome, never raised,
/// and never discards local results. Each call is independent — no state
/// survives between runs.
pub async fn run_check<C: ReviewClient>(
    text: &str,
    options: CheckOptions,
    client: Option<&C>,
) -> CheckOutcome {
    let mut findings = Vec::new();
    let mut remote_error = None;

    if options.local {
        let local = checker::check(text, options.max_line_chars);
        debug!(count = local.len(), "local checks finished");
        findings.extend(local);
    }

    if options.remote {
        match client {
            Some(client) => {
                let prompt = remote::build_review_prompt(text);
                match client.review(&prompt).await {
                    Ok(response) => {
                        let parsed = remote::parse_review(&response);
                        debug!(count = parsed.len(), "AI review parsed");
                        findings.extend(parsed);
                    }
                    Err(err) => {
                        warn!(error = %err, "AI review failed; keeping local findings");
                        remote_error = Some(err.to_string());
                    }
                }
            }
            None => {
                remote_error = Some("AI review requested but no client was supplied".to_string());
            }
        }
    }

    merge_and_sort(&mut findings);
    let summary = CheckSummary::from_findings(text, &findings);

    CheckOutcome {
        findings,
        summary,
        remote_error,
    }
}

/// Stable sort on `(line, severity == error)`, both ascending. Unknown lines
/// (0) sort first, and suggestions come before errors within a line — the
/// tool this replaces ordered results that way, so the tie-break is kept
/// as observed rather than flipped to errors-first.
pub fn merge_and_sort(findings: &mut [Finding]) {
    findings.sort_by_key(|finding| (finding.line, finding.severity == Severity::Error));
}
