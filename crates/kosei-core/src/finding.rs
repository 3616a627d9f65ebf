use serde::Serialize;

/// Classification of a finding: must-fix versus optional improvement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Suggestion,
    Error,
}

impl Severity {
    pub fn label(self) -> &'static str {
        match self {
            Severity::Suggestion => "suggestion",
            Severity::Error => "error",
        }
    }
}

/// One reported issue, produced by either the local checker or the AI review
/// parser. Value-like: no identity beyond its fields, created fresh on every
/// check run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    /// Free-form category tag (e.g. 句読点重複, "AI: 誤字"). Local rules and
    /// the model both contribute arbitrary names, so this is not an enum.
    pub category: String,
    /// 1-based line number; 0 when the source did not supply one.
    pub line: u32,
    /// 0-based character offset within the line; 0 when not applicable.
    pub offset: u32,
    /// The exact substring (or model-quoted excerpt) that triggered the finding.
    pub matched_text: String,
    /// Human-readable explanation, with a suggested fix appended when one exists.
    pub message: String,
    pub severity: Severity,
}

/// Aggregate counters for one check run. Character and line counts come from
/// the submitted text itself, not from the findings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckSummary {
    pub total: usize,
    pub errors: usize,
    pub suggestions: usize,
    pub char_count: usize,
    pub line_count: usize,
}

impl CheckSummary {
    pub fn from_findings(text: &str, findings: &[Finding]) -> Self {
        let errors = findings
            .iter()
            .filter(|finding| finding.severity == Severity::Error)
            .count();
        Self {
            total: findings.len(),
            errors,
            suggestions: findings.len() - errors,
            char_count: text.chars().count(),
            line_count: text.split('\n').count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(severity: Severity) -> Finding {
        Finding {
            category: "表記統一".to_string(),
            line: 1,
            offset: 0,
            matched_text: "出来る".to_string(),
            message: "ひらがなで書くのが一般的です".to_string(),
            severity,
        }
    }

    #[test]
    fn summary_counts_severities_separately() {
        let findings = vec![
            finding(Severity::Suggestion),
            finding(Severity::Error),
            finding(Severity::Suggestion),
        ];
        let summary = CheckSummary::from_findings("一行目\n二行目", &findings);
        assert_eq!(summary.total, 3);
        assert_eq!(summary.errors, 1);
        assert_eq!(summary.suggestions, 2);
    }

    #[test]
    fn summary_measures_text_not_findings() {
        let summary = CheckSummary::from_findings("あいう\nえお\n", &[]);
        // Two newline-delimited lines plus the trailing empty one.
        assert_eq!(summary.line_count, 3);
        assert_eq!(summary.char_count, 7);
    }
}
