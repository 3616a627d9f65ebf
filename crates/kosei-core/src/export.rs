use chrono::Local;

use crate::finding::{CheckSummary, Finding};

/// UTF-8 BOM so spreadsheet applications pick up the encoding.
const CSV_BOM: &str = "\u{feff}";
const CSV_HEADER: &str = "category,line,offset,matched_text,message,severity";

/// Timestamped default name for an exported CSV report.
pub fn default_csv_filename() -> String {
    format!("校正結果_{}.csv", Local::now().format("%Y%m%d_%H%M%S"))
}

/// Serialize findings as one CSV row each, CRLF-terminated, BOM-prefixed.
pub fn to_csv(findings: &[Finding]) -> String {
    let mut out = String::from(CSV_BOM);
    out.push_str(CSV_HEADER);
    out.push_str("\r\n");

    for finding in findings {
        let row = [
            csv_field(&finding.category),
            finding.line.to_string(),
            finding.offset.to_string(),
            csv_field(&finding.matched_text),
            csv_field(&finding.message),
            finding.severity.label().to_string(),
        ];
        out.push_str(&row.join(","));
        out.push_str("\r\n");
    }

    out
}

fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// Flat human-readable report: summary header, then one stanza per finding.
pub fn to_text_report(summary: &CheckSummary, findings: &[Finding]) -> String {
    let mut out = format!(
        "指摘 {total}件（重大 {errors} / 提案 {suggestions}）　文字数 {chars}　行数 {lines}\n\n",
        total = summary.total,
        errors = summary.errors,
        suggestions = summary.suggestions,
        chars = summary.char_count,
        lines = summary.line_count,
    );

    if findings.is_empty() {
        out.push_str("問題は見つかりませんでした。\n");
        return out;
    }

    for finding in findings {
        let line_label = if finding.line == 0 {
            "不明".to_string()
        } else {
            finding.line.to_string()
        };
        out.push_str(&format!(
            "[{category}] 行:{line_label}\n問題箇所: {matched}\n詳細: {message}\n\n",
            category = finding.category,
            matched = finding.matched_text,
            message = finding.message,
        ));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::finding::Severity;

    fn sample() -> Vec<Finding> {
        vec![
            Finding {
                category: "句読点重複".to_string(),
                line: 2,
                offset: 5,
                matched_text: "。。".to_string(),
                message: "句読点が重複しています".to_string(),
                severity: Severity::Suggestion,
            },
            Finding {
                category: "AI: 誤字".to_string(),
                line: 0,
                offset: 0,
                matched_text: "こんにちわ".to_string(),
                message: "表記が誤っています\n提案: 「こんにちは」".to_string(),
                severity: Severity::Error,
            },
        ]
    }

    #[test]
    fn csv_has_bom_header_and_one_row_per_finding() {
        let csv = to_csv(&sample());
        assert!(csv.starts_with(CSV_BOM));
        let rows: Vec<&str> = csv.trim_start_matches(CSV_BOM).split("\r\n").collect();
        assert_eq!(rows[0], CSV_HEADER);
        assert!(rows[1].starts_with("句読点重複,2,5,。。,"));
        // Trailing CRLF leaves one empty slot.
        assert_eq!(rows.len(), 4);
    }

    #[test]
    fn csv_quotes_fields_with_separators_and_newlines() {
        let csv = to_csv(&sample());
        // The AI message contains a newline, so the field must be quoted.
        assert!(csv.contains("\"表記が誤っています\n提案: 「こんにちは」\""));

        let tricky = vec![Finding {
            category: "a,b".to_string(),
            line: 1,
            offset: 0,
            matched_text: "say \"hi\"".to_string(),
            message: String::new(),
            severity: Severity::Suggestion,
        }];
        let csv = to_csv(&tricky);
        assert!(csv.contains("\"a,b\",1,0,\"say \"\"hi\"\"\","));
    }

    #[test]
    fn text_report_renders_stanzas_and_unknown_lines() {
        let findings = sample();
        let summary = CheckSummary::from_findings("一行目\n二行目", &findings);
        let report = to_text_report(&summary, &findings);
        assert!(report.contains("指摘 2件（重大 1 / 提案 1）"));
        assert!(report.contains("[句読点重複] 行:2"));
        assert!(report.contains("[AI: 誤字] 行:不明"));
        assert!(report.contains("問題箇所: こんにちわ"));
    }

    #[test]
    fn empty_result_reports_success() {
        let summary = CheckSummary::from_findings("きれいな台本", &[]);
        let report = to_text_report(&summary, &[]);
        assert!(report.contains("問題は見つかりませんでした。"));
    }

    #[test]
    fn default_filename_is_timestamped() {
        let name = default_csv_filename();
        assert!(name.starts_with("校正結果_"));
        assert!(name.ends_with(".csv"));
    }
}
