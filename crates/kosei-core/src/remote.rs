use once_cell::sync::Lazy;
use regex::Regex;

use crate::finding::{Finding, Severity};

/// Category labels that force error severity for AI-sourced findings.
pub const HARD_ERROR_CATEGORIES: &[&str] = &["誤字", "脱字", "文法エラー", "セリフ閉じ忘れ"];

/// Marker prepended to AI-sourced categories so they stay distinguishable
/// from local checker categories downstream.
pub const AI_CATEGORY_PREFIX: &str = "AI: ";

static DIGIT_RUN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Build the fixed review prompt embedding the script and the expected reply
/// grammar. The labeled-field format here is what [`parse_review`] expects;
/// the model is asked for it, not guaranteed to honor it.
pub fn build_review_prompt(text: &str) -> String {
    format!(
        "以下の台本テキストをプロの校正者としてレビューしてください。\n\
         誤字脱字、文法的な誤り、表記の揺れ、不自然な言い回し、台本として不適切な箇所を厳しくチェックし、具体的な修正案を提示してください。\n\
         特に、**各セリフの前に話者（例：「田中」「N」など）が明記されているか**を確認し、話者が不明なセリフは必ず指摘してください。\n\
         \n\
         【台本テキスト】\n\
         {text}\n\
         \n\
         【出力形式】\n\
         発見した問題点について、以下の箇条書き形式（必ずハイフン `-` で始めてください）で回答してください。\n\
         問題が見つからない場合は「問題は見つかりませんでした。」とだけ回答してください。\n\
         ---\n\
         - 種類: (誤字/表記揺れ/表現改善/話者不明/文法エラー/その他)\n\
         - 行番号: (問題がある箇所の行番号)\n\
         - 問題箇所: (原文のテキスト)\n\
         - 修正案: (具体的な修正案)\n\
         - 理由: (なぜ修正が必要なのか、その理由)\n\
         ---\n"
    )
}

/// One issue block being accumulated during the parse.
#[derive(Default)]
struct IssueDraft {
    category: Option<String>,
    line: u32,
    excerpt: String,
    suggestion: Option<String>,
    rationale: Option<String>,
    touched: bool,
}

impl IssueDraft {
    /// A block that never named a category is dropped entirely; everything
    /// else defaults.
    fn into_finding(self) -> Option<Finding> {
        let category = self.category?;

        let mut message = self.rationale.unwrap_or_default();
        if let Some(suggestion) = self.suggestion {
            if !message.is_empty() {
                message.push('\n');
            }
            message.push_str("提案: 「");
            message.push_str(&suggestion);
            message.push('」');
        }

        let severity = if HARD_ERROR_CATEGORIES
            .iter()
            .any(|hard| category.contains(hard))
        {
            Severity::Error
        } else {
            Severity::Suggestion
        };

        Some(Finding {
            category: format!("{AI_CATEGORY_PREFIX}{category}"),
            line: self.line,
            offset: 0,
            matched_text: self.excerpt,
            message,
            severity,
        })
    }
}

/// Parse a freeform model reply into findings.
///
/// Tolerant by design: blocks are split on `---` delimiter lines, a
/// reappearing 種類 label restarts a new issue mid-block, emphasis markup and
/// bullet markers are stripped before label matching, and unknown labels are
/// skipped. Malformed input never fails — worst case the result is empty.
pub fn parse_review(response: &str) -> Vec<Finding> {
    let mut findings = Vec::new();
    let mut draft = IssueDraft::default();

    for raw_line in response.lines() {
        if is_delimiter(raw_line) {
            flush(&mut draft, &mut findings);
            continue;
        }

        let cleaned = raw_line.replace('*', "");
        let Some((label, value)) = split_labeled_field(&cleaned) else {
            continue;
        };

        match label.as_str() {
            "種類" => {
                // A second 種類 inside one block starts a new issue.
                if draft.category.is_some() {
                    flush(&mut draft, &mut findings);
                }
                draft.category = Some(value);
                draft.touched = true;
            }
            "行番号" => {
                draft.line = DIGIT_RUN_RE
                    .find(&value)
                    .and_then(|digits| digits.as_str().parse().ok())
                    .unwrap_or(0);
                draft.touched = true;
            }
            "問題箇所" => {
                draft.excerpt = value;
                draft.touched = true;
            }
            "修正案" => {
                draft.suggestion = Some(value);
                draft.touched = true;
            }
            "理由" => {
                draft.rationale = Some(value);
                draft.touched = true;
            }
            _ => {}
        }
    }

    flush(&mut draft, &mut findings);
    findings
}

fn flush(draft: &mut IssueDraft, findings: &mut Vec<Finding>) {
    if !draft.touched {
        return;
    }
    if let Some(finding) = std::mem::take(draft).into_finding() {
        findings.push(finding);
    }
}

/// Block delimiter: a line of three or more dashes and nothing else.
fn is_delimiter(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.len() >= 3 && trimmed.chars().all(|ch| ch == '-')
}

/// Split a line into a normalized label and its value on the first colon
/// (ASCII or full-width). Bullet markers and stray emphasis leftovers are
/// stripped from the label side.
fn split_labeled_field(line: &str) -> Option<(String, String)> {
    let colon = line.char_indices().find(|(_, ch)| *ch == ':' || *ch == '：')?;
    let (head, tail) = line.split_at(colon.0);
    let value = tail[colon.1.len_utf8()..].trim().to_string();
    let label: String = head
        .trim()
        .trim_matches(|ch: char| ch == '-' || ch == '・' || ch.is_whitespace())
        .to_string();
    if label.is_empty() {
        return None;
    }
    Some((label, value))
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = "\
---
- 種類: 誤字
- 行番号: 3
- 問題箇所: こんにちわ
- 修正案: こんにちは
- 理由: 挨拶の表記が誤っています
---
- 種類: 表現改善
- 行番号: 7行目
- 問題箇所: とてもとても嬉しい
- 修正案: とても嬉しい
- 理由: 重複表現は避けたほうが自然です
---
";

    #[test]
    fn well_formed_blocks_round_trip() {
        let findings = parse_review(WELL_FORMED);
        assert_eq!(findings.len(), 2);

        assert_eq!(findings[0].category, "AI: 誤字");
        assert_eq!(findings[0].line, 3);
        assert_eq!(findings[0].offset, 0);
        assert_eq!(findings[0].matched_text, "こんにちわ");
        assert_eq!(findings[0].severity, Severity::Error);
        assert!(findings[0].message.contains("挨拶の表記が誤っています"));
        assert!(findings[0].message.contains("提案: 「こんにちは」"));

        assert_eq!(findings[1].category, "AI: 表現改善");
        assert_eq!(findings[1].line, 7);
        assert_eq!(findings[1].severity, Severity::Suggestion);
    }

    #[test]
    fn emphasis_markup_and_bullets_are_stripped() {
        let response = "**種類**: 文法エラー\n・**行番号**: 12\n- 問題箇所: が、が";
        let findings = parse_review(response);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, "AI: 文法エラー");
        assert_eq!(findings[0].line, 12);
        assert_eq!(findings[0].matched_text, "が、が");
    }

    #[test]
    fn full_width_colon_is_accepted() {
        let findings = parse_review("- 種類：話者不明\n- 行番号：5");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, "AI: 話者不明");
        assert_eq!(findings[0].line, 5);
    }

    #[test]
    fn missing_category_discards_the_block() {
        let response = "\
---
- 行番号: 4
- 問題箇所: なにか
---
- 種類: 誤字
- 問題箇所: てにをは
---
";
        let findings = parse_review(response);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, "AI: 誤字");
        // Missing fields default rather than failing.
        assert_eq!(findings[0].line, 0);
        assert_eq!(findings[0].message, "");
    }

    #[test]
    fn non_numeric_line_defaults_to_unknown() {
        let findings = parse_review("- 種類: 誤字\n- 行番号: 不明");
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].line, 0);
    }

    #[test]
    fn repeated_category_without_delimiter_starts_a_new_issue() {
        let response = "\
- 種類: 誤字
- 問題箇所: ひとつめ
- 種類: 表記揺れ
- 問題箇所: ふたつめ
";
        let findings = parse_review(response);
        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].matched_text, "ひとつめ");
        assert_eq!(findings[1].category, "AI: 表記揺れ");
    }

    #[test]
    fn hard_error_set_drives_severity() {
        for (category, expected) in [
            ("誤字", Severity::Error),
            ("脱字", Severity::Error),
            ("文法エラー", Severity::Error),
            ("セリフ閉じ忘れ", Severity::Error),
            ("表現改善", Severity::Suggestion),
            ("その他", Severity::Suggestion),
        ] {
            let findings = parse_review(&format!("- 種類: {category}"));
            assert_eq!(findings[0].severity, expected, "category {category}");
        }
    }

    #[test]
    fn degenerate_inputs_produce_no_findings() {
        assert!(parse_review("").is_empty());
        assert!(parse_review("問題は見つかりませんでした。").is_empty());
        assert!(parse_review("----\n----\n----").is_empty());
        assert!(parse_review("ここにコロンはあるが: ラベルが未知").is_empty());
    }

    #[test]
    fn prompt_embeds_script_and_grammar() {
        let prompt = build_review_prompt("田中「おはよう」");
        assert!(prompt.contains("田中「おはよう」"));
        assert!(prompt.contains("- 種類:"));
        assert!(prompt.contains("【出力形式】"));
    }
}
