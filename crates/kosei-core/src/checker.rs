use crate::finding::{Finding, Severity};
use crate::patterns::CATALOG;

/// Lines longer than this many characters get flagged by default.
pub const DEFAULT_MAX_LINE_CHARS: usize = 100;

/// How much of an over-long line is echoed back in the finding.
const LONG_LINE_PREVIEW_CHARS: usize = 50;

const OPEN_QUOTE: char = '「';
const CLOSE_QUOTE: char = '」';

/// Run every catalog rule plus the structural heuristics over `text`.
///
/// Infallible: any input is valid, empty text is one empty line. Findings are
/// appended in discovery order (rule order, then the structural checks per
/// line); the coordinator owns the overall ordering.
pub fn check(text: &str, max_line_chars: usize) -> Vec<Finding> {
    let mut findings = Vec::new();

    for (index, line) in text.split('\n').enumerate() {
        let line_number = (index + 1) as u32;

        for rule in CATALOG.iter() {
            for matched in rule.pattern.find_iter(line) {
                findings.push(Finding {
                    category: rule.category.to_string(),
                    line: line_number,
                    offset: char_offset(line, matched.start()),
                    matched_text: matched.as_str().to_string(),
                    message: rule.message.to_string(),
                    severity: if rule.severe {
                        Severity::Error
                    } else {
                        Severity::Suggestion
                    },
                });
            }
        }

        let char_count = line.chars().count();
        if char_count > max_line_chars {
            let preview: String = line.chars().take(LONG_LINE_PREVIEW_CHARS).collect();
            findings.push(Finding {
                category: "行長すぎ".to_string(),
                line: line_number,
                offset: 0,
                matched_text: format!("{preview}..."),
                message: format!(
                    "行が長すぎます（{char_count}文字）。読みにくさを改善するため、改行を検討してください"
                ),
                severity: Severity::Suggestion,
            });
        }

        if line.contains(OPEN_QUOTE) && !line.contains(CLOSE_QUOTE) {
            let position = line
                .chars()
                .position(|ch| ch == OPEN_QUOTE)
                .unwrap_or(0) as u32;
            findings.push(Finding {
                category: "セリフ閉じ忘れ".to_string(),
                line: line_number,
                offset: position,
                matched_text: OPEN_QUOTE.to_string(),
                message: "セリフの閉じ括弧「」」が見つかりません".to_string(),
                severity: Severity::Error,
            });
        }

        if line.trim().starts_with(OPEN_QUOTE) {
            findings.push(Finding {
                category: "話者不明の可能性".to_string(),
                line: line_number,
                offset: 0,
                matched_text: line.trim().to_string(),
                message: "行頭がセリフで始まっています。話者（キャラクター名やN：ナレーション）の指定が抜けている可能性があります"
                    .to_string(),
                severity: Severity::Suggestion,
            });
        }
    }

    findings
}

/// Convert a regex byte offset into a 0-based character offset.
fn char_offset(line: &str, byte_offset: usize) -> u32 {
    line[..byte_offset].chars().count() as u32
}
