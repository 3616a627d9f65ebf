use once_cell::sync::Lazy;
use regex::Regex;

/// A single style rule: pattern, category tag, and the message attached to
/// every match. `severe` promotes matches to error severity.
pub struct Rule {
    pub pattern: Regex,
    pub category: &'static str,
    pub message: &'static str,
    pub severe: bool,
}

fn rule(pattern: &str, category: &'static str, message: &'static str) -> Rule {
    Rule {
        pattern: Regex::new(pattern).unwrap(),
        category,
        message,
        severe: false,
    }
}

/// Ordered rule table, compiled once at first use. Declaration order is
/// evaluation order: when several rules match the same substring, the earlier
/// rule's finding is emitted first and every match is kept — no deduplication.
pub static CATALOG: Lazy<Vec<Rule>> = Lazy::new(|| {
    vec![
        rule("[。、]{2,}", "句読点重複", "句読点が重複しています"),
        rule("[!?！？]{2,}", "感嘆符重複", "感嘆符や疑問符が重複しています"),
        rule(r"\s{2,}", "空白重複", "不要な空白が連続しています"),
        rule(
            "[ａ-ｚＡ-Ｚ０-９]",
            "全角英数字",
            "全角英数字が使用されています。半角に統一することを推奨します",
        ),
        rule(
            "という事",
            "表記統一",
            "「という事」はひらがなで「ということ」と書くのが一般的です",
        ),
        rule(
            "いう事",
            "表記統一",
            "「いう事」はひらがなで「いうこと」と書くのが一般的です",
        ),
        rule(
            "出来る",
            "表記統一",
            "補助動詞の「できる」はひらがなで書くのが一般的です",
        ),
        rule(
            "無い",
            "表記統一",
            "補助形容詞の「ない」はひらがなで書くのが一般的です",
        ),
        rule("見れる", "ら抜き言葉", "「見れる」は「見られる」が正しい表現です"),
        rule(
            "食べれる",
            "ら抜き言葉",
            "「食べれる」は「食べられる」が正しい表現です",
        ),
        rule(
            "です。ます。",
            "文体混在",
            "「ですます調」が不自然に連続している可能性があります",
        ),
    ]
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catalog_compiles_and_keeps_declaration_order() {
        assert_eq!(CATALOG[0].category, "句読点重複");
        assert_eq!(CATALOG.last().unwrap().category, "文体混在");
    }

    #[test]
    fn duplicate_punctuation_matches_mixed_marks() {
        let matched = CATALOG[0].pattern.find("そうですね。、").unwrap();
        assert_eq!(matched.as_str(), "。、");
    }

    #[test]
    fn no_rule_is_marked_severe() {
        // Error severity comes only from the structural unclosed-quote check.
        assert!(CATALOG.iter().all(|rule| !rule.severe));
    }
}
