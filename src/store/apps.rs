//! Line-preserving model of `applications.txt`.
//!
//! Each rule line is `domain|weight|endpoint`. Comment (`#`) and blank lines,
//! as well as any fields past the third, are kept byte-for-byte so that
//! rewriting one weight never disturbs the rest of the file.

use serde::{Deserialize, Serialize};

/// One traffic rule as exposed by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApplicationRule {
    pub domain: String,
    pub weight: u64,
    pub endpoint: String,
}

/// A single physical line of the apps file.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Line {
    /// Comment or blank line, reproduced verbatim.
    Verbatim(String),
    /// Rule line split on `|`.
    Rule(Vec<String>),
}

impl Line {
    fn parse(raw: &str) -> Self {
        if raw.is_empty() || raw.starts_with('#') {
            Line::Verbatim(raw.to_string())
        } else {
            Line::Rule(raw.split('|').map(str::to_string).collect())
        }
    }

    fn render(&self) -> String {
        match self {
            Line::Verbatim(raw) => raw.clone(),
            Line::Rule(fields) => fields.join("|"),
        }
    }
}

/// Parsed apps file. `render(parse(text)) == text` for any input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppsDocument {
    lines: Vec<Line>,
}

impl AppsDocument {
    /// Split on `\n` only, so `\r` and a missing or present trailing newline
    /// survive a round trip.
    pub fn parse(text: &str) -> Self {
        Self {
            lines: text.split('\n').map(Line::parse).collect(),
        }
    }

    pub fn render(&self) -> String {
        self.lines
            .iter()
            .map(Line::render)
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Rules in file order.
    pub fn rules(&self) -> Vec<ApplicationRule> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                Line::Rule(fields) => Some(rule_from_fields(fields)),
                Line::Verbatim(_) => None,
            })
            .collect()
    }

    /// Replace the weight field of every line starting with `domain|`.
    ///
    /// Returns the number of lines rewritten. Zero means the document is
    /// unchanged.
    pub fn set_weight(&mut self, domain: &str, weight: u64) -> usize {
        let prefix = format!("{domain}|");
        let mut matched = 0;
        for line in &mut self.lines {
            if let Line::Rule(fields) = line
                && fields.join("|").starts_with(&prefix)
            {
                fields[1] = weight.to_string();
                matched += 1;
            }
        }
        matched
    }
}

fn rule_from_fields(fields: &[String]) -> ApplicationRule {
    ApplicationRule {
        domain: fields.first().cloned().unwrap_or_default(),
        weight: fields.get(1).map(|w| parse_weight(w)).unwrap_or(0),
        endpoint: fields.get(2).cloned().unwrap_or_default(),
    }
}

/// Lenient weight parser.
///
/// Leading whitespace is skipped and the leading run of decimal digits is
/// used (`"12abc"` → 12). Anything without leading digits, including
/// negative numbers, reads as 0.
pub fn parse_weight(raw: &str) -> u64 {
    let digits: String = raw
        .trim_start()
        .trim_start_matches('+')
        .chars()
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "# domain|weight|endpoint\n\
google.com|50|/search\n\
\n\
github.com|30|/\n\
# disabled: slack.com|10|/api\n\
api.example.com|bad|/v1\n";

    #[test]
    fn rules_skip_comments_and_blanks() {
        let doc = AppsDocument::parse(SAMPLE);
        let rules = doc.rules();
        assert_eq!(rules.len(), 3);
        assert_eq!(
            rules[0],
            ApplicationRule {
                domain: "google.com".to_string(),
                weight: 50,
                endpoint: "/search".to_string(),
            }
        );
        assert_eq!(rules[1].domain, "github.com");
        assert_eq!(rules[2].weight, 0);
    }

    #[test]
    fn render_reproduces_input() {
        for text in [
            SAMPLE,
            "a.com|1|/",
            "a.com|1|/\r\nb.com|2|/x\r\n",
            "x.com| 7 |/p|extra|fields\n\n\n",
            "",
            "\n",
            "#only a comment",
        ] {
            assert_eq!(AppsDocument::parse(text).render(), text);
        }
    }

    #[test]
    fn set_weight_touches_only_the_weight_field() {
        let mut doc = AppsDocument::parse(SAMPLE);
        assert_eq!(doc.set_weight("github.com", 75), 1);
        let expected = SAMPLE.replace("github.com|30|/", "github.com|75|/");
        assert_eq!(doc.render(), expected);
    }

    #[test]
    fn set_weight_preserves_extra_fields() {
        let mut doc = AppsDocument::parse("x.com|1|/p|tag|more\n");
        doc.set_weight("x.com", 9);
        assert_eq!(doc.render(), "x.com|9|/p|tag|more\n");
    }

    #[test]
    fn set_weight_requires_exact_domain_boundary() {
        let mut doc = AppsDocument::parse("api|1|/\napi-v2|2|/\n");
        assert_eq!(doc.set_weight("api", 5), 1);
        assert_eq!(doc.render(), "api|5|/\napi-v2|2|/\n");
    }

    #[test]
    fn set_weight_updates_every_duplicate() {
        let mut doc = AppsDocument::parse("dup.com|1|/a\nother|2|/\ndup.com|3|/b\n");
        assert_eq!(doc.set_weight("dup.com", 8), 2);
        assert_eq!(doc.render(), "dup.com|8|/a\nother|2|/\ndup.com|8|/b\n");
    }

    #[test]
    fn set_weight_on_unknown_domain_is_a_noop() {
        let mut doc = AppsDocument::parse(SAMPLE);
        assert_eq!(doc.set_weight("missing.com", 10), 0);
        assert_eq!(doc.render(), SAMPLE);
    }

    #[test]
    fn set_weight_never_matches_comment_lines() {
        let mut doc = AppsDocument::parse("# disabled: slack.com|10|/api\n");
        assert_eq!(doc.set_weight("# disabled: slack.com", 1), 0);
    }

    #[test]
    fn rule_without_endpoint_reads_empty() {
        let rules = AppsDocument::parse("bare.com|4").rules();
        assert_eq!(rules[0].endpoint, "");
        assert_eq!(rules[0].weight, 4);
        let rules = AppsDocument::parse("lonely.com").rules();
        assert_eq!(rules[0].weight, 0);
    }

    #[test]
    fn parse_weight_is_lenient() {
        assert_eq!(parse_weight("42"), 42);
        assert_eq!(parse_weight(" 42"), 42);
        assert_eq!(parse_weight("12abc"), 12);
        assert_eq!(parse_weight("abc"), 0);
        assert_eq!(parse_weight(""), 0);
        assert_eq!(parse_weight("-3"), 0);
        assert_eq!(parse_weight("3.9"), 3);
    }
}
