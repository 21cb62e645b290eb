/// Local JSON syntax validation for the seed field and the output panel.
///
/// Pure functions only: no I/O, no state. The validator answers three
/// questions for a piece of text:
///
/// - is there anything to validate at all (empty input is **neutral**, not
///   invalid, so the indicator is cleared instead of turning red);
/// - is it syntactically valid JSON, and if so what does it look like
///   pretty-printed with 2-space indentation;
/// - if not, what did the parser say (surfaced verbatim).
///
/// Key order is preserved when pretty-printing (`serde_json` is built with
/// `preserve_order`), so the output panel shows keys in the order the service
/// produced them.
use serde_json::Value;

/// Outcome of validating a piece of text as JSON.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JsonValidation {
    /// Empty or whitespace-only input. Neither valid nor invalid.
    Empty,
    /// Syntactically valid JSON, pretty-printed for display.
    Valid { pretty: String },
    /// Malformed JSON with the parser's error detail.
    Invalid { detail: String },
}

impl JsonValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self, Self::Invalid { .. })
    }
}

/// Validate `text` as JSON.
pub fn validate(text: &str) -> JsonValidation {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return JsonValidation::Empty;
    }

    match parse(trimmed) {
        Ok(value) => match serde_json::to_string_pretty(&value) {
            Ok(pretty) => JsonValidation::Valid { pretty },
            Err(e) => JsonValidation::Invalid {
                detail: e.to_string(),
            },
        },
        Err(detail) => JsonValidation::Invalid { detail },
    }
}

/// Parse `text` as JSON, returning the parser's error detail on failure.
pub fn parse(text: &str) -> Result<Value, String> {
    serde_json::from_str::<Value>(text).map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Output panel formatting
// ---------------------------------------------------------------------------

/// How a configuration string should appear in the output panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisplayJson {
    /// Valid JSON, pretty-printed.
    Formatted(String),
    /// Not valid JSON; shown as-is in the error colour.
    Raw(String),
}

impl DisplayJson {
    pub fn text(&self) -> &str {
        match self {
            Self::Formatted(s) | Self::Raw(s) => s,
        }
    }
}

/// Format configuration text for the output panel.
pub fn display(text: &str) -> DisplayJson {
    match validate(text) {
        JsonValidation::Valid { pretty } => DisplayJson::Formatted(pretty),
        _ => DisplayJson::Raw(text.to_string()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_are_neutral() {
        assert_eq!(validate(""), JsonValidation::Empty);
        assert_eq!(validate("   \n\t "), JsonValidation::Empty);
    }

    #[test]
    fn valid_object_is_pretty_printed_with_two_spaces() {
        let result = validate(r#"{"variants":2}"#);
        assert_eq!(
            result,
            JsonValidation::Valid {
                pretty: "{\n  \"variants\": 2\n}".to_string()
            }
        );
    }

    #[test]
    fn pretty_print_preserves_key_order() {
        let result = validate(r#"{"zeta":1,"alpha":{"b":2,"a":1}}"#);
        let JsonValidation::Valid { pretty } = result else {
            panic!("expected valid JSON");
        };
        let zeta = pretty.find("zeta").unwrap();
        let alpha = pretty.find("alpha").unwrap();
        assert!(zeta < alpha);
        assert!(pretty.find("\"b\"").unwrap() < pretty.find("\"a\"").unwrap());
    }

    #[test]
    fn pretty_form_reparses_to_same_value() {
        let inputs = [
            r#"{"experiment":{"name":"cta","variants":[{"id":"a","weight":50},{"id":"b","weight":50}]}}"#,
            "[1, 2.5, \"three\", null, true]",
            "\"just a string\"",
            "42",
        ];
        for input in inputs {
            let JsonValidation::Valid { pretty } = validate(input) else {
                panic!("expected valid JSON for {input}");
            };
            let original: Value = serde_json::from_str(input).unwrap();
            let reparsed: Value = serde_json::from_str(&pretty).unwrap();
            assert_eq!(original, reparsed, "round trip changed {input}");
        }
    }

    #[test]
    fn malformed_input_reports_parser_detail() {
        let result = validate("{not json");
        let JsonValidation::Invalid { detail } = result else {
            panic!("expected invalid JSON");
        };
        let expected = serde_json::from_str::<Value>("{not json")
            .unwrap_err()
            .to_string();
        assert_eq!(detail, expected);
        assert!(detail.contains("line 1"));
    }

    #[test]
    fn malformed_inputs_never_panic() {
        for input in ["{", "}", "[1,]", "{\"a\":}", "nul", "\u{0}", "{\"a\" 1}", "'single'"] {
            assert!(validate(input).is_invalid(), "{input:?} should be invalid");
        }
    }

    #[test]
    fn display_formats_valid_json() {
        assert_eq!(
            display("{\"variants\":2}"),
            DisplayJson::Formatted("{\n  \"variants\": 2\n}".to_string())
        );
    }

    #[test]
    fn display_falls_back_to_raw_text() {
        let shown = display("variants: two");
        assert_eq!(shown, DisplayJson::Raw("variants: two".to_string()));
        assert_eq!(shown.text(), "variants: two");
    }
}
