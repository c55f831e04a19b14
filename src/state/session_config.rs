//! Session configuration and lenient input clamping

use serde::{Deserialize, Serialize};

/// Smallest accepted value for any numeric session field
pub const MIN_FIELD: u32 = 1;
/// Largest accepted value for any numeric session field
pub const MAX_FIELD: u32 = 99;

/// Validated configuration for one Pomodoro session.
///
/// Every numeric field is kept within `[MIN_FIELD, MAX_FIELD]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    pub target_loops: u32,
    pub work_minutes: u32,
    pub rest_minutes: u32,
    pub long_rest_minutes: u32,
    /// Substitute `long_rest_minutes` for the rest after every fourth loop
    pub supports_long_rest: bool,
}

impl SessionConfig {
    pub fn new(
        target_loops: u32,
        work_minutes: u32,
        rest_minutes: u32,
        long_rest_minutes: u32,
        supports_long_rest: bool,
    ) -> Self {
        Self {
            target_loops,
            work_minutes,
            rest_minutes,
            long_rest_minutes,
            supports_long_rest,
        }
        .clamped()
    }

    /// Return a copy with every numeric field pulled back into range
    pub fn clamped(self) -> Self {
        Self {
            target_loops: clamp_field(self.target_loops as i64),
            work_minutes: clamp_field(self.work_minutes as i64),
            rest_minutes: clamp_field(self.rest_minutes as i64),
            long_rest_minutes: clamp_field(self.long_rest_minutes as i64),
            supports_long_rest: self.supports_long_rest,
        }
    }

    /// Overlay raw user input onto this configuration
    pub fn merged(self, input: &SessionConfigInput) -> Self {
        let pick = |field: &Option<FieldInput>, current: u32| {
            field.as_ref().map_or(current, FieldInput::sanitize)
        };

        Self {
            target_loops: pick(&input.target_loops, self.target_loops),
            work_minutes: pick(&input.work_minutes, self.work_minutes),
            rest_minutes: pick(&input.rest_minutes, self.rest_minutes),
            long_rest_minutes: pick(&input.long_rest_minutes, self.long_rest_minutes),
            supports_long_rest: input.supports_long_rest.unwrap_or(self.supports_long_rest),
        }
        .clamped()
    }

    pub fn work_seconds(&self) -> u64 {
        u64::from(self.work_minutes) * 60
    }

    pub fn rest_seconds(&self) -> u64 {
        u64::from(self.rest_minutes) * 60
    }

    pub fn long_rest_seconds(&self) -> u64 {
        u64::from(self.long_rest_minutes) * 60
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::new(4, 25, 5, 15, true)
    }
}

/// A single raw field as typed by a user: either a JSON number or free text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldInput {
    Number(f64),
    Text(String),
}

impl FieldInput {
    /// Coerce the raw value into `[MIN_FIELD, MAX_FIELD]`, defaulting to `MIN_FIELD`
    pub fn sanitize(&self) -> u32 {
        match self {
            FieldInput::Number(n) if n.is_finite() => clamp_field(n.trunc() as i64),
            FieldInput::Number(_) => MIN_FIELD,
            FieldInput::Text(text) => parse_leading_int(text).map_or(MIN_FIELD, clamp_field),
        }
    }
}

/// Partial, unvalidated configuration as received from a client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfigInput {
    #[serde(default)]
    pub target_loops: Option<FieldInput>,
    #[serde(default)]
    pub work_minutes: Option<FieldInput>,
    #[serde(default)]
    pub rest_minutes: Option<FieldInput>,
    #[serde(default)]
    pub long_rest_minutes: Option<FieldInput>,
    #[serde(default)]
    pub supports_long_rest: Option<bool>,
}

fn clamp_field(value: i64) -> u32 {
    value.clamp(MIN_FIELD as i64, MAX_FIELD as i64) as u32
}

/// Parse the integer prefix of `text`, ignoring surrounding whitespace and
/// any trailing garbage. Returns `None` when no digits lead the string.
fn parse_leading_int(text: &str) -> Option<i64> {
    let text = text.trim();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };

    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    let digits = &rest[..digits_end];
    if digits.is_empty() {
        return None;
    }

    // Too many digits to fit still means "very large", which clamps anyway.
    let magnitude = digits.parse::<i64>().unwrap_or(i64::MAX);
    Some(if negative { -magnitude } else { magnitude })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> FieldInput {
        FieldInput::Text(s.to_string())
    }

    #[test]
    fn test_default_config() {
        let config = SessionConfig::default();
        assert_eq!(config.target_loops, 4);
        assert_eq!(config.work_seconds(), 1500);
        assert_eq!(config.rest_seconds(), 300);
        assert_eq!(config.long_rest_seconds(), 900);
        assert!(config.supports_long_rest);
    }

    #[test]
    fn test_new_clamps_out_of_range_values() {
        let config = SessionConfig::new(0, 120, 99, 100, false);
        assert_eq!(config.target_loops, 1);
        assert_eq!(config.work_minutes, 99);
        assert_eq!(config.rest_minutes, 99);
        assert_eq!(config.long_rest_minutes, 99);
    }

    #[test]
    fn test_text_input_is_parsed_leniently() {
        assert_eq!(text("25").sanitize(), 25);
        assert_eq!(text("  7 ").sanitize(), 7);
        assert_eq!(text("12abc").sanitize(), 12);
        assert_eq!(text("abc").sanitize(), 1);
        assert_eq!(text("").sanitize(), 1);
        assert_eq!(text("-5").sanitize(), 1);
        assert_eq!(text("0").sanitize(), 1);
        assert_eq!(text("150").sanitize(), 99);
        assert_eq!(text("99999999999999999999999").sanitize(), 99);
    }

    #[test]
    fn test_number_input_is_truncated_and_clamped() {
        assert_eq!(FieldInput::Number(3.9).sanitize(), 3);
        assert_eq!(FieldInput::Number(-2.0).sanitize(), 1);
        assert_eq!(FieldInput::Number(1e9).sanitize(), 99);
        assert_eq!(FieldInput::Number(f64::NAN).sanitize(), 1);
    }

    #[test]
    fn test_merge_keeps_missing_fields() {
        let input = SessionConfigInput {
            work_minutes: Some(text("50")),
            supports_long_rest: Some(false),
            ..Default::default()
        };

        let merged = SessionConfig::default().merged(&input);
        assert_eq!(merged.work_minutes, 50);
        assert_eq!(merged.rest_minutes, 5);
        assert_eq!(merged.target_loops, 4);
        assert!(!merged.supports_long_rest);
    }

    #[test]
    fn test_input_deserializes_numbers_and_strings() {
        let input: SessionConfigInput =
            serde_json::from_str(r#"{"targetLoops": 2, "restMinutes": "x"}"#).unwrap();
        let merged = SessionConfig::default().merged(&input);
        assert_eq!(merged.target_loops, 2);
        assert_eq!(merged.rest_minutes, 1);
    }
}
