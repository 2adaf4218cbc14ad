//! Forgiving deserializers for AI output and client-authored resume data.
//!
//! Shapes stay explicit: a list field is still a list of strings, a score is still a
//! number. These helpers only absorb the usual wobble (`null`, a comma-separated
//! string instead of an array, a number sent as text).

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum ListOrText {
    List(Vec<Option<String>>),
    Text(String),
}

/// `null`, `"a, b"`, or `["a", "b"]` → trimmed, non-empty strings.
pub fn string_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    let raw = Option::<ListOrText>::deserialize(deserializer)?;
    let items: Vec<String> = match raw {
        None => Vec::new(),
        Some(ListOrText::List(items)) => items.into_iter().flatten().collect(),
        Some(ListOrText::Text(text)) => text.split(',').map(str::to_string).collect(),
    };
    Ok(items
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect())
}

/// `null` → `T::default()`.
pub fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

/// Strings (and bare numbers, e.g. a graduation year) → trimmed `Some`; blank or `null` → `None`.
pub fn opt_string<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<Scalar>::deserialize(deserializer)?;
    Ok(match raw {
        None => None,
        Some(Scalar::Text(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
        Some(Scalar::Int(n)) => Some(n.to_string()),
        Some(Scalar::Float(n)) => Some(n.to_string()),
        Some(Scalar::Bool(b)) => Some(b.to_string()),
    })
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// Clamps any integer-ish value into 0..=100.
pub fn clamp_score(value: i64) -> i32 {
    value.clamp(0, 100) as i32
}

/// A 0–100 score sent as a number or numeric string; out-of-range values are clamped.
pub fn score<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i32, D::Error> {
    let value = match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n,
        NumberOrText::Text(s) => s
            .trim()
            .trim_end_matches('%')
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("score is not a number: '{s}'")))?,
    };
    if !value.is_finite() {
        return Err(serde::de::Error::custom("score is not finite"));
    }
    Ok(clamp_score(value.round() as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "string_list")]
        skills: Vec<String>,
        #[serde(default, deserialize_with = "opt_string")]
        year: Option<String>,
    }

    #[derive(Debug, Deserialize)]
    struct Scored {
        #[serde(deserialize_with = "score")]
        score: i32,
    }

    fn probe(value: serde_json::Value) -> Probe {
        serde_json::from_value(value).unwrap()
    }

    fn scored(value: serde_json::Value) -> Result<i32, serde_json::Error> {
        serde_json::from_value::<Scored>(json!({ "score": value })).map(|s| s.score)
    }

    #[test]
    fn test_string_list_accepts_array_text_and_null() {
        assert_eq!(probe(json!({"skills": ["Rust", " SQL ", ""]})).skills, ["Rust", "SQL"]);
        assert_eq!(probe(json!({"skills": "Rust, Go ,"})).skills, ["Rust", "Go"]);
        assert!(probe(json!({"skills": null})).skills.is_empty());
        assert!(probe(json!({})).skills.is_empty());
    }

    #[test]
    fn test_string_list_rejects_objects() {
        assert!(serde_json::from_value::<Probe>(json!({"skills": {"a": 1}})).is_err());
    }

    #[test]
    fn test_opt_string_blank_is_none_and_numbers_are_text() {
        assert_eq!(probe(json!({"year": "  "})).year, None);
        assert_eq!(probe(json!({"year": 2019})).year.as_deref(), Some("2019"));
        assert_eq!(probe(json!({"year": " 2020 "})).year.as_deref(), Some("2020"));
    }

    #[test]
    fn test_score_clamped_and_parsed() {
        assert_eq!(scored(json!(150)).unwrap(), 100);
        assert_eq!(scored(json!(-5)).unwrap(), 0);
        assert_eq!(scored(json!("72")).unwrap(), 72);
        assert_eq!(scored(json!("85%")).unwrap(), 85);
        assert_eq!(scored(json!(66.6)).unwrap(), 67);
        assert!(scored(json!("high")).is_err());
    }
}
