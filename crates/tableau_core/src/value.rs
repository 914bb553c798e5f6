//! Animating property values
//!
//! Entities declare a small set of their own properties that take part in a
//! transition (a card's face-up state, a token's rotation). Values are kept
//! deliberately simple so before/after snapshots can be compared exactly.

use std::fmt;

use indexmap::IndexMap;

/// Snapshot of an entity's animating properties, in declaration order
pub type PropertyMap = IndexMap<String, PropValue>;

/// A single animating property value
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl PropValue {
    /// Number of quarter turns this value stands for when used as a rotation.
    ///
    /// `true` is one quarter turn (a tapped card), numbers are degrees rounded
    /// to the nearest quarter turn. Text never rotates.
    pub fn quarter_turns(&self) -> i64 {
        match self {
            PropValue::Bool(true) => 1,
            PropValue::Bool(false) => 0,
            PropValue::Number(deg) if deg.is_finite() => (deg / 90.0).round() as i64,
            PropValue::Number(_) => 0,
            PropValue::Text(_) => 0,
        }
    }
}

impl fmt::Display for PropValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropValue::Bool(b) => write!(f, "{}", b),
            PropValue::Number(n) => write!(f, "{}", n),
            PropValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for PropValue {
    fn from(value: bool) -> Self {
        PropValue::Bool(value)
    }
}

impl From<f64> for PropValue {
    fn from(value: f64) -> Self {
        PropValue::Number(value)
    }
}

impl From<i32> for PropValue {
    fn from(value: i32) -> Self {
        PropValue::Number(value as f64)
    }
}

impl From<&str> for PropValue {
    fn from(value: &str) -> Self {
        PropValue::Text(value.to_string())
    }
}

impl From<String> for PropValue {
    fn from(value: String) -> Self {
        PropValue::Text(value)
    }
}

/// Whether a rotation property changed by an odd number of quarter turns.
///
/// A missing value counts as no rotation.
pub fn is_quarter_turn_change(before: Option<&PropValue>, after: Option<&PropValue>) -> bool {
    let turns = |v: Option<&PropValue>| v.map(PropValue::quarter_turns).unwrap_or(0);
    (turns(before) - turns(after)).rem_euclid(2) == 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quarter_turns() {
        assert_eq!(PropValue::Bool(true).quarter_turns(), 1);
        assert_eq!(PropValue::Bool(false).quarter_turns(), 0);
        assert_eq!(PropValue::Number(90.0).quarter_turns(), 1);
        assert_eq!(PropValue::Number(-270.0).quarter_turns(), -3);
        assert_eq!(PropValue::Number(3.0).quarter_turns(), 0);
        assert_eq!(PropValue::Number(f64::NAN).quarter_turns(), 0);
    }

    #[test]
    fn test_quarter_turn_change() {
        let tapped = PropValue::Bool(true);
        let untapped = PropValue::Bool(false);
        assert!(is_quarter_turn_change(Some(&untapped), Some(&tapped)));
        assert!(!is_quarter_turn_change(Some(&tapped), Some(&tapped)));
        assert!(is_quarter_turn_change(None, Some(&PropValue::Number(270.0))));
        assert!(!is_quarter_turn_change(
            Some(&PropValue::Number(0.0)),
            Some(&PropValue::Number(180.0))
        ));
        assert!(!is_quarter_turn_change(None, None));
    }

    #[test]
    fn test_property_map_preserves_order() {
        let mut props = PropertyMap::new();
        props.insert("rotated".into(), false.into());
        props.insert("face_up".into(), true.into());
        let keys: Vec<_> = props.keys().map(String::as_str).collect();
        assert_eq!(keys, ["rotated", "face_up"]);
    }
}
