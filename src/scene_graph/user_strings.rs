use serde_json::Value;

/// Ordered key/value metadata attached to a node in the source CAD file.
///
/// Exporters place it in the node `extras` field as
/// `{"userStrings": [["Name", "Wall-01"], ["Material", "Concrete"]]}` — an
/// array of pairs, so the authoring order survives the round trip.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UserStrings(Vec<(String, String)>);

impl UserStrings {
    pub fn new(entries: Vec<(String, String)>) -> Self {
        Self(entries)
    }

    /// Parses node extras. Returns `None` when the extras carry no
    /// `userStrings` array, the array is empty, or any entry is not a
    /// `[key, value]` string pair.
    pub fn from_extras(raw: &serde_json::value::RawValue) -> Option<UserStrings> {
        let extras: Value = serde_json::from_str(raw.get()).ok()?;
        let pairs = extras.get("userStrings")?.as_array()?;

        let mut entries = Vec::with_capacity(pairs.len());
        for pair in pairs {
            match pair.as_array()?.as_slice() {
                [Value::String(key), Value::String(value)] => {
                    entries.push((key.clone(), value.clone()));
                }
                _ => return None,
            }
        }

        if entries.is_empty() {
            return None;
        }

        Some(Self::new(entries))
    }

    pub fn entries(&self) -> &[(String, String)] {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::value::RawValue;

    fn raw(json: &str) -> Box<RawValue> {
        RawValue::from_string(json.to_string()).unwrap()
    }

    #[test]
    fn parses_ordered_pairs() {
        let extras = raw(r#"{"userStrings": [["Name", "Wall-01"], ["Material", "Concrete"]]}"#);
        let strings = UserStrings::from_extras(&extras).unwrap();

        assert_eq!(
            strings.entries(),
            &[
                ("Name".to_string(), "Wall-01".to_string()),
                ("Material".to_string(), "Concrete".to_string()),
            ]
        );
    }

    #[test]
    fn missing_key_is_none() {
        let extras = raw(r#"{"somethingElse": 1}"#);
        assert_eq!(UserStrings::from_extras(&extras), None);
    }

    #[test]
    fn empty_array_is_none() {
        let extras = raw(r#"{"userStrings": []}"#);
        assert_eq!(UserStrings::from_extras(&extras), None);
    }

    #[test]
    fn malformed_pair_is_none() {
        let extras = raw(r#"{"userStrings": [["Name", 42]]}"#);
        assert_eq!(UserStrings::from_extras(&extras), None);

        let extras = raw(r#"{"userStrings": [["only-key"]]}"#);
        assert_eq!(UserStrings::from_extras(&extras), None);
    }
}
