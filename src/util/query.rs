use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Deserializer};

/// Query-string parameters. Keys match either as written or with the first
/// letter uppercased (`limit` also finds `Limit`). Blank values count as
/// absent.
#[derive(Debug, Default)]
pub struct QueryParams {
    map: HashMap<String, String>,
}

impl<'de> Deserialize<'de> for QueryParams {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let map = HashMap::<String, String>::deserialize(deserializer)?;
        Ok(QueryParams { map })
    }
}

impl QueryParams {
    pub fn get(&self, key: &str) -> Option<&str> {
        let value = self.map.get(key).or_else(|| {
            let mut chars = key.chars();
            let first = chars.next()?;
            if !first.is_ascii_lowercase() {
                return None;
            }
            let capitalized: String = first.to_ascii_uppercase().to_string() + chars.as_str();
            self.map.get(&capitalized)
        })?;

        let value = value.trim();
        (!value.is_empty()).then_some(value)
    }

    /// Parsed value, `None` when absent or malformed.
    pub fn get_parsed<T: FromStr>(&self, key: &str) -> Option<T> {
        self.get(key).and_then(|v| v.parse().ok())
    }

    /// True when `key` is present and not `0` or `false`.
    pub fn flag(&self, key: &str) -> bool {
        self.get(key)
            .is_some_and(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
    }
}

#[cfg(test)]
impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}
