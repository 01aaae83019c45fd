//! レポート対象外とする `(path, key)`

use std::collections::{
    HashMap,
    HashSet,
};
use std::path::Path;

use serde_json::Value;

use crate::table::LoadError;
use crate::table::value_kind;

/// パス配下のすべてのキーに一致するキー
pub const WILDCARD: &str = "*";

/// レポートのブラックリスト
///
/// ソースは構造パスから、未翻訳が想定されるキー（ユーザー入力や動的な内容）への
/// JSON オブジェクト:
///
/// ```json
/// { "api_port.api_deck_port": ["api_name"], "api_mst_furnituregraph": ["*"] }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Blacklist {
    /// パス → キー
    entries: HashMap<String, HashSet<String>>,
}

impl Blacklist {
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// JSON オブジェクトから作成
    ///
    /// # Errors
    /// - ルートがオブジェクトでない
    /// - パスの値が文字列の配列でない
    pub fn from_json(json: &Value) -> Result<Self, LoadError> {
        let Value::Object(map) = json else {
            return Err(LoadError::NotAnObject(value_kind(json)));
        };

        let mut entries = HashMap::with_capacity(map.len());
        for (path, keys) in map {
            let Value::Array(keys) = keys else {
                return Err(LoadError::InvalidValue { key: path.clone(), kind: value_kind(keys) });
            };

            let mut set = HashSet::with_capacity(keys.len());
            for (index, key) in keys.iter().enumerate() {
                let Value::String(key) = key else {
                    return Err(LoadError::InvalidValue {
                        key: format!("{path}[{index}]"),
                        kind: value_kind(key),
                    });
                };
                set.insert(key.clone());
            }
            entries.insert(path.clone(), set);
        }

        Ok(Self { entries })
    }

    /// # Errors
    /// JSON が不正、または形が未対応
    pub fn from_slice(source: &[u8]) -> Result<Self, LoadError> {
        let json: Value = serde_json::from_slice(source)?;
        Self::from_json(&json)
    }

    /// # Errors
    /// 読み込み失敗、JSON が不正、または形が未対応
    pub fn from_file(path: &Path) -> Result<Self, LoadError> {
        let content = std::fs::read(path)?;
        Self::from_slice(&content)
    }

    /// `(path, key)` の未翻訳をレポートしてはいけないか
    #[must_use]
    pub fn contains(&self, path: &str, key: &str) -> bool {
        self.entries.get(path).is_some_and(|keys| keys.contains(key) || keys.contains(WILDCARD))
    }

    pub fn insert(&mut self, path: impl Into<String>, key: impl Into<String>) {
        self.entries.entry(path.into()).or_default().insert(key.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<P: Into<String>, K: Into<String>> FromIterator<(P, K)> for Blacklist {
    fn from_iter<I: IntoIterator<Item = (P, K)>>(iter: I) -> Self {
        let mut blacklist = Self::empty();
        for (path, key) in iter {
            blacklist.insert(path, key);
        }
        blacklist
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;
    use serde_json::json;

    use super::*;

    #[rstest]
    #[case("api_port", "api_name", true)]
    #[case("api_port", "api_comment", true)]
    #[case("api_port", "api_other", false)]
    #[case("api_mst_furniture", "anything", true)]
    #[case("", "api_name", false)]
    #[case("unknown", "api_name", false)]
    fn test_contains(#[case] path: &str, #[case] key: &str, #[case] expected: bool) {
        let blacklist = Blacklist::from_json(&json!({
            "api_port": ["api_name", "api_comment"],
            "api_mst_furniture": ["*"]
        }))
        .unwrap();

        assert_eq!(blacklist.contains(path, key), expected);
    }

    #[googletest::test]
    fn test_empty_path_entry() {
        let blacklist: Blacklist = [("", "tags")].into_iter().collect();

        expect_that!(blacklist.contains("", "tags"), eq(true));
        expect_that!(blacklist.contains("", "greeting"), eq(false));
    }

    #[rstest]
    #[case(json!({ "api_port": "api_name" }), "api_port", "string")]
    #[case(json!({ "api_port": ["api_name", 3] }), "api_port[1]", "number")]
    fn test_from_json_rejects_bad_shapes(
        #[case] json: Value,
        #[case] expected_key: &str,
        #[case] expected_kind: &str,
    ) {
        let result = Blacklist::from_json(&json);

        assert!(matches!(
            result,
            Err(LoadError::InvalidValue { key, kind }) if key == expected_key && kind == expected_kind
        ));
    }

    #[googletest::test]
    fn test_from_slice_non_object() {
        let result = Blacklist::from_slice(b"[]");

        expect_that!(matches!(result, Err(LoadError::NotAnObject("array"))), eq(true));
    }
}
