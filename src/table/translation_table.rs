//! 原文 → 訳文のマップ

use std::collections::HashMap;
use std::path::Path;

use serde_json::Value;

use super::LoadError;
use super::error::value_kind;

/// テーブル検索のヒット結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableEntry<'a> {
    /// 訳文がある
    Translated(&'a str),
    /// ソースで `null` が指定された文字列。既知で、意図的に訳さない
    Untranslatable,
}

/// 不変の翻訳テーブル
///
/// キーは原文そのもの（ソースのトップレベル）か、ネストしたオブジェクトをキー区切り文字で
/// 連結した複合キー（例: `{"menu": {"title": {"Hello": "Salut"}}}` → `menu.title.Hello`）。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranslationTable {
    /// 平坦化したエントリ。`None` は訳さない文字列
    entries: HashMap<String, Option<String>>,
}

impl TranslationTable {
    /// 空のテーブル
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// パース済み JSON オブジェクトから作成
    ///
    /// # Examples
    /// ```
    /// use serde_json::json;
    /// use kct_localizer::table::TranslationTable;
    ///
    /// let table = TranslationTable::from_json(
    ///     &json!({ "Hello": "Bonjour", "menu": { "title": { "Hello": "Salut" } } }),
    ///     ".",
    /// )
    /// .unwrap();
    ///
    /// assert_eq!(table.lookup("Hello"), Some("Bonjour"));
    /// assert_eq!(table.lookup("menu.title.Hello"), Some("Salut"));
    /// ```
    ///
    /// # Errors
    /// - ルートがオブジェクトでない
    /// - 葉が文字列、`null`、オブジェクトのいずれでもない
    pub fn from_json(json: &Value, separator: &str) -> Result<Self, LoadError> {
        if !json.is_object() {
            return Err(LoadError::NotAnObject(value_kind(json)));
        }

        let mut entries = HashMap::new();
        flatten_entries(json, separator, None, &mut entries)?;
        Ok(Self { entries })
    }

    /// # Errors
    /// JSON が不正、または形が未対応
    pub fn from_slice(source: &[u8], separator: &str) -> Result<Self, LoadError> {
        let json: Value = serde_json::from_slice(source)?;
        Self::from_json(&json, separator)
    }

    /// # Errors
    /// 読み込み失敗、JSON が不正、または形が未対応
    pub fn from_file(path: &Path, separator: &str) -> Result<Self, LoadError> {
        let content = std::fs::read(path)?;
        Self::from_slice(&content, separator)
    }

    /// 完全一致で検索。訳さないエントリも、ないエントリと同じく `None`
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&str> {
        match self.get(key)? {
            TableEntry::Translated(value) => Some(value),
            TableEntry::Untranslatable => None,
        }
    }

    /// 完全一致で検索。訳さないエントリとないエントリを区別する
    #[must_use]
    pub fn get(&self, key: &str) -> Option<TableEntry<'_>> {
        self.entries.get(key).map(|value| {
            value.as_deref().map_or(TableEntry::Untranslatable, TableEntry::Translated)
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for TranslationTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { entries: iter.into_iter().map(|(key, value)| (key, Some(value))).collect() }
    }
}

/// `json` を走査し、文字列と null の葉を連結したキーで登録する
fn flatten_entries(
    json: &Value,
    separator: &str,
    prefix: Option<&str>,
    result: &mut HashMap<String, Option<String>>,
) -> Result<(), LoadError> {
    match json {
        Value::Object(map) => {
            for (key, value) in map {
                let full_key =
                    prefix.map_or_else(|| key.clone(), |p| format!("{p}{separator}{key}"));
                flatten_entries(value, separator, Some(&full_key), result)?;
            }
        }
        Value::String(s) => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), Some(s.clone()));
            }
        }
        Value::Null => {
            if let Some(key) = prefix {
                result.insert(key.to_string(), None);
            }
        }
        _ => {
            return Err(LoadError::InvalidValue {
                key: prefix.unwrap_or_default().to_string(),
                kind: value_kind(json),
            });
        }
    }
    Ok(())
}
