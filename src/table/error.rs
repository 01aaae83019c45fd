//! 読み込みエラー

use serde_json::Value;
use thiserror::Error;

/// 翻訳テーブルまたはレポートのブラックリストの読み込みエラー
///
/// 読み込みは全部か無しか。失敗しても以前に公開したものが有効なまま。
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read source: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Expected a JSON object at the root, found {0}")]
    NotAnObject(&'static str),

    #[error("Unsupported {kind} value at '{key}'")]
    InvalidValue { key: String, kind: &'static str },
}

/// エラーメッセージ用の JSON 値の型名
pub(crate) const fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
