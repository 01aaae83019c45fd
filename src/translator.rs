//! 文字列と構造化ペイロードの翻訳
//!
//! # 初期化順序
//!
//! 1. 設定から（[`Translator::from_settings`]）、または [`TableStore`] と [`ReportGate`] を
//!    渡して [`Translator`] を作成
//! 2. 翻訳テーブル（[`TableStore::load_file`] など）とレポートのブラックリスト
//!    （[`ReportGate::set_blacklist`]）を読み込む
//! 3. 必要ならゲートに [`crate::report::ReportWorker`] を起動
//! 4. 翻訳する。2 の前はすべての文字列が未翻訳のまま素通りする
//!
//! [`Translator::reset`] で 1 の直後の状態に戻る。
//!
//! # 検索順序
//!
//! `translate_string_with(line, path, key)` はまず `[path, key, line]` のうち空でないものを
//! キー区切り文字で連結した複合キーを引き、次に `line` 単独で引く。
//! 見つからなければ `(path, key, line)` としてレポートする。

use std::sync::Arc;

use serde_json::{
    Map,
    Value,
};
use thiserror::Error;

use crate::config::LocalizerSettings;
use crate::report::{
    Blacklist,
    ReportGate,
};
use crate::table::{
    TableEntry,
    TableStore,
    TranslationTable,
};

#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("Malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

/// 翻訳エンジン
///
/// `Arc` で安価に共有できる。メソッドはすべて `&self` を取る。
#[derive(Debug, Clone)]
pub struct Translator {
    /// 公開中の翻訳テーブル
    tables: Arc<TableStore>,
    /// 未翻訳のレポート判定
    gate: Arc<ReportGate>,
    /// テーブルストアからコピーしたキー区切り文字
    separator: String,
    /// バイト列ペイロードから外し、出力で付け直すプレフィックス
    api_prefix: Option<String>,
}

impl Translator {
    /// API プレフィックスなしで作成
    #[must_use]
    pub fn new(tables: Arc<TableStore>, gate: Arc<ReportGate>) -> Self {
        let separator = tables.separator().to_string();
        Self { tables, gate, separator, api_prefix: None }
    }

    /// 空のテーブルと空のブラックリストで作成。ゲートは設定でレポートが有効な場合のみ有効
    #[must_use]
    pub fn from_settings(settings: &LocalizerSettings) -> Self {
        let tables = Arc::new(TableStore::new(settings.key_separator.clone()));
        let gate = Arc::new(ReportGate::from_settings(&settings.report, Blacklist::empty()));
        Self::new(tables, gate).with_api_prefix(settings.api_prefix.clone())
    }

    #[must_use]
    pub fn with_api_prefix(mut self, api_prefix: Option<String>) -> Self {
        self.api_prefix = api_prefix;
        self
    }

    #[must_use]
    pub const fn tables(&self) -> &Arc<TableStore> {
        &self.tables
    }

    #[must_use]
    pub const fn gate(&self) -> &Arc<ReportGate> {
        &self.gate
    }

    /// レポート用のコンテキストなしで `line` を翻訳
    #[must_use]
    pub fn translate_string(&self, line: &str) -> String {
        self.translate_string_with(line, "", "")
    }

    /// `line` を翻訳し、見つからなければ `(path, key)` でレポート
    #[must_use]
    pub fn translate_string_with(&self, line: &str, path: &str, key: &str) -> String {
        let table = self.tables.snapshot();
        self.translate_in(&table, line, path, key)
    }

    /// `payload` の文字列の葉をすべて書き換える。形と文字列以外の葉はそのまま
    #[must_use]
    pub fn translate_structured(&self, payload: &Value) -> Value {
        self.translate_structured_at(payload, "")
    }

    /// [`Translator::translate_structured`] と同じだが、走査パスを `path` から始める
    #[must_use]
    pub fn translate_structured_at(&self, payload: &Value, path: &str) -> Value {
        let table = self.tables.snapshot();
        self.translate_node(&table, payload, path, "")
    }

    /// シリアライズ済み JSON ペイロードを翻訳
    ///
    /// 入力が API プレフィックス（`svdata=`）を持つ場合は、パース前に外して出力の先頭に
    /// 付け直す。キーの順序と数値の表記は入力のまま保たれる。
    ///
    /// # Errors
    /// ペイロードが JSON として不正
    pub fn translate_json(&self, json: &[u8]) -> Result<Vec<u8>, TranslateError> {
        self.translate_json_at(json, "")
    }

    /// # Errors
    /// ペイロードが JSON として不正
    pub fn translate_json_at(&self, json: &[u8], path: &str) -> Result<Vec<u8>, TranslateError> {
        let (prefix, body) = self.split_prefix(json);

        let payload: Value = serde_json::from_slice(body)?;
        let translated = self.translate_structured_at(&payload, path);

        let mut output = prefix.to_vec();
        serde_json::to_writer(&mut output, &translated)?;
        Ok(output)
    }

    /// 空のテーブルを公開し、新しいレポートセッションを始める
    pub fn reset(&self) {
        self.tables.reset();
        self.gate.reset();
    }

    /// `json` を API プレフィックス（空の場合あり）と JSON 本体に分ける
    fn split_prefix<'a>(&'a self, json: &'a [u8]) -> (&'a [u8], &'a [u8]) {
        self.api_prefix
            .as_deref()
            .and_then(|prefix| {
                json.strip_prefix(prefix.as_bytes()).map(|body| (prefix.as_bytes(), body))
            })
            .unwrap_or((b"".as_slice(), json))
    }

    /// `node` 以下を再帰的に翻訳。`(path, key)` は `node` の位置
    fn translate_node(
        &self,
        table: &TranslationTable,
        node: &Value,
        path: &str,
        key: &str,
    ) -> Value {
        match node {
            Value::String(line) => Value::String(self.translate_in(table, line, path, key)),
            Value::Array(items) => Value::Array(
                items.iter().map(|item| self.translate_node(table, item, path, key)).collect(),
            ),
            Value::Object(map) => {
                let child_path = self.join(&[path, key]);
                let translated: Map<String, Value> = map
                    .iter()
                    .map(|(child_key, child)| {
                        let translated = self.translate_node(table, child, &child_path, child_key);
                        (child_key.clone(), translated)
                    })
                    .collect();
                Value::Object(translated)
            }
            Value::Null | Value::Bool(_) | Value::Number(_) => node.clone(),
        }
    }

    /// 1 文字列を翻訳し、見つからなければレポートを検討する
    fn translate_in(&self, table: &TranslationTable, line: &str, path: &str, key: &str) -> String {
        if line.is_empty() {
            return String::new();
        }

        match self.resolve(table, line, path, key) {
            Some(TableEntry::Translated(translated)) => translated.to_string(),
            Some(TableEntry::Untranslatable) => line.to_string(),
            None => {
                self.gate.consider_report(path, key, line);
                line.to_string()
            }
        }
    }

    /// 複合キーを先に、次に文字列単独で引く
    fn resolve<'t>(
        &self,
        table: &'t TranslationTable,
        line: &str,
        path: &str,
        key: &str,
    ) -> Option<TableEntry<'t>> {
        if !path.is_empty() || !key.is_empty() {
            let composite = self.join(&[path, key, line]);
            if let Some(entry) = table.get(&composite) {
                return Some(entry);
            }
        }
        table.get(line)
    }

    /// 空でない `parts` をキー区切り文字で連結
    fn join(&self, parts: &[&str]) -> String {
        parts
            .iter()
            .filter(|part| !part.is_empty())
            .copied()
            .collect::<Vec<_>>()
            .join(&self.separator)
    }
}
