//! 現在有効な翻訳テーブルの保持

use std::path::Path;
use std::sync::{
    Arc,
    PoisonError,
    RwLock,
};

use super::{
    LoadError,
    TranslationTable,
};

/// 翻訳テーブルを丸ごと公開する
///
/// 読み手は呼び出しごとに `Arc` のスナップショットを取るので、再読み込みの途中状態は
/// 見えない。読み込みに失敗しても公開中のテーブルはそのまま。
#[derive(Debug)]
pub struct TableStore {
    /// 有効なテーブル
    current: RwLock<Arc<TranslationTable>>,
    /// ネストしたソースの平坦化に使う区切り文字
    separator: String,
}

impl TableStore {
    /// 空のテーブルで作成（すべて未翻訳のまま素通り）
    #[must_use]
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(Arc::new(TranslationTable::empty())),
            separator: separator.into(),
        }
    }

    #[must_use]
    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// 現在のテーブル
    #[must_use]
    pub fn snapshot(&self) -> Arc<TranslationTable> {
        Arc::clone(&self.current.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// `table` を公開し、以前のものと差し替える
    pub fn replace(&self, table: TranslationTable) {
        let entries = table.len();
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(table);
        tracing::info!(entries, "Translation table published");
    }

    /// `source` をパースして公開する
    ///
    /// # Errors
    /// ソースが不正。以前のテーブルが有効なまま
    pub fn load_slice(&self, source: &[u8]) -> Result<usize, LoadError> {
        let table = TranslationTable::from_slice(source, &self.separator)
            .inspect_err(|e| tracing::warn!("Translation table rejected: {e}"))?;
        let entries = table.len();
        self.replace(table);
        Ok(entries)
    }

    /// # Errors
    /// ソースが不正。以前のテーブルが有効なまま
    pub fn load_str(&self, source: &str) -> Result<usize, LoadError> {
        self.load_slice(source.as_bytes())
    }

    /// # Errors
    /// 読み込み失敗、またはソースが不正。以前のテーブルが有効なまま
    pub fn load_file(&self, path: &Path) -> Result<usize, LoadError> {
        tracing::debug!(path = %path.display(), "Loading translation table");
        let content = std::fs::read(path)
            .inspect_err(|e| tracing::warn!(path = %path.display(), "Failed to read table: {e}"))?;
        self.load_slice(&content)
    }

    /// 空のテーブルを公開
    pub fn reset(&self) {
        self.replace(TranslationTable::empty());
    }
}

impl Default for TableStore {
    fn default() -> Self {
        Self::new(".")
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::thread;

    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn new_store_is_empty() {
        let store = TableStore::new(".");

        expect_that!(store.snapshot().is_empty(), eq(true));
        expect_that!(store.separator(), eq("."));
    }

    #[googletest::test]
    fn load_str_publishes_table() {
        let store = TableStore::default();

        let entries = store.load_str(r#"{"Hello": "Bonjour", "menu": {"Hi": "Salut"}}"#).unwrap();

        expect_that!(entries, eq(2));
        expect_that!(store.snapshot().lookup("Hello"), some(eq("Bonjour")));
        expect_that!(store.snapshot().lookup("menu.Hi"), some(eq("Salut")));
    }

    #[googletest::test]
    fn failed_load_keeps_previous_table() {
        let store = TableStore::default();
        store.load_str(r#"{"Hello": "Bonjour"}"#).unwrap();

        let result = store.load_str(r#"{"Hello": 1}"#);

        expect_that!(result.is_err(), eq(true));
        expect_that!(store.snapshot().lookup("Hello"), some(eq("Bonjour")));
    }

    #[googletest::test]
    fn snapshot_survives_reload() {
        let store = TableStore::default();
        store.load_str(r#"{"Hello": "Bonjour"}"#).unwrap();
        let before = store.snapshot();

        store.load_str(r#"{"Hello": "Hallo"}"#).unwrap();

        expect_that!(before.lookup("Hello"), some(eq("Bonjour")));
        expect_that!(store.snapshot().lookup("Hello"), some(eq("Hallo")));
    }

    #[googletest::test]
    fn reset_clears_table() {
        let store = TableStore::default();
        store.load_str(r#"{"Hello": "Bonjour"}"#).unwrap();

        store.reset();

        expect_that!(store.snapshot().lookup("Hello"), none());
    }

    #[googletest::test]
    fn concurrent_readers_see_whole_tables() {
        let store = Arc::new(TableStore::default());
        store.load_str(r#"{"a": "1", "b": "1"}"#).unwrap();

        let readers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                thread::spawn(move || {
                    for _ in 0..200 {
                        let table = store.snapshot();
                        assert_eq!(table.lookup("a"), table.lookup("b"));
                    }
                })
            })
            .collect();

        for round in 0..50 {
            let value = round.to_string();
            let table: TranslationTable =
                [("a".to_string(), value.clone()), ("b".to_string(), value)].into_iter().collect();
            store.replace(table);
        }

        for reader in readers {
            reader.join().unwrap();
        }
    }
}
