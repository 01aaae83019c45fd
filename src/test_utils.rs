//! ユニットテスト共通のヘルパー
#![cfg(test)]

use std::sync::{
    Arc,
    Mutex,
    PoisonError,
};

use futures::future::BoxFuture;

use crate::report::{
    Blacklist,
    ReportError,
    ReportGate,
    ReportItem,
    ReportSink,
};
use crate::table::{
    TableStore,
    TranslationTable,
};
use crate::translator::Translator;

/// 送られたバッチをすべて記録するメモリ上のシンク
#[derive(Debug, Default)]
pub(crate) struct RecordingSink {
    /// 送信順のバッチ
    batches: Mutex<Vec<Vec<ReportItem>>>,
    /// すべての送信に 500 を返す
    fail: bool,
}

impl RecordingSink {
    /// すべてのバッチを拒否するシンク
    pub(crate) fn failing() -> Self {
        Self { fail: true, ..Self::default() }
    }

    /// 受け取った全アイテム（平坦化）
    pub(crate) fn items(&self) -> Vec<ReportItem> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner).concat()
    }

    /// 受け取った各バッチの件数
    pub(crate) fn batch_sizes(&self) -> Vec<usize> {
        self.batches.lock().unwrap_or_else(PoisonError::into_inner).iter().map(Vec::len).collect()
    }
}

impl ReportSink for RecordingSink {
    fn submit<'a>(&'a self, batch: &'a [ReportItem]) -> BoxFuture<'a, Result<(), ReportError>> {
        Box::pin(async move {
            if self.fail {
                return Err(ReportError::Status(500));
            }
            self.batches.lock().unwrap_or_else(PoisonError::into_inner).push(batch.to_vec());
            Ok(())
        })
    }
}

/// `entries` のテーブルと、`blacklist` を使う有効なゲートを持つ `Translator`
pub(crate) fn create_translator(entries: &[(&str, &str)], blacklist: Blacklist) -> Translator {
    let tables = Arc::new(TableStore::new("."));
    let table: TranslationTable =
        entries.iter().map(|(key, value)| ((*key).to_string(), (*value).to_string())).collect();
    tables.replace(table);
    Translator::new(tables, Arc::new(ReportGate::new(blacklist, 1000)))
}
