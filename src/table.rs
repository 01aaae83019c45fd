//! 翻訳テーブル: ソース形式、検索、アトミックな公開
/// テーブルとブラックリストで共通の読み込みエラー
mod error;
/// 公開中テーブルの保持
mod store;
/// 平坦化した原文 → 訳文のマップ
mod translation_table;

pub use error::LoadError;
pub(crate) use error::value_kind;
pub use store::TableStore;
pub use translation_table::{
    TableEntry,
    TranslationTable,
};
