//! 未翻訳レポート: どの文字列を収集サーバーへ送るか、どう送るか
//!
//! [`ReportGate`] が呼び出し元で同期的に判定し（ブラックリスト、セッション内の重複排除、
//! 上限付きキュー、送信失敗時のブレーカー）、[`ReportWorker`] が呼び出し経路の外で
//! ゲートを吸い出して [`ReportSink`] にバッチを渡す。

pub mod blacklist;
pub mod gate;
pub mod sink;
pub mod worker;

pub use blacklist::Blacklist;
pub use gate::{
    ReportDecision,
    ReportGate,
    ReportItem,
};
pub use sink::{
    HttpReportSink,
    ReportError,
    ReportSink,
};
pub use worker::ReportWorker;
