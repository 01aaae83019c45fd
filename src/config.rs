//! 設定: ファイル形式、読み込み、バリデーション
/// 設定の保持と読み込み
mod manager;
/// 設定の型とバリデーション
mod types;

pub use manager::{
    CONFIG_FILE_NAME,
    ConfigManager,
};
pub use types::{
    ConfigError,
    LocalizerSettings,
    ReportSettings,
    ValidationError,
};
