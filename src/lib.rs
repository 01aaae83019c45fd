//! kct-localizer
//!
//! ゲーム API ペイロードのその場翻訳と未翻訳文字列のレポート、
//! および再生可能な HTTP キャッシュエントリ
//!
//! ```
//! use kct_localizer::{LocalizerSettings, Translator};
//!
//! let translator = Translator::from_settings(&LocalizerSettings::default());
//! translator.tables().load_str(r#"{"Hello": "Bonjour"}"#).unwrap();
//!
//! assert_eq!(translator.translate_string("Hello"), "Bonjour");
//! ```

pub mod cache;
pub mod config;
pub mod report;
pub mod table;
mod test_utils;
pub mod translator;

pub use config::LocalizerSettings;
pub use translator::{
    TranslateError,
    Translator,
};
