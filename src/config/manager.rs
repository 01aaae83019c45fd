//! 有効な設定の保持と設定ファイルの読み込み

use std::io::ErrorKind;
use std::path::{
    Path,
    PathBuf,
};

use super::{
    ConfigError,
    LocalizerSettings,
};

/// 設定ディレクトリ直下で探す設定ファイル名
pub const CONFIG_FILE_NAME: &str = ".kct-localizer.json";

/// 設定管理を行う
#[derive(Default, Debug, Clone)]
pub struct ConfigManager {
    /// 現在の設定
    current_settings: LocalizerSettings,

    /// 設定を読み込んだディレクトリ
    config_dir: Option<PathBuf>,
}

impl ConfigManager {
    /// 既定値で作成
    #[must_use]
    pub fn new() -> Self {
        Self { current_settings: LocalizerSettings::default(), config_dir: None }
    }

    /// `config_dir` の設定ファイルを読み込み、検証して反映する
    ///
    /// ディレクトリ未指定、または設定ファイルがなければ既定値。
    /// 失敗した場合は以前の設定が残る。
    ///
    /// # Errors
    /// - ファイル読み込みエラー
    /// - JSON パースエラー
    /// - バリデーションエラー
    pub fn load_settings(&mut self, config_dir: Option<PathBuf>) -> Result<(), ConfigError> {
        let settings = match &config_dir {
            Some(dir) => read_settings_file(&dir.join(CONFIG_FILE_NAME))?,
            None => LocalizerSettings::default(),
        };

        settings.validate().map_err(ConfigError::ValidationErrors)?;

        tracing::debug!("Settings in effect: {:?}", settings);
        self.current_settings = settings;
        self.config_dir = config_dir;

        Ok(())
    }

    /// 検証してから設定を差し替える
    ///
    /// # Errors
    /// バリデーションエラー。以前の設定が残る。
    pub fn update_settings(&mut self, new_settings: LocalizerSettings) -> Result<(), ConfigError> {
        new_settings.validate().map_err(ConfigError::ValidationErrors)?;

        self.current_settings = new_settings;
        tracing::debug!("Settings updated");

        Ok(())
    }

    /// 現在の設定を取得
    #[must_use]
    pub const fn get_settings(&self) -> &LocalizerSettings {
        &self.current_settings
    }

    /// 設定を読み込んだディレクトリを取得
    #[must_use]
    pub const fn config_dir(&self) -> Option<&PathBuf> {
        self.config_dir.as_ref()
    }
}

/// 設定ファイルを読む。ファイルがなければ既定値
fn read_settings_file(path: &Path) -> Result<LocalizerSettings, ConfigError> {
    let content = match std::fs::read(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            tracing::debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(LocalizerSettings::default());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::debug!(path = %path.display(), "Reading settings file");
    Ok(serde_json::from_slice(&content)?)
}
