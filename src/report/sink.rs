//! 未翻訳レポートの送信先

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

use super::ReportItem;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Invalid report endpoint '{endpoint}': {message}")]
    InvalidEndpoint { endpoint: String, message: String },

    #[error("Report request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Report endpoint answered with status {0}")]
    Status(u16),
}

/// レポートのバッチを収集サーバーへ送る
///
/// 送信手段は問わない。約束は「バッチを送り、届いたかどうかを返す」ことだけ。
/// `Err` を返すとゲートのブレーカーが落ちる。
pub trait ReportSink: Send + Sync {
    /// `batch` を送信する
    fn submit<'a>(&'a self, batch: &'a [ReportItem]) -> BoxFuture<'a, Result<(), ReportError>>;
}

/// バッチを `{path, key, value}` の JSON 配列として POST する
#[derive(Debug, Clone)]
pub struct HttpReportSink {
    /// タイムアウト設定済みの HTTP クライアント
    client: reqwest::Client,
    /// 収集サーバーの URL
    endpoint: reqwest::Url,
}

impl HttpReportSink {
    /// タイムアウト未指定時の既定値
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// # Errors
    /// - `endpoint` が URL として不正
    /// - HTTP クライアントの構築に失敗
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, ReportError> {
        let endpoint = reqwest::Url::parse(endpoint).map_err(|e| ReportError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        })?;

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(format!("kct-localizer/{}", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, endpoint })
    }

    #[must_use]
    pub const fn endpoint(&self) -> &reqwest::Url {
        &self.endpoint
    }
}

impl ReportSink for HttpReportSink {
    fn submit<'a>(&'a self, batch: &'a [ReportItem]) -> BoxFuture<'a, Result<(), ReportError>> {
        Box::pin(async move {
            tracing::debug!(endpoint = %self.endpoint, items = batch.len(), "Submitting reports");

            let response = self.client.post(self.endpoint.clone()).json(batch).send().await?;

            let status = response.status();
            if !status.is_success() {
                return Err(ReportError::Status(status.as_u16()));
            }
            Ok(())
        })
    }
}
