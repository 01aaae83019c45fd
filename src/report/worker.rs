//! バックグラウンドでのレポート送信

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::{
    ReportGate,
    ReportSink,
};
use crate::config::ReportSettings;

/// 一定間隔で [`ReportGate`] を吸い出し、[`ReportSink`] へバッチを送る
///
/// 翻訳の呼び出し側が触るのはゲートだけで、ネットワークを待つのはこのタスクだけ。
#[derive(Debug)]
pub struct ReportWorker {
    /// 停止要求
    shutdown: Arc<Notify>,
    /// ワーカーループのタスク
    handle: JoinHandle<()>,
}

impl ReportWorker {
    /// 現在の tokio ランタイム上でワーカーを起動
    #[must_use]
    pub fn spawn(
        gate: Arc<ReportGate>,
        sink: Arc<dyn ReportSink>,
        settings: &ReportSettings,
    ) -> Self {
        let shutdown = Arc::new(Notify::new());
        let batch_size = settings.batch_size.max(1);
        let interval = Duration::from_millis(settings.flush_interval_ms.max(1));

        let handle = tokio::spawn(run(gate, sink, batch_size, interval, Arc::clone(&shutdown)));
        tracing::info!(batch_size, ?interval, "Report worker started");

        Self { shutdown, handle }
    }

    /// 送信待ちを送り切ってから停止
    pub async fn shutdown(self) {
        self.shutdown.notify_one();
        if let Err(e) = self.handle.await {
            tracing::error!("Report worker terminated abnormally: {e}");
        }
    }
}

/// ワーカーループ
async fn run(
    gate: Arc<ReportGate>,
    sink: Arc<dyn ReportSink>,
    batch_size: usize,
    interval: Duration,
    shutdown: Arc<Notify>,
) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                flush(&gate, sink.as_ref(), batch_size).await;
            }
            () = shutdown.notified() => {
                let sent = flush(&gate, sink.as_ref(), batch_size).await;
                tracing::info!(sent, "Report worker stopped");
                break;
            }
        }
    }
}

/// 送信待ちを `batch_size` 件ずつすべて送る
///
/// 最初の失敗で止まり、ゲートのブレーカーを落とす。送信できた件数を返す。
pub async fn flush(gate: &ReportGate, sink: &dyn ReportSink, batch_size: usize) -> usize {
    let mut sent = 0;
    loop {
        let batch = gate.drain(batch_size);
        if batch.is_empty() {
            return sent;
        }

        match sink.submit(&batch).await {
            Ok(()) => sent += batch.len(),
            Err(e) => {
                tracing::warn!(items = batch.len(), "Report submission failed: {e}");
                gate.on_report_transmission_failure();
                return sent;
            }
        }
    }
}
