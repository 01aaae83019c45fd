//! 未翻訳ごとのレポート可否判定と送信待ちキュー

use std::collections::{
    HashSet,
    VecDeque,
};
use std::sync::atomic::{
    AtomicBool,
    Ordering,
};
use std::sync::{
    Arc,
    Mutex,
    MutexGuard,
    PoisonError,
    RwLock,
};

use serde::{
    Deserialize,
    Serialize,
};

use super::Blacklist;
use crate::config::ReportSettings;

/// 収集サーバーへ送る未翻訳文字列 1 件
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportItem {
    pub path: String,
    pub key: String,
    /// 翻訳前の文字列
    pub value: String,
}

impl ReportItem {
    #[must_use]
    pub fn new(path: impl Into<String>, key: impl Into<String>, value: impl Into<String>) -> Self {
        Self { path: path.into(), key: key.into(), value: value.into() }
    }
}

/// [`ReportGate::consider_report`] の判定結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportDecision {
    Queued,
    /// 設定で無効、または送信失敗でブレーカーが落ちている
    Disabled,
    Blacklisted,
    /// このセッションで報告済み
    Duplicate,
    /// キューが満杯。報告済みにはしないので、後で再びキューに入りうる
    Dropped,
}

/// 全翻訳呼び出しで共有する可変状態
#[derive(Debug, Default)]
struct GateState {
    /// このセッションでキューに入れた識別子
    reported: HashSet<ReportItem>,
    /// 送信待ち（古い順）
    queue: VecDeque<ReportItem>,
}

/// 未翻訳をレポートするかを判定し、レポートを溜めておく
///
/// 一度送信に失敗すると [`ReportGate::reset`]（新しいセッション）まで閉じたまま。
/// リトライもバックオフもしない。
///
/// # ロック順序
///
/// `blacklist` の読み取りは `state` のロック取得前に済ませる。
#[derive(Debug)]
pub struct ReportGate {
    /// レポートが設定されているか
    enabled: bool,
    /// 送信失敗で落ちたブレーカー
    tripped: AtomicBool,
    /// 送信待ちキューの上限
    max_pending: usize,
    /// 報告しない `(path, key)`。丸ごと差し替える
    blacklist: RwLock<Arc<Blacklist>>,
    /// 重複排除セットと送信待ちキュー
    state: Mutex<GateState>,
}

impl ReportGate {
    /// 有効なゲートを作成
    #[must_use]
    pub fn new(blacklist: Blacklist, max_pending: usize) -> Self {
        Self {
            enabled: true,
            tripped: AtomicBool::new(false),
            max_pending,
            blacklist: RwLock::new(Arc::new(blacklist)),
            state: Mutex::new(GateState::default()),
        }
    }

    /// 何もキューに入れないゲート
    #[must_use]
    pub fn inactive() -> Self {
        Self { enabled: false, ..Self::new(Blacklist::empty(), 0) }
    }

    /// 設定からゲートを作成。レポート無効、または送信先未設定なら常に無効
    #[must_use]
    pub fn from_settings(settings: &ReportSettings, blacklist: Blacklist) -> Self {
        if settings.is_active() {
            Self::new(blacklist, settings.max_pending)
        } else {
            tracing::debug!("Miss reporting is not configured");
            Self { blacklist: RwLock::new(Arc::new(blacklist)), ..Self::inactive() }
        }
    }

    /// 未翻訳 `(path, key, value)` をレポートするか判定し、するならキューに入れる
    ///
    /// I/O では決してブロックしない。
    pub fn consider_report(&self, path: &str, key: &str, value: &str) -> ReportDecision {
        if self.is_disabled() {
            return ReportDecision::Disabled;
        }

        if self.blacklist().contains(path, key) {
            return ReportDecision::Blacklisted;
        }

        let item = ReportItem::new(path, key, value);
        let mut state = self.lock_state();

        // ロック待ちの間にブレーカーが落ちている可能性がある
        if self.is_disabled() {
            return ReportDecision::Disabled;
        }
        if state.reported.contains(&item) {
            return ReportDecision::Duplicate;
        }
        if state.queue.len() >= self.max_pending {
            drop(state);
            tracing::warn!(path, key, "Report queue full, dropping miss");
            return ReportDecision::Dropped;
        }

        tracing::debug!(path, key, value, "Queued untranslated string");
        state.reported.insert(item.clone());
        state.queue.push_back(item);
        ReportDecision::Queued
    }

    /// ブレーカーを落とす。送信待ちを破棄し、このセッションではもう何もキューに入れない
    pub fn on_report_transmission_failure(&self) {
        let mut state = self.lock_state();
        if !self.tripped.swap(true, Ordering::SeqCst) {
            tracing::warn!(
                discarded = state.queue.len(),
                "Report transmission failed, disabling reporting for this session"
            );
        }
        state.queue.clear();
    }

    /// 送信待ちを古い順に最大 `max` 件取り出す
    pub fn drain(&self, max: usize) -> Vec<ReportItem> {
        let mut state = self.lock_state();
        if self.is_disabled() {
            return Vec::new();
        }
        let count = max.min(state.queue.len());
        state.queue.drain(..count).collect()
    }

    /// 送信待ちの件数
    #[must_use]
    pub fn pending(&self) -> usize {
        self.lock_state().queue.len()
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        !self.enabled || self.tripped.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn blacklist(&self) -> Arc<Blacklist> {
        Arc::clone(&self.blacklist.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// ブラックリストを丸ごと差し替える
    pub fn set_blacklist(&self, blacklist: Blacklist) {
        *self.blacklist.write().unwrap_or_else(PoisonError::into_inner) = Arc::new(blacklist);
    }

    /// 新しいセッションを開始。報告済み・送信待ち・ブレーカーをすべてリセット
    pub fn reset(&self) {
        let mut state = self.lock_state();
        state.reported.clear();
        state.queue.clear();
        self.tripped.store(false, Ordering::SeqCst);
    }

    /// 共有状態をロック（ポイズンからは回復する）
    fn lock_state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;
    use rstest::rstest;

    use super::*;

    /// 空のブラックリスト、キュー上限 `max_pending` のゲート
    fn new_gate(max_pending: usize) -> ReportGate {
        ReportGate::new(Blacklist::empty(), max_pending)
    }

    #[googletest::test]
    fn first_miss_is_queued() {
        let gate = new_gate(10);

        expect_that!(gate.consider_report("", "", "Bye"), eq(ReportDecision::Queued));
        expect_that!(gate.drain(10), elements_are![eq(&ReportItem::new("", "", "Bye"))]);
    }

    #[googletest::test]
    fn repeated_miss_is_reported_once() {
        let gate = new_gate(10);

        gate.consider_report("api_port", "api_name", "Bye");
        let second = gate.consider_report("api_port", "api_name", "Bye");

        expect_that!(second, eq(ReportDecision::Duplicate));
        expect_that!(gate.pending(), eq(1));
    }

    #[googletest::test]
    fn dedup_survives_drain() {
        let gate = new_gate(10);
        gate.consider_report("", "", "Bye");
        gate.drain(10);

        expect_that!(gate.consider_report("", "", "Bye"), eq(ReportDecision::Duplicate));
        expect_that!(gate.pending(), eq(0));
    }

    #[googletest::test]
    fn distinct_values_in_same_context_are_each_reported() {
        let gate = new_gate(10);

        gate.consider_report("", "", "A");
        gate.consider_report("", "", "B");

        expect_that!(gate.pending(), eq(2));
    }

    #[rstest]
    #[case("api_port", "api_name")]
    #[case("api_mst", "api_anything")]
    fn blacklisted_misses_are_never_queued(#[case] path: &str, #[case] key: &str) {
        let blacklist: Blacklist =
            [("api_port", "api_name"), ("api_mst", "*")].into_iter().collect();
        let gate = ReportGate::new(blacklist, 10);

        for _ in 0..3 {
            assert_eq!(gate.consider_report(path, key, "value"), ReportDecision::Blacklisted);
        }
        assert_eq!(gate.pending(), 0);
    }

    #[googletest::test]
    fn failure_disables_reporting_for_novel_misses() {
        let gate = new_gate(10);
        gate.consider_report("", "", "Pending");

        gate.on_report_transmission_failure();

        expect_that!(gate.is_disabled(), eq(true));
        expect_that!(gate.pending(), eq(0));
        expect_that!(gate.consider_report("new", "key", "Novel"), eq(ReportDecision::Disabled));
        expect_that!(gate.drain(10), is_empty());
    }

    #[googletest::test]
    fn full_queue_drops_without_marking_reported() {
        let gate = new_gate(1);
        gate.consider_report("", "", "A");

        expect_that!(gate.consider_report("", "", "B"), eq(ReportDecision::Dropped));

        gate.drain(1);
        expect_that!(gate.consider_report("", "", "B"), eq(ReportDecision::Queued));
    }

    #[googletest::test]
    fn drain_is_fifo_and_bounded() {
        let gate = new_gate(10);
        for value in ["A", "B", "C"] {
            gate.consider_report("", "", value);
        }

        let first = gate.drain(2);

        expect_that!(
            first,
            elements_are![
                field!(ReportItem.value, eq("A")),
                field!(ReportItem.value, eq("B"))
            ]
        );
        expect_that!(gate.pending(), eq(1));
    }

    #[googletest::test]
    fn reset_starts_new_session() {
        let gate = new_gate(10);
        gate.consider_report("", "", "A");
        gate.on_report_transmission_failure();

        gate.reset();

        expect_that!(gate.is_disabled(), eq(false));
        expect_that!(gate.consider_report("", "", "A"), eq(ReportDecision::Queued));
    }

    #[googletest::test]
    fn inactive_gate_never_queues() {
        let gate = ReportGate::from_settings(&ReportSettings::default(), Blacklist::empty());

        expect_that!(gate.consider_report("", "", "A"), eq(ReportDecision::Disabled));

        gate.reset();
        expect_that!(gate.is_disabled(), eq(true));
    }

    #[googletest::test]
    fn active_settings_build_enabled_gate() {
        let settings = ReportSettings {
            endpoint: Some("http://localhost/report".to_string()),
            max_pending: 2,
            ..ReportSettings::default()
        };
        let gate = ReportGate::from_settings(&settings, Blacklist::empty());

        gate.consider_report("", "", "A");
        gate.consider_report("", "", "B");

        expect_that!(gate.consider_report("", "", "C"), eq(ReportDecision::Dropped));
    }

    #[googletest::test]
    fn set_blacklist_applies_to_later_misses() {
        let gate = new_gate(10);

        gate.set_blacklist([("", "tags")].into_iter().collect());

        expect_that!(gate.consider_report("", "tags", "Bye"), eq(ReportDecision::Blacklisted));
    }
}
