mod launcher;
pub(crate) mod process;
pub(crate) mod protocol;
mod relay;

use eframe::egui;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, mpsc};

use crate::error::LaunchError;
use crate::fs_utils::next_index;

pub use launcher::{JobHandle, JobLauncher};
pub use relay::{DisplayMode, DisplaySink, ProgressDisplayState, ProgressRelay, RelayState};

pub(crate) const UNKNOWN_ERROR: &str = "不明なエラーです。";
pub(crate) const RELAY_LOST: &str = "進捗の中継スレッドが結果を返さずに終了しました。";

// 1 回分のダウンロード依頼。起動後は変更しない。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DownloadJob {
    pub link: String,
    pub destination: PathBuf,
    pub transcoder: PathBuf,
    pub start_index: u64,
}

impl DownloadJob {
    // 入力値を検証し、保存先の既存ファイルから開始番号を決めてジョブを作る。
    pub fn prepare(
        link: &str,
        destination: Option<&Path>,
        transcoder: &Path,
    ) -> Result<Self, LaunchError> {
        let link = link.trim();
        if link.is_empty() {
            return Err(LaunchError::EmptyLink);
        }
        let destination = destination.ok_or(LaunchError::NoDestination)?;
        let start_index = next_index(destination)
            .ok_or_else(|| LaunchError::IndexExhausted(destination.to_path_buf()))?;
        let job = Self {
            link: link.to_string(),
            destination: destination.to_path_buf(),
            transcoder: transcoder.to_path_buf(),
            start_index,
        };
        job.validate()?;
        Ok(job)
    }

    pub fn validate(&self) -> Result<(), LaunchError> {
        if self.link.trim().is_empty() {
            return Err(LaunchError::EmptyLink);
        }
        if !self.destination.is_dir() {
            return Err(LaunchError::DestinationMissing(self.destination.clone()));
        }
        if !self.transcoder.is_file() {
            return Err(LaunchError::TranscoderMissing(self.transcoder.clone()));
        }
        Ok(())
    }
}

// ワーカー終了時の結果。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JobOutcome {
    pub exit_code: i32,
    pub error_text: String,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.exit_code == 0
    }

    pub fn failure_message(&self) -> String {
        let trimmed = self.error_text.trim();
        if trimmed.is_empty() {
            UNKNOWN_ERROR.to_string()
        } else {
            trimmed.to_string()
        }
    }
}

pub enum DisplayCommand {
    Mode(DisplayMode),
    Value(f32),
    Status(String),
}

impl DisplayCommand {
    pub fn apply_to(self, sink: &mut impl DisplaySink) {
        match self {
            Self::Mode(mode) => sink.set_mode(mode),
            Self::Value(value) => sink.set_value(value),
            Self::Status(text) => sink.set_status_text(&text),
        }
    }
}

pub enum DownloadEvent {
    Log(String),
    Display(DisplayCommand),
    // `Err` は起動後の読み取り・待機の失敗。
    Done(Result<JobOutcome, String>),
}

// 中継スレッドから UI スレッドへ表示更新を受け渡す。
pub struct ChannelSink {
    tx: mpsc::Sender<DownloadEvent>,
    repaint: egui::Context,
}

impl ChannelSink {
    pub fn new(tx: mpsc::Sender<DownloadEvent>, repaint: egui::Context) -> Self {
        Self { tx, repaint }
    }

    fn send(&self, event: DownloadEvent) {
        let _ = self.tx.send(event);
        self.repaint.request_repaint();
    }
}

impl DisplaySink for ChannelSink {
    fn set_mode(&mut self, mode: DisplayMode) {
        self.send(DownloadEvent::Display(DisplayCommand::Mode(mode)));
    }

    fn set_value(&mut self, value: f32) {
        self.send(DownloadEvent::Display(DisplayCommand::Value(value)));
    }

    fn set_status_text(&mut self, text: &str) {
        self.send(DownloadEvent::Display(DisplayCommand::Status(
            text.to_string(),
        )));
    }

    fn unrecognized_line(&mut self, line: &str) {
        self.send(DownloadEvent::Log(line.to_string()));
    }
}

// 同時に 1 件だけジョブを走らせるための枠。
#[derive(Clone, Default)]
pub struct JobSlot {
    active: Arc<AtomicBool>,
}

impl JobSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    // 空いていれば確保する。使用中なら None (待ち行列には積まない)。
    pub fn try_begin(&self) -> Option<ActiveJob> {
        self.active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| ActiveJob {
                active: self.active.clone(),
            })
    }
}

// 確保中の枠。drop で解放される。
pub struct ActiveJob {
    active: Arc<AtomicBool>,
}

impl Drop for ActiveJob {
    fn drop(&mut self) {
        self.active.store(false, Ordering::Release);
    }
}

// 届いているイベントを全て取り出す。Done が来ないまま送信側が消えた場合は
// 失敗の Done を補い、UI が実行中のまま固まらないようにする。
pub fn drain_events(rx: &mpsc::Receiver<DownloadEvent>) -> Vec<DownloadEvent> {
    let mut events = Vec::new();
    loop {
        match rx.try_recv() {
            Ok(event) => events.push(event),
            Err(mpsc::TryRecvError::Empty) => break,
            Err(mpsc::TryRecvError::Disconnected) => {
                let done_seen = events
                    .iter()
                    .any(|event| matches!(event, DownloadEvent::Done(_)));
                if !done_seen {
                    events.push(DownloadEvent::Done(Err(RELAY_LOST.to_string())));
                }
                break;
            }
        }
    }
    events
}

// 中継スレッドのエントリポイント。ワーカーを最後まで見届けて結果を通知する。
pub fn run_relay(
    handle: JobHandle,
    tx: mpsc::Sender<DownloadEvent>,
    repaint: egui::Context,
    active: ActiveJob,
) {
    let _ = tx.send(DownloadEvent::Log(format!(
        "ワーカーを起動しました (pid {})",
        handle.id()
    )));
    let mut relay = ProgressRelay::new(ChannelSink::new(tx.clone(), repaint.clone()));
    let result = relay::observe(handle, &mut relay).map_err(|err| err.to_string());
    if let RelayState::Failed(reason) = relay.state() {
        let _ = tx.send(DownloadEvent::Log(format!("ワーカー異常終了: {reason}")));
    }

    drop(active);
    let _ = tx.send(DownloadEvent::Done(result));
    repaint.request_repaint();
}
