use crate::error::RelayError;

use super::launcher::JobHandle;
use super::process::{read_lines, spawn_capture_thread, terminate_child_process};
use super::protocol::{ProgressEvent, parse_line};
use super::JobOutcome;

pub const STATUS_RUNNING: &str = "バックグラウンドでダウンロードを処理中...";
pub const STATUS_INDETERMINATE: &str = "ダウンロード中です。しばらくお待ちください...";
pub const STATUS_COMPLETED: &str = "ダウンロード完了!";
pub const STATUS_FAILED: &str = "ダウンロードでエラーが発生しました。";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DisplayMode {
    Determinate,
    Indeterminate,
}

// 進捗表示の書き込み口。
pub trait DisplaySink {
    fn set_mode(&mut self, mode: DisplayMode);
    fn set_value(&mut self, value: f32);
    fn set_status_text(&mut self, text: &str);

    // プロトコル外の出力行。既定では捨てる。
    fn unrecognized_line(&mut self, _line: &str) {}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProgressDisplayState {
    pub mode: DisplayMode,
    // 0.0〜100.0
    pub value: f32,
    pub status: String,
}

impl ProgressDisplayState {
    pub fn idle() -> Self {
        Self {
            mode: DisplayMode::Determinate,
            value: 0.0,
            status: String::new(),
        }
    }

    pub fn reset(&mut self) {
        *self = Self::idle();
    }
}

impl Default for ProgressDisplayState {
    fn default() -> Self {
        Self::idle()
    }
}

impl DisplaySink for ProgressDisplayState {
    fn set_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    fn set_value(&mut self, value: f32) {
        self.value = value;
    }

    fn set_status_text(&mut self, text: &str) {
        self.status = text.to_string();
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum RelayState {
    Idle,
    Running(DisplayMode),
    Succeeded,
    Failed(String),
}

impl RelayState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed(_))
    }
}

pub struct ProgressRelay<S> {
    sink: S,
    state: RelayState,
}

impl<S: DisplaySink> ProgressRelay<S> {
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            state: RelayState::Idle,
        }
    }

    pub fn state(&self) -> &RelayState {
        &self.state
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    // ジョブ開始時の基準状態に戻す。
    pub fn begin(&mut self) {
        self.state = RelayState::Running(DisplayMode::Determinate);
        self.sink.set_mode(DisplayMode::Determinate);
        self.sink.set_value(0.0);
        self.sink.set_status_text(STATUS_RUNNING);
    }

    pub fn handle_line(&mut self, line: &str) {
        if let Some(event) = parse_line(line) {
            self.apply(event);
        }
    }

    pub fn apply(&mut self, event: ProgressEvent) {
        if self.state.is_terminal() {
            return;
        }
        match event {
            ProgressEvent::Percent(value) => {
                // 不定モードに入ったジョブは最後まで不定モードのまま。
                if self.state == RelayState::Running(DisplayMode::Indeterminate) {
                    return;
                }
                let value = value.clamp(0.0, 100.0);
                if self.state != RelayState::Running(DisplayMode::Determinate) {
                    self.sink.set_mode(DisplayMode::Determinate);
                }
                self.state = RelayState::Running(DisplayMode::Determinate);
                self.sink.set_value(value);
                self.sink
                    .set_status_text(&format!("ダウンロード中... {value:.1}%"));
            }
            ProgressEvent::IndeterminateModeEntered => {
                self.state = RelayState::Running(DisplayMode::Indeterminate);
                self.sink.set_mode(DisplayMode::Indeterminate);
                self.sink.set_status_text(STATUS_INDETERMINATE);
            }
            ProgressEvent::Unrecognized(line) => self.sink.unrecognized_line(&line),
        }
    }

    // 終了コードに応じて表示を「完了」か「エラー停止」に確定させる。
    pub fn finish(&mut self, outcome: &JobOutcome) {
        self.sink.set_mode(DisplayMode::Determinate);
        if outcome.is_success() {
            self.state = RelayState::Succeeded;
            self.sink.set_value(100.0);
            self.sink.set_status_text(STATUS_COMPLETED);
        } else {
            self.state = RelayState::Failed(outcome.failure_message());
            self.sink.set_value(0.0);
            self.sink.set_status_text(STATUS_FAILED);
        }
    }

    fn abort(&mut self, reason: &RelayError) {
        self.state = RelayState::Failed(reason.to_string());
        self.sink.set_mode(DisplayMode::Determinate);
        self.sink.set_value(0.0);
        self.sink.set_status_text(STATUS_FAILED);
    }
}

// ワーカーを終了まで見届ける。標準出力はこのスレッドで行ごとに読み、
// 標準エラーは別スレッドで読み切る。終了コードは標準出力の EOF 後に取る。
pub fn observe<S: DisplaySink>(
    handle: JobHandle,
    relay: &mut ProgressRelay<S>,
) -> Result<JobOutcome, RelayError> {
    let JobHandle {
        mut child,
        stdout,
        stderr,
    } = handle;

    relay.begin();
    let stderr_thread = spawn_capture_thread(stderr);

    if let Err(err) = read_lines(stdout, |line| relay.handle_line(line)) {
        terminate_child_process(&mut child);
        let err = RelayError::Read(err);
        relay.abort(&err);
        return Err(err);
    }

    let status = match child.wait() {
        Ok(status) => status,
        Err(err) => {
            let err = RelayError::Wait(err);
            relay.abort(&err);
            return Err(err);
        }
    };
    let error_text = stderr_thread.join().unwrap_or_default();

    let outcome = JobOutcome {
        exit_code: status.code().unwrap_or(-1),
        error_text,
    };
    relay.finish(&outcome);
    Ok(outcome)
}
