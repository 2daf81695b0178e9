use arboard::Clipboard;
use eframe::egui;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;

use crate::app_logger::AppLogger;
use crate::download::{
    DownloadEvent, DownloadJob, JobLauncher, JobOutcome, JobSlot, ProgressDisplayState,
    drain_events, run_relay,
};
use crate::error::LaunchError;
use crate::paths::transcoder_path;
use crate::settings::{MIN_WINDOW_HEIGHT, MIN_WINDOW_WIDTH, SettingsData, format_dimension};
use crate::theme::apply_theme;
use crate::ui;

pub fn run() -> eframe::Result<()> {
    let settings = SettingsData::load();
    let window_width = settings.window_width.parse::<f32>().unwrap_or(560.0);
    let window_height = settings.window_height.parse::<f32>().unwrap_or(520.0);
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("MP3 Downloader")
            .with_inner_size([window_width, window_height])
            .with_min_inner_size([MIN_WINDOW_WIDTH, MIN_WINDOW_HEIGHT]),
        ..Default::default()
    };

    eframe::run_native(
        "MP3 Downloader",
        options,
        Box::new(|cc| Ok(Box::new(DownloaderApp::new(cc)))),
    )
}

pub struct DownloaderApp {
    pub(crate) link_input: String,
    pub(crate) download_dir: Option<PathBuf>,
    pub(crate) display: ProgressDisplayState,
    pub(crate) logger: AppLogger,
    job_slot: JobSlot,
    rx: Option<mpsc::Receiver<DownloadEvent>>,
    // 完了表示を 1 フレーム描画してからダイアログを出すため保留する。
    pending_result: Option<Result<JobOutcome, String>>,
    settings: SettingsData,
    current_window_size: Option<egui::Vec2>,
}

impl DownloaderApp {
    fn new(cc: &eframe::CreationContext<'_>) -> Self {
        apply_theme(&cc.egui_ctx);
        let settings = SettingsData::load();

        let mut app = Self {
            link_input: String::new(),
            download_dir: settings.download_dir(),
            display: ProgressDisplayState::idle(),
            logger: AppLogger::new(),
            job_slot: JobSlot::new(),
            rx: None,
            pending_result: None,
            settings,
            current_window_size: None,
        };

        let transcoder = transcoder_path(&app.settings.ffmpeg_path);
        if !transcoder.is_file() {
            app.logger.push(format!(
                "ffmpegが見つかりません: {}",
                transcoder.to_string_lossy()
            ));
        }

        app
    }

    // 実行中は新しいダウンロードを受け付けない。
    pub(crate) fn is_downloading(&self) -> bool {
        self.job_slot.is_active() || self.rx.is_some() || self.pending_result.is_some()
    }

    pub(crate) fn paste_link_from_clipboard(&mut self) {
        match read_clipboard_text() {
            Some(text) => self.link_input = text,
            None => self.logger.push("クリップボードにテキストがありません。"),
        }
    }

    pub(crate) fn choose_destination(&mut self) {
        let mut dialog = rfd::FileDialog::new().set_title("保存先フォルダを選択");
        if let Some(dir) = self.download_dir.as_ref() {
            dialog = dialog.set_directory(dir);
        }
        if let Some(dir) = dialog.pick_folder() {
            self.logger
                .push(format!("保存先: {}", dir.to_string_lossy()));
            self.settings.download_dir = dir.to_string_lossy().to_string();
            self.download_dir = Some(dir);
            if let Err(err) = self.settings.save() {
                self.logger.push(format!("設定の保存に失敗しました: {err}"));
            }
        }
    }

    pub(crate) fn copy_log_to_clipboard(&mut self) {
        let text = self.logger.snapshot();
        let result = Clipboard::new().and_then(|mut clipboard| clipboard.set_text(text));
        if let Err(err) = result {
            self.logger
                .push(format!("クリップボードへのコピーに失敗しました: {err}"));
        }
    }

    pub(crate) fn start_download(&mut self, ctx: &egui::Context) {
        if self.is_downloading() {
            self.logger
                .push("ダウンロード中のため新しい依頼は受け付けません。");
            return;
        }

        let transcoder = transcoder_path(&self.settings.ffmpeg_path);
        let job = match DownloadJob::prepare(
            &self.link_input,
            self.download_dir.as_deref(),
            &transcoder,
        ) {
            Ok(job) => job,
            Err(err) => {
                self.report_launch_error(ctx, &err);
                return;
            }
        };

        let Some(active) = self.job_slot.try_begin() else {
            return;
        };

        let handle = match JobLauncher::for_current_exe().and_then(|launcher| launcher.launch(&job))
        {
            Ok(handle) => handle,
            Err(err) => {
                self.report_launch_error(ctx, &err);
                return;
            }
        };

        self.logger.push(format!(
            "ダウンロード開始: {} -> {} (開始番号 {:02})",
            job.link,
            job.destination.to_string_lossy(),
            job.start_index
        ));

        let (tx, rx) = mpsc::channel();
        self.rx = Some(rx);
        let repaint = ctx.clone();
        thread::spawn(move || run_relay(handle, tx, repaint, active));
    }

    fn report_launch_error(&mut self, ctx: &egui::Context, err: &LaunchError) {
        self.logger.push(err.to_string());
        if err.is_precondition() {
            show_dialog(ctx, rfd::MessageLevel::Warning, "注意", &err.to_string());
        } else {
            show_dialog(ctx, rfd::MessageLevel::Error, "重大なエラー", &err.to_string());
        }
    }

    fn poll_download_events(&mut self, ctx: &egui::Context) {
        let events = match self.rx.as_ref() {
            Some(rx) => drain_events(rx),
            None => return,
        };

        for event in events {
            match event {
                DownloadEvent::Log(line) => self.logger.push(line),
                DownloadEvent::Display(command) => command.apply_to(&mut self.display),
                DownloadEvent::Done(result) => {
                    self.rx = None;
                    self.pending_result = Some(result);
                    ctx.request_repaint();
                }
            }
        }
    }

    // 結果をダイアログで知らせ、表示を初期状態へ戻す。
    fn finish_job(&mut self, ctx: &egui::Context, result: Result<JobOutcome, String>) {
        match result {
            Ok(outcome) if outcome.is_success() => {
                self.logger.push("ダウンロード完了。");
                show_dialog(
                    ctx,
                    rfd::MessageLevel::Info,
                    "成功",
                    "ダウンロードが正常に完了しました!",
                );
                self.link_input.clear();
            }
            Ok(outcome) => {
                let message = outcome.failure_message();
                self.logger.push(format!(
                    "ダウンロード失敗 (終了コード {}): {message}",
                    outcome.exit_code
                ));
                show_dialog(
                    ctx,
                    rfd::MessageLevel::Error,
                    "内部エラー",
                    &format!("ダウンロードに失敗しました:\n{message}"),
                );
            }
            Err(err) => {
                self.logger.push(format!("ワーカーの監視に失敗しました: {err}"));
                show_dialog(ctx, rfd::MessageLevel::Error, "重大なエラー", &err);
            }
        }
        self.display.reset();
    }
}

impl eframe::App for DownloaderApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.current_window_size = ctx.input(|i| i.viewport().inner_rect.map(|rect| rect.size()));
        if let Some(result) = self.pending_result.take() {
            self.finish_job(ctx, result);
        }
        self.poll_download_events(ctx);
        ui::render(self, ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        let mut data = SettingsData::load();
        if let Some(size) = self.current_window_size {
            data.window_width = format_dimension(size.x.max(MIN_WINDOW_WIDTH));
            data.window_height = format_dimension(size.y.max(MIN_WINDOW_HEIGHT));
        }
        if let Some(dir) = self.download_dir.as_ref() {
            data.download_dir = dir.to_string_lossy().to_string();
        }
        let _ = data.save();
    }
}

// ダイアログの前にウィンドウを前面へ出す。閉じられるまで戻らない。
fn show_dialog(ctx: &egui::Context, level: rfd::MessageLevel, title: &str, description: &str) {
    ctx.send_viewport_cmd(egui::ViewportCommand::Focus);
    let _ = rfd::MessageDialog::new()
        .set_level(level)
        .set_title(title)
        .set_description(description)
        .set_buttons(rfd::MessageButtons::Ok)
        .show();
}

// クリップボード文字列を読み取り、空文字の場合は None を返す。
fn read_clipboard_text() -> Option<String> {
    let mut clipboard = Clipboard::new().ok()?;
    let text = clipboard.get_text().ok()?;
    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
