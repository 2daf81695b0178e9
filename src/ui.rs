use eframe::egui;

use crate::app::DownloaderApp;
use crate::download::DisplayMode;

const TEXT_COLOR: egui::Color32 = egui::Color32::from_rgb(226, 232, 240);
const MUTED_COLOR: egui::Color32 = egui::Color32::from_rgb(130, 140, 160);
const ACCENT_COLOR: egui::Color32 = egui::Color32::from_rgb(76, 175, 80);

pub fn render(
    // 画面全体の状態とアクションの入口
    app: &mut DownloaderApp,
    // 描画・入力を統括するeguiコンテキスト
    ctx: &egui::Context,
) {
    egui::TopBottomPanel::bottom("credits")
        .frame(egui::Frame::NONE.inner_margin(egui::Margin::symmetric(16, 8)))
        .show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.label(
                    egui::RichText::new("yt-dlp / spotDL / FFmpeg を利用しています")
                        .size(10.5)
                        .color(MUTED_COLOR),
                );
            });
        });

    egui::CentralPanel::default()
        .frame(egui::Frame::NONE.inner_margin(egui::Margin::symmetric(20, 16)))
        .show(ctx, |ui| {
            render_link_section(ui, app);
            ui.add_space(12.0);
            render_destination_section(ui, app);
            ui.add_space(16.0);
            render_download_button(ui, ctx, app);
            ui.add_space(12.0);
            render_progress_panel(ui, ctx, app);
            ui.add_space(12.0);
            render_log_section(ui, app);
        });
}

fn render_link_section(
    // リンク入力欄の描画先
    ui: &mut egui::Ui,
    // 入力中リンクを保持するアプリ状態
    app: &mut DownloaderApp,
) {
    ui.label(
        egui::RichText::new("リンクを貼り付け (YouTube または Spotify)")
            .size(13.0)
            .color(TEXT_COLOR),
    );
    ui.add_space(4.0);
    let enabled = !app.is_downloading();
    ui.horizontal(|ui| {
        let paste_width = 72.0;
        let input_width = (ui.available_width() - paste_width - ui.spacing().item_spacing.x).max(0.0);
        ui.add_enabled(
            enabled,
            egui::TextEdit::singleline(&mut app.link_input)
                .hint_text("https://...")
                .desired_width(input_width),
        );
        if ui
            .add_enabled(enabled, egui::Button::new("貼り付け"))
            .clicked()
        {
            app.paste_link_from_clipboard();
        }
    });
}

fn render_destination_section(
    // 保存先表示の描画先
    ui: &mut egui::Ui,
    // 選択済みフォルダを保持するアプリ状態
    app: &mut DownloaderApp,
) {
    let enabled = !app.is_downloading();
    ui.horizontal(|ui| {
        if ui
            .add_enabled(enabled, egui::Button::new("保存先フォルダを選択"))
            .clicked()
        {
            app.choose_destination();
        }
        let (text, color) = match app.download_dir.as_ref() {
            Some(dir) => (
                dir.to_string_lossy().to_string(),
                egui::Color32::from_rgb(96, 165, 250),
            ),
            None => ("フォルダが選択されていません".to_string(), MUTED_COLOR),
        };
        ui.add(egui::Label::new(egui::RichText::new(text).size(12.0).color(color)).truncate());
    });
}

fn render_download_button(ui: &mut egui::Ui, ctx: &egui::Context, app: &mut DownloaderApp) {
    let downloading = app.is_downloading();
    let label = if downloading {
        "ダウンロード中..."
    } else {
        "ダウンロード"
    };
    let button = egui::Button::new(
        egui::RichText::new(label)
            .size(17.0)
            .strong()
            .color(egui::Color32::WHITE),
    )
    .fill(ACCENT_COLOR)
    .corner_radius(egui::CornerRadius::same(12));

    let clicked = ui
        .add_enabled_ui(!downloading, |ui| {
            ui.add_sized([ui.available_width(), 44.0], button)
        })
        .inner
        .clicked();
    if clicked {
        app.start_download(ctx);
    }
}

fn render_progress_panel(
    // 進捗パネルの描画先UI
    ui: &mut egui::Ui,
    // アニメーション時間や再描画依頼に使用
    ctx: &egui::Context,
    // 進捗表示に必要な読み取り専用アプリ状態
    app: &DownloaderApp,
) {
    let display = &app.display;
    let downloading = app.is_downloading();
    let opacity = if downloading { 1.0 } else { 0.6 };
    let label_color = apply_opacity(egui::Color32::from_rgb(203, 213, 225), opacity);

    egui::Frame::NONE
        .fill(apply_opacity(
            egui::Color32::from_rgba_unmultiplied(255, 255, 255, 13),
            opacity,
        ))
        .stroke(egui::Stroke::new(
            1.0,
            apply_opacity(egui::Color32::from_rgba_unmultiplied(255, 255, 255, 20), opacity),
        ))
        .corner_radius(egui::CornerRadius::same(12))
        .inner_margin(egui::Margin::symmetric(12, 10))
        .show(ui, |ui| {
            let label_text = if display.status.is_empty() {
                "待機中..."
            } else {
                display.status.as_str()
            };
            ui.label(
                egui::RichText::new(label_text)
                    .size(12.0)
                    .color(label_color)
                    .strong(),
            );
            ui.add_space(6.0);

            let (rect, _) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), 12.0),
                egui::Sense::hover(),
            );
            let rounding = egui::CornerRadius::same(8);
            let bar_fill = apply_opacity(ACCENT_COLOR, opacity);
            ui.painter().rect_filled(
                rect,
                rounding,
                apply_opacity(egui::Color32::from_rgba_unmultiplied(255, 255, 255, 31), opacity),
            );

            match display.mode {
                DisplayMode::Indeterminate if downloading => {
                    // 進捗率が無いときは区間が左右に流れるアニメーション。
                    let t = ctx.input(|input| input.time) as f32;
                    let segment_fraction = 0.28f32;
                    let phase = (t * 0.6) % 1.0;
                    let start = phase * (1.0 + segment_fraction) - segment_fraction;
                    let seg_min = (rect.left() + rect.width() * start).max(rect.left());
                    let seg_max =
                        (rect.left() + rect.width() * (start + segment_fraction)).min(rect.right());
                    if seg_max > seg_min {
                        let seg_rect = egui::Rect::from_min_max(
                            egui::pos2(seg_min, rect.top()),
                            egui::pos2(seg_max, rect.bottom()),
                        );
                        ui.painter().rect_filled(seg_rect, rounding, bar_fill);
                    }
                    ctx.request_repaint();
                }
                _ => {
                    let progress = (display.value / 100.0).clamp(0.0, 1.0);
                    if progress > 0.0 {
                        let fill_rect = egui::Rect::from_min_max(
                            rect.min,
                            egui::pos2(rect.left() + rect.width() * progress, rect.bottom()),
                        );
                        ui.painter().rect_filled(fill_rect, rounding, bar_fill);
                    }
                }
            }
        });
}

fn render_log_section(ui: &mut egui::Ui, app: &mut DownloaderApp) {
    egui::CollapsingHeader::new(egui::RichText::new("ログ").size(12.5).color(TEXT_COLOR))
        .default_open(false)
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                if ui.small_button("コピー").clicked() {
                    app.copy_log_to_clipboard();
                }
                if ui.small_button("クリア").clicked() {
                    app.logger.clear();
                }
            });
            egui::ScrollArea::vertical()
                .max_height(ui.available_height().max(80.0))
                .auto_shrink([false, true])
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if app.logger.is_empty() {
                        ui.label(egui::RichText::new("ログはありません。").size(11.5).color(MUTED_COLOR));
                        return;
                    }
                    for line in app.logger.lines() {
                        ui.label(
                            egui::RichText::new(line)
                                .size(11.5)
                                .monospace()
                                .color(egui::Color32::from_rgb(200, 210, 230)),
                        );
                    }
                });
        });
}

fn apply_opacity(
    // ベースとなる色
    color: egui::Color32,
    // 0.0〜1.0の透過率
    opacity: f32,
) -> egui::Color32 {
    let alpha = (color.a() as f32 * opacity).round().clamp(0.0, 255.0) as u8;
    egui::Color32::from_rgba_unmultiplied(color.r(), color.g(), color.b(), alpha)
}
