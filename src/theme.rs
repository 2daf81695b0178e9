use eframe::egui;

// 日本語表示用フォントの候補。見つかった最初のものを使う。
const CJK_FONT_CANDIDATES: &[&str] = &[
    "C:\\Windows\\Fonts\\YuGothM.ttc",
    "C:\\Windows\\Fonts\\meiryo.ttc",
    "C:\\Windows\\Fonts\\msgothic.ttc",
    "/System/Library/Fonts/ヒラギノ角ゴシック W3.ttc",
    "/System/Library/Fonts/Hiragino Sans GB.ttc",
    "/System/Library/Fonts/Supplemental/Arial Unicode.ttf",
    "/usr/share/fonts/opentype/noto/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/noto-cjk/NotoSansCJK-Regular.ttc",
    "/usr/share/fonts/google-noto-cjk/NotoSansCJK-Regular.ttc",
];

pub fn apply_theme(
    // テーマ適用先のeguiコンテキスト
    ctx: &egui::Context,
) {
    let mut style = (*ctx.style()).clone();
    style.visuals = egui::Visuals::dark();
    style.visuals.window_fill = egui::Color32::from_rgb(15, 23, 42);
    style.visuals.panel_fill = egui::Color32::from_rgb(15, 23, 42);
    style.visuals.extreme_bg_color = egui::Color32::from_rgb(24, 30, 45);
    style.visuals.widgets.inactive.bg_fill = egui::Color32::from_rgb(30, 41, 59);
    style.visuals.widgets.hovered.bg_fill = egui::Color32::from_rgb(40, 52, 74);
    style.visuals.widgets.active.bg_fill = egui::Color32::from_rgb(51, 65, 85);
    style.visuals.widgets.inactive.corner_radius = egui::CornerRadius::same(8);
    style.visuals.widgets.hovered.corner_radius = egui::CornerRadius::same(8);
    style.visuals.widgets.active.corner_radius = egui::CornerRadius::same(8);
    style.visuals.selection.bg_fill = egui::Color32::from_rgb(76, 175, 80);
    style.spacing.item_spacing = egui::vec2(10.0, 8.0);
    style.spacing.button_padding = egui::vec2(12.0, 6.0);
    ctx.set_style(style);

    let mut fonts = egui::FontDefinitions::default();
    if let Some(font_data) = load_first_font(CJK_FONT_CANDIDATES) {
        fonts.font_data.insert("cjk".to_string(), font_data.into());
        for family in [egui::FontFamily::Proportional, egui::FontFamily::Monospace] {
            if let Some(names) = fonts.families.get_mut(&family) {
                names.push("cjk".to_string());
            }
        }
    }
    ctx.set_fonts(fonts);
}

fn load_first_font(
    // 探索するフォントファイル候補一覧
    paths: &[&str],
) -> Option<egui::FontData> {
    paths
        .iter()
        .find_map(|path| std::fs::read(path).ok())
        .map(egui::FontData::from_owned)
}
