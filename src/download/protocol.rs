use std::io::{self, Write};

// ワーカー標準出力の行形式: "PROGRESS:<数値>" / "MODE:SPOTIFY"。
// 失敗は標準エラーにマーカー付きの 1 行で出す。
pub const PROGRESS_TOKEN: &str = "PROGRESS:";
pub const INDETERMINATE_TOKEN: &str = "MODE:SPOTIFY";
pub const WORKER_ERROR_MARKER: &str = "ERRO CRITICO WORKER:";

#[derive(Clone, Debug, PartialEq)]
pub enum ProgressEvent {
    Percent(f32),
    IndeterminateModeEntered,
    Unrecognized(String),
}

// ワーカー出力 1 行を分類する。空行は None。
// PROGRESS: の値が有限の数値にならない行は Unrecognized 扱い。
pub fn parse_line(line: &str) -> Option<ProgressEvent> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Some(pos) = trimmed.find(PROGRESS_TOKEN) {
        let raw = trimmed[pos + PROGRESS_TOKEN.len()..].trim();
        return Some(match parse_percent(raw) {
            Some(value) => ProgressEvent::Percent(value),
            None => ProgressEvent::Unrecognized(trimmed.to_string()),
        });
    }

    if trimmed.contains(INDETERMINATE_TOKEN) {
        return Some(ProgressEvent::IndeterminateModeEntered);
    }

    Some(ProgressEvent::Unrecognized(trimmed.to_string()))
}

fn parse_percent(raw: &str) -> Option<f32> {
    raw.parse::<f32>().ok().filter(|value| value.is_finite())
}

// 1 行書いてすぐ flush する。
pub fn emit<W: Write>(out: &mut W, event: &ProgressEvent) -> io::Result<()> {
    match event {
        ProgressEvent::Percent(value) => writeln!(out, "{PROGRESS_TOKEN}{value}")?,
        ProgressEvent::IndeterminateModeEntered => writeln!(out, "{INDETERMINATE_TOKEN}")?,
        ProgressEvent::Unrecognized(line) => writeln!(out, "{line}")?,
    }
    out.flush()
}
