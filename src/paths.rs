use std::path::{Path, PathBuf};

pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".mp3downloader")
}

pub fn settings_file_path() -> PathBuf {
    app_data_dir().join("settings.properties")
}

pub fn make_absolute_path(raw: &str) -> PathBuf {
    let path = PathBuf::from(raw);
    if path.is_absolute() {
        return path;
    }
    std::env::current_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(path)
}

// 実行ファイルと同じフォルダ。取得できない場合はカレントディレクトリ。
pub fn exe_dir() -> PathBuf {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."))
}

pub fn executable_name(stem: &str) -> String {
    if cfg!(windows) {
        format!("{stem}.exe")
    } else {
        stem.to_string()
    }
}

// 設定値があればそれを、なければ実行ファイル横の ffmpeg を使う。
pub fn transcoder_path(configured: &str) -> PathBuf {
    let configured = configured.trim();
    if !configured.is_empty() {
        return make_absolute_path(configured);
    }
    exe_dir().join(executable_name("ffmpeg"))
}

// 外部エンジンの実行パスを解決する。設定値 → 同梱 → PATH の順。
pub fn engine_path(configured: &str, stem: &str) -> PathBuf {
    let configured = configured.trim();
    if !configured.is_empty() {
        return make_absolute_path(configured);
    }
    let name = executable_name(stem);
    let bundled = exe_dir().join(&name);
    if bundled.is_file() {
        return bundled;
    }
    PathBuf::from(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_transcoder_wins() {
        let path = transcoder_path("/opt/tools/ffmpeg");
        assert_eq!(path, PathBuf::from("/opt/tools/ffmpeg"));
    }

    #[test]
    fn unconfigured_transcoder_sits_next_to_executable() {
        let path = transcoder_path("  ");
        assert_eq!(path.parent(), Some(exe_dir().as_path()));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some(executable_name("ffmpeg").as_str())
        );
    }

    #[test]
    fn missing_engine_falls_back_to_bare_name() {
        let path = engine_path("", "surely-not-bundled-engine");
        assert_eq!(path, PathBuf::from(executable_name("surely-not-bundled-engine")));
    }
}
