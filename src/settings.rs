use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::paths::{make_absolute_path, settings_file_path};

#[derive(Clone, Debug)]
pub struct SettingsData {
    pub window_width: String,
    pub window_height: String,
    pub download_dir: String,
    pub ffmpeg_path: String,
    pub yt_dlp_path: String,
    pub spotdl_path: String,
}

impl SettingsData {
    pub fn load() -> Self {
        Self::load_from(&settings_file_path())
    }

    pub fn load_from(path: &Path) -> Self {
        let props = read_properties_from_path(path).unwrap_or_default();
        let window_width = parse_dimension(
            props.get("window.width"),
            DEFAULT_WINDOW_WIDTH,
            MIN_WINDOW_WIDTH,
        );
        let window_height = parse_dimension(
            props.get("window.height"),
            DEFAULT_WINDOW_HEIGHT,
            MIN_WINDOW_HEIGHT,
        );
        let download_dir = props
            .get("download.dir")
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .map(|value| make_absolute_path(value).to_string_lossy().to_string())
            .unwrap_or_default();
        let tool = |key: &str| {
            props
                .get(key)
                .map(|v| v.trim().to_string())
                .unwrap_or_default()
        };
        Self {
            window_width: format_dimension(window_width),
            window_height: format_dimension(window_height),
            download_dir,
            ffmpeg_path: tool("tools.ffmpeg"),
            yt_dlp_path: tool("tools.yt_dlp"),
            spotdl_path: tool("tools.spotdl"),
        }
    }

    pub fn save(&self) -> Result<(), String> {
        self.save_to(&settings_file_path())
    }

    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|err| err.to_string())?;
        }
        fs::write(path, self.to_properties_string()).map_err(|err| err.to_string())
    }

    // 未選択なら None。空文字を「選択済み」と誤認しないようにする。
    pub fn download_dir(&self) -> Option<PathBuf> {
        let trimmed = self.download_dir.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(PathBuf::from(trimmed))
        }
    }

    fn to_properties_string(&self) -> String {
        let lines = [
            format!("window.width={}", self.window_width.trim()),
            format!("window.height={}", self.window_height.trim()),
            format!("download.dir={}", self.download_dir.trim()),
            format!("tools.ffmpeg={}", self.ffmpeg_path.trim()),
            format!("tools.yt_dlp={}", self.yt_dlp_path.trim()),
            format!("tools.spotdl={}", self.spotdl_path.trim()),
        ];
        lines.join("\n")
    }
}

fn read_properties_from_path(path: &Path) -> Option<HashMap<String, String>> {
    let contents = fs::read_to_string(path).ok()?;
    Some(parse_properties(&contents))
}

fn parse_properties(contents: &str) -> HashMap<String, String> {
    let mut props = HashMap::new();
    for raw_line in contents.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let mut split = line.splitn(2, |c| c == '=' || c == ':');
        let key = split.next().unwrap_or("").trim();
        let value = split.next().unwrap_or("").trim();
        if !key.is_empty() {
            props.insert(key.to_string(), value.to_string());
        }
    }
    props
}

const DEFAULT_WINDOW_WIDTH: f32 = 560.0;
const DEFAULT_WINDOW_HEIGHT: f32 = 520.0;
pub(crate) const MIN_WINDOW_WIDTH: f32 = 420.0;
pub(crate) const MIN_WINDOW_HEIGHT: f32 = 380.0;

fn parse_dimension(raw: Option<&String>, fallback: f32, min: f32) -> f32 {
    let Some(raw) = raw else {
        return fallback.max(min);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return fallback.max(min);
    }
    let parsed = trimmed.parse::<f32>().unwrap_or(fallback);
    parsed.max(min)
}

pub(crate) fn format_dimension(value: f32) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{value}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempdir().expect("tempdir");
        let data = SettingsData::load_from(&dir.path().join("nope.properties"));
        assert_eq!(data.window_width, "560");
        assert!(data.download_dir().is_none());
        assert!(data.ffmpeg_path.is_empty());
    }

    #[test]
    fn parses_comments_and_both_separators() {
        let props = parse_properties("# comment\n! other\ntools.ffmpeg = /usr/bin/ffmpeg\nwindow.width: 700\n=orphan\n");
        assert_eq!(props.get("tools.ffmpeg").map(String::as_str), Some("/usr/bin/ffmpeg"));
        assert_eq!(props.get("window.width").map(String::as_str), Some("700"));
        assert_eq!(props.len(), 2);
    }

    #[test]
    fn saved_settings_load_back() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("conf").join("settings.properties");
        let music = dir.path().join("music");
        let data = SettingsData {
            window_width: "640".to_string(),
            window_height: "100".to_string(),
            download_dir: music.to_string_lossy().to_string(),
            ffmpeg_path: String::new(),
            yt_dlp_path: "/opt/yt-dlp".to_string(),
            spotdl_path: String::new(),
        };
        data.save_to(&path).expect("save");

        let loaded = SettingsData::load_from(&path);
        assert_eq!(loaded.window_width, "640");
        assert_eq!(loaded.window_height, format_dimension(MIN_WINDOW_HEIGHT));
        assert_eq!(loaded.download_dir(), Some(music));
        assert_eq!(loaded.yt_dlp_path, "/opt/yt-dlp");
    }
}
