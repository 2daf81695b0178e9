mod music;
mod video;

use std::io::{self, Write};
use std::path::PathBuf;

use crate::download::protocol::WORKER_ERROR_MARKER;
use crate::error::WorkerError;
use crate::paths::engine_path;
use crate::settings::SettingsData;

pub const WORKER_FLAG: &str = "--worker";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WorkerArgs {
    pub link: String,
    pub destination: PathBuf,
    pub transcoder: PathBuf,
    pub start_index: u64,
}

impl WorkerArgs {
    // argv[0] は実行ファイル、argv[1] はワーカーフラグ。以降が位置引数。
    pub fn parse(argv: &[String]) -> Result<Self, WorkerError> {
        let positional = argv.get(2..).unwrap_or_default();
        let arg = |idx: usize, name: &'static str| {
            positional
                .get(idx)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
                .ok_or(WorkerError::MissingArgument(name))
        };

        let link = arg(0, "link")?.to_string();
        let destination = PathBuf::from(arg(1, "destination")?);
        let transcoder = PathBuf::from(arg(2, "transcoder")?);
        let start_index = match positional.get(3).map(|value| value.trim()) {
            None | Some("") => 1,
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|_| WorkerError::InvalidStartIndex(raw.to_string()))?,
        };

        Ok(Self {
            link,
            destination,
            transcoder,
            start_index,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
    Music,
    Video,
}

pub fn select_strategy(link: &str) -> Strategy {
    if music::is_music_link(link) {
        Strategy::Music
    } else {
        Strategy::Video
    }
}

// ワーカーモードの入口。戻り値はプロセスの終了コード。
pub fn run(argv: &[String]) -> i32 {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    match run_inner(argv, &mut out) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{WORKER_ERROR_MARKER} {err}");
            1
        }
    }
}

fn run_inner<W: Write>(argv: &[String], out: &mut W) -> Result<(), WorkerError> {
    let args = WorkerArgs::parse(argv)?;
    let settings = SettingsData::load();
    match select_strategy(&args.link) {
        Strategy::Music => {
            let engine = engine_path(&settings.spotdl_path, music::ENGINE);
            music::download(&args, &engine, out)
        }
        Strategy::Video => {
            let engine = engine_path(&settings.yt_dlp_path, video::ENGINE);
            video::download(&args, &engine, out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[test]
    fn parses_positional_arguments() {
        let args = WorkerArgs::parse(&argv(&[
            "app",
            "--worker",
            "https://youtu.be/abc",
            "/music",
            "/tools/ffmpeg",
            "12",
        ]))
        .expect("parse");
        assert_eq!(args.link, "https://youtu.be/abc");
        assert_eq!(args.destination, PathBuf::from("/music"));
        assert_eq!(args.transcoder, PathBuf::from("/tools/ffmpeg"));
        assert_eq!(args.start_index, 12);
    }

    #[test]
    fn start_index_defaults_to_one() {
        let args = WorkerArgs::parse(&argv(&["app", "--worker", "l", "/m", "/f"])).expect("parse");
        assert_eq!(args.start_index, 1);
    }

    #[test]
    fn start_index_beyond_u32_is_accepted() {
        let args = WorkerArgs::parse(&argv(&["app", "--worker", "l", "/m", "/f", "5000000001"]))
            .expect("parse");
        assert_eq!(args.start_index, 5_000_000_001);
    }

    #[test]
    fn rejects_missing_or_bad_arguments() {
        let err = WorkerArgs::parse(&argv(&["app", "--worker", "link"])).unwrap_err();
        assert!(matches!(err, WorkerError::MissingArgument("destination")));

        let err = WorkerArgs::parse(&argv(&["app"])).unwrap_err();
        assert!(matches!(err, WorkerError::MissingArgument("link")));

        let err =
            WorkerArgs::parse(&argv(&["app", "--worker", "l", "/m", "/f", "-2"])).unwrap_err();
        assert!(matches!(err, WorkerError::InvalidStartIndex(_)));
    }

    #[test]
    fn dispatches_by_origin() {
        assert_eq!(
            select_strategy("https://open.spotify.com/track/4uLU6hMCjMI75M1A2tKUQC"),
            Strategy::Music
        );
        assert_eq!(
            select_strategy("https://www.youtube.com/watch?v=dQw4w9WgXcQ"),
            Strategy::Video
        );
        assert_eq!(select_strategy("not a url"), Strategy::Video);
    }

    #[test]
    fn argument_errors_exit_non_zero() {
        let mut out = Vec::new();
        let result = run_inner(&argv(&["app", "--worker"]), &mut out);
        assert!(result.is_err());
        assert!(out.is_empty());
        assert_eq!(run(&argv(&["app", "--worker"])), 1);
    }
}
