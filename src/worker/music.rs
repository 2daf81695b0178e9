use std::io::Write;
use std::path::Path;
use std::process::Stdio;

use url::Url;

use crate::download::process::{SpawnOptions, background_command};
use crate::download::protocol::{ProgressEvent, emit};
use crate::error::WorkerError;

use super::WorkerArgs;

pub(super) const ENGINE: &str = "spotdl";
const BITRATE: &str = "192k";

pub(super) fn is_music_link(link: &str) -> bool {
    let link = link.trim();
    match Url::parse(link) {
        Ok(url) if url.scheme() == "spotify" => true,
        Ok(url) => url
            .host_str()
            .map(|host| {
                let host = host.to_ascii_lowercase();
                host == "spotify.com" || host.ends_with(".spotify.com")
            })
            .unwrap_or(false),
        Err(_) => {
            let lower = link.to_lowercase();
            lower.contains("spotify.com") || lower.starts_with("spotify:")
        }
    }
}

// 単曲リンクかどうか。プレイリスト・アルバム・アーティストは false。
pub(super) fn is_single_track(link: &str) -> bool {
    let link = link.trim();
    if link.to_lowercase().starts_with("spotify:track:") {
        return true;
    }
    match Url::parse(link) {
        Ok(url) => url
            .path_segments()
            .map(|mut segments| segments.any(|segment| segment.eq_ignore_ascii_case("track")))
            .unwrap_or(false),
        Err(_) => link.to_lowercase().contains("/track/"),
    }
}

// 単曲は開始番号を 2 桁で埋め込み、コレクションは曲順を使う。
pub(super) fn output_template(args: &WorkerArgs) -> String {
    let file_name = if is_single_track(&args.link) {
        format!("{:02}_{{title}}.{{output-ext}}", args.start_index)
    } else {
        "{list-position}_{title}.{output-ext}".to_string()
    };
    args.destination.join(file_name).to_string_lossy().to_string()
}

pub(super) fn spotdl_args(args: &WorkerArgs) -> Vec<String> {
    vec![
        "download".to_string(),
        args.link.clone(),
        "--output".to_string(),
        output_template(args),
        "--format".to_string(),
        "mp3".to_string(),
        "--bitrate".to_string(),
        BITRATE.to_string(),
        "--ffmpeg".to_string(),
        args.transcoder.to_string_lossy().to_string(),
        "--headless".to_string(),
        "--log-level".to_string(),
        "CRITICAL".to_string(),
    ]
}

// 進捗率は取れないので、先に不定モードを通知してから spotdl を実行する。
pub(super) fn download<W: Write>(
    args: &WorkerArgs,
    engine: &Path,
    out: &mut W,
) -> Result<(), WorkerError> {
    emit(out, &ProgressEvent::IndeterminateModeEntered)?;

    let status = background_command(engine, SpawnOptions::hidden())
        .args(spotdl_args(args))
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::inherit())
        .status()
        .map_err(|source| WorkerError::EngineSpawn {
            engine: ENGINE,
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(WorkerError::EngineFailed {
            engine: ENGINE,
            code: status.code(),
        })
    }
}
