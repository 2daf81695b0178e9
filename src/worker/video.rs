use std::io::{self, Read, Write};
use std::path::Path;
use std::process::Stdio;

use crate::download::process::{
    SpawnOptions, background_command, read_lines, terminate_child_process,
};
use crate::download::protocol::{ProgressEvent, emit};
use crate::error::WorkerError;

use super::WorkerArgs;

pub(super) const ENGINE: &str = "yt-dlp";
const AUDIO_QUALITY: &str = "192K";
// yt-dlp の進捗行を他の出力と区別するための目印。
const ENGINE_PROGRESS_MARKER: &str = "[mp3dl]";

pub(super) fn yt_dlp_args(args: &WorkerArgs) -> Vec<String> {
    let ffmpeg_location = args
        .transcoder
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or(args.transcoder.as_path());
    let output_template = args.destination.join("%(autonumber)02d_%(title)s.%(ext)s");

    vec![
        "-f".to_string(),
        "bestaudio/best".to_string(),
        "-x".to_string(),
        "--audio-format".to_string(),
        "mp3".to_string(),
        "--audio-quality".to_string(),
        AUDIO_QUALITY.to_string(),
        "--ffmpeg-location".to_string(),
        ffmpeg_location.to_string_lossy().to_string(),
        "-o".to_string(),
        output_template.to_string_lossy().to_string(),
        "--autonumber-start".to_string(),
        args.start_index.to_string(),
        // タイトル中のパス区切り文字はファイル名で使えないので "-" に置き換える。
        "--replace-in-metadata".to_string(),
        "title".to_string(),
        r"[/\\]".to_string(),
        "-".to_string(),
        "--quiet".to_string(),
        "--no-warnings".to_string(),
        "--progress".to_string(),
        "--newline".to_string(),
        "--progress-template".to_string(),
        format!("download:{ENGINE_PROGRESS_MARKER}%(progress.status)s:%(progress._percent_str)s"),
        args.link.clone(),
    ]
}

// "[mp3dl]downloading: 42.0%" から 42.0 を取り出す。
// downloading 以外の状態や数値にならない値は None。
pub(super) fn parse_engine_progress(line: &str) -> Option<f32> {
    let pos = line.find(ENGINE_PROGRESS_MARKER)?;
    let rest = &line[pos + ENGINE_PROGRESS_MARKER.len()..];
    let (status, percent) = rest.split_once(':')?;
    if status.trim() != "downloading" {
        return None;
    }
    let percent = percent.trim();
    let percent = percent.strip_suffix('%').unwrap_or(percent).trim();
    percent.parse::<f32>().ok().filter(|value| value.is_finite())
}

// yt-dlp の出力から進捗だけを拾い、プロトコル行として書き出す。
fn relay_engine_output<R: Read, W: Write>(reader: R, out: &mut W) -> io::Result<()> {
    read_lines(reader, |line| {
        if let Some(percent) = parse_engine_progress(line) {
            // 進捗の書き出し失敗でダウンロード自体は止めない。
            let _ = emit(out, &ProgressEvent::Percent(percent));
        }
    })
}

pub(super) fn download<W: Write>(
    args: &WorkerArgs,
    engine: &Path,
    out: &mut W,
) -> Result<(), WorkerError> {
    let mut child = background_command(engine, SpawnOptions::hidden())
        .args(yt_dlp_args(args))
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| WorkerError::EngineSpawn {
            engine: ENGINE,
            source,
        })?;

    if let Some(stdout) = child.stdout.take() {
        if let Err(err) = relay_engine_output(stdout, out) {
            terminate_child_process(&mut child);
            return Err(err.into());
        }
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(WorkerError::EngineFailed {
            engine: ENGINE,
            code: status.code(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::path::PathBuf;

    fn sample_args() -> WorkerArgs {
        WorkerArgs {
            link: "https://www.youtube.com/watch?v=dQw4w9WgXcQ".to_string(),
            destination: PathBuf::from("/music"),
            transcoder: PathBuf::from("/tools/bin/ffmpeg"),
            start_index: 1,
        }
    }

    #[test]
    fn extracts_downloading_percent() {
        assert_eq!(parse_engine_progress("[mp3dl]downloading:  42.3%"), Some(42.3));
        assert_eq!(parse_engine_progress("[mp3dl]downloading:100%"), Some(100.0));
    }

    #[test]
    fn ignores_other_states_and_garbage() {
        assert_eq!(parse_engine_progress("[mp3dl]finished:100.0%"), None);
        assert_eq!(parse_engine_progress("[mp3dl]downloading:  N/A%"), None);
        assert_eq!(parse_engine_progress("[mp3dl]downloading"), None);
        assert_eq!(parse_engine_progress("[download]  42.3% of 3.1MiB"), None);
    }

    #[test]
    fn builds_numbered_mp3_output() {
        let mut args = sample_args();
        args.start_index = 7;
        let argv = yt_dlp_args(&args);
        let pairs: Vec<_> = argv.windows(2).map(|w| (w[0].as_str(), w[1].as_str())).collect();

        assert!(pairs.contains(&("--audio-format", "mp3")));
        assert!(pairs.contains(&("--audio-quality", "192K")));
        assert!(pairs.contains(&("--autonumber-start", "7")));
        assert!(pairs.contains(&("--ffmpeg-location", "/tools/bin")));
        let template = PathBuf::from("/music")
            .join("%(autonumber)02d_%(title)s.%(ext)s")
            .to_string_lossy()
            .to_string();
        assert!(pairs.contains(&("-o", template.as_str())));
        assert_eq!(argv.last().map(String::as_str), Some(args.link.as_str()));
    }

    #[test]
    fn sanitizes_path_separators_in_title() {
        let argv = yt_dlp_args(&sample_args());
        let pos = argv
            .iter()
            .position(|arg| arg == "--replace-in-metadata")
            .expect("metadata step");
        assert_eq!(&argv[pos + 1..pos + 4], &["title", r"[/\\]", "-"]);
    }

    #[test]
    fn relays_engine_progress_as_protocol_lines() {
        let engine_output = "[youtube] dQw4w9WgXcQ: Downloading webpage\n\
            [mp3dl]downloading:  10.0%\r\
            [mp3dl]downloading:  bad%\r\
            [mp3dl]downloading:  60.5%\n\
            [mp3dl]finished: 100.0%\n";
        let mut out = Vec::new();
        relay_engine_output(Cursor::new(engine_output.as_bytes()), &mut out).expect("relay");
        assert_eq!(
            String::from_utf8(out).expect("utf8"),
            "PROGRESS:10\nPROGRESS:60.5\n"
        );
    }

    #[test]
    fn missing_engine_is_a_spawn_error() {
        let mut out = Vec::new();
        let err = download(
            &sample_args(),
            Path::new("/definitely/missing/yt-dlp"),
            &mut out,
        )
        .unwrap_err();
        assert!(matches!(err, WorkerError::EngineSpawn { engine: "yt-dlp", .. }));
        assert!(out.is_empty());
    }

    #[cfg(unix)]
    fn run_stub_engine(exit_code: i32) -> (String, Result<(), WorkerError>) {
        use std::io::ErrorKind;
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().expect("tempdir");
        let engine = dir.path().join("yt-dlp");
        let script = format!(
            "#!/bin/sh\n\
             echo '[youtube] abc: Downloading webpage'\n\
             echo '[mp3dl]downloading:  10.0%'\n\
             echo '[mp3dl]downloading:  55.5%'\n\
             exit {exit_code}\n"
        );
        std::fs::write(&engine, script).expect("write stub");
        std::fs::set_permissions(&engine, std::fs::Permissions::from_mode(0o755))
            .expect("chmod");

        // 並列テストの fork と重なると ETXTBSY になることがあるので数回やり直す。
        for _ in 0..5 {
            let mut out = Vec::new();
            let result = download(&sample_args(), &engine, &mut out);
            if let Err(WorkerError::EngineSpawn { source, .. }) = &result {
                if source.kind() == ErrorKind::ExecutableFileBusy {
                    std::thread::sleep(std::time::Duration::from_millis(50));
                    continue;
                }
            }
            return (String::from_utf8(out).expect("utf8"), result);
        }
        panic!("stub engine stayed busy");
    }

    #[cfg(unix)]
    #[test]
    fn engine_progress_reaches_stdout_on_success() {
        let (out, result) = run_stub_engine(0);
        assert_eq!(out, "PROGRESS:10\nPROGRESS:55.5\n");
        assert!(result.is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn engine_failure_keeps_exit_code() {
        let (out, result) = run_stub_engine(3);
        assert_eq!(out, "PROGRESS:10\nPROGRESS:55.5\n");
        assert!(matches!(
            result,
            Err(WorkerError::EngineFailed {
                engine: "yt-dlp",
                code: Some(3)
            })
        ));
    }
}
