use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("リンクが入力されていません。")]
    EmptyLink,

    #[error("保存先フォルダが選択されていません。")]
    NoDestination,

    #[error("保存先フォルダが見つかりません: {0}")]
    DestinationMissing(PathBuf),

    #[error("ffmpegが見つかりません: {0}")]
    TranscoderMissing(PathBuf),

    #[error("保存先の連番がこれ以上増やせません: {0}")]
    IndexExhausted(PathBuf),

    #[error("実行ファイルの場所を取得できませんでした: {0}")]
    CurrentExe(#[source] io::Error),

    #[error("ワーカーの起動に失敗しました: {0}")]
    Spawn(#[source] io::Error),

    #[error("ワーカーの{0}を取得できませんでした。")]
    MissingPipe(&'static str),
}

impl LaunchError {
    // 起動前チェックで弾かれたかどうか。警告ダイアログで表示する。
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::EmptyLink
                | Self::NoDestination
                | Self::DestinationMissing(_)
                | Self::TranscoderMissing(_)
                | Self::IndexExhausted(_)
        )
    }
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("missing argument: {0}")]
    MissingArgument(&'static str),

    #[error("invalid start index: {0}")]
    InvalidStartIndex(String),

    #[error("failed to start {engine}: {source}")]
    EngineSpawn {
        engine: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("{engine} exited with error: {}", format_code(*.code))]
    EngineFailed {
        engine: &'static str,
        code: Option<i32>,
    },

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum RelayError {
    #[error("ワーカー出力の読み取りに失敗しました: {0}")]
    Read(#[source] io::Error),

    #[error("ワーカーの終了待ちに失敗しました: {0}")]
    Wait(#[source] io::Error),
}

fn format_code(code: Option<i32>) -> String {
    match code {
        Some(code) => code.to_string(),
        None => "terminated by signal".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_failure_carries_exit_code() {
        let err = WorkerError::EngineFailed {
            engine: "spotdl",
            code: Some(2),
        };
        assert_eq!(err.to_string(), "spotdl exited with error: 2");
    }

    #[test]
    fn only_input_problems_are_preconditions() {
        assert!(LaunchError::EmptyLink.is_precondition());
        assert!(LaunchError::TranscoderMissing(PathBuf::from("ffmpeg")).is_precondition());
        assert!(LaunchError::IndexExhausted(PathBuf::from("/music")).is_precondition());
        assert!(!LaunchError::MissingPipe("stdout").is_precondition());
    }
}
