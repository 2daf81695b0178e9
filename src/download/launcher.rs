use std::ffi::OsString;
use std::path::PathBuf;
use std::process::{Child, ChildStderr, ChildStdout, Stdio};

use crate::error::LaunchError;
use crate::worker::WORKER_FLAG;

use super::DownloadJob;
use super::process::{SpawnOptions, background_command, terminate_child_process};

// ワーカーとして自分自身 (または指定プログラム) を起動する。
pub struct JobLauncher {
    program: PathBuf,
    options: SpawnOptions,
}

impl JobLauncher {
    pub fn for_current_exe() -> Result<Self, LaunchError> {
        let program = std::env::current_exe().map_err(LaunchError::CurrentExe)?;
        Ok(Self::new(program))
    }

    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            options: SpawnOptions::hidden(),
        }
    }

    // 前提条件を確認してからワーカーを起動し、出力を読めるハンドルを返す。
    // 完了は待たない。
    pub fn launch(&self, job: &DownloadJob) -> Result<JobHandle, LaunchError> {
        job.validate()?;

        let mut command = background_command(&self.program, self.options);
        command
            .args(worker_args(job))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let child = command.spawn().map_err(LaunchError::Spawn)?;
        JobHandle::from_child(child)
    }
}

// ワーカーへ渡す位置引数: フラグ, リンク, 保存先, ffmpeg, 開始番号。
pub fn worker_args(job: &DownloadJob) -> Vec<OsString> {
    vec![
        OsString::from(WORKER_FLAG),
        OsString::from(&job.link),
        job.destination.clone().into_os_string(),
        job.transcoder.clone().into_os_string(),
        OsString::from(job.start_index.to_string()),
    ]
}

// 起動済みワーカー。標準出力と標準エラーは必ず取得済み。
pub struct JobHandle {
    pub(super) child: Child,
    pub(super) stdout: ChildStdout,
    pub(super) stderr: ChildStderr,
}

impl JobHandle {
    pub fn from_child(mut child: Child) -> Result<Self, LaunchError> {
        let stdout = child.stdout.take();
        let stderr = child.stderr.take();
        match (stdout, stderr) {
            (Some(stdout), Some(stderr)) => Ok(Self {
                child,
                stdout,
                stderr,
            }),
            (None, _) => {
                terminate_child_process(&mut child);
                Err(LaunchError::MissingPipe("標準出力"))
            }
            (_, None) => {
                terminate_child_process(&mut child);
                Err(LaunchError::MissingPipe("標準エラー"))
            }
        }
    }

    pub fn id(&self) -> u32 {
        self.child.id()
    }
}
