use std::ffi::OsStr;
use std::io::{BufReader, ErrorKind, Read};
use std::process::{Child, Command};
use std::thread;

// 子プロセス起動時の見た目に関するオプション。
#[derive(Clone, Copy, Debug, Default)]
pub struct SpawnOptions {
    pub hide_window: bool,
}

impl SpawnOptions {
    pub fn hidden() -> Self {
        Self { hide_window: true }
    }
}

// オプションを反映した Command を作る。子プロセスの起動は全てここを通す。
pub fn background_command(program: impl AsRef<OsStr>, options: SpawnOptions) -> Command {
    let mut command = Command::new(program);
    if options.hide_window {
        hide_console_window(&mut command);
    }
    command
}

#[cfg(windows)]
fn hide_console_window(command: &mut Command) {
    use std::os::windows::process::CommandExt;

    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    command.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(windows))]
fn hide_console_window(_command: &mut Command) {}

// 子プロセスを強制終了して wait まで行い、プロセスを確実に回収する。
pub fn terminate_child_process(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

// ストリームを 1 行ずつ分解して渡す。改行は LF / CR のどちらでも区切る。
pub fn read_lines<R: Read>(reader: R, mut on_line: impl FnMut(&str)) -> std::io::Result<()> {
    let mut buffered = BufReader::new(reader);
    let mut buf = [0u8; 4096];
    let mut line = Vec::new();
    loop {
        let read = match buffered.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };
        for &byte in &buf[..read] {
            if byte == b'\n' || byte == b'\r' {
                flush_line(&mut line, &mut on_line);
            } else {
                line.push(byte);
            }
        }
    }
    flush_line(&mut line, &mut on_line);
    Ok(())
}

fn flush_line(line: &mut Vec<u8>, on_line: &mut impl FnMut(&str)) {
    if line.is_empty() {
        return;
    }
    let text = String::from_utf8_lossy(line);
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        on_line(trimmed);
    }
    line.clear();
}

// 標準エラーなどを別スレッドで最後まで読み切り、文字列として返す。
pub fn spawn_capture_thread<R: Read + Send + 'static>(reader: R) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut bytes = Vec::new();
        let mut reader = reader;
        let _ = reader.read_to_end(&mut bytes);
        String::from_utf8_lossy(&bytes).to_string()
    })
}
