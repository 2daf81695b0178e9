#![cfg_attr(all(windows, not(debug_assertions)), windows_subsystem = "windows")]

mod app;
mod app_logger;
mod download;
mod error;
mod fs_utils;
mod paths;
mod settings;
mod theme;
mod ui;
mod worker;

fn main() -> eframe::Result<()> {
    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    if args.get(1).map(String::as_str) == Some(worker::WORKER_FLAG) {
        std::process::exit(worker::run(&args));
    }
    app::run()
}
