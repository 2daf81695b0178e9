use std::collections::VecDeque;

use time::OffsetDateTime;
use time::macros::format_description;

const MAX_ENTRIES: usize = 500;

// 画面下部のログ欄に出す履歴。標準出力にも同じ行を流す。
pub struct AppLogger {
    entries: VecDeque<String>,
}

impl AppLogger {
    pub fn new() -> Self {
        Self {
            entries: VecDeque::with_capacity(MAX_ENTRIES),
        }
    }

    pub fn push(&mut self, message: impl Into<String>) {
        let message = message.into();
        let message = message.trim();
        if message.is_empty() {
            return;
        }

        let line = format!("[{}] {message}", current_time_text());
        println!("{line}");
        self.entries.push_back(line);

        while self.entries.len() > MAX_ENTRIES {
            self.entries.pop_front();
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(String::as_str)
    }

    // クリップボード用に全行を改行区切りでまとめる。
    pub fn snapshot(&self) -> String {
        self.lines().collect::<Vec<_>>().join("\n")
    }
}

impl Default for AppLogger {
    fn default() -> Self {
        Self::new()
    }
}

fn current_time_text() -> String {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    now.format(&format_description!("[hour]:[minute]:[second]"))
        .unwrap_or_else(|_| "00:00:00".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_blank_messages_and_stamps_time() {
        let mut logger = AppLogger::new();
        logger.push("   ");
        assert!(logger.is_empty());

        logger.push("ワーカーを起動しました");
        let line = logger.lines().next().expect("one line");
        assert!(line.starts_with('['));
        assert_eq!(&line[9..], "] ワーカーを起動しました");
    }

    #[test]
    fn keeps_only_recent_entries() {
        let mut logger = AppLogger::new();
        for idx in 0..(MAX_ENTRIES + 5) {
            logger.push(format!("line {idx}"));
        }
        assert_eq!(logger.lines().count(), MAX_ENTRIES);
        assert!(logger.lines().next().expect("first").ends_with("line 5"));
        assert_eq!(logger.snapshot().lines().count(), MAX_ENTRIES);

        logger.clear();
        assert!(logger.snapshot().is_empty());
    }
}
