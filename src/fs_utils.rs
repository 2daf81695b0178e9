use std::fs;
use std::path::Path;

// フォルダ内の "NN_..." 形式のファイル名から次の連番を求める。
// 読めないフォルダや該当ファイルなしの場合は 1。
// 最大の番号が u64::MAX に達していて次の番号が作れない場合は None。
pub fn next_index(dir: &Path) -> Option<u64> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Some(1),
    };

    let highest = entries
        .flatten()
        .filter_map(|entry| numeric_prefix(&entry.file_name().to_string_lossy()))
        .max();

    match highest {
        Some(value) => value.checked_add(1),
        None => Some(1),
    }
}

// 数字だけの接頭辞を返す。u64 に収まらない桁数は u64::MAX として扱う。
fn numeric_prefix(name: &str) -> Option<u64> {
    let prefix = name.split('_').next()?;
    if prefix.is_empty() || !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(prefix.parse::<u64>().unwrap_or(u64::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn touch(dir: &Path, name: &str) {
        fs::write(dir.join(name), b"").expect("write file");
    }

    #[test]
    fn continues_after_highest_prefix() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "3_first.mp3");
        touch(dir.path(), "7_second.mp3");
        touch(dir.path(), "x_third.mp3");
        assert_eq!(next_index(dir.path()), Some(8));
    }

    #[test]
    fn empty_or_missing_folder_starts_at_one() {
        let dir = tempdir().expect("tempdir");
        assert_eq!(next_index(dir.path()), Some(1));
        assert_eq!(next_index(&dir.path().join("missing")), Some(1));
    }

    #[test]
    fn ignores_names_without_numeric_prefix() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "_leading.mp3");
        touch(dir.path(), "12a_mixed.mp3");
        touch(dir.path(), "song.mp3");
        assert_eq!(next_index(dir.path()), Some(1));
    }

    #[test]
    fn large_prefixes_are_not_dropped() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "4294967295_a.mp3");
        assert_eq!(next_index(dir.path()), Some(4_294_967_296));

        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "03_a.mp3");
        touch(dir.path(), "5000000000_b.mp3");
        touch(dir.path(), "99999999999999_c.mp3");
        assert_eq!(next_index(dir.path()), Some(100_000_000_000_000));
    }

    #[test]
    fn exhausted_numbering_yields_none() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "18446744073709551615_max.mp3");
        assert_eq!(next_index(dir.path()), None);

        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "123456789012345678901234567890_huge.mp3");
        assert_eq!(next_index(dir.path()), None);
    }

    #[test]
    fn zero_padded_prefixes_count() {
        let dir = tempdir().expect("tempdir");
        touch(dir.path(), "04_a.mp3");
        fs::create_dir(dir.path().join("09_folder")).expect("create dir");
        assert_eq!(next_index(dir.path()), Some(10));
    }
}
