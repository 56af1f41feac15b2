//! Small shared helpers — path resolution, timestamps, filename hygiene.

use std::path::PathBuf;

/// Get the Parley data directory (e.g. `~/.parley/`).
pub fn get_data_path() -> PathBuf {
    let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join(".parley")
}

/// Get the sessions directory (e.g. `~/.parley/sessions/`).
pub fn get_sessions_path() -> PathBuf {
    get_data_path().join("sessions")
}

/// Current local time as `YYYY-MM-DD HH:MM:SS` (human-readable reports).
pub fn now_stamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Current local time as `YYYYMMDD_HHMMSS` (filename suffixes).
pub fn file_stamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Truncate a string to `max_len` characters, adding "..." if truncated.
/// Unicode-safe.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", truncated)
    }
}

/// Sanitize a string for use as a filename.
pub fn safe_filename(s: &str) -> String {
    s.chars()
        .map(|c| {
            if c.is_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Expand `~` to the home directory in a path string.
pub fn expand_home(path: &str) -> PathBuf {
    if path.starts_with("~/") || path == "~" {
        let home = home_dir().unwrap_or_else(|| PathBuf::from("."));
        home.join(&path[2.min(path.len())..])
    } else {
        PathBuf::from(path)
    }
}

/// Helper to get home directory.
fn home_dir() -> Option<PathBuf> {
    std::env::var("HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| std::env::var("USERPROFILE").ok().map(PathBuf::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate_string("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = truncate_string("hello world, this is a long string", 15);
        assert_eq!(result, "hello world,...");
        assert!(result.len() <= 15);
    }

    #[test]
    fn test_truncate_unicode() {
        let result = truncate_string("こんにちは世界です", 5);
        assert_eq!(result, "こん...");
    }

    #[test]
    fn test_safe_filename() {
        assert_eq!(safe_filename("hello world!"), "hello_world_");
        assert_eq!(safe_filename("file.txt"), "file.txt");
        assert_eq!(safe_filename("a/b/c"), "a_b_c");
    }

    #[test]
    fn test_safe_filename_preserves_valid() {
        assert_eq!(safe_filename("my-file_v2.txt"), "my-file_v2.txt");
    }

    #[test]
    fn test_expand_home_tilde() {
        let expanded = expand_home("~/test/path");
        assert!(!expanded.starts_with("~"));
        assert!(expanded.to_str().unwrap().ends_with("test/path"));
    }

    #[test]
    fn test_expand_home_absolute() {
        let expanded = expand_home("/absolute/path");
        assert_eq!(expanded, PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_file_stamp_format() {
        let stamp = file_stamp();
        assert_eq!(stamp.len(), 15);
        assert_eq!(stamp.chars().nth(8), Some('_'));
    }

    #[test]
    fn test_now_stamp_format() {
        let stamp = now_stamp();
        assert_eq!(stamp.len(), 19);
        assert_eq!(stamp.chars().nth(4), Some('-'));
        assert_eq!(stamp.chars().nth(10), Some(' '));
    }

    #[test]
    fn test_data_path_ends_with_parley() {
        let path = get_data_path();
        assert!(path.ends_with(".parley"));
    }

    #[test]
    fn test_sessions_path() {
        let path = get_sessions_path();
        assert!(path.ends_with("sessions"));
        assert!(path.parent().unwrap().ends_with(".parley"));
    }
}
