//! Text normalization for captured task output.

use regex::Regex;
use std::sync::OnceLock;

fn escape_sequence() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // CSI (colors, cursor movement) and OSC (window titles, hyperlinks) sequences,
    // then any stray single-character escapes.
    RE.get_or_init(|| {
        Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]|\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)|\x1b[@-_]")
            .expect("escape sequence pattern is valid")
    })
}

/// Remove terminal control and escape sequences from a line.
pub fn strip_escape_sequences(line: &str) -> String {
    let stripped = escape_sequence().replace_all(line, "");
    stripped
        .chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .collect()
}

/// Clean raw output lines for display.
///
/// Drops lines beginning with any of `marker_prefixes`, strips escape sequences,
/// trims, drops empty results and keeps the last `limit` lines in original order.
pub fn clean_output_lines<S: AsRef<str>>(
    lines: &[S],
    marker_prefixes: &[String],
    limit: usize,
) -> Vec<String> {
    let cleaned: Vec<String> = lines
        .iter()
        .map(|line| line.as_ref())
        .filter(|line| !marker_prefixes.iter().any(|p| line.starts_with(p.as_str())))
        .map(strip_escape_sequences)
        .map(|line| line.trim().to_string())
        .filter(|line| !line.is_empty())
        .collect();

    let skip = cleaned.len().saturating_sub(limit);
    cleaned.into_iter().skip(skip).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn markers() -> Vec<String> {
        vec!["Task ".to_string()]
    }

    #[test]
    fn strips_color_codes() {
        assert_eq!(
            strip_escape_sequences("\x1b[0;31mfatal: [opnsense]\x1b[0m"),
            "fatal: [opnsense]"
        );
    }

    #[test]
    fn strips_cursor_and_title_sequences() {
        assert_eq!(strip_escape_sequences("\x1b[2K\x1b[1Gdone"), "done");
        assert_eq!(strip_escape_sequences("\x1b]0;title\x07ok"), "ok");
    }

    #[test]
    fn drops_marker_lines_and_blank_lines() {
        let lines = [
            "Task 42 added to queue",
            "\x1b[33m   \x1b[0m",
            "PLAY [dns] ****",
            "",
            "Task 42 failed",
        ];
        assert_eq!(
            clean_output_lines(&lines, &markers(), 5),
            vec!["PLAY [dns] ****"]
        );
    }

    #[test]
    fn keeps_only_the_most_recent_lines() {
        let lines: Vec<String> = (1..=8).map(|i| format!("line {}", i)).collect();
        assert_eq!(
            clean_output_lines(&lines, &markers(), 5),
            vec!["line 4", "line 5", "line 6", "line 7", "line 8"]
        );
    }

    #[test]
    fn marker_check_applies_to_raw_line() {
        // A colored marker is not a marker: only the literal prefix counts.
        let lines = ["\x1b[1mTask 9 running"];
        assert_eq!(clean_output_lines(&lines, &markers(), 5), vec!["Task 9 running"]);
    }
}
