//! Greedy word wrap on a characters-per-line budget.
//!
//! The budget is an approximation: `width / (font_size * avg_glyph_em)` assumes every
//! glyph has the same average width instead of measuring real advances. Narrow text
//! (lots of `i`/`l`) leaves slack at the right edge and very wide text (`W`, `M`) can
//! overrun slightly. The hard cap bounds any single line regardless of the estimate.

/// Characters that fit on one line of `width` points at `font_size`.
pub fn max_chars_per_line(width: f32, font_size: f32, avg_glyph_em: f32, hard_cap: usize) -> usize {
    let estimate = (width / (font_size * avg_glyph_em)).floor();
    let estimate = if estimate.is_finite() && estimate >= 1.0 {
        estimate as usize
    } else {
        1
    };
    estimate.min(hard_cap).max(1)
}

/// Wraps `text` into lines of at most `max_chars` characters.
///
/// Breaks on whitespace; a single word longer than `max_chars` is hard-split.
/// Whitespace-only input yields no lines.
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();
    let mut current_len = 0usize;

    for word in text.split_whitespace() {
        let word_len = word.chars().count();

        if word_len > max_chars {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            let chars: Vec<char> = word.chars().collect();
            let mut chunks = chars.chunks(max_chars).peekable();
            while let Some(chunk) = chunks.next() {
                let piece: String = chunk.iter().collect();
                if chunks.peek().is_some() {
                    lines.push(piece);
                } else {
                    current_len = chunk.len();
                    current = piece;
                }
            }
            continue;
        }

        if current.is_empty() {
            current.push_str(word);
            current_len = word_len;
        } else if current_len + 1 + word_len <= max_chars {
            current.push(' ');
            current.push_str(word);
            current_len += 1 + word_len;
        } else {
            lines.push(std::mem::replace(&mut current, word.to_string()));
            current_len = word_len;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_max_chars_from_width() {
        // 495pt at 10pt * 0.5em = 99 chars
        assert_eq!(max_chars_per_line(495.0, 10.0, 0.5, 120), 99);
    }

    #[test]
    fn test_max_chars_respects_hard_cap() {
        assert_eq!(max_chars_per_line(2000.0, 10.0, 0.5, 120), 120);
    }

    #[test]
    fn test_max_chars_never_zero() {
        assert_eq!(max_chars_per_line(1.0, 10.0, 0.5, 120), 1);
    }

    #[test]
    fn test_wrap_breaks_on_whitespace() {
        let lines = wrap_text("the quick brown fox jumps", 10);
        assert_eq!(lines, vec!["the quick", "brown fox", "jumps"]);
        assert!(lines.iter().all(|l| l.chars().count() <= 10));
    }

    #[test]
    fn test_wrap_hard_splits_only_the_overlong_word() {
        let lines = wrap_text("ok abcdefghijkl no", 5);
        assert_eq!(lines, vec!["ok", "abcde", "fghij", "kl no"]);
    }

    #[test]
    fn test_wrap_long_token_terminates_with_capped_lines() {
        let token = "x".repeat(1000);
        let lines = wrap_text(&token, 120);
        assert_eq!(lines.len(), 9);
        assert!(lines.iter().all(|l| l.len() <= 120));
        assert_eq!(lines.concat(), token);
    }

    #[test]
    fn test_wrap_empty_and_blank() {
        assert!(wrap_text("", 10).is_empty());
        assert!(wrap_text("   \t ", 10).is_empty());
    }

    #[test]
    fn test_wrap_counts_chars_not_bytes() {
        let lines = wrap_text("héllo wörld", 5);
        assert_eq!(lines, vec!["héllo", "wörld"]);
    }
}
