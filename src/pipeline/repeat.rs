//! Degenerate-output detection: the repeat-token heuristic.
//!
//! OCR-tuned vision-language models occasionally collapse into emitting a
//! short unit over and over (`| | | | |`, `ababab…`) until the token budget
//! runs out. The guard here examines only the tail of the output, because
//! that is where a runaway loop lives by the time generation stops.
//!
//! False negatives on exotic repeat periods are acceptable; false positives
//! must be rare, since each one burns a retry at higher temperature. The
//! window and repeat threshold are therefore conservative and configurable
//! via [`crate::config::OcrConfig`].

/// Default tail window examined, in characters.
pub const DEFAULT_WINDOW: usize = 50;

/// Default number of consecutive unit repeats tolerated.
pub const DEFAULT_MAX_REPEATS: usize = 4;

/// How far before the true end the second, suffix-shifted detector pass
/// cuts. Catches a repetition loop that recovered into a short coherent
/// tail. Fixed at 50 regardless of the configured window.
pub(crate) const SUFFIX_CUT: usize = 50;

/// Does `text` end in pathological short-cycle repetition?
///
/// Examines the last `window` characters, case-folded. For each candidate
/// unit length `L` where `L * (max_repeats + 1)` still fits the window, the
/// trailing `L` characters are the candidate unit; walking backward in
/// strides of `L`, more than `max_repeats` consecutive matches flags the
/// text as degenerate.
///
/// Text shorter than the window carries too little signal and is never
/// flagged.
pub fn is_degenerate(text: &str, window: usize, max_repeats: usize) -> bool {
    let chars: Vec<char> = text.chars().collect();
    if window < 2 || chars.len() < window {
        return false;
    }

    let tail: Vec<char> = chars[chars.len() - window..]
        .iter()
        .flat_map(|c| c.to_lowercase())
        .collect();
    let n = tail.len();

    for unit_len in 1..=n / 2 {
        if unit_len * (max_repeats + 1) > n {
            continue;
        }

        let unit = &tail[n - unit_len..];
        let mut repeats = 0usize;
        let mut pos = n - unit_len;
        loop {
            if tail[pos..pos + unit_len] == *unit {
                repeats += 1;
                if pos < unit_len {
                    break;
                }
                pos -= unit_len;
            } else {
                break;
            }
        }

        if repeats > max_repeats {
            return true;
        }
    }

    false
}

/// The orchestrator's combined retry predicate for one generation result.
///
/// An item is retried when the call failed outright, when the output tail
/// is degenerate, or when the output is degenerate just before a short
/// coherent tail (detector re-run on the text minus its last
/// [`SUFFIX_CUT`] characters).
pub(crate) fn needs_retry(raw: &str, failed: bool, window: usize, max_repeats: usize) -> bool {
    if failed {
        return true;
    }
    if is_degenerate(raw, window, max_repeats) {
        return true;
    }
    let len = raw.chars().count();
    if len > SUFFIX_CUT {
        let head: String = raw.chars().take(len - SUFFIX_CUT).collect();
        return is_degenerate(&head, window, max_repeats);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn period_two_repeat_over_threshold() {
        // Six "ab" repeats in a 10-char window, threshold 3.
        assert!(is_degenerate("abababababab", 10, 3));
    }

    #[test]
    fn short_text_is_never_degenerate() {
        assert!(!is_degenerate("the quick brown fox", 50, 4));
    }

    #[test]
    fn varied_text_is_not_degenerate() {
        let text = "The quick brown fox jumps over the lazy dog near the river bank today.";
        assert!(!is_degenerate(text, 50, 4));
    }

    #[test]
    fn single_char_runaway() {
        let text = format!("A normal sentence before the loop {}", "|".repeat(60));
        assert!(is_degenerate(&text, DEFAULT_WINDOW, DEFAULT_MAX_REPEATS));
    }

    #[test]
    fn longer_period_repeat() {
        let text = "intro text ".to_string() + &"<td></td>".repeat(10);
        assert!(is_degenerate(&text, DEFAULT_WINDOW, DEFAULT_MAX_REPEATS));
    }

    #[test]
    fn case_folded_before_matching() {
        assert!(is_degenerate("AbaBabABabab", 10, 3));
    }

    #[test]
    fn repeats_at_threshold_are_tolerated() {
        // Exactly max_repeats repeats of "ab" fill the window; the rule is
        // strictly more than max_repeats.
        assert!(!is_degenerate("xyabababab", 10, 4));
    }

    #[test]
    fn retry_predicate_on_failed_result() {
        assert!(needs_retry("", true, DEFAULT_WINDOW, DEFAULT_MAX_REPEATS));
    }

    #[test]
    fn retry_predicate_catches_repeat_before_tail() {
        // Degenerate run followed by a 50-char coherent tail: the plain
        // detector misses it, the suffix-shifted pass catches it.
        let tail = "and then the page ends with a normal sentence here";
        assert_eq!(tail.len(), 50);
        let text = format!("{}{}", "ha".repeat(40), tail);
        assert!(!is_degenerate(&text, DEFAULT_WINDOW, DEFAULT_MAX_REPEATS));
        assert!(needs_retry(
            &text,
            false,
            DEFAULT_WINDOW,
            DEFAULT_MAX_REPEATS
        ));
    }

    #[test]
    fn retry_predicate_clean_output() {
        let text = "A perfectly ordinary page transcription with varied wording throughout.";
        assert!(!needs_retry(
            text,
            false,
            DEFAULT_WINDOW,
            DEFAULT_MAX_REPEATS
        ));
    }

    #[test]
    fn retry_predicate_skips_suffix_pass_on_short_output() {
        // 50 chars or fewer: only the plain detector runs.
        let text = "ab".repeat(25);
        assert_eq!(text.len(), 50);
        assert!(needs_retry(
            &text,
            false,
            DEFAULT_WINDOW,
            DEFAULT_MAX_REPEATS
        ));
    }
}
