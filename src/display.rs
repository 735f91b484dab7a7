//! Live terminal rendering of recognition results.
//!
//! Interim blocks overwrite each other in place; final blocks are printed
//! permanently. Rendering goes to stderr so stdout stays clean.

use crate::export::format_timestamp;
use crate::stt::model::AlignedResult;

const HEADER: &str = "\x1b[95m";
const BLUE: &str = "\x1b[94m";
const CYAN: &str = "\x1b[96m";
const GREEN: &str = "\x1b[92m";
const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Move the cursor up one line and clear it.
const ERASE_LINE_UP: &str = "\x1b[F\x1b[K";

/// Renders results as they arrive, tracking how many lines the previous
/// interim block used so the next one can replace it.
pub struct ResultDisplay {
    quiet: bool,
    interim_lines: usize,
}

impl ResultDisplay {
    pub fn new(quiet: bool) -> Self {
        Self {
            quiet,
            interim_lines: 0,
        }
    }

    /// Print one result block.
    pub fn show(&mut self, result: &AlignedResult, rtf: f64, is_final: bool) {
        if self.quiet {
            return;
        }

        // Replace the previous interim block, if any
        if self.interim_lines > 0 {
            eprint!("{}", ERASE_LINE_UP.repeat(self.interim_lines));
        }

        let (block, lines) = render_block(result, rtf, is_final);
        eprint!("{}", block);

        self.interim_lines = if is_final { 0 } else { lines };
    }
}

/// Build the text block for one result. Returns the block and its line count.
fn render_block(result: &AlignedResult, rtf: f64, is_final: bool) -> (String, usize) {
    let status = if is_final {
        format!("{GREEN}FINAL{RESET}")
    } else {
        format!("{YELLOW}INTERIM{RESET}")
    };

    let text = if result.text.is_empty() {
        "[No speech detected]"
    } else {
        &result.text
    };

    let mut block = format!(
        "{HEADER}Transcription:{RESET} [{status}] {CYAN}(RTF: {rtf:.2}x){RESET}\n\
         {BOLD}{text}{RESET}\n"
    );
    let mut lines = 2;

    if let Some(timeline) = token_timeline(result) {
        block.push_str(&timeline);
        block.push('\n');
        lines += 1;
    }

    (block, lines)
}

/// Word-level timestamps for the last sentence: `word[MM:SS] ...`.
fn token_timeline(result: &AlignedResult) -> Option<String> {
    let sentence = result.sentences.last()?;
    let mut timeline = String::new();
    for token in &sentence.tokens {
        let word = token.text.trim();
        if word.is_empty() {
            continue;
        }
        timeline.push_str(&format!(
            "{BLUE}{word}{RESET}[{}] ",
            format_timestamp(token.start)
        ));
    }
    if timeline.is_empty() {
        None
    } else {
        Some(timeline.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stt::model::{AlignedSentence, AlignedToken};

    fn result_with_tokens() -> AlignedResult {
        AlignedResult {
            text: "hello world".to_string(),
            sentences: vec![AlignedSentence {
                text: "hello world".to_string(),
                start: 64.0,
                end: 66.0,
                duration: 2.0,
                tokens: vec![
                    AlignedToken {
                        text: " hello".to_string(),
                        start: 64.0,
                        end: 65.0,
                        duration: 1.0,
                    },
                    AlignedToken {
                        text: " world".to_string(),
                        start: 65.0,
                        end: 66.0,
                        duration: 1.0,
                    },
                ],
            }],
        }
    }

    #[test]
    fn final_block_shows_status_and_rtf() {
        let (block, _) = render_block(&result_with_tokens(), 0.435, true);
        assert!(block.contains("FINAL"));
        assert!(block.contains("(RTF: 0.43x)"));
        assert!(block.contains("hello world"));
    }

    #[test]
    fn interim_block_shows_interim_status() {
        let (block, _) = render_block(&result_with_tokens(), 1.2, false);
        assert!(block.contains("INTERIM"));
        assert!(!block.contains("FINAL"));
    }

    #[test]
    fn empty_text_gets_placeholder() {
        let result = AlignedResult {
            text: String::new(),
            sentences: Vec::new(),
        };
        let (block, lines) = render_block(&result, 0.5, true);
        assert!(block.contains("[No speech detected]"));
        assert_eq!(lines, 2);
    }

    #[test]
    fn timeline_renders_last_sentence_tokens() {
        let timeline = token_timeline(&result_with_tokens()).unwrap();
        assert!(timeline.contains("hello"));
        assert!(timeline.contains("[01:04]"));
        assert!(timeline.contains("[01:05]"));
    }

    #[test]
    fn block_line_count_includes_timeline() {
        let (_, lines) = render_block(&result_with_tokens(), 0.5, false);
        assert_eq!(lines, 3);
    }

    #[test]
    fn quiet_display_prints_nothing_and_tracks_nothing() {
        let mut display = ResultDisplay::new(true);
        display.show(&result_with_tokens(), 0.5, false);
        assert_eq!(display.interim_lines, 0);
    }
}
