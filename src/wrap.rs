//! Greedy caption wrapping.
//!
//! Both strategies share one accumulation loop: split the text on single
//! spaces (empty tokens from doubled spaces are kept), extend the current
//! line with `word + " "`, and flush the line when the extended candidate
//! exceeds the budget. Flushed lines keep their trailing space, and a word
//! that alone exceeds the budget flushes the current line first, so the
//! first flushed line can be empty and the word's own line can run over
//! the budget.

/// Character budget used when a caption sets none (or sets 0).
pub const DEFAULT_MAX_CHARS: u32 = 20;

/// Which wrapping budget a caption uses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WrapMode {
    /// Budget counted in characters (Unicode scalars). The default.
    #[default]
    CharCount,
    /// Budget measured in pixels against the shaped line width.
    PixelWidth,
}

/// Resolve a configured character budget (0 means unset).
pub fn effective_max_chars(configured: u32) -> u32 {
    if configured == 0 {
        DEFAULT_MAX_CHARS
    } else {
        configured
    }
}

/// Wrap by character count against `max_chars` (0 uses the default budget).
pub fn wrap_chars(text: &str, max_chars: u32) -> Vec<String> {
    let max = effective_max_chars(max_chars) as usize;
    accumulate(text, |candidate| candidate.chars().count() > max)
}

/// Wrap by measured pixel width against `max_width`.
///
/// `measure` receives each candidate line including its trailing space and
/// returns its advance width in pixels.
pub fn wrap_measured<F>(text: &str, max_width: f64, mut measure: F) -> Vec<String>
where
    F: FnMut(&str) -> f64,
{
    accumulate(text, |candidate| measure(candidate) > max_width)
}

fn accumulate<F>(text: &str, mut exceeds: F) -> Vec<String>
where
    F: FnMut(&str) -> bool,
{
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split(' ') {
        let candidate = format!("{line}{word} ");
        if exceeds(&candidate) {
            lines.push(std::mem::take(&mut line));
            line = format!("{word} ");
        } else {
            line = candidate;
        }
    }
    lines.push(line);
    lines
}
