use super::source::GlyphSource;

/// Extra pen advance for a space when the configured gap is tighter than this
const MIN_WORD_GAP: i32 = 3;

const KHMER_FAMILIES: [&str; 4] = ["battambang", "bokor", "moul", "dangrek"];

/// Scripts whose clusters must not be split into individual characters
pub fn is_complex_script(text: &str, family: &str) -> bool {
    let family = family.to_lowercase();
    text.chars()
        .any(|c| matches!(c as u32, 0x1780..=0x17FF | 0x19E0..=0x19FF))
        || KHMER_FAMILIES.iter().any(|k| family.contains(k))
}

/// How characters are positioned along the line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// One character at a time, spaces padded to a minimum word gap
    Characters,
    /// One character at a time with the raw gap, for tight clock digits
    Flat,
    /// Whitespace-separated tokens kept whole for shaped scripts
    Tokens,
}

impl Placement {
    /// Token placement wins whenever the text or font needs shaping
    pub fn for_text(text: &str, family: &str, flat: bool) -> Self {
        if is_complex_script(text, family) {
            Placement::Tokens
        } else if flat {
            Placement::Flat
        } else {
            Placement::Characters
        }
    }
}

/// Pen positions for the visible characters of a line plus its total width
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayout {
    pub glyphs: Vec<(char, f32)>,
    pub width: f32,
}

/// Per-character placement: each character advances by its own width plus
/// `gap` (none after the last); spaces get topped up to a minimum word gap.
fn layout_characters(
    source: &dyn GlyphSource,
    text: &str,
    px: f32,
    gap: i32,
    pad_spaces: bool,
) -> LineLayout {
    let chars: Vec<char> = text.chars().collect();
    let mut glyphs = Vec::with_capacity(chars.len());
    let mut x = 0.0f32;
    for (i, &ch) in chars.iter().enumerate() {
        if !ch.is_whitespace() {
            glyphs.push((ch, x));
        }
        x += source.advance(ch, px);
        if i + 1 < chars.len() {
            x += gap as f32;
        }
        if pad_spaces && ch == ' ' && gap < MIN_WORD_GAP {
            x += (MIN_WORD_GAP - gap) as f32;
        }
    }
    LineLayout { glyphs, width: x.max(0.0) }
}

/// Per-token placement: runs of non-whitespace keep their natural advance
/// and the gap is only applied to whitespace runs.
fn layout_tokens(source: &dyn GlyphSource, text: &str, px: f32, gap: i32) -> LineLayout {
    let mut glyphs = Vec::new();
    let mut x = 0.0f32;
    for (is_space, run) in split_whitespace_runs(text) {
        let run_width: f32 = run.chars().map(|c| source.advance(c, px)).sum();
        if is_space {
            x += run_width + gap as f32;
            continue;
        }
        let mut pen = x;
        for ch in run.chars() {
            glyphs.push((ch, pen));
            pen += source.advance(ch, px);
        }
        x += run_width;
    }
    LineLayout { glyphs, width: x.max(0.0) }
}

/// Split into alternating runs, tagging whitespace runs with `true`
fn split_whitespace_runs(text: &str) -> Vec<(bool, &str)> {
    let mut runs = Vec::new();
    let mut start = 0;
    let mut current: Option<bool> = None;
    for (i, ch) in text.char_indices() {
        let ws = ch.is_whitespace();
        match current {
            Some(c) if c == ws => {}
            Some(c) => {
                runs.push((c, &text[start..i]));
                start = i;
                current = Some(ws);
            }
            None => current = Some(ws),
        }
    }
    if let Some(c) = current {
        runs.push((c, &text[start..]));
    }
    runs
}

/// Lay out one line starting at x = 0
pub fn layout_line(
    source: &dyn GlyphSource,
    text: &str,
    px: f32,
    gap: i32,
    placement: Placement,
) -> LineLayout {
    match placement {
        Placement::Characters => layout_characters(source, text, px, gap, true),
        Placement::Flat => layout_characters(source, text, px, gap, false),
        Placement::Tokens => layout_tokens(source, text, px, gap),
    }
}
