//! Monospaced text measurement helpers.
//!
//! Tiles whose content is terminal text are measured here so the packer
//! sees honest extents even when the content carries ANSI styling.

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Measure a text block: (widest line in cells, line count).
///
/// An empty block measures (0, 0); trailing newlines do not add lines.
pub fn measure_block(text: &str) -> (f64, f64) {
    let mut widest = 0usize;
    let mut lines = 0usize;
    for line in text.lines() {
        widest = widest.max(display_width(line));
        lines += 1;
    }
    (widest as f64, lines as f64)
}
