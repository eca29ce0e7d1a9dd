//! Indentation detection and content re-indentation.
//!
//! One analyzer is built per source. It infers the indentation style and
//! unit width once, answers byte/line/level queries, and re-indents pasted
//! content blocks while preserving their relative nesting.

use log::debug;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Whether a source indents with spaces or tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndentStyle {
    /// Space-indented source.
    Spaces,
    /// Tab-indented source.
    Tabs,
}

/// The inferred indentation of one source: style, unit width, and the
/// concrete unit string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indentation {
    /// Detected style.
    pub style: IndentStyle,
    /// Width of one indentation unit, in characters.
    pub size: usize,
    /// One indentation unit as a string.
    pub unit: String,
}

impl Indentation {
    /// Space indentation with the given unit width.
    #[must_use]
    pub fn spaces(size: usize) -> Self {
        Self {
            style: IndentStyle::Spaces,
            size,
            unit: " ".repeat(size),
        }
    }

    /// Tab indentation (unit width 1).
    #[must_use]
    pub fn tabs() -> Self {
        Self {
            style: IndentStyle::Tabs,
            size: 1,
            unit: "\t".to_owned(),
        }
    }

    /// Unit string repeated `level` times; negative levels clamp to zero.
    #[must_use]
    pub fn string_for_level(&self, level: isize) -> String {
        self.unit.repeat(usize::try_from(level.max(0)).unwrap_or(0))
    }

    /// Nesting level of a leading-whitespace run, in units.
    fn level_of_ws(&self, ws: &str) -> usize {
        match self.style {
            IndentStyle::Tabs => ws.bytes().filter(|b| *b == b'\t').count(),
            IndentStyle::Spaces => {
                ws.bytes().filter(|b| *b == b' ').count() / self.size.max(1)
            }
        }
    }
}

/// Detects the indentation of one source and answers byte, line, and level
/// queries against it.
#[derive(Debug)]
pub struct IndentationAnalyzer {
    source: String,
    line_starts: Vec<usize>,
    indentation: Indentation,
}

impl IndentationAnalyzer {
    /// Analyze `source`, inferring its indentation descriptor once.
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        let source = source.into();
        let line_starts = line_starts(&source);
        let indentation = detect(&source);
        debug!(
            "detected {:?} indentation, unit width {}",
            indentation.style, indentation.size
        );
        Self {
            source,
            line_starts,
            indentation,
        }
    }

    /// Replace the detected descriptor with an explicit one.
    #[must_use]
    pub fn with_indentation(mut self, indentation: Indentation) -> Self {
        self.indentation = indentation;
        self
    }

    /// The analyzed source.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// The inferred indentation descriptor.
    #[must_use]
    pub fn detect(&self) -> &Indentation {
        &self.indentation
    }

    /// Zero-indexed line containing `byte`. Offsets at or past the end of
    /// the source map to the last line.
    #[must_use]
    pub fn line_at_byte(&self, byte: usize) -> usize {
        let mut line = 0;
        for (i, &start) in self.line_starts.iter().enumerate() {
            if start > byte {
                break;
            }
            line = i;
        }
        line
    }

    /// The leading whitespace of line `line` (empty for out-of-range
    /// lines).
    #[must_use]
    pub fn raw_indentation_at_line(&self, line: usize) -> &str {
        let text = self.line_text(line);
        leading_ws(text)
    }

    /// Nesting level of line `line`, measured in indentation units.
    #[must_use]
    pub fn level_at_line(&self, line: usize) -> usize {
        self.indentation
            .level_of_ws(self.raw_indentation_at_line(line))
    }

    /// The leading whitespace of the line containing `byte`.
    #[must_use]
    pub fn indentation_at_byte(&self, byte: usize) -> &str {
        self.raw_indentation_at_line(self.line_at_byte(byte))
    }

    /// Nesting level of the line containing `byte`.
    #[must_use]
    pub fn level_at_byte(&self, byte: usize) -> usize {
        self.level_at_line(self.line_at_byte(byte))
    }

    /// Unit string repeated `max(level, 0)` times.
    #[must_use]
    pub fn indent_string_for_level(&self, level: isize) -> String {
        self.indentation.string_for_level(level)
    }

    /// Re-indent `content` so its first non-empty line sits at
    /// `target_level`, preserving the relative nesting of deeper lines.
    ///
    /// When `current_level` is `None` it is inferred from the leading
    /// whitespace of the first non-empty line. Blank lines pass through
    /// verbatim; a zero delta returns the content unchanged. A trailing
    /// newline is preserved.
    #[must_use]
    pub fn adjust_indentation(
        &self,
        content: &str,
        target_level: usize,
        current_level: Option<usize>,
    ) -> String {
        let current = current_level.unwrap_or_else(|| {
            content
                .lines()
                .find(|line| !line.trim().is_empty())
                .map_or(0, |line| self.indentation.level_of_ws(leading_ws(line)))
        });
        let delta = target_level as isize - current as isize;
        if delta == 0 {
            return content.to_owned();
        }

        let mut lines = Vec::new();
        for line in content.lines() {
            if line.trim().is_empty() {
                lines.push(line.to_owned());
            } else {
                let level = self.indentation.level_of_ws(leading_ws(line)) as isize;
                let tail = line.trim_start_matches([' ', '\t']);
                let mut adjusted = self.indentation.string_for_level(level + delta);
                adjusted.push_str(tail);
                lines.push(adjusted);
            }
        }
        let mut result = lines.join("\n");
        if content.ends_with('\n') {
            result.push('\n');
        }
        result
    }

    /// Text of line `line`, without its newline.
    fn line_text(&self, line: usize) -> &str {
        let Some(&start) = self.line_starts.get(line) else {
            return "";
        };
        let end = self
            .line_starts
            .get(line + 1)
            .map_or(self.source.len(), |&next| next - 1);
        &self.source[start..end]
    }
}

/// Leading run of spaces and tabs.
fn leading_ws(line: &str) -> &str {
    &line[..line.len() - line.trim_start_matches([' ', '\t']).len()]
}

/// Byte offset of each line start. A trailing newline does not open a new
/// line.
fn line_starts(source: &str) -> Vec<usize> {
    let mut starts = vec![0];
    for (i, byte) in source.bytes().enumerate() {
        if byte == b'\n' && i + 1 < source.len() {
            starts.push(i + 1);
        }
    }
    starts
}

/// Infer the indentation descriptor of `source`.
///
/// Lines whose leading whitespace contains a tab vote for tabs; lines
/// indented with spaces only vote for spaces. A space win gathers the set
/// of distinct leading-space widths and takes the GCD of the consecutive
/// differences in the sorted set together with its smallest member,
/// clamped to `[1, 8]` with 4 as the fallback.
fn detect(source: &str) -> Indentation {
    let mut tab_lines = 0usize;
    let mut space_lines = 0usize;
    let mut widths: FxHashSet<usize> = FxHashSet::default();

    for line in source.lines() {
        let ws = leading_ws(line);
        if ws.is_empty() || ws.len() == line.len() {
            continue;
        }
        if ws.contains('\t') {
            tab_lines += 1;
        } else {
            space_lines += 1;
            widths.insert(ws.len());
        }
    }

    if tab_lines > space_lines {
        return Indentation::tabs();
    }

    let mut sorted: Vec<usize> = widths.into_iter().collect();
    sorted.sort_unstable();
    if sorted.is_empty() {
        return Indentation::spaces(4);
    }

    let mut values: Vec<usize> = sorted.windows(2).map(|pair| pair[1] - pair[0]).collect();
    values.push(sorted[0]);
    let unit = values.into_iter().fold(0, gcd);
    if unit == 0 || unit > 8 {
        Indentation::spaces(4)
    } else {
        Indentation::spaces(unit)
    }
}

fn gcd(mut a: usize, mut b: usize) -> usize {
    while b != 0 {
        let rem = a % b;
        a = b;
        b = rem;
    }
    a
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detects_four_space_indent() {
        let source = "fn main() {\n    let x = 1;\n    if x > 0 {\n        x;\n    }\n}\n";
        let analyzer = IndentationAnalyzer::new(source);
        let indent = analyzer.detect();
        assert_eq!(indent.style, IndentStyle::Spaces);
        assert_eq!(indent.size, 4);
        assert_eq!(indent.unit, "    ");
    }

    #[test]
    fn test_detects_two_space_indent() {
        let source = "a:\n  b:\n    c: 1\n  d: 2\n";
        let analyzer = IndentationAnalyzer::new(source);
        assert_eq!(analyzer.detect().size, 2);
    }

    #[test]
    fn test_detects_tabs() {
        let source = "fn main() {\n\tlet x = 1;\n\tif x > 0 {\n\t\tx;\n\t}\n}\n";
        let analyzer = IndentationAnalyzer::new(source);
        let indent = analyzer.detect();
        assert_eq!(indent.style, IndentStyle::Tabs);
        assert_eq!(indent.size, 1);
        assert_eq!(indent.unit, "\t");
    }

    #[test]
    fn test_unindented_source_defaults_to_four_spaces() {
        let analyzer = IndentationAnalyzer::new("a\nb\nc\n");
        let indent = analyzer.detect();
        assert_eq!(indent.style, IndentStyle::Spaces);
        assert_eq!(indent.size, 4);
    }

    #[test]
    fn test_odd_width_set_takes_gcd() {
        let source = "x\n   a\n      b\n";
        let analyzer = IndentationAnalyzer::new(source);
        assert_eq!(analyzer.detect().size, 3);
    }

    #[test]
    fn test_level_queries() {
        let source = "fn main() {\n    let x = 1;\n        y;\n}\n";
        let analyzer = IndentationAnalyzer::new(source);
        assert_eq!(analyzer.level_at_line(0), 0);
        assert_eq!(analyzer.level_at_line(1), 1);
        assert_eq!(analyzer.level_at_line(2), 2);
        let x_offset = source.find("let").unwrap();
        assert_eq!(analyzer.line_at_byte(x_offset), 1);
        assert_eq!(analyzer.level_at_byte(x_offset), 1);
        assert_eq!(analyzer.indentation_at_byte(x_offset), "    ");
    }

    #[test]
    fn test_indent_string_for_level_clamps_at_zero() {
        let analyzer = IndentationAnalyzer::new("    a\n");
        assert_eq!(analyzer.indent_string_for_level(2), "        ");
        assert_eq!(analyzer.indent_string_for_level(0), "");
        assert_eq!(analyzer.indent_string_for_level(-3), "");
    }

    #[test]
    fn test_adjust_indentation_shifts_block() {
        let analyzer = IndentationAnalyzer::new("    a\n");
        let content = "if x {\n    y();\n}";
        let adjusted = analyzer.adjust_indentation(content, 1, None);
        assert_eq!(adjusted, "    if x {\n        y();\n    }");
    }

    #[test]
    fn test_adjust_indentation_shifts_down() {
        let analyzer = IndentationAnalyzer::new("    a\n");
        let content = "        a();\n            b();";
        let adjusted = analyzer.adjust_indentation(content, 1, Some(2));
        assert_eq!(adjusted, "    a();\n        b();");
    }

    #[test]
    fn test_adjust_indentation_is_idempotent_at_same_level() {
        let analyzer = IndentationAnalyzer::new("    a\n");
        let content = "    a();\n\n        b();\n";
        assert_eq!(analyzer.adjust_indentation(content, 1, None), content);
        assert_eq!(analyzer.adjust_indentation(content, 1, Some(1)), content);
    }

    #[test]
    fn test_adjust_indentation_keeps_blank_lines_verbatim() {
        let analyzer = IndentationAnalyzer::new("    a\n");
        let content = "a();\n\nb();";
        let adjusted = analyzer.adjust_indentation(content, 1, Some(0));
        assert_eq!(adjusted, "    a();\n\n    b();");
    }

    #[test]
    fn test_adjust_indentation_never_outdents_past_zero() {
        let analyzer = IndentationAnalyzer::new("    a\n");
        let content = "a();\n    b();";
        let adjusted = analyzer.adjust_indentation(content, 0, Some(2));
        assert_eq!(adjusted, "a();\nb();");
    }

    #[test]
    fn test_empty_source() {
        let analyzer = IndentationAnalyzer::new("");
        assert_eq!(analyzer.level_at_byte(0), 0);
        assert_eq!(analyzer.raw_indentation_at_line(0), "");
    }
}
