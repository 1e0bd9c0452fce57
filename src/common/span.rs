use std::{
    fmt::{self, Debug, Display, Formatter},
    rc::Rc,
};

use crate::common::source::Source;

/// A `Span` refers to a section of a source,
/// much like a `&str`, but with a reference to a `Source` rather than a `String`.
/// A `Span` is meant to be paired with other datastructures,
/// to be used during error reporting.
#[derive(Clone, Eq, PartialEq)]
pub struct Span {
    source: Rc<Source>,
    offset: usize,
    length: usize,
}

impl Span {
    /// Create a new `Span` from an offset with a length.
    /// All `Span`s have access to the `Source` from whence they came,
    /// So they can't be misinterpreted or miscombined.
    pub fn new(source: &Rc<Source>, offset: usize, length: usize) -> Span {
        Span {
            source: Rc::clone(source),
            offset,
            length,
        }
    }

    /// A `Span` that points at a specific point in the source.
    /// Has a length of `0`.
    pub fn point(source: &Rc<Source>, offset: usize) -> Span {
        Span::new(source, offset, 0)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Return the index of the end of the `Span`.
    pub fn end(&self) -> usize {
        self.offset + self.length
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Creates a new `Span` which spans the space of the previous two.
    /// ```plain
    /// hello this is cool
    /// ^^^^^              | Span a
    ///            ^^      | Span b
    /// ^^^^^^^^^^^^^      | combined
    /// ```
    /// Both spans must come from the same `Source`.
    pub fn combine(a: &Span, b: &Span) -> Span {
        debug_assert!(
            Rc::ptr_eq(&a.source, &b.source) || a.source == b.source,
            "Can't combine two Spans with separate sources",
        );

        let offset = a.offset.min(b.offset);
        let end = a.end().max(b.end());
        Span::new(&a.source, offset, end - offset)
    }

    /// Returns the contents of a `Span`.
    /// Spans that fall outside of the source or off a
    /// character boundary yield an empty string.
    pub fn contents(&self) -> String {
        self.source
            .contents
            .get(self.offset..self.end())
            .unwrap_or("")
            .to_string()
    }

    /// The full text of every line the `Span` touches.
    pub fn lines(&self) -> Vec<String> {
        let lines: Vec<_> = self.source.contents.split('\n').collect();
        let start_line = self.line(self.offset);
        let end_line = self.line(self.end()).max(start_line);
        lines[start_line..=end_line.min(lines.len() - 1)]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    pub fn path(&self) -> String {
        self.source.path.to_string_lossy().to_string()
    }

    /// Zero-based line number of a byte index.
    pub fn line(&self, index: usize) -> usize {
        let index = index.min(self.source.len());
        self.source.contents.as_bytes()[..index]
            .iter()
            .filter(|b| **b == b'\n')
            .count()
    }

    /// Zero-based column (in characters) of a byte index.
    pub fn col(&self, index: usize) -> usize {
        let index = index.min(self.source.len());
        let before = &self.source.contents.as_bytes()[..index];
        let line_start = before
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |i| i + 1);
        String::from_utf8_lossy(&before[line_start..]).chars().count()
    }

    pub fn format(&self) -> FormattedSpan {
        FormattedSpan {
            path: self.path(),
            start: self.line(self.offset),
            lines: self.lines(),
            start_col: self.col(self.offset),
            end_col: self.col(self.end()),
        }
    }
}

impl Debug for Span {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Span")
            .field("contents", &self.contents())
            .field("start", &self.offset)
            .field("end", &self.end())
            .finish()
    }
}

impl Display for Span {
    /// Given a `Span`, `fmt` will print out where the `Span` occurs in its source.
    /// Single-line `Span`s:
    /// ```plain
    /// 12 | func blatant { error }
    ///    |      ^^^^^^^
    /// ```
    /// Multi-line `Span`s:
    /// ```plain
    /// 12 > func f() {
    /// 13 >     return 1 +
    /// 14 > }
    /// ```
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Represents a formatted span, ready to be displayed.
/// Contains information about where the span is from,
/// and where in the text it starts and ends
/// relative to the lines in the source.
pub struct FormattedSpan {
    pub path: String,
    pub start: usize,
    pub lines: Vec<String>,
    pub start_col: usize,
    pub end_col: usize,
}

impl FormattedSpan {
    pub fn is_multiline(&self) -> bool {
        self.lines.len() != 1
    }

    pub fn gutter_padding(&self) -> usize {
        (self.start + self.lines.len()).to_string().len()
    }

    /// If a single line span, returns the number of carrots between cols.
    /// Zero-length spans still get a single carrot.
    pub fn carrots(&self) -> Option<usize> {
        if self.is_multiline() {
            None
        } else {
            Some(self.end_col.saturating_sub(self.start_col).max(1))
        }
    }
}

impl Display for FormattedSpan {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "In {}:{}:{}",
            self.path,
            self.start + 1,
            self.start_col + 1
        )?;
        writeln!(f, "{} |", " ".repeat(self.gutter_padding()))?;

        if let Some(carrots) = self.carrots() {
            writeln!(f, "{} | {}", self.start + 1, self.lines[0])?;
            writeln!(
                f,
                "{} | {}{}",
                " ".repeat(self.gutter_padding()),
                " ".repeat(self.start_col),
                "^".repeat(carrots),
            )?;
        } else {
            for (index, line) in self.lines.iter().enumerate() {
                let line_no = (self.start + index + 1).to_string();
                let padding = " ".repeat(self.gutter_padding() - line_no.len());
                writeln!(f, "{}{} > {}", line_no, padding, line)?;
            }
        }

        Ok(())
    }
}
