//! Line/column derivation from byte offsets.
//!
//! Positions are 1-based in both lines and columns, matching what editors
//! display. Columns count bytes from the start of the line; for ASCII
//! sources this equals the character column.

use sable_ir::Span;

/// A 1-based line/column pair.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub struct LineCol {
    pub line: u32,
    pub column: u32,
}

/// Derive the line/column of a byte offset in `source`.
///
/// Offsets past the end of the source report the position just after the
/// last character (where an end-of-input error points).
pub fn line_col(source: &str, offset: u32) -> LineCol {
    let offset = (offset as usize).min(source.len());
    let mut line = 1;
    let mut column = 1;
    for byte in source.as_bytes()[..offset].iter() {
        if *byte == b'\n' {
            line += 1;
            column = 1;
        } else {
            column += 1;
        }
    }
    LineCol { line, column }
}

/// Derive the start and end positions of a span in one pass.
pub fn line_col_range(source: &str, span: Span) -> (LineCol, LineCol) {
    let start = line_col(source, span.start);
    let mut end = start;
    let from = (span.start as usize).min(source.len());
    let to = (span.end as usize).min(source.len());
    for byte in source.as_bytes()[from..to].iter() {
        if *byte == b'\n' {
            end.line += 1;
            end.column = 1;
        } else {
            end.column += 1;
        }
    }
    (start, end)
}
