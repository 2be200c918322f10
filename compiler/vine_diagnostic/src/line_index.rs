//! Byte offset to line/column conversion.

use vine_ir::Span;

/// Line start offsets of one source text.
#[derive(Clone, Debug, Default)]
pub struct LineIndex {
    line_starts: Vec<u32>,
}

impl LineIndex {
    pub fn new(source: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            source
                .bytes()
                .enumerate()
                .filter(|&(_, b)| b == b'\n')
                .map(|(i, _)| u32::try_from(i + 1).unwrap_or(u32::MAX)),
        );
        LineIndex { line_starts }
    }

    /// 1-based (line, column) for a byte offset. Columns count characters.
    pub fn position(&self, source: &str, offset: u32) -> (u32, u32) {
        let line_idx = match self.line_starts.binary_search(&offset) {
            Ok(idx) => idx,
            Err(idx) => idx.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line_idx).copied().unwrap_or(0) as usize;
        let end = (offset as usize).min(source.len());
        let column = source
            .get(line_start..end)
            .map_or(end.saturating_sub(line_start), |text| text.chars().count());
        let line = u32::try_from(line_idx + 1).unwrap_or(u32::MAX);
        (line, u32::try_from(column + 1).unwrap_or(u32::MAX))
    }

    /// Position of the start of a span.
    pub fn span_start(&self, source: &str, span: Span) -> (u32, u32) {
        self.position(source, span.start)
    }

    /// Text of a 1-based line, without its line break.
    pub fn line_text<'a>(&self, source: &'a str, line: u32) -> Option<&'a str> {
        let idx = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(idx)? as usize;
        let end = self
            .line_starts
            .get(idx + 1)
            .map_or(source.len(), |&next| next as usize);
        source
            .get(start..end)
            .map(|text| text.trim_end_matches(['\n', '\r']))
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}
