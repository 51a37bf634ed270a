//! Line/column positions.
//!
//! Node spans are byte offsets; editors and the CLI talk in lines and
//! columns. Columns count characters, not bytes.

use serde::Serialize;

/// 0-based line and column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Position {
    pub line: u32,
    pub character: u32,
}

impl Position {
    pub fn new(line: u32, character: u32) -> Self {
        Position { line, character }
    }
}

/// Byte offset of the first character of every line.
///
/// `\n`, `\r\n` and a lone `\r` all end a line.
#[derive(Debug, Clone)]
pub struct LineMap {
    starts: Vec<u32>,
}

impl LineMap {
    pub fn build(source: &str) -> Self {
        let bytes = source.as_bytes();
        let mut starts = vec![0];
        let mut i = 0;
        while i < bytes.len() {
            match bytes[i] {
                b'\r' if bytes.get(i + 1) == Some(&b'\n') => i += 2,
                b'\r' | b'\n' => i += 1,
                _ => {
                    i += 1;
                    continue;
                }
            }
            starts.push(i as u32);
        }
        LineMap { starts }
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }

    /// Position of byte `offset`; offsets past the end land on the last line.
    pub fn offset_to_position(&self, offset: u32, source: &str) -> Position {
        let line = self.starts.partition_point(|&start| start <= offset).max(1) - 1;
        let from = self.starts[line] as usize;
        let to = (offset as usize).clamp(from, source.len().max(from));
        let character = source.get(from..to).map_or(0, |text| text.chars().count());
        Position::new(line as u32, character as u32)
    }

    /// Byte offset of `position`. A column past the end of its line clamps to
    /// the line end; a line past the end of the source is `None`.
    pub fn position_to_offset(&self, position: Position, source: &str) -> Option<u32> {
        let line = position.line as usize;
        let start = *self.starts.get(line)? as usize;
        let end = self
            .starts
            .get(line + 1)
            .map_or(source.len(), |&next| next as usize);
        let text = source.get(start..end)?;
        let content = text.trim_end_matches(['\r', '\n']);
        let width = content
            .char_indices()
            .nth(position.character as usize)
            .map_or(content.len(), |(byte, _)| byte);
        Some((start + width) as u32)
    }
}
