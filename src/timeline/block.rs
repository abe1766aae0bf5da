// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Grouping of tokenized lines into keyword-delimited blocks

use super::tokenizer::Line;
use crate::error::{CompileError, Location, Result};
use serde::Serialize;
use std::fmt;
use std::iter::Peekable;

/// File type keyword that opens a block
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileType {
    Parameters,
    Units,
    Sketch,
    CrossRails,
    Plane,
    Loft,
    Extrude,
    Revolve,
    Split,
    Combine,
    Mirror,
    #[serde(rename = "movecopy")]
    MoveCopy,
    #[serde(rename = "modifyedges")]
    ModifyEdges,
    Assembly,
    Assemblies,
    Design,
    Echo,
}

impl FileType {
    pub const ALL: [FileType; 17] = [
        FileType::Parameters,
        FileType::Units,
        FileType::Sketch,
        FileType::CrossRails,
        FileType::Plane,
        FileType::Loft,
        FileType::Extrude,
        FileType::Revolve,
        FileType::Split,
        FileType::Combine,
        FileType::Mirror,
        FileType::MoveCopy,
        FileType::ModifyEdges,
        FileType::Assembly,
        FileType::Assemblies,
        FileType::Design,
        FileType::Echo,
    ];

    pub fn keyword(self) -> &'static str {
        match self {
            FileType::Parameters => "parameters",
            FileType::Units => "units",
            FileType::Sketch => "sketch",
            FileType::CrossRails => "cross_rails",
            FileType::Plane => "plane",
            FileType::Loft => "loft",
            FileType::Extrude => "extrude",
            FileType::Revolve => "revolve",
            FileType::Split => "split",
            FileType::Combine => "combine",
            FileType::Mirror => "mirror",
            FileType::MoveCopy => "movecopy",
            FileType::ModifyEdges => "modifyedges",
            FileType::Assembly => "assembly",
            FileType::Assemblies => "assemblies",
            FileType::Design => "design",
            FileType::Echo => "echo",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|t| t.keyword() == keyword)
    }

    /// Block types that produce one CSV action file
    pub fn is_action(self) -> bool {
        !matches!(
            self,
            FileType::Parameters | FileType::Units | FileType::CrossRails | FileType::Echo
        )
    }

    /// Block types in which an `echo` line is part of the body
    pub fn accepts_echo(self) -> bool {
        matches!(
            self,
            FileType::Assembly | FileType::Assemblies | FileType::Design
        )
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// A header line with the body lines that follow it
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub file_type: FileType,
    pub header: Line,
    pub body: Vec<Line>,
}

impl Block {
    pub fn line(&self) -> usize {
        self.header.number
    }

    /// Short label used in diagnostics, e.g. `sketch circle`
    pub fn label(&self) -> String {
        match self.header.text(2).or_else(|| self.header.text(1)) {
            Some(name) if self.file_type != FileType::Echo => {
                format!("{} {}", self.file_type, name)
            }
            _ => self.file_type.to_string(),
        }
    }

    pub fn location(&self, file: &str, line: usize) -> Location {
        Location::new(file, line, self.label())
    }
}

/// Groups a stream of lines into blocks
pub struct BlockReader<I: Iterator<Item = Result<Line>>> {
    lines: Peekable<I>,
}

impl<I: Iterator<Item = Result<Line>>> BlockReader<I> {
    pub fn new(lines: I) -> Self {
        Self {
            lines: lines.peekable(),
        }
    }
}

/// Block keyword of a line; a quoted first field is always data
fn block_keyword(line: &Line) -> Option<FileType> {
    match line.fields.first() {
        Some(field) if !field.quoted => FileType::from_keyword(&field.text),
        _ => None,
    }
}

fn opens_block(current: FileType, line: &Line) -> bool {
    match block_keyword(line) {
        Some(FileType::Echo) => !current.accepts_echo(),
        Some(_) => true,
        None => false,
    }
}

impl<I: Iterator<Item = Result<Line>>> Iterator for BlockReader<I> {
    type Item = Result<Block>;

    fn next(&mut self) -> Option<Self::Item> {
        let header = match self.lines.next()? {
            Ok(line) => line,
            Err(e) => return Some(Err(e)),
        };
        let file_type = match block_keyword(&header) {
            Some(file_type) => file_type,
            None => {
                return Some(Err(CompileError::schema(
                    Location::at_line(header.number),
                    format!(
                        "unknown file type `{}`, expected a block keyword",
                        header.keyword()
                    ),
                )))
            }
        };

        let mut body = Vec::new();
        // A tokenizer error ends the block; it is returned by the next call.
        while let Some(Ok(line)) = self.lines.peek() {
            if opens_block(file_type, line) {
                break;
            }
            if let Some(Ok(line)) = self.lines.next() {
                body.push(line);
            }
        }

        Some(Ok(Block {
            file_type,
            header,
            body,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::timeline::Tokenizer;

    fn read_blocks(source: &str) -> Result<Vec<Block>> {
        BlockReader::new(Tokenizer::new(source)).collect()
    }

    #[test]
    fn test_keyword_round_trip() {
        for file_type in FileType::ALL {
            assert_eq!(FileType::from_keyword(file_type.keyword()), Some(file_type));
        }
        assert_eq!(FileType::from_keyword("circle"), None);
    }

    #[test]
    fn test_blocks_are_split_on_keywords() {
        let source = "parameters\nr, 10\nsketch, out, c\noffset_plane, z, 0\ncircle\n0, 0, $r\n";
        let blocks = read_blocks(source).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].file_type, FileType::Parameters);
        assert_eq!(blocks[0].body.len(), 1);
        assert_eq!(blocks[1].file_type, FileType::Sketch);
        assert_eq!(blocks[1].body.len(), 3);
        assert_eq!(blocks[1].label(), "sketch c");
    }

    #[test]
    fn test_echo_continues_assembly() {
        let source = "assembly, asm, top\nrun_extrude, parts/body\necho, building top\necho, standalone\n";
        let blocks = read_blocks(source).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body.len(), 3);

        let source = "echo, hello\nsketch, a, b\n";
        let blocks = read_blocks(source).unwrap();
        assert_eq!(blocks[0].file_type, FileType::Echo);
        assert!(blocks[0].body.is_empty());
    }

    #[test]
    fn test_quoted_keyword_is_data() {
        let source = "combine, out, c\njoin\ntarget_body, a\ntool_bodies\n\"plane\"\n";
        let blocks = read_blocks(source).unwrap();
        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].body.len(), 4);
        assert_eq!(blocks[0].body[3].text(0), Some("plane"));

        let error = read_blocks("\"sketch\", a, b\n").unwrap_err();
        assert!(matches!(error, CompileError::SchemaValidation { .. }));
    }

    #[test]
    fn test_line_before_any_block() {
        let error = read_blocks("r, 10\n").unwrap_err();
        assert!(matches!(error, CompileError::SchemaValidation { .. }));
    }
}
