//! Source Map v3 generation.
//!
//! Produces the standard delta-encoded `mappings` form for single-file
//! output, and the `sections` index-map form for bundled chunks where
//! several already-printed modules are concatenated with line offsets.

use serde::Serialize;

/// Base64 VLQ encoding as used by the `mappings` field.
pub mod vlq {
    const BASE64_CHARS: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

    /// Encode a signed value. The sign bit is stored in the LSB of the first
    /// digit; continuation is the high bit of each 6-bit group.
    pub fn encode(value: i32) -> String {
        let mut vlq: u32 = if value < 0 {
            (((-(value as i64)) as u32) << 1) | 1
        } else {
            (value as u32) << 1
        };

        let mut out = String::new();
        loop {
            let mut digit = (vlq & 0x1f) as usize;
            vlq >>= 5;
            if vlq > 0 {
                digit |= 0x20;
            }
            out.push(BASE64_CHARS[digit] as char);
            if vlq == 0 {
                break;
            }
        }
        out
    }

    /// Decode one VLQ value from the start of `input`. Returns the value and
    /// the number of characters consumed, or `None` on malformed input.
    pub fn decode(input: &str) -> Option<(i32, usize)> {
        let mut result: u32 = 0;
        let mut shift = 0u32;
        for (i, byte) in input.bytes().enumerate() {
            let digit = BASE64_CHARS.iter().position(|&c| c == byte)? as u32;
            result |= (digit & 0x1f) << shift;
            if digit & 0x20 == 0 {
                let value = if result & 1 == 1 {
                    -((result >> 1) as i32)
                } else {
                    (result >> 1) as i32
                };
                return Some((value, i + 1));
            }
            shift += 5;
        }
        None
    }
}

/// Plain base64, used to inline maps as data URLs.
pub fn base64_encode(bytes: &[u8]) -> String {
    const CHARS: &[u8; 64] =
        b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";
    let mut out = String::with_capacity(bytes.len().div_ceil(3) * 4);
    for chunk in bytes.chunks(3) {
        let b0 = chunk[0] as u32;
        let b1 = chunk.get(1).copied().unwrap_or(0) as u32;
        let b2 = chunk.get(2).copied().unwrap_or(0) as u32;
        let triple = (b0 << 16) | (b1 << 8) | b2;
        out.push(CHARS[(triple >> 18) as usize & 0x3f] as char);
        out.push(CHARS[(triple >> 12) as usize & 0x3f] as char);
        out.push(if chunk.len() > 1 {
            CHARS[(triple >> 6) as usize & 0x3f] as char
        } else {
            '='
        });
        out.push(if chunk.len() > 2 {
            CHARS[triple as usize & 0x3f] as char
        } else {
            '='
        });
    }
    out
}

/// Count newline bytes in `text`.
pub fn count_lines(text: &str) -> u32 {
    memchr::memchr_iter(b'\n', text.as_bytes()).count() as u32
}

/// A finished Source Map v3 document.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SourceMap {
    pub version: u32,
    pub file: String,
    pub sources: Vec<String>,
    pub names: Vec<String>,
    pub mappings: String,
}

impl SourceMap {
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("source map serialization cannot fail")
    }

    pub fn to_data_url(&self) -> String {
        format!(
            "data:application/json;base64,{}",
            base64_encode(self.to_json().as_bytes())
        )
    }
}

struct Mapping {
    generated_line: u32,
    generated_column: u32,
    source_index: u32,
    original_line: u32,
    original_column: u32,
}

/// Incrementally records mappings as output is printed.
///
/// Mappings must be added in generated order (the printer emits strictly
/// forward), which keeps the delta encoding a single pass.
pub struct SourceMapBuilder {
    file: String,
    sources: Vec<String>,
    mappings: Vec<Mapping>,
}

impl SourceMapBuilder {
    pub fn new(output_name: &str, source_name: &str) -> Self {
        Self {
            file: output_name.to_string(),
            sources: vec![source_name.to_string()],
            mappings: Vec::new(),
        }
    }

    pub fn add_mapping(
        &mut self,
        generated_line: u32,
        generated_column: u32,
        original_line: u32,
        original_column: u32,
    ) {
        self.mappings.push(Mapping {
            generated_line,
            generated_column,
            source_index: 0,
            original_line,
            original_column,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }

    pub fn build(self) -> SourceMap {
        let mut mappings = String::new();
        let mut current_line = 0u32;
        let mut prev_generated_column = 0i32;
        let mut prev_source_index = 0i32;
        let mut prev_original_line = 0i32;
        let mut prev_original_column = 0i32;

        for (i, mapping) in self.mappings.iter().enumerate() {
            while current_line < mapping.generated_line {
                mappings.push(';');
                current_line += 1;
                prev_generated_column = 0;
            }
            if !mappings.is_empty() && !mappings.ends_with(';') && i > 0 {
                mappings.push(',');
            }

            mappings.push_str(&vlq::encode(
                mapping.generated_column as i32 - prev_generated_column,
            ));
            prev_generated_column = mapping.generated_column as i32;

            mappings.push_str(&vlq::encode(
                mapping.source_index as i32 - prev_source_index,
            ));
            prev_source_index = mapping.source_index as i32;

            mappings.push_str(&vlq::encode(
                mapping.original_line as i32 - prev_original_line,
            ));
            prev_original_line = mapping.original_line as i32;

            mappings.push_str(&vlq::encode(
                mapping.original_column as i32 - prev_original_column,
            ));
            prev_original_column = mapping.original_column as i32;
        }

        SourceMap {
            version: 3,
            file: self.file,
            sources: self.sources,
            names: Vec::new(),
            mappings,
        }
    }
}

/// One section of an index map: a complete sub-map placed at a line/column
/// offset in the generated bundle.
#[derive(Debug, Clone, Serialize)]
pub struct SourceMapSection {
    pub offset: SectionOffset,
    pub map: SourceMap,
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct SectionOffset {
    pub line: u32,
    pub column: u32,
}

/// Source Map v3 "index map": the map form for concatenated output.
#[derive(Debug, Clone, Serialize)]
pub struct IndexSourceMap {
    pub version: u32,
    pub file: String,
    pub sections: Vec<SourceMapSection>,
}

impl IndexSourceMap {
    pub fn new(output_name: &str) -> Self {
        Self {
            version: 3,
            file: output_name.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, line_offset: u32, map: SourceMap) {
        self.sections.push(SourceMapSection {
            offset: SectionOffset {
                line: line_offset,
                column: 0,
            },
            map,
        });
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).expect("source map serialization cannot fail")
    }
}
