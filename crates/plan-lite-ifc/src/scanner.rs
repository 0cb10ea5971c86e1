// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance scanner using SIMD-accelerated byte searching
//!
//! Finds instance boundaries in the DATA section without decoding
//! attributes, and reads the HEADER section.

use crate::tokenizer::parse_arguments;
use crate::types::{AttributeValue, StepType};
use memchr::{memchr, memmem};
use plan_lite_model::{BimHeader, EntityId};
use rustc_hash::FxHashMap;

/// Byte ranges and per-type id lists of every instance
#[derive(Debug, Default)]
pub struct EntityIndex {
    /// Instance id -> (start, end) byte offsets
    pub offsets: FxHashMap<u32, (usize, usize)>,
    /// Type -> instance ids, in file order
    pub by_type: FxHashMap<StepType, Vec<EntityId>>,
}

impl EntityIndex {
    pub fn len(&self) -> usize {
        self.offsets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.offsets.is_empty()
    }

    /// Ids of a given type, in file order
    pub fn ids_of(&self, step_type: &StepType) -> &[EntityId] {
        self.by_type.get(step_type).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Streaming scanner over the DATA section
pub struct EntityScanner<'a> {
    content: &'a str,
    pos: usize,
}

impl<'a> EntityScanner<'a> {
    /// Position the scanner right after `DATA;`
    pub fn new(content: &'a str) -> Self {
        let pos = memmem::find(content.as_bytes(), b"DATA;")
            .map(|p| p + 5)
            .unwrap_or(0);
        Self { content, pos }
    }

    /// Next instance as (id, type keyword, start, end)
    pub fn next_entity(&mut self) -> Option<(u32, &'a str, usize, usize)> {
        let bytes = self.content.as_bytes();

        while self.pos < bytes.len() {
            self.pos += memchr(b'#', &bytes[self.pos..])?;

            // References inside attribute lists follow '(' or ','
            let at_start = self.pos == 0
                || matches!(bytes[self.pos - 1], b'\n' | b'\r' | b';' | b' ' | b'\t');
            if !at_start {
                self.pos += 1;
                continue;
            }

            let start = self.pos;
            self.pos += 1;
            let id_start = self.pos;
            while self.pos < bytes.len() && bytes[self.pos].is_ascii_digit() {
                self.pos += 1;
            }
            if self.pos == id_start {
                continue;
            }
            let id: u32 = match self.content[id_start..self.pos].parse() {
                Ok(id) => id,
                Err(_) => continue,
            };

            self.skip_blanks();
            if bytes.get(self.pos) != Some(&b'=') {
                continue;
            }
            self.pos += 1;
            self.skip_blanks();

            let type_start = self.pos;
            while self.pos < bytes.len()
                && (bytes[self.pos].is_ascii_alphanumeric() || bytes[self.pos] == b'_')
            {
                self.pos += 1;
            }
            if self.pos == type_start {
                continue;
            }
            let type_name = &self.content[type_start..self.pos];

            let end = self.find_entity_end()?;
            return Some((id, type_name, start, end));
        }

        None
    }

    fn skip_blanks(&mut self) {
        let bytes = self.content.as_bytes();
        while self.pos < bytes.len() && matches!(bytes[self.pos], b' ' | b'\t') {
            self.pos += 1;
        }
    }

    /// Advance past the terminating `;`, skipping quoted strings
    fn find_entity_end(&mut self) -> Option<usize> {
        let bytes = self.content.as_bytes();
        let mut in_string = false;

        while self.pos < bytes.len() {
            match bytes[self.pos] {
                b'\'' => {
                    if in_string && bytes.get(self.pos + 1) == Some(&b'\'') {
                        self.pos += 2;
                        continue;
                    }
                    in_string = !in_string;
                }
                b';' if !in_string => {
                    self.pos += 1;
                    return Some(self.pos);
                }
                _ => {}
            }
            self.pos += 1;
        }

        None
    }

    /// Index every instance in `content`
    pub fn build_index(content: &'a str) -> EntityIndex {
        let mut scanner = Self::new(content);
        let mut index = EntityIndex::default();

        while let Some((id, type_name, start, end)) = scanner.next_entity() {
            index.offsets.insert(id, (start, end));
            index
                .by_type
                .entry(StepType::parse(type_name))
                .or_default()
                .push(EntityId(id));
        }

        index
    }
}

/// Locate `KEYWORD(` in the HEADER section and decode its arguments
fn header_arguments(header: &str, keyword: &str) -> Option<Vec<AttributeValue>> {
    let at = header.find(keyword)?;
    let after = &header[at + keyword.len()..];
    let open = after.find('(')?;
    parse_arguments(&after[open..])
}

fn first_string(value: &AttributeValue) -> Option<String> {
    match value {
        AttributeValue::List(items) => items.iter().find_map(first_string),
        other => other
            .as_string()
            .filter(|s| !s.trim().is_empty())
            .map(str::to_string),
    }
}

/// Read schema, file name and originating system from the HEADER section
pub fn parse_header(content: &str) -> BimHeader {
    let mut info = BimHeader::default();

    let header_start = content.find("HEADER;").unwrap_or(0);
    let header_end = content[header_start..]
        .find("ENDSEC;")
        .map(|p| header_start + p)
        .unwrap_or(content.len());
    let header = &content[header_start..header_end];

    if let Some(args) = header_arguments(header, "FILE_SCHEMA") {
        if let Some(schema) = args.first().and_then(first_string) {
            info.schema = schema.to_ascii_uppercase();
        }
    }

    // FILE_NAME(name, time_stamp, author, organization, preprocessor_version,
    //           originating_system, authorization)
    if let Some(args) = header_arguments(header, "FILE_NAME") {
        info.file_name = args.first().and_then(first_string);
        info.originating_system = args.get(5).and_then(first_string);
    }

    info
}
