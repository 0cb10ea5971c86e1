// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Group code / value pair stream over ASCII DXF text

use crate::DxfError;

/// One `(group code, value)` pair
pub type Pair = (i32, String);

pub(crate) struct PairReader<'a> {
    lines: std::str::Lines<'a>,
    buffer: Option<Pair>,
    line_number: usize,
}

impl<'a> PairReader<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            lines: source.lines(),
            buffer: None,
            line_number: 0,
        }
    }

    /// Line of the last value read (1-based)
    pub(crate) fn line(&self) -> usize {
        self.line_number
    }

    /// Next pair, or `None` at end of input
    pub(crate) fn next_pair(&mut self) -> Result<Option<Pair>, DxfError> {
        if let Some(pair) = self.buffer.take() {
            return Ok(Some(pair));
        }

        // Blank trailing lines after EOF are tolerated
        let code_line = loop {
            match self.lines.next() {
                Some(line) => {
                    self.line_number += 1;
                    if !line.trim().is_empty() {
                        break line;
                    }
                }
                None => return Ok(None),
            }
        };

        let value_line = match self.lines.next() {
            Some(line) => {
                self.line_number += 1;
                line
            }
            None => {
                return Err(DxfError::invalid(
                    self.line_number,
                    "input ends after a group code without its value",
                ));
            }
        };

        let code = code_line.trim().parse::<i32>().map_err(|_| {
            DxfError::invalid(
                self.line_number - 1,
                format!("group code \"{}\" is not an integer", code_line.trim()),
            )
        })?;
        Ok(Some((code, value_line.trim_end_matches('\r').to_string())))
    }

    /// Push a pair back; the next call to [`next_pair`](Self::next_pair) returns it
    pub(crate) fn put_back(&mut self, pair: Pair) {
        debug_assert!(self.buffer.is_none(), "only one pair can be put back");
        self.buffer = Some(pair);
    }
}

/// Parse a coordinate or real value; only finite numbers are accepted
pub(crate) fn parse_f64(raw: &str, line: usize, context: &str) -> Result<f64, DxfError> {
    let raw = raw.trim();
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(DxfError::invalid(
            line,
            format!("{context}: \"{raw}\" is not a finite number"),
        )),
    }
}

pub(crate) fn parse_i32(raw: &str, line: usize, context: &str) -> Result<i32, DxfError> {
    let raw = raw.trim();
    raw.parse::<i32>()
        .map_err(|_| DxfError::invalid(line, format!("{context}: \"{raw}\" is not an integer")))
}
