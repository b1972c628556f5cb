//! Ranges of macro sizes (`N` values).

use crate::errors::GenerationError;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// A non-empty inclusive range of `N` values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NRange {
    pub start: u32,
    pub end: u32,
}

impl NRange {
    pub fn new(start: u32, end: u32) -> Option<NRange> {
        if start <= end {
            Some(NRange { start, end })
        } else {
            None
        }
    }

    pub fn single(n: u32) -> NRange {
        NRange { start: n, end: n }
    }

    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    pub fn iter(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }
}

impl Display for NRange {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// The range a user asked for. Without an end, generation goes on until the output size
/// limit stops it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RequestedRange {
    pub start: u32,
    pub end: Option<u32>,
}

impl RequestedRange {
    pub fn is_bounded(&self) -> bool {
        self.end.is_some()
    }

    /// Part of the range from `min` on, or `None` if that part is empty.
    pub fn from_min(&self, min: u32) -> Option<RequestedRange> {
        let start = self.start.max(min);
        match self.end {
            Some(end) if end < start => None,
            end => Some(RequestedRange { start, end }),
        }
    }
}

impl FromStr for RequestedRange {
    type Err = GenerationError;

    /// Parses `N`, `START-END` or `START-`.
    fn from_str(text: &str) -> Result<RequestedRange, GenerationError> {
        let number = |s: &str| {
            s.trim()
                .parse::<u32>()
                .map_err(|_| GenerationError::malformed_range(text))
        };

        match text.find('-') {
            None => {
                let n = number(text)?;
                Ok(RequestedRange {
                    start: n,
                    end: Some(n),
                })
            }
            Some(dash) => {
                let start = number(&text[..dash])?;
                let end = &text[dash + 1..];
                if end.trim().is_empty() {
                    return Ok(RequestedRange { start, end: None });
                }
                let end = number(end)?;
                if end < start {
                    return Err(GenerationError::reversed_range(start, end));
                }
                Ok(RequestedRange {
                    start,
                    end: Some(end),
                })
            }
        }
    }
}

/// Ranges covered by consecutive generated headers, in generation order.
#[derive(Clone, Debug, Default)]
pub struct FileIndex {
    files: Vec<NRange>,
}

impl FileIndex {
    pub fn new() -> FileIndex {
        FileIndex { files: Vec::new() }
    }

    /// Records the next file. Its range must start after the previous one ends.
    pub fn push(&mut self, range: NRange) {
        debug_assert!(self.files.last().map_or(true, |last| last.end < range.start));
        self.files.push(range);
    }

    pub fn files(&self) -> &[NRange] {
        &self.files
    }

    /// Files whose range intersects `query`.
    pub fn intersecting(&self, query: NRange) -> &[NRange] {
        if query.start > query.end {
            return &[];
        }
        let first = self.files.partition_point(|file| file.end < query.start);
        let last = self.files.partition_point(|file| file.start <= query.end);
        if first >= last {
            &[]
        } else {
            &self.files[first..last]
        }
    }
}
