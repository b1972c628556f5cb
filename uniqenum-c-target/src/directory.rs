//! Output of macros into a tree of size-capped headers.
//!
//! Every family gets its own subdirectory. Consecutive sizes are packed into a header until
//! the next macro would push it over the size cap, and headers are nested into directories by
//! the common decimal prefix of the sizes they hold:
//!
//! ```text
//! out/areuniq/areuniq2-40.h
//! out/areuniq/areuniq41-52.h
//! out/areuniq/12/areuniq1200-1209.h
//! out/uniqenum/uniqenum1-30.h
//! ```
//!
//! Headers include the `areuniq` headers their macros call, so any single header can be
//! included on its own.

use crate::guards::{file_slug, IncludeGuard};
use crate::printer::{C11MacroPrinter, MacroDef};
use std::collections::HashSet;
use std::fs;
use std::path::PathBuf;
use uniqenum::backends::GenerationSummary;
use uniqenum::errors::GenerationError;
use uniqenum::options::{DirectoryOptions, MacroFamily, MacroSelection};
use uniqenum::ranges::{FileIndex, NRange, RequestedRange};

pub struct DirectoryEmitter<'a> {
    printer: C11MacroPrinter<'a>,
    guard: IncludeGuard,
    options: &'a DirectoryOptions,

    /// `areuniq` headers written so far.
    areuniq_files: FileIndex,

    /// Number of headers written so far, across families. Used for guard slugs.
    file_number: u64,

    created_dirs: HashSet<PathBuf>,
    files: Vec<PathBuf>,
}

impl<'a> DirectoryEmitter<'a> {
    pub fn new(
        printer: C11MacroPrinter<'a>,
        guard: IncludeGuard,
        options: &'a DirectoryOptions,
    ) -> DirectoryEmitter<'a> {
        DirectoryEmitter {
            printer,
            guard,
            options,
            areuniq_files: FileIndex::new(),
            file_number: 0,
            created_dirs: HashSet::new(),
            files: Vec::new(),
        }
    }

    /// Writes all selected families. `uniqenum` macros are only generated up to the largest
    /// `areuniq` written, so that every check they make is defined.
    pub fn emit(
        mut self,
        selection: MacroSelection,
        requested: RequestedRange,
    ) -> Result<GenerationSummary, GenerationError> {
        let mut summary = GenerationSummary::default();

        let mut uniqenum_range = requested;
        if selection.areuniq {
            if let Some(range) = requested.from_min(MacroFamily::Areuniq.min_n()) {
                summary.areuniq = self.write_family(MacroFamily::Areuniq, range)?;
                let last = summary
                    .areuniq
                    .map_or(range.start - 1, |written| written.end);
                uniqenum_range.end = Some(last);
            }
        }

        if selection.uniqenum {
            if let Some(range) = uniqenum_range.from_min(MacroFamily::Uniqenum.min_n()) {
                summary.uniqenum = self.write_family(MacroFamily::Uniqenum, range)?;
            }
        }

        summary.files = self.files;
        Ok(summary)
    }

    /// Writes headers for `family` starting at `requested.start`. Returns the sizes written.
    fn write_family(
        &mut self,
        family: MacroFamily,
        requested: RequestedRange,
    ) -> Result<Option<NRange>, GenerationError> {
        let mut written: Option<NRange> = None;
        let mut start = requested.start;

        while requested.end.map_or(true, |end| start <= end) {
            let mut defs = self.fit(family, start, requested.end);
            if defs.is_empty() {
                if !requested.is_bounded() {
                    tracing::warn!(
                        %family,
                        n = start,
                        max_file_size = self.options.max_file_size,
                        "macro does not fit into a header, stopping"
                    );
                    break;
                }
                tracing::warn!(
                    %family,
                    n = start,
                    max_file_size = self.options.max_file_size,
                    "macro does not fit into a header, writing it alone"
                );
                defs.extend(self.printer.macro_def(family, start));
                if defs.is_empty() {
                    break;
                }
            }

            let end = start + defs.len() as u32 - 1;
            let range = NRange { start, end };
            self.write_header(family, range, &defs)?;

            written = Some(NRange {
                start: written.map_or(range.start, |w| w.start),
                end,
            });
            start = match end.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }

        if let Some(range) = written {
            tracing::info!(%family, %range, "generated macros");
        }
        Ok(written)
    }

    /// Largest run of macros from `start` on that fits into the next header.
    fn fit(&mut self, family: MacroFamily, start: u32, end: Option<u32>) -> Vec<MacroDef> {
        let slug = file_slug(self.file_number);
        let fixed = (self.guard.start(&slug).len() + self.guard.end().len()) as u64;

        let mut defs = Vec::new();
        let mut size = 0;
        let mut n = start;
        while end.map_or(true, |end| n <= end) {
            let def = match self.printer.macro_def(family, n) {
                Some(def) => def,
                None => break,
            };
            let range = NRange { start, end: n };
            let includes = self.includes(family, range).len() as u64;
            if fixed + includes + size + def.size() > self.options.max_file_size {
                break;
            }
            size += def.size();
            defs.push(def);
            n = match n.checked_add(1) {
                Some(next) => next,
                None => break,
            };
        }
        defs
    }

    fn write_header(
        &mut self,
        family: MacroFamily,
        range: NRange,
        defs: &[MacroDef],
    ) -> Result<(), GenerationError> {
        let mut dir = self.options.path.clone();
        dir.extend(dir_of(family, range, self.options.prefix_length));
        if !self.created_dirs.contains(&dir) {
            fs::create_dir_all(&dir).map_err(|error| GenerationError::io(&dir, error))?;
            self.created_dirs.insert(dir.clone());
        }

        let mut contents = self.guard.start(&file_slug(self.file_number));
        contents.push_str(&self.includes(family, range));
        for (n, def) in range.iter().zip(defs) {
            tracing::debug!(%family, n, size = def.size(), "writing macro");
            contents.push_str(&def.to_string());
        }
        contents.push_str(self.guard.end());

        let path = dir.join(file_name(family, range));
        fs::write(&path, &contents).map_err(|error| GenerationError::io(&path, error))?;
        tracing::info!(path = %path.display(), size = contents.len(), "wrote header");

        self.file_number += 1;
        if family == MacroFamily::Areuniq {
            self.areuniq_files.push(range);
        }
        self.files.push(path);
        Ok(())
    }

    /// `#include` lines for the `areuniq` headers defining the macros called from a `family`
    /// header holding `range`.
    fn includes(&self, family: MacroFamily, range: NRange) -> String {
        let dependencies = match family {
            MacroFamily::Areuniq => NRange::new(
                two_thirds(range.start, false),
                two_thirds(range.end, true),
            ),
            MacroFamily::Uniqenum => NRange::new(range.start.max(2), range.end),
        };
        let dependencies = match dependencies {
            Some(dependencies) => dependencies,
            None => return String::new(),
        };

        let from = dir_of(family, range, self.options.prefix_length);
        let mut includes = String::new();
        for &file in self.areuniq_files.intersecting(dependencies) {
            let to = dir_of(MacroFamily::Areuniq, file, self.options.prefix_length);
            includes.push_str("#include \"");
            includes.push_str(&relative_path(&from, &to));
            includes.push_str(&file_name(MacroFamily::Areuniq, file));
            includes.push_str("\"\n");
        }
        includes
    }
}

/// `2n/3` rounded down or up, and at least 2.
fn two_thirds(n: u32, round_up: bool) -> u32 {
    let twice = 2 * u64::from(n);
    let third = if round_up { (twice + 2) / 3 } else { twice / 3 };
    third.max(2) as u32
}

pub fn file_name(family: MacroFamily, range: NRange) -> String {
    format!("{}{}.h", family, range)
}

/// Directory of the header holding `range`, as path components below the output directory.
///
/// The common decimal prefix of the range bounds is cut into groups of `prefix_length` digits,
/// one directory level each; a trailing partial group is dropped. For a single size the last
/// digit is left out of the prefix, so that a directory never holds just one header.
pub fn dir_of(family: MacroFamily, range: NRange, prefix_length: usize) -> Vec<String> {
    let start = range.start.to_string();
    let prefix = if range.is_single() {
        &start[..start.len() - 1]
    } else {
        let end = range.end.to_string();
        let common = start
            .bytes()
            .zip(end.bytes())
            .take_while(|(s, e)| s == e)
            .count();
        &start[..common]
    };

    let mut dirs = vec![family.name().to_string()];
    if prefix_length > 0 {
        dirs.extend(
            prefix
                .as_bytes()
                .chunks_exact(prefix_length)
                .map(|group| String::from_utf8_lossy(group).into_owned()),
        );
    }
    dirs
}

/// `/`-separated path from directory `from` to directory `to`, with a trailing `/` unless empty.
pub fn relative_path(from: &[String], to: &[String]) -> String {
    let common = from
        .iter()
        .zip(to)
        .take_while(|(f, t)| f == t)
        .count();

    let mut path = String::new();
    for _ in common..from.len() {
        path.push_str("../");
    }
    for dir in &to[common..] {
        path.push_str(dir);
        path.push('/');
    }
    path
}
