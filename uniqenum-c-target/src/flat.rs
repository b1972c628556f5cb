//! Output of all macros into a single stream.

use crate::guards::{file_slug, IncludeGuard};
use crate::printer::C11MacroPrinter;
use std::io::{self, Write};
use uniqenum::backends::GenerationSummary;
use uniqenum::options::{MacroFamily, MacroSelection};
use uniqenum::ranges::NRange;

/// Writes one header holding every selected macro for `range`: `areuniq` macros first, since
/// `uniqenum` macros call them.
pub fn emit(
    printer: &mut C11MacroPrinter,
    guard: IncludeGuard,
    selection: MacroSelection,
    range: NRange,
    out: &mut impl Write,
) -> io::Result<GenerationSummary> {
    let mut summary = GenerationSummary::default();

    out.write_all(guard.start(&file_slug(0)).as_bytes())?;
    for family in selection.families() {
        let family_range = match NRange::new(range.start.max(family.min_n()), range.end) {
            Some(family_range) => family_range,
            None => continue,
        };

        for n in family_range.iter() {
            if let Some(def) = printer.macro_def(family, n) {
                tracing::debug!(%family, n, size = def.size(), "writing macro");
                write!(out, "{}", def)?;
            }
        }
        tracing::info!(%family, range = %family_range, "generated macros");

        match family {
            MacroFamily::Areuniq => summary.areuniq = Some(family_range),
            MacroFamily::Uniqenum => summary.uniqenum = Some(family_range),
        }
    }
    out.write_all(guard.end().as_bytes())?;
    out.flush()?;

    Ok(summary)
}

/// Largest `n` such that a header holding every selected macro from `start` to `n` stays
/// within `max_size` bytes. Stops at `end` if given. `None` if not even `start` fits.
pub fn last_fitting(
    printer: &mut C11MacroPrinter,
    guard: IncludeGuard,
    selection: MacroSelection,
    start: u32,
    end: Option<u32>,
    max_size: u64,
) -> Option<u32> {
    let mut size = (guard.start(&file_slug(0)).len() + guard.end().len()) as u64;
    let mut last = None;
    let mut n = start;

    while end.map_or(true, |end| n <= end) {
        for family in selection.families() {
            size += printer.macro_def(family, n).map_or(0, |def| def.size());
        }
        if size > max_size {
            break;
        }
        last = Some(n);
        n = match n.checked_add(1) {
            Some(next) => next,
            None => break,
        };
    }
    last
}

#[cfg(test)]
mod tests {
    use super::*;
    use uniqenum::options::{CodeOptions, IncludeGuardStyle};

    fn emit_to_string(selection: MacroSelection, range: NRange) -> (String, GenerationSummary) {
        let options = CodeOptions::default();
        let mut printer = C11MacroPrinter::new(&options);
        let guard = IncludeGuard::new(IncludeGuardStyle::Classic);
        let mut out = Vec::new();
        let summary = emit(&mut printer, guard, selection, range, &mut out).unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[test]
    fn writes_guarded_header() {
        let (text, summary) = emit_to_string(MacroSelection::all(), NRange::new(1, 2).unwrap());
        assert_eq!(
            text,
            "#ifndef UNIQ_a_H\n\
             #define UNIQ_a_H\n\
             #define areuniq2(a,b)((a)!=(b))\n\
             #define uniqenum1(d,a,b,e)enum d{a b}e\n\
             #define uniqenum2(f,a,c,b,d,g)enum f{a c,b d}g;_Static_assert(areuniq2(a,b),\"duplicate enum values: \"#f\" \"#g)\n\
             #endif\n"
        );
        assert_eq!(summary.areuniq, NRange::new(2, 2));
        assert_eq!(summary.uniqenum, NRange::new(1, 2));
        assert!(summary.files.is_empty());
    }

    #[test]
    fn skips_families_below_their_minimum() {
        let (text, summary) = emit_to_string(MacroSelection::all(), NRange::single(1));
        assert!(!text.contains("areuniq"));
        assert_eq!(summary.areuniq, None);
        assert_eq!(summary.uniqenum, Some(NRange::single(1)));
    }

    #[test]
    fn sizing_stops_at_the_cap() {
        let options = CodeOptions::default();
        let mut printer = C11MacroPrinter::new(&options);
        let guard = IncludeGuard::new(IncludeGuardStyle::Classic);
        let selection = MacroSelection::all();

        // Guards, `areuniq2` and `uniqenum1` to `uniqenum2`, as in `writes_guarded_header`.
        let (text, _) = emit_to_string(selection, NRange::new(1, 2).unwrap());
        let exact = text.len() as u64;

        assert_eq!(last_fitting(&mut printer, guard, selection, 1, None, exact), Some(2));
        assert_eq!(last_fitting(&mut printer, guard, selection, 1, None, exact - 1), Some(1));
        assert_eq!(last_fitting(&mut printer, guard, selection, 1, Some(1), exact), Some(1));
        assert_eq!(last_fitting(&mut printer, guard, selection, 1, None, 10), None);
    }
}
