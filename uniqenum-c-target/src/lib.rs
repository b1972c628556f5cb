use crate::directory::DirectoryEmitter;
use crate::guards::IncludeGuard;
use crate::printer::C11MacroPrinter;
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::path::Path;
use uniqenum::backends::{Backend, GenerationSummary};
use uniqenum::errors::GenerationError;
use uniqenum::options::{GenerateOptions, MacroSelection, OutputTarget};
use uniqenum::ranges::NRange;

pub mod directory;
pub mod flat;
pub mod guards;
pub mod names;
pub mod printer;

/// Generates C11 headers.
pub struct C11Backend;

impl Backend for C11Backend {
    fn generate(&self, options: &GenerateOptions) -> Result<GenerationSummary, GenerationError> {
        options.validate()?;

        let mut printer = C11MacroPrinter::new(&options.code);
        let guard = IncludeGuard::new(options.include_guards);
        let selection = options.selected_families();

        if let OutputTarget::Directory(directory) = &options.output {
            return DirectoryEmitter::new(printer, guard, directory).emit(selection, options.range);
        }

        let range = match flat_range(&mut printer, guard, selection, options)? {
            Some(range) => range,
            None => return Ok(GenerationSummary::default()),
        };

        match &options.output {
            OutputTarget::File(path) => write_file(&mut printer, guard, selection, range, path),
            _ => {
                let stdout = io::stdout();
                let mut out = BufWriter::new(stdout.lock());
                flat::emit(&mut printer, guard, selection, range, &mut out)
                    .map_err(GenerationError::stdout)
            }
        }
    }
}

/// Sizes to write into a single header. An open range ends where the size cap is reached;
/// `None` if the first size already exceeds it.
fn flat_range(
    printer: &mut C11MacroPrinter,
    guard: IncludeGuard,
    selection: MacroSelection,
    options: &GenerateOptions,
) -> Result<Option<NRange>, GenerationError> {
    let requested = options.range;
    let max_size = match options.max_header_size {
        Some(max_size) => max_size,
        None => {
            return requested
                .end
                .map(|end| NRange::new(requested.start, end))
                .ok_or_else(|| GenerationError::unbounded_flat_output(options.output.kind()))
        }
    };

    let last = flat::last_fitting(
        printer,
        guard,
        selection,
        requested.start,
        requested.end,
        max_size,
    );
    match requested.end {
        Some(end) => {
            if last != Some(end) {
                tracing::warn!(
                    max_file_size = max_size,
                    start = requested.start,
                    end,
                    "header will exceed the size cap, writing every macro anyway"
                );
            }
            Ok(NRange::new(requested.start, end))
        }
        None => {
            if last.is_none() {
                tracing::warn!(
                    n = requested.start,
                    max_file_size = max_size,
                    "macro does not fit into a header, stopping"
                );
            }
            Ok(last.and_then(|end| NRange::new(requested.start, end)))
        }
    }
}

fn write_file(
    printer: &mut C11MacroPrinter,
    guard: IncludeGuard,
    selection: MacroSelection,
    range: NRange,
    path: &Path,
) -> Result<GenerationSummary, GenerationError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|error| GenerationError::io(parent, error))?;
        }
    }

    let file = File::create(path).map_err(|error| GenerationError::io(path, error))?;
    let mut summary = flat::emit(printer, guard, selection, range, &mut BufWriter::new(file))
        .map_err(|error| GenerationError::io(path, error))?;
    tracing::info!(path = %path.display(), "wrote header");

    summary.files.push(path.to_path_buf());
    Ok(summary)
}
