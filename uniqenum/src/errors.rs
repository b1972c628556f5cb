//! Generation error definitions.

use codespan_reporting::diagnostic::Diagnostic;
use std::fmt::{self, Display, Formatter};
use std::io;
use std::path::Path;

#[derive(Debug)]
pub struct GenerationError {
    /// Unique code identifying a class of errors.
    pub code: &'static str,

    /// Short (single-line) message describing the problem.
    pub message: String,

    /// Useful information related to the error.
    pub notes: Vec<String>,
}

impl GenerationError {
    fn new(code: &'static str, message: impl Into<String>) -> GenerationError {
        GenerationError {
            code,
            message: message.into(),
            notes: Vec::new(),
        }
    }

    fn with_note(mut self, note: impl Into<String>) -> GenerationError {
        self.notes.push(note.into());
        self
    }

    pub fn to_codespan<FileId>(&self) -> Diagnostic<FileId> {
        Diagnostic::error()
            .with_code(self.code)
            .with_message(&self.message)
            .with_notes(self.notes.clone())
    }
}

impl Display for GenerationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "error[{}]: {}", self.code, self.message)?;
        for note in &self.notes {
            write!(f, "\n  = {}", note)?;
        }
        Ok(())
    }
}

impl std::error::Error for GenerationError {}

// Error constructors.
impl GenerationError {
    pub fn invalid_index(index: i64) -> GenerationError {
        GenerationError::new(
            "E0001",
            format!("identifier index must be >= 0, got {}", index),
        )
    }

    pub fn malformed_range(text: &str) -> GenerationError {
        GenerationError::new("E0002", format!("malformed range `{}`", text))
            .with_note("expected `N`, `START-END` or `START-`")
    }

    pub fn reversed_range(start: u32, end: u32) -> GenerationError {
        GenerationError::new(
            "E0002",
            format!("range end ({}) must be >= range start ({})", end, start),
        )
    }

    pub fn unknown_macro_family(name: &str) -> GenerationError {
        GenerationError::new("E0003", format!("unknown macro family `{}`", name))
            .with_note("known families are `areuniq` and `uniqenum`")
    }

    pub fn no_macro_family_selected() -> GenerationError {
        GenerationError::new("E0003", "at least one macro family must be selected")
    }

    pub fn unbounded_flat_output(target: &str) -> GenerationError {
        GenerationError::new(
            "E0004",
            format!("output target `{}` requires a finite range end", target),
        )
        .with_note("open-ended ranges need directory output or `--max-file-size`")
    }

    pub fn io(path: &Path, error: io::Error) -> GenerationError {
        GenerationError::new(
            "E0005",
            format!("could not write `{}`: {}", path.display(), error),
        )
    }

    pub fn stdout(error: io::Error) -> GenerationError {
        GenerationError::new("E0005", format!("could not write to stdout: {}", error))
    }

    pub fn malformed_template(template: &str, reason: &str) -> GenerationError {
        GenerationError::new("E0006", format!("malformed template `{}`", template))
            .with_note(reason)
    }

    pub fn unknown_template_reference(
        template: &str,
        reference: &str,
        allowed: &[&str],
    ) -> GenerationError {
        let allowed: Vec<String> = allowed.iter().map(|r| format!("{{{}}}", r)).collect();
        GenerationError::new(
            "E0006",
            format!(
                "template `{}` refers to unknown value `{{{}}}`",
                template, reference
            ),
        )
        .with_note(format!("available here: {}", allowed.join(", ")))
    }

    pub fn invalid_macro_name(name: &str) -> GenerationError {
        GenerationError::new(
            "E0007",
            format!("macro name `{}` is not a valid C identifier", name),
        )
    }

    pub fn invalid_number(option: &str, value: &str) -> GenerationError {
        GenerationError::new(
            "E0008",
            format!("invalid number `{}` for `{}`", value, option),
        )
    }
}
