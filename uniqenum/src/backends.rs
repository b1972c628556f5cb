//! Interface between option handling and the code generators.

use crate::errors::GenerationError;
use crate::options::GenerateOptions;
use crate::ranges::NRange;
use std::path::PathBuf;

/// What a generation run produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationSummary {
    /// `N` values for which `areuniq` macros were written, if any.
    pub areuniq: Option<NRange>,

    /// `N` values for which `uniqenum` macros were written, if any.
    pub uniqenum: Option<NRange>,

    /// Files created, in creation order. Empty when writing to stdout.
    pub files: Vec<PathBuf>,
}

pub trait Backend {
    fn generate(&self, options: &GenerateOptions) -> Result<GenerationSummary, GenerationError>;
}
