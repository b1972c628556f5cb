//! Options for controlling generator behavior.

use crate::errors::GenerationError;
use crate::format::Template;
use crate::ranges::RequestedRange;
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Default size cap of a generated header in directory output.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 256 * 1024;

/// Default number of decimal digits per subdirectory level in directory output.
pub const DEFAULT_PREFIX_LENGTH: usize = 2;

/// References available in macro name templates.
pub const NAME_REFS: &[&str] = &["n"];

/// References available in the assertion message when asserting once per enum.
pub const ASSERT_ONCE_REFS: &[&str] = &["n", "name", "type"];

/// References available in the assertion message when asserting once per pair.
pub const ASSERT_ALL_REFS: &[&str] = &["enumerator1", "enumerator2"];

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MacroFamily {
    Areuniq,
    Uniqenum,
}

impl MacroFamily {
    pub fn name(self) -> &'static str {
        match self {
            MacroFamily::Areuniq => "areuniq",
            MacroFamily::Uniqenum => "uniqenum",
        }
    }

    /// Smallest `N` for which the family has a macro.
    pub fn min_n(self) -> u32 {
        match self {
            MacroFamily::Areuniq => 2,
            MacroFamily::Uniqenum => 1,
        }
    }
}

impl Display for MacroFamily {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for MacroFamily {
    type Err = GenerationError;

    fn from_str(name: &str) -> Result<MacroFamily, GenerationError> {
        match name.trim() {
            "areuniq" => Ok(MacroFamily::Areuniq),
            "uniqenum" => Ok(MacroFamily::Uniqenum),
            other => Err(GenerationError::unknown_macro_family(other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MacroSelection {
    pub areuniq: bool,
    pub uniqenum: bool,
}

impl MacroSelection {
    pub fn all() -> MacroSelection {
        MacroSelection {
            areuniq: true,
            uniqenum: true,
        }
    }

    /// Parses a comma-separated list of family names.
    pub fn parse_list(list: &str) -> Result<MacroSelection, GenerationError> {
        let mut selection = MacroSelection {
            areuniq: false,
            uniqenum: false,
        };
        for name in list.split(',').filter(|name| !name.trim().is_empty()) {
            match name.parse()? {
                MacroFamily::Areuniq => selection.areuniq = true,
                MacroFamily::Uniqenum => selection.uniqenum = true,
            }
        }
        if !selection.areuniq && !selection.uniqenum {
            return Err(GenerationError::no_macro_family_selected());
        }
        Ok(selection)
    }

    /// `uniqenum` macros invoke `areuniq` macros, so selecting the former pulls the latter in
    /// unless dependencies are omitted.
    pub fn with_dependencies(self, policy: DependencyPolicy) -> MacroSelection {
        match policy {
            DependencyPolicy::Include if self.uniqenum => MacroSelection {
                areuniq: true,
                ..self
            },
            _ => self,
        }
    }

    pub fn families(self) -> impl Iterator<Item = MacroFamily> {
        let areuniq = Some(MacroFamily::Areuniq).filter(|_| self.areuniq);
        let uniqenum = Some(MacroFamily::Uniqenum).filter(|_| self.uniqenum);
        areuniq.into_iter().chain(uniqenum)
    }
}

impl Default for MacroSelection {
    fn default() -> MacroSelection {
        MacroSelection::all()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DependencyPolicy {
    Include,
    Omit,
}

impl Default for DependencyPolicy {
    fn default() -> DependencyPolicy {
        DependencyPolicy::Include
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncludeGuardStyle {
    /// `#ifndef UNIQ_<slug>_H` / `#define` / `#endif`.
    Classic,
    PragmaOnce,
    Omit,
}

impl Default for IncludeGuardStyle {
    fn default() -> IncludeGuardStyle {
        IncludeGuardStyle::Classic
    }
}

impl FromStr for IncludeGuardStyle {
    type Err = String;

    fn from_str(name: &str) -> Result<IncludeGuardStyle, String> {
        match name {
            "classic" => Ok(IncludeGuardStyle::Classic),
            "pragma-once" => Ok(IncludeGuardStyle::PragmaOnce),
            "omit" => Ok(IncludeGuardStyle::Omit),
            other => Err(format!("unknown include guard style `{}`", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssertMode {
    /// One `_Static_assert` per enum, on the product of all pairwise differences.
    Once,

    /// One `_Static_assert` per pair of enumerators.
    All,
}

impl AssertMode {
    pub fn refs(self) -> &'static [&'static str] {
        match self {
            AssertMode::Once => ASSERT_ONCE_REFS,
            AssertMode::All => ASSERT_ALL_REFS,
        }
    }

    pub fn default_message(self) -> &'static str {
        match self {
            AssertMode::Once => "duplicate enum values: {name} {type}",
            AssertMode::All => "duplicate enum values: {enumerator1} and {enumerator2}",
        }
    }
}

impl FromStr for AssertMode {
    type Err = String;

    fn from_str(name: &str) -> Result<AssertMode, String> {
        match name {
            "once" => Ok(AssertMode::Once),
            "all" => Ok(AssertMode::All),
            other => Err(format!("unknown assertion mode `{}`", other)),
        }
    }
}

#[derive(Clone, Debug)]
pub struct AssertOptions {
    pub mode: AssertMode,
    pub message: Template,
}

impl AssertOptions {
    pub fn new(mode: AssertMode, message: Option<&str>) -> Result<AssertOptions, GenerationError> {
        let message = Template::parse(message.unwrap_or_else(|| mode.default_message()))?;
        message.validate(mode.refs())?;
        Ok(AssertOptions { mode, message })
    }
}

impl Default for AssertOptions {
    fn default() -> AssertOptions {
        let mode = AssertMode::Once;
        AssertOptions {
            mode,
            message: Template::parse(mode.default_message())
                .expect("default assertion message is a valid template"),
        }
    }
}

/// Everything that affects the text of the generated macros.
#[derive(Clone, Debug)]
pub struct CodeOptions {
    pub areuniq_name: Template,
    pub uniqenum_name: Template,
    pub assert: AssertOptions,

    /// Keep C keywords out of macro parameter names. The preprocessor does not mind them, but
    /// they make expanded code harder to read.
    pub avoid_keywords: bool,
}

impl CodeOptions {
    pub fn with_names(
        areuniq_name: &str,
        uniqenum_name: &str,
    ) -> Result<CodeOptions, GenerationError> {
        let areuniq_name = Template::parse(areuniq_name)?;
        let uniqenum_name = Template::parse(uniqenum_name)?;
        for template in &[&areuniq_name, &uniqenum_name] {
            template.validate(NAME_REFS)?;
            check_macro_name(&template.render(&[("n", crate::format::Arg::Text("2"))]))?;
        }
        Ok(CodeOptions {
            areuniq_name,
            uniqenum_name,
            ..CodeOptions::default()
        })
    }
}

impl Default for CodeOptions {
    fn default() -> CodeOptions {
        CodeOptions {
            areuniq_name: Template::parse("areuniq{n}").expect("default name is a valid template"),
            uniqenum_name: Template::parse("uniqenum{n}")
                .expect("default name is a valid template"),
            assert: AssertOptions::default(),
            avoid_keywords: false,
        }
    }
}

lazy_static! {
    static ref IDENTIFIER_RE: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

/// Checks that a rendered macro name can be `#define`d.
pub fn check_macro_name(name: &str) -> Result<(), GenerationError> {
    if IDENTIFIER_RE.is_match(name) {
        Ok(())
    } else {
        Err(GenerationError::invalid_macro_name(name))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OutputTarget {
    Stdout,
    File(PathBuf),
    Directory(DirectoryOptions),
}

impl OutputTarget {
    pub fn kind(&self) -> &'static str {
        match self {
            OutputTarget::Stdout => "stdout",
            OutputTarget::File(_) => "file",
            OutputTarget::Directory(_) => "directory",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DirectoryOptions {
    pub path: PathBuf,

    /// Size cap of a header in bytes. A single macro larger than this is still written to a
    /// header of its own when the range is bounded.
    pub max_file_size: u64,

    /// Number of decimal digits of `N` per subdirectory level.
    pub prefix_length: usize,
}

impl DirectoryOptions {
    pub fn new(path: impl Into<PathBuf>) -> DirectoryOptions {
        DirectoryOptions {
            path: path.into(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            prefix_length: DEFAULT_PREFIX_LENGTH,
        }
    }
}

#[derive(Clone, Debug)]
pub struct GenerateOptions {
    pub range: RequestedRange,
    pub macros: MacroSelection,
    pub dependencies: DependencyPolicy,
    pub include_guards: IncludeGuardStyle,
    pub code: CodeOptions,
    pub output: OutputTarget,

    /// Size cap in bytes of a stdout or file header. An open range ends at the last size that
    /// fits; a bounded range is written whole, with a warning if it does not fit.
    pub max_header_size: Option<u64>,
}

impl GenerateOptions {
    pub fn new(range: RequestedRange) -> GenerateOptions {
        GenerateOptions {
            range,
            macros: MacroSelection::default(),
            dependencies: DependencyPolicy::default(),
            include_guards: IncludeGuardStyle::default(),
            code: CodeOptions::default(),
            output: OutputTarget::Stdout,
            max_header_size: None,
        }
    }

    /// Families to generate once dependencies are taken into account.
    pub fn selected_families(&self) -> MacroSelection {
        self.macros.with_dependencies(self.dependencies)
    }

    /// Checks combinations of options that cannot be expressed by the types alone.
    pub fn validate(&self) -> Result<(), GenerationError> {
        if !self.macros.areuniq && !self.macros.uniqenum {
            return Err(GenerationError::no_macro_family_selected());
        }
        if !self.range.is_bounded() && self.max_header_size.is_none() {
            if let OutputTarget::Stdout | OutputTarget::File(_) = self.output {
                return Err(GenerationError::unbounded_flat_output(self.output.kind()));
            }
        }
        Ok(())
    }
}
