use clap::{value_t, App, AppSettings, Arg, ArgMatches, SubCommand};
use codespan_reporting::files::SimpleFiles;
use codespan_reporting::term::termcolor::{ColorChoice, StandardStream};
use std::ffi::OsString;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;
use uniqenum::backends::Backend;
use uniqenum::errors::GenerationError;
use uniqenum::ident::{antecedent, IdentAllocator};
use uniqenum::options::{
    AssertMode, AssertOptions, CodeOptions, DependencyPolicy, DirectoryOptions, GenerateOptions,
    IncludeGuardStyle, MacroSelection, OutputTarget, DEFAULT_MAX_FILE_SIZE,
    DEFAULT_PREFIX_LENGTH,
};
use uniqenum::ranges::RequestedRange;
use uniqenum_c_target::C11Backend;

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment variable holding a `tracing` filter, e.g. `UNIQENUM_LOG=debug`.
pub const LOG_ENV: &str = "UNIQENUM_LOG";

pub struct Config {
    /// The expected behavior.
    pub target: Target,

    /// Log progress at `info` level unless `UNIQENUM_LOG` says otherwise.
    pub verbose: bool,

    /// A flag for integration tests: this allows to better capture output. There is
    /// no way to set it through command-line.
    pub plaintext_errors: bool,
}

pub enum Target {
    /// Generate macros and pass them to a backend.
    Generate(GenerateOptions, Box<dyn Backend>),

    /// Print the identifiers at the given indices.
    Ident {
        indices: Vec<String>,
        allow_keywords: bool,
    },

    /// Print the raw index of each name.
    Antecedent(Vec<String>),
}

fn app<'a>(max_file_size: &'a str, prefix_length: &'a str) -> App<'a, 'a> {
    App::new("uniqenum")
        .version(VERSION)
        .about("Generates C macros declaring enums with compile-time checked unique values")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .long("verbose")
                .help("Report progress on stderr")
                .global(true),
        )
        .subcommand(
            SubCommand::with_name("generate")
                .about("Generates areuniq and uniqenum macros for a range of sizes")
                .arg(
                    Arg::with_name("RANGE")
                        .help("Sizes to generate: N, START-END or START- (needs -d or --max-file-size)")
                        .required(true)
                        .index(1),
                )
                .arg(
                    Arg::with_name("macros")
                        .long("macros")
                        .takes_value(true)
                        .default_value("areuniq,uniqenum")
                        .help("Comma-separated macro families to generate"),
                )
                .arg(
                    Arg::with_name("no-dependencies")
                        .long("no-dependencies")
                        .help("Do not add areuniq macros needed by the selected uniqenum macros"),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .help("Write a single header to this file instead of stdout"),
                )
                .arg(
                    Arg::with_name("directory")
                        .short("d")
                        .long("directory")
                        .takes_value(true)
                        .conflicts_with("output")
                        .help("Write a tree of size-capped headers into this directory"),
                )
                .arg(
                    Arg::with_name("max-file-size")
                        .long("max-file-size")
                        .takes_value(true)
                        .value_name("BYTES")
                        .default_value(max_file_size)
                        .help(
                            "Size cap of a header; with -o or stdout it only applies when given, \
                             and lets an open range end where the cap is reached",
                        ),
                )
                .arg(
                    Arg::with_name("prefix-length")
                        .long("prefix-length")
                        .takes_value(true)
                        .value_name("DIGITS")
                        .default_value(prefix_length)
                        .help("Decimal digits per subdirectory level in directory output"),
                )
                .arg(
                    Arg::with_name("include-guard")
                        .long("include-guard")
                        .takes_value(true)
                        .possible_values(&["classic", "pragma-once", "omit"])
                        .default_value("classic")
                        .help("Include guard style"),
                )
                .arg(
                    Arg::with_name("areuniq-name")
                        .long("areuniq-name")
                        .takes_value(true)
                        .value_name("TEMPLATE")
                        .default_value("areuniq{n}")
                        .help("Name of the areuniq macros, {n} is the size"),
                )
                .arg(
                    Arg::with_name("uniqenum-name")
                        .long("uniqenum-name")
                        .takes_value(true)
                        .value_name("TEMPLATE")
                        .default_value("uniqenum{n}")
                        .help("Name of the uniqenum macros, {n} is the size"),
                )
                .arg(
                    Arg::with_name("assert")
                        .long("assert")
                        .takes_value(true)
                        .possible_values(&["once", "all"])
                        .default_value("once")
                        .help("One assertion per enum, or one per pair of enumerators"),
                )
                .arg(
                    Arg::with_name("assert-message")
                        .long("assert-message")
                        .takes_value(true)
                        .value_name("TEMPLATE")
                        .help(
                            "Assertion message; refers to {n}, {name} and {type} with \
                             --assert once, or {enumerator1} and {enumerator2} with --assert all",
                        ),
                )
                .arg(
                    Arg::with_name("avoid-keywords")
                        .long("avoid-keywords")
                        .help("Keep C keywords out of macro parameter names"),
                ),
        )
        .subcommand(
            SubCommand::with_name("tools")
                .about("Inspects the identifier allocator")
                .setting(AppSettings::SubcommandRequiredElseHelp)
                .subcommand(
                    SubCommand::with_name("ident")
                        .about("Prints the identifiers at the given indices")
                        .setting(AppSettings::AllowNegativeNumbers)
                        .arg(
                            Arg::with_name("allow-keywords")
                                .long("allow-keywords")
                                .help("Do not skip C keywords"),
                        )
                        .arg(
                            Arg::with_name("INDEX")
                                .required(true)
                                .multiple(true)
                                .allow_hyphen_values(true)
                                .index(1),
                        ),
                )
                .subcommand(
                    SubCommand::with_name("antecedent")
                        .about("Prints the raw index of each identifier, or - if there is none")
                        .arg(
                            Arg::with_name("NAME")
                                .required(true)
                                .multiple(true)
                                .allow_hyphen_values(true)
                                .index(1),
                        ),
                ),
        )
}

impl Config {
    /// Parses the process arguments. Exits on usage errors.
    pub fn new() -> Result<Config, GenerationError> {
        Config::from_args(std::env::args_os())
    }

    pub fn from_args<I, T>(args: I) -> Result<Config, GenerationError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        let max_file_size = DEFAULT_MAX_FILE_SIZE.to_string();
        let prefix_length = DEFAULT_PREFIX_LENGTH.to_string();
        let matches = app(&max_file_size, &prefix_length).get_matches_from(args);
        let verbose = matches.is_present("verbose");

        let target = match matches.subcommand() {
            ("generate", Some(matches)) => {
                Target::Generate(generate_options(matches)?, Box::new(C11Backend))
            }
            ("tools", Some(matches)) => match matches.subcommand() {
                ("ident", Some(matches)) => Target::Ident {
                    indices: values(matches, "INDEX"),
                    allow_keywords: matches.is_present("allow-keywords"),
                },
                ("antecedent", Some(matches)) => Target::Antecedent(values(matches, "NAME")),
                _ => unreachable!(),
            },
            _ => unreachable!(),
        };

        Ok(Config {
            target,
            verbose,
            plaintext_errors: false,
        })
    }
}

fn values(matches: &ArgMatches, name: &str) -> Vec<String> {
    matches
        .values_of(name)
        .map(|values| values.map(String::from).collect())
        .unwrap_or_default()
}

fn value<'a>(matches: &'a ArgMatches, name: &str) -> &'a str {
    matches.value_of(name).unwrap_or("")
}

fn number<T: FromStr>(matches: &ArgMatches, name: &str) -> Result<T, GenerationError> {
    let text = value(matches, name);
    text.parse()
        .map_err(|_| GenerationError::invalid_number(name, text))
}

fn generate_options(matches: &ArgMatches) -> Result<GenerateOptions, GenerationError> {
    let range: RequestedRange = value(matches, "RANGE").parse()?;
    let mut options = GenerateOptions::new(range);

    options.macros = MacroSelection::parse_list(value(matches, "macros"))?;
    if matches.is_present("no-dependencies") {
        options.dependencies = DependencyPolicy::Omit;
    }
    options.include_guards =
        value_t!(matches, "include-guard", IncludeGuardStyle).unwrap_or_else(|e| e.exit());

    let mut code = CodeOptions::with_names(
        value(matches, "areuniq-name"),
        value(matches, "uniqenum-name"),
    )?;
    let mode = value_t!(matches, "assert", AssertMode).unwrap_or_else(|e| e.exit());
    code.assert = AssertOptions::new(mode, matches.value_of("assert-message"))?;
    code.avoid_keywords = matches.is_present("avoid-keywords");
    options.code = code;

    options.output = if let Some(path) = matches.value_of("directory") {
        let mut directory = DirectoryOptions::new(path);
        directory.max_file_size = number(matches, "max-file-size")?;
        directory.prefix_length = number(matches, "prefix-length")?;
        if directory.prefix_length == 0 {
            return Err(GenerationError::invalid_number("prefix-length", "0"));
        }
        OutputTarget::Directory(directory)
    } else {
        if matches.occurrences_of("max-file-size") > 0 {
            options.max_header_size = Some(number(matches, "max-file-size")?);
        }
        match matches.value_of("output") {
            Some(path) => OutputTarget::File(PathBuf::from(path)),
            None => OutputTarget::Stdout,
        }
    };

    Ok(options)
}

/// Installs a subscriber writing log events to stderr.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}

#[derive(Debug, PartialEq)]
pub enum RunResult {
    Ok,
    UsageError,
    GenerationError,
}

/// Executes the configured command.
pub fn run(config: Config) -> RunResult {
    let plaintext_errors = config.plaintext_errors;
    let result = match config.target {
        Target::Generate(options, backend) => backend.generate(&options).map(|summary| {
            tracing::info!(
                areuniq = ?summary.areuniq,
                uniqenum = ?summary.uniqenum,
                files = summary.files.len(),
                "generation finished"
            );
        }),
        Target::Ident {
            indices,
            allow_keywords,
        } => print_idents(&indices, allow_keywords),
        Target::Antecedent(names) => {
            for name in &names {
                match antecedent(name) {
                    Some(raw) => println!("{}", raw),
                    None => println!("-"),
                }
            }
            Ok(())
        }
    };

    match result {
        Ok(()) => RunResult::Ok,
        Err(error) => {
            report_errors(&[error], plaintext_errors);
            RunResult::GenerationError
        }
    }
}

fn print_idents(indices: &[String], allow_keywords: bool) -> Result<(), GenerationError> {
    let mut idents = if allow_keywords {
        IdentAllocator::unreserved()
    } else {
        IdentAllocator::new()
    };
    for index in indices {
        let index: i64 = index
            .parse()
            .map_err(|_| GenerationError::invalid_number("INDEX", index))?;
        println!("{}", idents.ident(index)?);
    }
    Ok(())
}

pub fn report_errors(errors: &[GenerationError], plaintext_stdout: bool) {
    if !plaintext_stdout {
        let files = SimpleFiles::<String, String>::new();
        let writer = StandardStream::stderr(ColorChoice::Auto);
        let config = codespan_reporting::term::Config::default();

        for error in errors {
            let emitted = codespan_reporting::term::emit(
                &mut writer.lock(),
                &config,
                &files,
                &error.to_codespan(),
            );
            if emitted.is_err() {
                eprintln!("{}", error);
            }
        }
    } else {
        for error in errors {
            println!("{:?}", error);
        }
    }
}
