//! `clap`-derived command-line surface: the `percent` and `filter`
//! subcommands, argument validation matching the original tool's
//! "print a message and exit 0" policy for user errors, and the glue
//! that resolves shared geometry/preset/expression flags before
//! dispatching into [`crate::percent`]/[`crate::filter`].

use std::io::{self, Write};

use clap::{Args, Parser, Subcommand, ValueEnum};
use fs_err::File;

use crate::bag::resolve_geometry;
use crate::cover::Choice;
use crate::error::Error;
use crate::expr::{parse_wanted_saves, Ast};
use crate::filter::{self, FilterOptions, OutputMode};
use crate::percent::{self, PercentOptions};
use crate::presets;

#[derive(Debug, Parser)]
#[command(name = "pcsaves", version, about = "Derives and filters achievable saves from a perfect-clear path table")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
    /// Trace level for the logging framework.
    #[arg(long = "trace", value_enum, global = true, default_value_t = TraceLevel::Warn)]
    pub trace_level: TraceLevel,
}

/// The trace level / verbosity for the logging framework.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum TraceLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<TraceLevel> for log::LevelFilter {
    fn from(level: TraceLevel) -> Self {
        match level {
            TraceLevel::Off => Self::Off,
            TraceLevel::Error => Self::Error,
            TraceLevel::Warn => Self::Warn,
            TraceLevel::Info => Self::Info,
            TraceLevel::Debug => Self::Debug,
            TraceLevel::Trace => Self::Trace,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Give the percents of saves using the path table with a wanted-save expression.
    Percent(PercentArgs),
    /// Filter path-table fumens that don't meet a wanted-save expression.
    Filter(FilterArgs),
}

/// Geometry, I/O and preset flags shared by both subcommands.
#[derive(Debug, Args)]
pub struct SharedArgs {
    /// Pieces in the build of the setup. Ignored if -l has '-' in it.
    #[arg(short = 'b', long = "build")]
    pub build: Option<String>,
    /// Leftover pieces, supports the `X-Y` form (X held, Y used from next bag).
    #[arg(short = 'l', long = "leftover", default_value = "")]
    pub leftover: String,
    /// PC number for the setup, alternative to --leftover-length.
    #[arg(long = "pc-num")]
    pub pc_num: Option<i64>,
    /// Length of leftover, alternative to --pc-num.
    #[arg(long = "leftover-length")]
    pub leftover_length: Option<i64>,
    /// Height of the PC.
    #[arg(long = "height", default_value_t = 4)]
    pub height: i64,
    /// Width of the PC.
    #[arg(long = "width", default_value_t = 10)]
    pub width: i64,
    /// Number of hold.
    #[arg(long = "hold", default_value_t = 1)]
    pub hold: i64,
    /// Path-table CSV filepath.
    #[arg(short = 'f', long = "path-file", default_value = "output/path.csv")]
    pub path_file: String,
    /// Log output filepath.
    #[arg(long = "log-path", default_value = "output/last_output.txt")]
    pub log_path: String,
    /// Path to the JSON file with preset wanted saves.
    #[arg(long = "saves-path", default_value = "saves.json")]
    pub saves_path: String,
    /// Don't print the log output to the terminal too.
    #[arg(long = "no-print")]
    pub no_print: bool,
}

#[derive(Debug, Args)]
pub struct PercentArgs {
    /// Wanted-save expression(s); required unless -k or -a is given.
    #[arg(short = 'w', long = "wanted", num_args = 1..)]
    pub wanted: Vec<String>,
    /// Preset key(s) in the saves JSON; required unless -w or -a is given.
    #[arg(short = 'k', long = "key", num_args = 1..)]
    pub key: Vec<String>,
    /// Output all saves and their percents instead of specific wanted saves.
    #[arg(short = 'a', long = "all")]
    pub all: bool,
    /// Prioritize the first wanted save that matches instead of listing each separately.
    #[arg(long = "best-save")]
    pub best_save: bool,
    /// Tree depth of pieces to break percents down by.
    #[arg(long = "tree-depth", default_value_t = 0)]
    pub tree_depth: usize,
    /// Include the queues that failed to achieve any wanted save.
    #[arg(long = "fails")]
    pub fails: bool,
    /// Report percents out of solvable setups only, instead of all rows.
    #[arg(long = "over-solves")]
    pub over_solves: bool,
    #[command(flatten)]
    pub shared: SharedArgs,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SolveMode {
    Minimal,
    Unique,
    File,
}

#[derive(Debug, Args)]
pub struct FilterArgs {
    /// Wanted-save expression(s); required unless -k is given.
    #[arg(short = 'w', long = "wanted", num_args = 1..)]
    pub wanted: Vec<String>,
    /// Preset key(s) in the saves JSON; required unless -w is given.
    #[arg(short = 'k', long = "key", num_args = 1..)]
    pub key: Vec<String>,
    /// Index of -k/-w to filter by (negative indexes from the end).
    #[arg(short = 'i', long = "index", default_value_t = 0)]
    pub index: i64,
    /// Try every wanted save in order, keeping the first that matches.
    #[arg(long = "best-save")]
    pub best_save: bool,
    /// Report cumulative coverage of the minimal set instead of raw coverage.
    #[arg(short = 'c', long = "cumulative")]
    pub cumulative: bool,
    /// How to emit the solve: a minimal covering set, a unique combined fumen, or a filtered CSV.
    #[arg(short = 's', long = "solve", value_enum, default_value_t = SolveMode::Minimal)]
    pub solve: SolveMode,
    /// Output filepath for the filtered path table, used by `-s file`.
    #[arg(long = "filtered-path", default_value = "output/filtered_path.txt")]
    pub filtered_path: String,
    /// Shorten the output fumen URL via an external service if possible.
    #[arg(short = 't', long = "tinyurl")]
    pub tinyurl: bool,
    #[command(flatten)]
    pub shared: SharedArgs,
}

fn resolve_wanted_saves(wanted: &[String], keys: &[String], saves_path: &str) -> Result<Vec<(Ast, String)>, Error> {
    let mut raw = Vec::new();
    if !keys.is_empty() {
        let presets = presets::load_presets(saves_path)?;
        raw.extend(presets::resolve_keys(&presets, keys)?);
    }
    raw.extend(wanted.iter().cloned());
    parse_wanted_saves(&raw)
}

fn check_dimensions(width: i64, height: i64) -> Result<(), Error> {
    if (width * height) % 4 != 0 {
        return Err(Error::Validation(
            "Width and height does not produce an area divisible by 4 necessary for a PC".to_string(),
        ));
    }
    Ok(())
}

/// Prompts the operator to pick between two candidate minimal sets' symmetric
/// differences, for use with [`crate::cover::find_best_set`].
pub fn prompt_choice(first_only: &[&str], second_only: &[&str]) -> Choice {
    println!("Multiple minimal sets found of the same size.");
    println!("1) unique to first:  {}", first_only.join(", "));
    println!("2) unique to second: {}", second_only.join(", "));
    loop {
        print!("Choose 1 or 2: ");
        let _ = io::stdout().flush();
        let mut line = String::new();
        if io::stdin().read_line(&mut line).is_err() {
            return Choice::First;
        }
        match line.trim() {
            "1" => return Choice::First,
            "2" => return Choice::Second,
            _ => println!("Please enter 1 or 2."),
        }
    }
}

fn run_percent(args: &PercentArgs) -> Result<(), Error> {
    if args.key.is_empty() && args.wanted.is_empty() && !args.all {
        return Err(Error::Validation("Expected -k, -w, or -a to be set".to_string()));
    }
    check_dimensions(args.shared.width, args.shared.height)?;

    let geometry = resolve_geometry(
        &args.shared.leftover,
        args.shared.leftover_length,
        args.shared.build.as_deref(),
        args.shared.pc_num,
        args.shared.hold,
    )?;
    let mut log_file = File::create(&args.shared.log_path)?;

    if args.all {
        let options = PercentOptions {
            console_print: !args.shared.no_print,
            include_fails: args.fails,
            over_solves: args.over_solves,
            all_saves: true,
            best_save: false,
            tree_depth: args.tree_depth,
        };
        return percent::percent(
            &args.shared.path_file,
            &[],
            &[],
            &geometry.build,
            &geometry.leftover,
            args.shared.width,
            args.shared.height,
            args.shared.hold,
            &mut log_file,
            &options,
        );
    }

    let parsed = resolve_wanted_saves(&args.wanted, &args.key, &args.shared.saves_path)?;
    let asts: Vec<Ast> = parsed.iter().map(|(ast, _)| ast.clone()).collect();
    let labels: Vec<String> = parsed.iter().map(|(_, label)| label.clone()).collect();
    let options = PercentOptions {
        console_print: !args.shared.no_print,
        include_fails: args.fails,
        over_solves: args.over_solves,
        all_saves: false,
        best_save: args.best_save,
        tree_depth: args.tree_depth,
    };
    percent::percent(
        &args.shared.path_file,
        &asts,
        &labels,
        &geometry.build,
        &geometry.leftover,
        args.shared.width,
        args.shared.height,
        args.shared.hold,
        &mut log_file,
        &options,
    )
}

fn run_filter(args: &FilterArgs) -> Result<(), Error> {
    if args.key.is_empty() && args.wanted.is_empty() {
        return Err(Error::Validation("Expected -k or -w to be set".to_string()));
    }
    check_dimensions(args.shared.width, args.shared.height)?;

    let geometry = resolve_geometry(
        &args.shared.leftover,
        args.shared.leftover_length,
        args.shared.build.as_deref(),
        args.shared.pc_num,
        args.shared.hold,
    )?;
    let mut log_file = File::create(&args.shared.log_path)?;

    let parsed = resolve_wanted_saves(&args.wanted, &args.key, &args.shared.saves_path)?;
    let asts: Vec<Ast> = parsed.iter().map(|(ast, _)| ast.clone()).collect();
    let labels: Vec<String> = parsed.iter().map(|(_, label)| label.clone()).collect();

    let (selected_asts, selected_labels): (Vec<Ast>, Vec<String>) = if args.best_save {
        (asts, labels)
    } else {
        let len = asts.len() as i64;
        let resolved = if args.index < 0 { len + args.index } else { args.index };
        if resolved < 0 || resolved >= len {
            return Err(Error::Validation("Index out of bounds for wanted saves".to_string()));
        }
        let i = resolved as usize;
        (vec![asts[i].clone()], vec![labels[i].clone()])
    };

    let output_mode = match args.solve {
        SolveMode::Minimal => OutputMode::Minimal,
        SolveMode::Unique => OutputMode::Unique,
        SolveMode::File => OutputMode::File,
    };
    let options = FilterOptions {
        output_mode,
        cumulative: args.cumulative,
        console_print: !args.shared.no_print,
        tinyurl: args.tinyurl,
    };

    filter::filter(
        &args.shared.path_file,
        Some(&args.filtered_path),
        &selected_asts,
        &selected_labels,
        &geometry.build,
        &geometry.leftover,
        args.shared.width,
        args.shared.height,
        args.shared.hold,
        &mut log_file,
        &options,
        prompt_choice,
    )
    .map(|_| ())
}

/// Runs the parsed CLI invocation.
///
/// # Errors
///
/// Returns whatever [`Error`] the underlying engine raises; the caller is
/// expected to apply the exit-code policy (recoverable user errors are
/// logged and do not fail the process, see [`Error::is_recoverable`]).
pub fn run(cli: &Cli) -> Result<(), Error> {
    match &cli.command {
        Command::Percent(args) => run_percent(args),
        Command::Filter(args) => run_filter(args),
    }
}
