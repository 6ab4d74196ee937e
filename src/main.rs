use std::fs;
use std::path::{Path, PathBuf};
use std::thread::sleep;
use std::time::Duration;

use clap::{Parser, Subcommand};
use colored::Colorize;
use miette::{bail, miette, IntoDiagnostic, Result};
use tracing::debug;
use tracing_subscriber::{fmt, EnvFilter};

use mailroom::output::Output;
use mailroom::{dprintln, env, level};
use mailroom::{
    Channel, Debugger, DebuggerOptions, Effect, Fault, Level, ParsedProgram, Recorder,
    RunOptions, RunState, Score, Session, Silent, Stats, Status, Verdict, LEVELS,
};

/// Mailroom runs worker-and-inbox assembly programs against puzzle levels.
#[derive(Parser)]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Quickly provide a `.hrm` file to run against the default level
    path: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Run a `.hrm` program against a level and report the result
    Run {
        /// `.hrm` file to run
        name: PathBuf,
        #[command(flatten)]
        level: LevelArgs,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
        /// Halt once this many faults have occurred
        #[arg(long)]
        fault_limit: Option<u32>,
        /// Halt as soon as the outbox matches the expected output
        #[arg(long)]
        halt_on_success: bool,
        /// Stop after executing this many instructions
        #[arg(long)]
        step_limit: Option<u64>,
        /// Pause between instructions, in milliseconds
        #[arg(long)]
        delay: Option<u64>,
    },
    /// Run a `.hrm` program with the step debugger
    Debug {
        /// `.hrm` file to run
        name: PathBuf,
        #[command(flatten)]
        level: LevelArgs,
        /// Read debugger commands from argument
        #[arg(short, long)]
        command: Option<String>,
        /// Produce minimal output, suited for blackbox tests
        #[arg(short, long)]
        minimal: bool,
    },
    /// Check that programs parse and fit a level, without running them
    Check {
        /// Files or glob patterns, such as `solutions/*.hrm`
        #[arg(required = true)]
        patterns: Vec<String>,
        /// Level to check against
        #[arg(short, long, default_value = DEFAULT_LEVEL)]
        level: String,
    },
    /// List every level
    Levels,
}

#[derive(clap::Args)]
struct LevelArgs {
    /// Level to play, see `mailroom levels`
    #[arg(short, long, default_value = DEFAULT_LEVEL)]
    level: String,
    /// Seed for the level's input. Random if not given
    #[arg(short, long)]
    seed: Option<u64>,
}

const DEFAULT_LEVEL: &str = "subtract-room";
/// Unless given by flag or environment, so an endless loop still ends.
const DEFAULT_STEP_LIMIT: u64 = 10_000;
const LOG_ENV: &str = "MAILROOM_LOG";

fn main() -> Result<()> {
    use MsgColor::*;
    let args = Args::parse();
    env::init();
    init_logging();

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new() //
                .context_lines(mailroom::DIAGNOSTIC_CONTEXT_LINES)
                .build(),
        )
    }))?;

    if let Some(command) = args.command {
        match command {
            Command::Run {
                name,
                level,
                minimal,
                fault_limit,
                halt_on_success,
                step_limit,
                delay,
            } => {
                let options = RunOptions {
                    fault_limit: fault_limit.or_else(env::fault_limit),
                    halt_on_success,
                    step_limit: Some(
                        step_limit
                            .or_else(env::step_limit)
                            .unwrap_or(DEFAULT_STEP_LIMIT),
                    ),
                };
                let delay = delay.map(Duration::from_millis);
                run(&name, &level, options, delay, minimal)
            }
            Command::Debug {
                name,
                level,
                command,
                minimal,
            } => debug(&name, &level, DebuggerOptions { command }, minimal),
            Command::Check { patterns, level } => check(&patterns, &level),
            Command::Levels => {
                list_levels();
                Ok(())
            }
        }
    } else if let Some(path) = args.path {
        let level = LevelArgs {
            level: DEFAULT_LEVEL.to_string(),
            seed: None,
        };
        let options = RunOptions {
            fault_limit: env::fault_limit(),
            step_limit: Some(env::step_limit().unwrap_or(DEFAULT_STEP_LIMIT)),
            ..RunOptions::default()
        };
        run(&path, &level, options, None, false)
    } else {
        println!("\n~ mailroom v{VERSION} ~");
        println!("{}", LOGO.truecolor(222, 184, 135).bold());
        message(Cyan, "Help", "use `-h` or `--help` for usage instructions");
        std::process::exit(0);
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[allow(unused)]
enum MsgColor {
    Green,
    Cyan,
    Red,
}

fn file_message(color: MsgColor, left: &str, right: &Path) {
    let right = format!("target {}", right.display());
    message(color, left, &right);
}

/// Skipped with `--minimal`, so stdout only holds what the program put in the outbox.
fn message<S>(color: MsgColor, left: S, right: S)
where
    S: Colorize + std::fmt::Display,
{
    if Output::is_minimal() {
        return;
    }
    let left = match color {
        MsgColor::Green => left.green(),
        MsgColor::Cyan => left.cyan(),
        MsgColor::Red => left.red(),
    };
    println!("{left:>12} {right}");
}

fn run(
    name: &Path,
    level_args: &LevelArgs,
    options: RunOptions,
    delay: Option<Duration>,
    minimal: bool,
) -> Result<()> {
    Output::set_minimal(minimal);
    let level = find_level(&level_args.level)?;
    let seed = seed(level_args);

    file_message(MsgColor::Green, "Loading", name);
    let src = fs::read_to_string(name).into_diagnostic()?;
    let parsed = mailroom::parse(&src)?;

    let mut session = Session::new(level, seed, options);
    let mut state = start(&mut session, &parsed, &src)?;
    message(
        MsgColor::Green,
        "Running",
        &format!("level {} with seed {}", level.id, state.seed()),
    );

    let mut terminal = Terminal::new(delay, true);
    let status = state.run(&mut terminal);
    terminal.finish();
    debug!(?status, executed = state.instructions_executed(), "run finished");

    let Some(stats) = terminal.completion() else {
        let reason = match (state.verdict(), status) {
            (Verdict::Mismatched, _) => "the outbox holds a wrong value".to_string(),
            (_, Status::HaltedError) => "too many faults occurred".to_string(),
            (_, Status::HaltedStopped)
                if options
                    .step_limit
                    .is_some_and(|limit| state.instructions_executed() >= limit) =>
            {
                format!("stopped after {} instructions", state.instructions_executed())
            }
            _ => "the outbox is missing values".to_string(),
        };
        bail!(
            code = "run::incomplete",
            help = format!(
                "expected outbox: {}\n  actual outbox: {}",
                join(state.expected()),
                join(state.outbox())
            ),
            "Program did not complete level `{}`: {}.",
            level.id,
            reason
        );
    };

    print_score(level, stats);
    file_message(MsgColor::Green, "Completed", name);
    Ok(())
}

fn debug(name: &Path, level_args: &LevelArgs, opts: DebuggerOptions, minimal: bool) -> Result<()> {
    Output::set_minimal(minimal);
    let level = find_level(&level_args.level)?;
    let seed = seed(level_args);

    file_message(MsgColor::Green, "Loading", name);
    let src = fs::read_to_string(name).into_diagnostic()?;
    let parsed = mailroom::parse(&src)?;

    let options = RunOptions {
        fault_limit: env::fault_limit(),
        ..RunOptions::default()
    };
    let mut session = Session::new(level, seed, options);
    let mut state = start(&mut session, &parsed, &src)?;
    message(
        MsgColor::Green,
        "Debugging",
        &format!("level {} with seed {}", level.id, state.seed()),
    );

    let mut terminal = Terminal::new(None, false);
    Debugger::new(opts).run(&mut session, &mut state, &mut terminal);

    if let Some(stats) = terminal.completion() {
        print_score(level, stats);
    }
    file_message(MsgColor::Green, "Exited", name);
    Ok(())
}

fn check(patterns: &[String], level_id: &str) -> Result<()> {
    let level = find_level(level_id)?;
    let session = Session::new(level, 0, RunOptions::default());

    let mut checked = 0;
    let mut failed = 0;
    for pattern in patterns {
        for path in glob::glob(pattern).into_diagnostic()? {
            let path = path.into_diagnostic()?;
            file_message(MsgColor::Green, "Checking", &path);
            checked += 1;
            if let Err(report) = check_file(&path, &session) {
                failed += 1;
                eprintln!("{:?}", report);
            }
        }
    }

    if checked == 0 {
        bail!(
            code = "check::no_files",
            help = "quote glob patterns so the shell does not expand them",
            "No files match the given patterns."
        );
    }
    if failed > 0 {
        bail!(
            code = "check::failed",
            "{} of {} file{} failed to build for level `{}`.",
            failed,
            checked,
            if checked == 1 { "" } else { "s" },
            level.id
        );
    }
    message(MsgColor::Green, "Success", "no errors found!");
    Ok(())
}

fn check_file(path: &Path, session: &Session) -> Result<()> {
    let src = fs::read_to_string(path).into_diagnostic()?;
    let parsed = mailroom::parse(&src)?;
    session
        .build(&parsed.commands)
        .map_err(|error| mailroom::error::build(&error, parsed.span(error.index()), &src))?;
    Ok(())
}

fn list_levels() {
    for level in LEVELS {
        println!(
            "{} {}",
            format!("{:<18}", level.id).bold(),
            level.name.cyan()
        );
        let toolbox = level
            .toolbox
            .iter()
            .map(|opcode| opcode.mnemonic())
            .collect::<Vec<_>>()
            .join(" ");
        println!("{:>18} commands: {}", "", toolbox);
        println!(
            "{:>18} slots: {}, size challenge: {}, speed challenge: {}",
            "", level.construction_slots, level.expected_command_count, level.expected_execute_count
        );
    }
}

/// Start a run, turning build errors into a diagnostic pointing at the offending command.
fn start(session: &mut Session, parsed: &ParsedProgram, src: &str) -> Result<RunState> {
    // The diagnostic is the report, so the channel is not needed here
    session
        .start(&parsed.commands, &mut Silent)
        .map_err(|error| mailroom::error::build(&error, parsed.span(error.index()), src))
}

fn find_level(id: &str) -> Result<&'static Level> {
    level::find(id).ok_or_else(|| {
        miette!(
            code = "cli::unknown_level",
            help = "use `mailroom levels` to list the available levels",
            "No level named `{}`.",
            id
        )
    })
}

fn seed(level_args: &LevelArgs) -> u64 {
    level_args
        .seed
        .or_else(env::seed)
        .unwrap_or_else(level::fresh_seed)
}

fn print_score(level: &Level, stats: Stats) {
    let score = Score::evaluate(level, stats);
    dprintln!(
        Always,
        Info,
        "Size: {} commands (challenge {}){}",
        stats.commands_used,
        level.expected_command_count,
        if score.size_met { ", met" } else { "" }
    );
    dprintln!(
        Always,
        Info,
        "Speed: {} steps (challenge {}){}",
        stats.instructions_executed,
        level.expected_execute_count,
        if score.speed_met { ", met" } else { "" }
    );
}

fn join(values: &[mailroom::Value]) -> String {
    if values.is_empty() {
        return "(empty)".to_string();
    }
    values
        .iter()
        .map(|value| value.to_string())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Shows a run in the terminal. Outbox values go to stdout, everything else to stderr.
struct Terminal {
    record: Recorder,
    delay: Option<Duration>,
    /// Print each distinct fault only once.
    collapse: bool,
    /// Faults printed so far, when collapsing.
    shown: Vec<Fault>,
}

impl Terminal {
    fn new(delay: Option<Duration>, collapse: bool) -> Self {
        Self {
            record: Recorder::new(),
            delay,
            collapse,
            shown: Vec::new(),
        }
    }

    fn completion(&self) -> Option<Stats> {
        self.record.completions.first().copied()
    }

    /// Summarize faults which were not printed.
    fn finish(&self) {
        let hidden = self.record.faults.len() - self.shown.len();
        if self.collapse && hidden > 0 {
            dprintln!(
                Always,
                Warning,
                "{} faults in total, repeated faults were not shown.",
                self.record.faults.len()
            );
        }
    }
}

impl Channel for Terminal {
    fn report(&mut self, fault: Fault) {
        let repeated = self.collapse && self.shown.contains(&fault);
        if !repeated {
            dprintln!(Always, Warning, "Fault [{}]: {}", fault.code(), fault);
            if self.collapse {
                self.shown.push(fault.clone());
            }
        }
        self.record.report(fault);
    }

    fn completed(&mut self, stats: Stats) {
        dprintln!(
            Always,
            Info,
            "Outbox matches the expected output after {} instructions.",
            stats.instructions_executed
        );
        self.record.completed(stats);
    }

    fn effect(&mut self, effect: &Effect) {
        if let Effect::Drop { value } = effect {
            Output::Normal.print_str(&format!("{}\n", value));
        }
        if let Some(delay) = self.delay {
            if !matches!(effect, Effect::Halt(_)) {
                sleep(delay);
            }
        }
    }
}

const LOGO: &str = r#"
  ┌─────────┐                 ┌─────────┐
  │  INBOX  │ ──▶  ( o_o)  ──▶ │ OUTBOX  │
  └─────────┘      /|  |\     └─────────┘
                    /  \"#;

const VERSION: &str = env!("CARGO_PKG_VERSION");
