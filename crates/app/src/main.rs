mod commands;

use std::fmt;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use backend::{Backend, RpcConfig};
use exam_core::model::{ExamSerial, StudentId};
use services::{Clock, DashboardService, ExamConfig, ExamSessionController, TickOutcome};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use ui::vm::{ExamIntent, ExamScreen, ExamVm, map_dashboard_cards, start_exam};

use commands::{Command, HELP, parse_command};

/// How long to wait for outstanding answer submissions before exiting.
const FLUSH_LIMIT: Duration = Duration::from_secs(10);

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidExamSerial { raw: String },
    MissingStudent,
    MissingBackend,
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidExamSerial { raw } => write!(f, "invalid --exam value: {raw}"),
            ArgsError::MissingStudent => write!(f, "no student id (use --student or EXAM_STUDENT_ID)"),
            ArgsError::MissingBackend => {
                write!(f, "EXAM_BACKEND_URL and EXAM_BACKEND_KEY must both be set")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p app -- --student <id>                  # list mock exams");
    eprintln!("  cargo run -p app -- --student <id> --exam <serial>  # take a mock exam");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --verbose   debug logging (RUST_LOG wins when set)");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  EXAM_STUDENT_ID, EXAM_SERIAL, EXAM_BACKEND_URL, EXAM_BACKEND_KEY");
    eprintln!("  EXAM_DEFAULT_SECTION_SECONDS, EXAM_TICK_MILLIS");
}

struct Args {
    student_id: StudentId,
    exam_serial: Option<ExamSerial>,
    verbose: bool,
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut student = std::env::var("EXAM_STUDENT_ID")
            .ok()
            .filter(|value| !value.trim().is_empty());
        let mut exam_serial = std::env::var("EXAM_SERIAL")
            .ok()
            .and_then(|value| value.parse::<ExamSerial>().ok());
        let mut verbose = false;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--student" => {
                    let value = require_value(args, "--student")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::MissingStudent);
                    }
                    student = Some(value);
                }
                "--exam" => {
                    let value = require_value(args, "--exam")?;
                    let parsed = value
                        .parse::<ExamSerial>()
                        .map_err(|_| ArgsError::InvalidExamSerial { raw: value.clone() })?;
                    exam_serial = Some(parsed);
                }
                "--verbose" | "-v" => verbose = true,
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        let student_id = student.map(StudentId::new).ok_or(ArgsError::MissingStudent)?;
        Ok(Self {
            student_id,
            exam_serial,
            verbose,
        })
    }
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(args: Args) -> Result<(), Box<dyn std::error::Error>> {
    let backend = Backend::rpc(RpcConfig::from_env().ok_or(ArgsError::MissingBackend)?);

    let Some(exam_serial) = args.exam_serial else {
        return show_dashboard(&backend, &args.student_id).await;
    };

    let controller = ExamSessionController::new(
        args.student_id,
        exam_serial,
        ExamConfig::from_env(),
        backend.sections,
        backend.answers,
    );
    let mut vm = start_exam(controller).await;
    println!("{HELP}");
    render(&vm);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        if matches!(vm.screen(), ExamScreen::ExamComplete | ExamScreen::Left) {
            break;
        }
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    vm.apply(ExamIntent::Leave).await;
                    break;
                };
                match parse_command(&line) {
                    Some(Command::Intent(intent)) => {
                        vm.apply(intent).await;
                        render(&vm);
                    }
                    Some(Command::JumpTo(number)) => match vm.sequence_at(number) {
                        Some(id) => {
                            vm.apply(ExamIntent::Jump(id)).await;
                            render(&vm);
                        }
                        None => println!("No question {number} in this section."),
                    },
                    None => println!("{HELP}"),
                }
            }
            Some(tick) = vm.next_tick() => {
                if vm.on_tick(tick) == TickOutcome::Expired {
                    println!("Time is up for this section.");
                    render(&vm);
                }
            }
        }
    }

    let stats = vm.flush_within(FLUSH_LIMIT).await;
    tracing::info!(
        accepted = stats.accepted,
        failed = stats.failed,
        pending = stats.pending,
        "submissions flushed"
    );
    if vm.screen() == ExamScreen::ExamComplete {
        println!("Exam complete. Thank you.");
    }
    Ok(())
}

async fn show_dashboard(
    backend: &Backend,
    student_id: &StudentId,
) -> Result<(), Box<dyn std::error::Error>> {
    let dashboard = DashboardService::new(Clock::default(), Arc::clone(&backend.catalog));
    let entries = dashboard.entries(student_id).await?;
    if entries.is_empty() {
        println!("No mock exams published yet.");
    }
    for card in map_dashboard_cards(&entries) {
        let marker = if card.can_start { "*" } else { " " };
        println!(
            "{marker} [{}] {}  {}  ({})",
            card.exam_serial, card.title, card.window_label, card.status_label
        );
    }
    Ok(())
}

fn render(vm: &ExamVm) {
    if let Some(err) = vm.error() {
        println!("! {}", err.message());
    }
    match vm.screen() {
        ExamScreen::Loading if vm.error().is_some_and(|err| !err.is_retryable()) => {
            println!("Section not loaded.");
        }
        ExamScreen::Loading => println!("Section not loaded. Type `retry`."),
        ExamScreen::SectionComplete => {
            println!("Section complete. Type `continue` for the next one or `finish`.");
        }
        ExamScreen::ExamComplete | ExamScreen::Left => {}
        ExamScreen::Question => {
            if let Some(label) = vm.section_label() {
                println!("\n{label}    {}", vm.clock_label());
            }
            if let Some(question) = vm.question() {
                match (&question.unavailable_reason, &question.stem) {
                    (Some(reason), _) => println!("[question unavailable: {reason}] Type `skip`."),
                    (None, Some(stem)) => println!("{}. {stem}", question.number),
                    (None, None) => {}
                }
                for option in &question.options {
                    let mark = if option.selected { ">" } else { " " };
                    println!(" {mark} {}) {}", option.label, option.text);
                }
            }
            if let Some(palette) = vm.palette() {
                println!("{}", palette.legend());
            }
        }
    }
    if vm.is_confirming_finish() {
        println!("Finish the exam now? (yes/no)");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let mut argv = std::env::args().skip(1);
    let args = match Args::parse(&mut argv) {
        Ok(args) => args,
        Err(err) => {
            eprintln!("{err}");
            print_usage();
            return ExitCode::from(2);
        }
    };

    init_tracing(args.verbose);
    tracing::debug!(student_id = %args.student_id, exam_serial = ?args.exam_serial, "starting");

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::from(1)
        }
    }
}
