mod commands;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines};
use tracing::info;
use tracing_subscriber::EnvFilter;

use flip_core::model::{Answer, ValidationStage};
use services::{
    AppServices, Clock, StageNavigator, SubmissionService, ValidationConfig,
    ValidationLoopService,
};
use ui::vm::{ValidationOutcome, ValidationVm};
use ui::{UiApp, build_app_context};

use commands::{Command, HELP, parse_command};

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidStage { raw: String },
    InvalidInterval { raw: String },
    InvalidDbUrl { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidStage { raw } => write!(f, "invalid --stage value: {raw}"),
            ArgsError::InvalidInterval { raw } => write!(f, "invalid --interval-ms value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
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

struct CliApp {
    stage: ValidationStage,
    services: AppServices,
}

impl UiApp for CliApp {
    fn initial_stage(&self) -> ValidationStage {
        self.stage
    }

    fn validation_loop(&self) -> Arc<ValidationLoopService> {
        self.services.validation_loop()
    }

    fn submissions(&self) -> Arc<SubmissionService> {
        self.services.submissions()
    }
}

struct LoggingNavigator;

impl StageNavigator for LoggingNavigator {
    fn go_to_next_stage(&self, next: Option<ValidationStage>) {
        match next {
            Some(stage) => info!(%stage, "moving to next validation stage"),
            None => info!("validation finished"),
        }
    }
}

struct Args {
    db_url: String,
    stage: ValidationStage,
    config: ValidationConfig,
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!(
        "  cargo run -p app -- [--node <url>] [--key <api_key>] [--stage short|long] \
         [--db <sqlite_url>] [--interval-ms <ms>]"
    );
    eprintln!();
    eprintln!("Defaults:");
    eprintln!("  --node http://localhost:9009");
    eprintln!("  --stage short");
    eprintln!("  --db sqlite:flip-validation.sqlite3");
    eprintln!("  --interval-ms 1000");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  IDENA_NODE_URL, IDENA_API_KEY, IDENA_POLL_INTERVAL_MS, IDENA_HTTP_TIMEOUT_SECS,");
    eprintln!("  FLIP_DB_URL, RUST_LOG");
}

impl Args {
    fn parse(args: &mut impl Iterator<Item = String>) -> Result<Self, ArgsError> {
        let mut config = ValidationConfig::from_env();
        let mut db_url = normalize_sqlite_url(
            std::env::var("FLIP_DB_URL").unwrap_or_else(|_| "flip-validation.sqlite3".into()),
        );
        let mut stage = ValidationStage::Short;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--node" => config.node_url = require_value(args, "--node")?,
                "--key" => config.api_key = Some(require_value(args, "--key")?),
                "--stage" => {
                    let value = require_value(args, "--stage")?;
                    stage = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidStage { raw: value.clone() })?;
                }
                "--db" => {
                    let value = require_value(args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(value);
                }
                "--interval-ms" => {
                    let value = require_value(args, "--interval-ms")?;
                    let millis = value
                        .parse::<u64>()
                        .ok()
                        .filter(|millis| *millis > 0)
                        .ok_or_else(|| ArgsError::InvalidInterval { raw: value.clone() })?;
                    config.poll_interval = Duration::from_millis(millis);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            stage,
            config,
        })
    }
}

fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim();
    let path_str = trimmed.strip_prefix("sqlite:").unwrap_or(trimmed);
    let path = std::path::Path::new(path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| std::path::PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

fn prepare_sqlite_file(db_url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let path = db_url
        .strip_prefix("sqlite://")
        .ok_or_else(|| ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        })?;
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        return Err(ArgsError::InvalidDbUrl {
            raw: db_url.to_string(),
        }
        .into());
    }

    let path = std::path::Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)?;
    }
    Ok(())
}

fn answer_label(answer: Answer) -> &'static str {
    match answer {
        Answer::Unanswered => ".",
        Answer::Left => "L",
        Answer::Right => "R",
        Answer::Inappropriate => "!",
    }
}

fn render(vm: &ValidationVm) {
    let progress = vm.progress();
    if progress.total == 0 {
        println!("[{}] waiting for flips to be assigned...", vm.stage());
        return;
    }

    let strip: Vec<String> = vm
        .slots()
        .iter()
        .map(|slot| {
            let state = if slot.loaded {
                answer_label(slot.answer)
            } else {
                "~"
            };
            if slot.current {
                format!("[{state}]")
            } else {
                format!(" {state} ")
            }
        })
        .collect();
    println!(
        "[{}] flip {}/{}  answered {}/{}{}",
        vm.stage(),
        progress.current + 1,
        progress.total,
        progress.answered,
        progress.total,
        if progress.fully_loaded { "" } else { "  (loading)" }
    );
    println!("  {}", strip.concat());
    match vm.current_flip() {
        Some(flip) => println!(
            "  {} images, order {:?}",
            flip.images().count(),
            flip.order().leading_positions()
        ),
        None => println!("  flip not available yet"),
    }
}

enum StageExit {
    Submitted(Option<ValidationStage>),
    Quit,
}

async fn drive_stage<R>(
    vm: &mut ValidationVm,
    lines: &mut Lines<R>,
) -> Result<StageExit, Box<dyn std::error::Error>>
where
    R: AsyncBufRead + Unpin,
{
    render(vm);
    while let Some(line) = lines.next_line().await? {
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(err) => {
                println!("{err}");
                continue;
            }
        };
        match command {
            Command::Show => render(vm),
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(StageExit::Quit),
            Command::Intent(intent) => match vm.dispatch(intent).await {
                Ok(ValidationOutcome::Continue) => render(vm),
                Ok(ValidationOutcome::Submitted { next }) => {
                    println!("[{}] answers submitted", vm.stage());
                    return Ok(StageExit::Submitted(next));
                }
                Err(err) => println!("{}", err.message()),
            },
        }
    }
    Ok(StageExit::Quit)
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut argv = std::env::args().skip(1);
    let parsed = Args::parse(&mut argv).map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    // Open + migrate SQLite at startup. Keep this in the binary glue so core/services stay pure.
    prepare_sqlite_file(&parsed.db_url)?;
    let services = AppServices::new_sqlite(
        &parsed.db_url,
        &parsed.config,
        Clock::default(),
        Arc::new(LoggingNavigator),
    )
    .await?;
    info!(node = %parsed.config.node_url, db = %parsed.db_url, "services ready");

    let app: Arc<dyn UiApp> = Arc::new(CliApp {
        stage: parsed.stage,
        services,
    });
    let context = build_app_context(&app);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stage = Some(context.initial_stage());
    while let Some(current) = stage {
        let (mut vm, task) = context
            .enter_stage(current)
            .await
            .map_err(|err| std::io::Error::other(err.message()))?;
        if vm.is_resumed() {
            println!("[{current}] resuming an unsubmitted session");
        }
        let exit = drive_stage(&mut vm, &mut lines).await?;
        task.cancel();
        stage = match exit {
            StageExit::Submitted(next) => next,
            StageExit::Quit => None,
        };
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run().await {
        // At this layer (binary glue), printing once is fine.
        eprintln!("{err}");
        std::process::exit(2);
    }
}
