use std::process::ExitCode;

use clap::{Parser, Subcommand};

use dotgit::clock::SystemClock;
use dotgit::config;
use dotgit::fs_backend::OsBackend;
use dotgit::repo::Repository;
use dotgit::GitError;

const KNOWN_COMMANDS: &[&str] = &["init", "add", "commit"];

#[derive(Parser, Debug)]
#[command(name = "ggit", version, about = "A partial, on-disk-compatible reimplementation of git")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create an empty repository, or reinitialise an existing one.
    Init,
    /// Stage working-tree paths into the index. `.` stages everything.
    Add {
        #[arg(required = true)]
        pathspecs: Vec<String>,
    },
    /// Record a commit snapshotting the current index.
    Commit {
        #[arg(short = 'm', long = "message")]
        message: String,
    },
}

fn main() -> ExitCode {
    let mut args: Vec<String> = std::env::args().collect();

    if let Some(first) = args.get(1) {
        let is_help_or_version = first == "--help" || first == "-h" || first == "--version" || first == "-V";
        if !is_help_or_version && !KNOWN_COMMANDS.contains(&first.as_str()) {
            eprintln!("ggit: \"{first}\" is not a ggit command. See 'ggit --help'");
            return ExitCode::from(1);
        }
    }

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = match Cli::try_parse_from(std::mem::take(&mut args)) {
        Ok(cli) => cli,
        Err(e) => e.exit(),
    };

    match run(cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{}", err.message());
            ExitCode::from(err.code as u8)
        }
    }
}

struct CliError {
    message: String,
    code: i32,
}

impl CliError {
    fn message(&self) -> &str {
        &self.message
    }
}

impl From<GitError> for CliError {
    fn from(err: GitError) -> Self {
        CliError {
            message: err.to_string(),
            code: err.exit_code(),
        }
    }
}

fn run(command: Commands) -> Result<(), CliError> {
    let cwd = std::env::current_dir().map_err(|e| CliError {
        message: format!("could not determine current directory: {e}"),
        code: 128,
    })?;

    match command {
        Commands::Init => run_init(&cwd),
        Commands::Add { pathspecs } => run_add(&cwd, &pathspecs),
        Commands::Commit { message } => run_commit(&cwd, &message),
    }
}

fn run_init(cwd: &std::path::Path) -> Result<(), CliError> {
    let fs = OsBackend::new();
    let repo = Repository::new(&fs, cwd);
    let already_initialized = repo.is_initialized();

    repo.init()?;

    if already_initialized {
        println!("Reinitialized existing Git repository in {}", repo.git_dir().display());
    } else {
        println!("Initialized empty Git repository in {}", repo.git_dir().display());
    }
    Ok(())
}

fn run_add(cwd: &std::path::Path, pathspecs: &[String]) -> Result<(), CliError> {
    let fs = OsBackend::new();
    let repo = discover_repo(&fs, cwd)?;
    repo.add(pathspecs)?;
    Ok(())
}

fn run_commit(cwd: &std::path::Path, message: &str) -> Result<(), CliError> {
    let fs = OsBackend::new();
    let repo = discover_repo(&fs, cwd)?;

    let config_path = config::default_config_path()?;
    let identity = config::load_user_identity(&config_path)?;
    let clock = SystemClock;

    let result = repo.commit(&identity, &clock, message)?;

    let root_suffix = if result.is_root { " (root-commit)" } else { "" };
    println!(
        "[{}{} {}] {}",
        result.branch,
        root_suffix,
        result.oid.short(),
        result.message
    );
    Ok(())
}

fn discover_repo<'a>(fs: &'a OsBackend, cwd: &std::path::Path) -> Result<Repository<'a>, CliError> {
    Repository::discover(fs, cwd).ok_or_else(|| CliError {
        message: "fatal: not a ggit repository (or any of the parent directories): .git".to_string(),
        code: 128,
    })
}
