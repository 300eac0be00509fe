//! CLI Adapter.

mod assignments;
mod reset;
mod submissions;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::app::api::ReportFormat;
use crate::app::logging;
use crate::domain::AppError;

#[derive(Parser)]
#[command(name = "coursekit")]
#[command(version)]
#[command(
    about = "Provision assignments, test students and submissions in Canvas courses",
    long_about = None
)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    /// HTTP settings file (defaults to ./coursekit.toml when present)
    #[arg(long, global = true, value_name = "FILE")]
    settings: Option<PathBuf>,
    /// Report format written to stdout
    #[arg(long, value_enum, default_value_t = ReportFormat::Text, global = true)]
    format: ReportFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create configured assignments and managed sections
    #[clap(visible_alias = "a")]
    Assignments {
        /// Courses file
        #[arg(short, long, default_value = "courses.yml")]
        courses: PathBuf,
        /// Assignments file
        #[arg(short, long, default_value = "assignment.yml")]
        assignments: PathBuf,
    },
    /// Enroll test students and create their submissions
    #[clap(visible_alias = "s")]
    Submissions {
        /// Courses file
        #[arg(short, long, default_value = "courses.yml")]
        courses: PathBuf,
        /// Submissions file
        #[arg(short, long, default_value = "submissions.yml")]
        submissions: PathBuf,
    },
    /// Delete generated assignments, managed enrollments and sections
    Reset {
        /// Courses file
        #[arg(short, long, default_value = "courses.yml")]
        courses: PathBuf,
        /// Assignments file
        #[arg(short, long, default_value = "assignment.yml")]
        assignments: PathBuf,
    },
}

/// Entry point for the CLI.
pub fn run() {
    let cli = Cli::parse();
    // `.env` may set RUST_LOG, so it is read before the subscriber is built.
    let dotenv = dotenvy::dotenv();
    logging::init(cli.verbose);
    report_dotenv(dotenv);

    let result: Result<i32, AppError> = match cli.command {
        Commands::Assignments { courses, assignments } => {
            assignments::run_assignments(courses, assignments, cli.settings, cli.format)
        }
        Commands::Submissions { courses, submissions } => {
            submissions::run_submissions(courses, submissions, cli.settings, cli.format)
        }
        Commands::Reset { courses, assignments } => {
            reset::run_reset(courses, assignments, cli.settings, cli.format)
        }
    };

    match result {
        Ok(exit_code) => {
            if exit_code != 0 {
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// `.env` in the working directory; real environment variables take precedence.
fn report_dotenv(result: Result<std::path::PathBuf, dotenvy::Error>) {
    match result {
        Ok(path) => tracing::debug!(path = %path.display(), "loaded .env"),
        Err(e) if e.not_found() => {}
        Err(e) => tracing::warn!("ignoring unreadable .env: {}", e),
    }
}
