use clap::{Parser, Subcommand};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod commands;

#[derive(Parser)]
#[command(name = "planbook", version, about = "Planbook: daily plans, streaks and goals")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Day plan management
    Plan {
        #[command(subcommand)]
        action: commands::plan::PlanAction,
    },
    /// Task completion within a day plan
    Task {
        #[command(subcommand)]
        action: commands::task::TaskAction,
    },
    /// Completion statistics and streak
    Stats {
        #[command(subcommand)]
        action: commands::stats::StatsAction,
    },
    /// Contribution calendar
    Calendar {
        #[command(subcommand)]
        action: commands::calendar::CalendarAction,
    },
    /// End-of-day log for a date
    Log {
        #[command(subcommand)]
        action: commands::log::LogAction,
    },
    /// Deadline to-do list
    Todo {
        #[command(subcommand)]
        action: commands::todo::TodoAction,
    },
    /// Goal tracking
    Goal {
        #[command(subcommand)]
        action: commands::goal::GoalAction,
    },
    /// Improvement feedback queue
    Feedback {
        #[command(subcommand)]
        action: commands::feedback::FeedbackAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

/// Logs go to stderr so stdout stays machine-readable.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "planbook=warn,planbook_core=warn".into()),
    );
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Plan { action } => commands::plan::run(action),
        Commands::Task { action } => commands::task::run(action),
        Commands::Stats { action } => commands::stats::run(action),
        Commands::Calendar { action } => commands::calendar::run(action),
        Commands::Log { action } => commands::log::run(action),
        Commands::Todo { action } => commands::todo::run(action),
        Commands::Goal { action } => commands::goal::run(action),
        Commands::Feedback { action } => commands::feedback::run(action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
