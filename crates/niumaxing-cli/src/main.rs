use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "niumaxing-cli", version, about = "Niumaxing daily check-in CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed grass to the warrior
    Feed(commands::feed::FeedArgs),
    /// Stage, progress, totals and countdown
    Status(commands::status::StatusArgs),
    /// Personal contribution heatmap
    Heatmap(commands::heatmap::HeatmapArgs),
    /// Time left until the boss fight
    Countdown(commands::countdown::CountdownArgs),
    /// Live view that follows the shared total
    Watch(commands::watch::WatchArgs),
    /// Show the intro story
    Story(commands::story::StoryArgs),
    /// Print this device's user identifier
    Whoami,
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Feed(args) => commands::feed::run(args),
        Commands::Status(args) => commands::status::run(args),
        Commands::Heatmap(args) => commands::heatmap::run(args),
        Commands::Countdown(args) => commands::countdown::run(args),
        Commands::Watch(args) => commands::watch::run(args),
        Commands::Story(args) => commands::story::run(args),
        Commands::Whoami => commands::whoami::run(),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
