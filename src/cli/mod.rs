//! CLI command definitions and parsing
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "reaction-finder",
    version,
    author = "neur0map",
    about = "Find the Slack messages with the most reactions of a given emoji",
    long_about = "reaction-finder searches a Slack workspace for messages carrying an emoji reaction, \
                  verifies each hit against the message itself to drop text-only matches, and ranks \
                  the verified messages by how many times that reaction was added.",
    after_help = "Examples:\n  \
                  reaction-finder pray\n  \
                  reaction-finder :tada: --top 10 --days 30\n  \
                  reaction-finder eyes --after 2024-01-01 --before 2024-03-31 --json"
)]
pub struct Cli {
    /// Emoji name to look for, with or without colons (e.g. "pray" or ":pray:")
    #[arg(value_name = "EMOJI")]
    pub emoji: String,

    /// Number of messages to show (defaults to report.default_top_n)
    #[arg(
        short = 'n',
        long = "top",
        value_name = "N",
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub top: Option<u32>,

    /// Slack token (defaults to the SLACK_REACTION_FINDER environment variable)
    #[arg(short, long, value_name = "TOKEN")]
    pub token: Option<String>,

    /// Only messages posted on this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub on: Option<String>,

    /// Only messages posted after this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub after: Option<String>,

    /// Only messages posted before this day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub before: Option<String>,

    /// Only messages from the last N days (combine with --before to shift the window)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub days: Option<u32>,

    /// Maximum search hits to analyse (defaults to search.default_max_results)
    #[arg(long = "max", value_name = "N", value_parser = clap::value_parser!(u32).range(1..))]
    pub max_results: Option<u32>,

    /// Print the report as JSON
    #[arg(long)]
    pub json: bool,

    /// Config file path (defaults to ~/.config/reaction-finder/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
