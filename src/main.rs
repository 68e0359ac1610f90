use reaction_finder::cli::Cli;
use reaction_finder::config::Config;
use reaction_finder::error::{ReactionFinderError, Result};
use reaction_finder::pipeline::{self, Collaborators, PipelineConfig};
use reaction_finder::query::DateWindow;
use reaction_finder::report;
use reaction_finder::slack::SlackClient;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

/// Above this many hits a run takes minutes because of per-message lookups
const LARGE_SEARCH_WARNING: usize = 1000;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse_args();

    init_logging(cli.verbose);

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            report_error(&e);
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose {
        "reaction_finder=debug"
    } else {
        "reaction_finder=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config)?;
    let token = resolve_token(cli.token, &config)?;

    let max_results = cli
        .max_results
        .map(|n| n as usize)
        .unwrap_or(config.search.default_max_results);
    if max_results > LARGE_SEARCH_WARNING {
        tracing::warn!(
            max_results,
            "Searching more than {} messages may take a long time",
            LARGE_SEARCH_WARNING
        );
    }
    let top_n = cli
        .top
        .map(|n| n as usize)
        .unwrap_or(config.report.default_top_n);

    let window = DateWindow {
        on: cli.on,
        after: cli.after,
        before: cli.before,
        days: cli.days,
    };
    let pipeline_config = PipelineConfig::new(cli.emoji, window)
        .with_max_results(max_results)
        .with_top_n(top_n)
        .with_preview_chars(config.report.preview_chars)
        .with_verify_concurrency(config.verify.concurrency);

    let client = SlackClient::with_options(
        token,
        config.slack.api_base_url.as_str(),
        Duration::from_secs(config.slack.timeout_secs),
    )?;
    let collaborators = Collaborators::from_client(Arc::new(client));

    let ranked = pipeline::run(&pipeline_config, &collaborators).await?;
    let marker = pipeline::normalize_marker(&pipeline_config.marker)?;

    if cli.json {
        println!("{}", report::render_json(&ranked)?);
    } else {
        print!("{}", report::TextReport::new(&ranked, &marker, top_n));
    }

    Ok(())
}

/// Load the given config file, or the default one when it exists
fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    if let Some(path) = config_path {
        return Config::load(&path);
    }

    let path = Config::default_path()?;
    if !path.exists() {
        tracing::debug!("Config file not found at {:?}, using defaults", path);
        return Config::from_env();
    }

    Config::load(&path)
}

/// `--token` wins over the configured environment variable
fn resolve_token(flag: Option<String>, config: &Config) -> Result<String> {
    let token = flag
        .or_else(|| std::env::var(&config.slack.token_env).ok())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    token.ok_or_else(|| ReactionFinderError::MissingToken {
        env_var: config.slack.token_env.clone(),
    })
}

fn report_error(err: &ReactionFinderError) {
    match err {
        ReactionFinderError::Pipeline(e) => {
            eprintln!("Error ({} stage): {}", e.stage(), e);
            eprintln!("Hint: {}", e.hint());
        }
        ReactionFinderError::ConfigValidation { errors } => {
            eprintln!("Error: invalid configuration");
            for error in errors {
                eprintln!("  {}: {}", error.path, error.message);
            }
        }
        other => eprintln!("Error: {}", other),
    }
}
