use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use loterias_client::{update_snapshot, ClientResults, ResultsClient, UpdateOutcome};
use loterias_core::CanonicalResult;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "loterias-cli")]
#[command(about = "Latest official lottery draws with offline fallback")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Show the latest draw for every game
    Results {
        /// Ask the intermediate service to bypass its cache
        #[arg(long)]
        force: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
        /// Snapshot file used when every live source fails
        #[arg(long, default_value = "data/results.json")]
        snapshot: PathBuf,
    },
    /// Refresh the local snapshot file from the intermediate service
    UpdateSnapshot {
        /// Full URL of the results endpoint (defaults to the first configured service)
        #[arg(long, env = "LOTERIAS_SNAPSHOT_API_URL")]
        api_url: Option<String>,
        /// Snapshot file to write
        #[arg(long, default_value = "data/results.json")]
        output: PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = loterias_core::load_client_config();
    let env_filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("warn"))?;
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Results {
            force,
            json,
            snapshot,
        } => {
            let client = ResultsClient::new(&config)?.with_snapshot_file(snapshot);
            let out = client.fetch_results(force).await;
            if json {
                println!("{}", serde_json::to_string_pretty(&out.results)?);
            } else {
                print_table(&out);
            }
            if out.refresh_failed {
                eprintln!("could not refresh results; showing saved snapshot");
            }
        }
        Commands::UpdateSnapshot { api_url, output } => {
            let api_url = api_url.unwrap_or_else(|| {
                let base = config
                    .api_base_urls
                    .first()
                    .map_or(loterias_core::config::DEFAULT_API_BASE_URL, String::as_str);
                format!("{base}/api/official-results")
            });
            let timeout = Duration::from_millis(config.timeout_ms);
            match update_snapshot(&api_url, &output, timeout).await? {
                UpdateOutcome::Written { results } => {
                    println!("wrote {results} results to {}", output.display());
                }
                UpdateOutcome::Unchanged => {
                    println!("{} already up to date", output.display());
                }
            }
        }
    }

    Ok(())
}

fn print_table(out: &ClientResults) {
    println!("source: {}", out.source);
    for result in &out.results {
        println!("{}", format_row(result));
    }
}

fn format_row(result: &CanonicalResult) -> String {
    let numbers = result
        .numbers
        .iter()
        .map(|n| format!("{n:02}"))
        .collect::<Vec<_>>()
        .join(" ");
    let mut row = format!(
        "{:<14} #{:<6} {:<10} {}",
        result.game_id.display_name(),
        result.contest_number,
        result.date,
        numbers
    );
    if let Some(special) = &result.special_numbers {
        let special = special
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(" ");
        row.push_str(&format!(" + [{special}]"));
    }
    if let Some(extra) = &result.extra_string {
        row.push_str(&format!(" ({extra})"));
    }
    let status = if result.accumulated {
        "accumulated"
    } else {
        "won"
    };
    row.push_str(&format!(
        " | {status} | next {} on {}",
        result.next_prize, result.next_date
    ));
    row
}
