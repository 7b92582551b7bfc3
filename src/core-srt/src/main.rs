use std::time::Duration;

use clap::{Parser, Subcommand};
use core_srt::{
    CheckOutcome, RankQuery, RetryPolicy, ValueSerp, VisibilityProvider, lookup_with_retry, setup_logging,
    visibility::Sistrix,
};

#[derive(Parser)]
#[command(name = "core-srt")]
#[command(about = "One-off SERP rank lookups", long_about = None)]
struct CoreCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find where a domain ranks for a keyword. Needs VALUESERP_API_KEY.
    Lookup {
        /// The search query.
        #[arg(short, long)]
        keyword: String,
        /// The domain to look for in the results.
        #[arg(short, long)]
        domain: String,
        /// Country to search from, e.g. "France".
        #[arg(short, long, default_value = "United States")]
        country: String,
        /// Total attempts before giving up.
        #[arg(long, default_value_t = 3, value_parser = clap::value_parser!(u32).range(1..=10))]
        attempts: u32,
        /// Seconds to wait between attempts.
        #[arg(long, default_value_t = 5)]
        retry_delay_s: u64,
    },

    /// Print the visibility index history of a domain. Needs SISTRIX_API_KEY.
    Visibility {
        #[arg(short, long)]
        domain: String,
        #[arg(short, long, default_value = "United States")]
        country: String,
    },
}

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    setup_logging("core_srt=info");

    let cli = CoreCli::parse();

    match cli.command {
        Commands::Lookup {
            keyword,
            domain,
            country,
            attempts,
            retry_delay_s,
        } => {
            let client = match ValueSerp::from_env() {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    std::process::exit(1)
                }
            };
            let policy = RetryPolicy {
                max_attempts: attempts,
                delay: Duration::from_secs(retry_delay_s),
            };
            let query = RankQuery::new(keyword, domain, country);

            let interrupted = async {
                tokio::signal::ctrl_c().await.ok();
            };

            match lookup_with_retry(&client, &query, &policy, interrupted).await {
                Some(CheckOutcome::Found(rank)) => println!(
                    "{} ranks #{} for '{}' in {}",
                    query.domain, rank, query.keyword, query.country
                ),
                Some(CheckOutcome::NotFound) => println!(
                    "{} is not in the top 100 for '{}' in {}",
                    query.domain, query.keyword, query.country
                ),
                Some(CheckOutcome::Failed { attempts, error }) => {
                    eprintln!("ERROR: lookup failed after {} attempt(s): {}", attempts, error);
                    std::process::exit(1)
                }
                None => {
                    eprintln!("Interrupted while waiting to retry");
                    std::process::exit(130)
                }
            }
        }

        Commands::Visibility { domain, country } => {
            let sistrix = match Sistrix::from_env() {
                Ok(Some(s)) => s,
                Ok(None) => {
                    eprintln!("ERROR: SISTRIX_API_KEY is not set");
                    std::process::exit(1)
                }
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    std::process::exit(1)
                }
            };

            match sistrix.visibility_index(&domain, &country).await {
                Ok(points) if points.is_empty() => println!("No visibility data for {} ({})", domain, country),
                Ok(points) => {
                    for point in points {
                        println!("{}\t{:.4}", point.date.date_naive(), point.value);
                    }
                }
                Err(e) => {
                    eprintln!("ERROR: {}", e);
                    std::process::exit(1)
                }
            }
        }
    }
}
