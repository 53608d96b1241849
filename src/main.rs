use anyhow::Context;
use clap::{Parser, Subcommand};
use medisia::config::{timeout_from_secs, Config};
use medisia::form::SearchForm;
use medisia::search::{LoadState, Pager, SearchClient, SearchSession};
use medisia::tui::Route;
use medisia::utils::{init_logging, LogTarget};
use tracing::{error, info};

/// Terminal client for the MediSia medical literature search service
#[derive(Debug, Parser)]
#[command(name = "medisia", version, about)]
struct Cli {
    /// Base URL of the search backend (overrides MEDISIA_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Request timeout in seconds (overrides MEDISIA_TIMEOUT_SECS)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive terminal interface (default)
    Tui {
        /// View to open: search or results
        #[arg(long, default_value = "/search")]
        route: String,
    },
    /// Run one search and print the results
    Search {
        /// Search term
        #[arg(default_value = "")]
        query: String,

        /// Comma-separated topics
        #[arg(long, default_value = "")]
        categories: String,

        /// Comma-separated journal names
        #[arg(long, default_value = "")]
        journals: String,

        /// YYYY or YYYY-YYYY
        #[arg(long, default_value = "")]
        years: String,

        /// Ask the backend for a deep search
        #[arg(long)]
        deep: bool,

        /// Page of results to print, starting at 1
        #[arg(long, default_value_t = 1)]
        page: usize,

        /// Print the raw backend response as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let mut config = Config::from_env()?;
    if let Some(url) = cli.api_url {
        config.api.base_url = url;
    }
    if let Some(secs) = cli.timeout {
        config.api.timeout = timeout_from_secs(secs).context("--timeout")?;
    }

    match cli.command.unwrap_or(Command::Tui {
        route: Route::Search.path().to_string(),
    }) {
        Command::Tui { route } => {
            // The TUI owns the terminal, so logs go to a file
            let _guard = init_logging(LogTarget::File(config.log.dir.clone()))?;
            info!(dir = %config.log.dir.display(), "Logging to file");
            medisia::tui::run(config, Route::parse(&route)).await
        }
        Command::Search {
            query,
            categories,
            journals,
            years,
            deep,
            page,
            json,
        } => {
            init_logging(LogTarget::Stderr)?;
            let form = SearchForm {
                query,
                categories,
                journals,
                pubyear: years,
                deep,
                advanced: true,
            };
            let query = form.validate(&[])?;
            info!(api = %config.api.base_url, query = ?query.query, "Running search");

            if json {
                let client = SearchClient::from_config(&config.api)?;
                let results = client.fetch_json(&query).await?;
                println!("{}", serde_json::to_string_pretty(&results)?);
                return Ok(());
            }

            let session = SearchSession::from_config(&config)?;
            session.submit_query(query);

            match session.wait_settled().await {
                LoadState::Ready(set) => {
                    let papers = &set.results.papers;
                    let mut pager = Pager::new(papers.len(), config.ui.page_size);
                    while pager.index() + 1 < page && pager.next() {}

                    println!("{}", pager.label());
                    for (i, paper) in pager.current(papers).iter().enumerate() {
                        println!();
                        println!("{:>3}. {}", pager.offset() + i + 1, paper.title);
                        if let Some(authors) = paper.author_line() {
                            println!("     {}", authors);
                        }
                        let year = paper.year.map(|y| y.to_string()).unwrap_or_default();
                        println!("     {} {} [{}]", paper.journal, year, paper.topic);
                        if !paper.url.is_empty() {
                            println!("     {}", paper.url);
                        }
                        println!("     {}", paper.abstract_text);
                    }
                    Ok(())
                }
                LoadState::Failed(e) => {
                    error!(error = %e, "Search failed");
                    anyhow::bail!("search failed: {}", e)
                }
                LoadState::Idle | LoadState::Loading => {
                    anyhow::bail!("search did not complete")
                }
            }
        }
    }
}
