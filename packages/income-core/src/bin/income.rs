//! Income CLI - command line interface over the income-core library.
//!
//! Every command prints a JSON `{ ok, data | error }` envelope on stdout;
//! logs go to stderr.

use clap::{Parser, Subcommand};
use income_core::{
    analyze_positions, yield_on_cost, ApiResponse, PortfolioSummary, PortfolioTracker, Result,
    Settings, SimulationAssumptions,
};
use serde::Serialize;
use serde_json::json;
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "income")]
#[command(about = "Dividend portfolio analysis and passive-income projection")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to INCOME_CONFIG or the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON quote snapshot used as the market-data source
    #[arg(long, global = true)]
    quotes: Option<PathBuf>,

    /// Maximum concurrent quote lookups
    #[arg(long, global = true)]
    concurrency: Option<usize>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Portfolio commands
    Portfolio {
        #[command(subcommand)]
        action: PortfolioAction,
    },
    /// Rank candidate tickers by dividend opportunity
    Rank {
        /// Candidate tickers (comma-separated); defaults to the configured universe
        #[arg(short, long)]
        tickers: Option<String>,
        /// Minimum dividend yield in percent
        #[arg(long)]
        min_yield: Option<f64>,
        /// Exclusive upper P/E bound
        #[arg(long)]
        max_pe: Option<f64>,
    },
    /// Project dividend reinvestment toward income milestones
    Simulate {
        /// Starting capital
        #[arg(short, long)]
        initial: Option<f64>,
        /// Monthly contribution
        #[arg(short, long)]
        monthly: Option<f64>,
        /// Expected annual dividend yield in percent
        #[arg(short = 'y', long)]
        yield_pct: Option<f64>,
        /// Include the month-by-month trajectory
        #[arg(long)]
        steps: bool,
    },
    /// Yield on cost for one ticker
    Yoc {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,
        /// Average purchase price
        #[arg(short, long)]
        average_price: f64,
    },
}

#[derive(Subcommand)]
enum PortfolioAction {
    /// Indicators, yield on cost and projected income for every position
    Analyze,
    /// List all positions
    Positions,
    /// Add or top up a position
    Add {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,
        /// Quantity bought
        #[arg(short = 'n', long)]
        quantity: f64,
        /// Price paid per unit
        #[arg(short, long)]
        price: Option<f64>,
    },
    /// Remove a position
    Remove {
        /// Ticker symbol
        #[arg(short, long)]
        ticker: String,
    },
}

fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let output = match load_settings(&cli) {
        Ok(settings) => match cli.command {
            Commands::Portfolio { action } => render(handle_portfolio(&settings, action)),
            Commands::Rank {
                tickers,
                min_yield,
                max_pe,
            } => render(handle_rank(&settings, tickers, min_yield, max_pe)),
            Commands::Simulate {
                initial,
                monthly,
                yield_pct,
                steps,
            } => render(handle_simulate(&settings, initial, monthly, yield_pct, steps)),
            Commands::Yoc {
                ticker,
                average_price,
            } => render(handle_yoc(&settings, &ticker, average_price)),
        },
        Err(e) => render::<()>(Err(e)),
    };

    println!("{}", output);
}

fn load_settings(cli: &Cli) -> Result<Settings> {
    let mut settings = match &cli.config {
        Some(path) => Settings::load_from_path(path)?,
        None => Settings::load()?,
    };
    if let Some(quotes) = &cli.quotes {
        settings.market.quotes_file = Some(quotes.clone());
    }
    if let Some(limit) = cli.concurrency {
        settings.market.concurrency = limit;
    }
    Ok(settings)
}

fn render<T: Serialize>(result: Result<T>) -> String {
    let response = match result {
        Ok(data) => serde_json::to_string_pretty(&ApiResponse::ok(data)),
        Err(e) => {
            tracing::error!("{}", e);
            serde_json::to_string_pretty(&ApiResponse::<()>::err(e.to_string()))
        }
    };
    response.unwrap_or_else(|e| format!(r#"{{"ok":false,"error":"{}"}}"#, e))
}

fn tracker(settings: &Settings) -> Result<PortfolioTracker> {
    match &settings.portfolio_file {
        Some(path) => PortfolioTracker::with_path(path.clone()),
        None => PortfolioTracker::new(),
    }
}

fn handle_portfolio(settings: &Settings, action: PortfolioAction) -> Result<serde_json::Value> {
    let mut tracker = tracker(settings)?;

    match action {
        PortfolioAction::Analyze => {
            let aggregator = settings.market.aggregator()?;
            let rows = analyze_positions(&aggregator, tracker.positions())?;
            let summary = PortfolioSummary::from_analyses(&rows);
            Ok(json!({
                "positions": rows,
                "summary": summary,
            }))
        }
        PortfolioAction::Positions => Ok(json!({
            "positions": tracker.positions(),
            "updatedAt": tracker.updated_at(),
        })),
        PortfolioAction::Add {
            ticker,
            quantity,
            price,
        } => {
            let (position, was_update) = tracker.add_position(&ticker, quantity, price)?;
            tracker.save()?;
            Ok(json!({
                "position": position,
                "action": if was_update { "updated" } else { "added" },
            }))
        }
        PortfolioAction::Remove { ticker } => {
            let removed = tracker.remove_position(&ticker)?;
            tracker.save()?;
            Ok(json!({ "removed": removed }))
        }
    }
}

fn handle_rank(
    settings: &Settings,
    tickers: Option<String>,
    min_yield: Option<f64>,
    max_pe: Option<f64>,
) -> Result<serde_json::Value> {
    let candidates: Vec<String> = match tickers {
        Some(list) => list
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        None => settings.ranking.candidates.clone(),
    };

    let mut criteria = settings.ranking.criteria;
    if let Some(min_yield) = min_yield {
        criteria.min_dividend_yield_pct = min_yield;
    }
    if let Some(max_pe) = max_pe {
        criteria.max_price_to_earnings = max_pe;
    }

    let aggregator = settings.market.aggregator()?;
    let ranked = income_core::OpportunityRanker::new(criteria).rank(&aggregator, &candidates);
    Ok(json!({
        "criteria": criteria,
        "candidates": candidates.len(),
        "ranked": ranked,
    }))
}

fn handle_simulate(
    settings: &Settings,
    initial: Option<f64>,
    monthly: Option<f64>,
    yield_pct: Option<f64>,
    include_steps: bool,
) -> Result<serde_json::Value> {
    let defaults = settings.simulation.assumptions();
    let assumptions = SimulationAssumptions {
        initial_capital: initial.unwrap_or(defaults.initial_capital),
        monthly_contribution: monthly.unwrap_or(defaults.monthly_contribution),
        annual_yield_pct: yield_pct.unwrap_or(defaults.annual_yield_pct),
    };

    let outcome = settings.simulation.simulator().run(&assumptions)?;
    let mut data = json!({
        "assumptions": assumptions,
        "months": outcome.months(),
        "finalCapital": outcome.final_capital(),
        "milestones": outcome.crossings,
    });
    if include_steps {
        data["steps"] = json!(outcome.steps);
    }
    Ok(data)
}

fn handle_yoc(settings: &Settings, ticker: &str, average_price: f64) -> Result<serde_json::Value> {
    let aggregator = settings.market.aggregator()?;
    let record = aggregator.fetch(ticker);
    let yoc = yield_on_cost(&record, average_price)?;
    Ok(json!({
        "indicators": record,
        "averagePrice": average_price,
        "yieldOnCostPct": yoc,
    }))
}
