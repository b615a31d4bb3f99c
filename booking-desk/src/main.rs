//! Booking desk command line interface

use std::sync::Arc;

use clap::{Parser, Subcommand};
use dotenv::dotenv;
use tracing::{debug, info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use common::model::trade::Trade;
use common::model::user::{SessionContext, UserAccount};
use settlement_service::export::prepare_download;
use settlement_service::SettlementEditor;
use trade_service::{
    HttpTradeBackend, InMemoryTradeBackend, SettlementDispatch, TradeBackend, TradeService,
    TradeServiceConfig,
};

/// Command line arguments
#[derive(Parser, Debug)]
#[clap(author, version, about)]
struct Args {
    /// Run against an in-memory backend instead of the configured API
    #[clap(short, long)]
    demo: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Book a new trade from the default template
    Book {
        /// Book name
        #[clap(long)]
        book: String,
        /// Counterparty name
        #[clap(long)]
        counterparty: String,
        /// Trader user id or display name
        #[clap(long)]
        trader: Option<String>,
        /// Settlement instruction text to save with the trade
        #[clap(long)]
        settlement: Option<String>,
    },
    /// Fetch and display a trade
    View { trade_id: String },
    /// Terminate a trade
    Terminate { trade_id: String },
    /// Generate and display cashflows for a trade
    Cashflows { trade_id: String },
    /// Settlement instruction operations
    Settlement {
        #[clap(subcommand)]
        action: SettlementAction,
    },
    /// Download the settlements CSV export
    Export {
        /// Only rows whose instructions match a non-standard keyword
        #[clap(long)]
        non_standard_only: bool,
        /// Only the authenticated user's trades
        #[clap(long)]
        mine_only: bool,
    },
}

#[derive(Subcommand, Debug)]
enum SettlementAction {
    /// Show the saved settlement instructions for a trade
    Get { trade_id: String },
    /// Validate and save settlement instructions for a trade
    Set { trade_id: String, text: String },
    /// Retry a settlement save that previously failed
    Retry { trade_id: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenv().ok();

    let args = Args::parse();

    // Initialize tracing with debug level if DEBUG=1 in .env
    let env_debug = std::env::var("DEBUG").unwrap_or_else(|_| "0".to_string());
    let log_level = if env_debug == "1" { Level::DEBUG } else { Level::INFO };

    let env_filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .parse("trade_service=debug,settlement_service=debug")
        .unwrap();

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_ok() {
        debug!("Tracing initialized");
    }

    let config = TradeServiceConfig::from_env();
    let backend: Arc<dyn TradeBackend> = if args.demo {
        info!("Running against the in-memory demo backend");
        Arc::new(InMemoryTradeBackend::new())
    } else {
        Arc::new(HttpTradeBackend::new(&config)?)
    };

    let session = SessionContext {
        current_user: Some(UserAccount {
            id: 1,
            login_id: std::env::var("DESK_USER").unwrap_or_else(|_| "desk".to_string()),
        }),
        users: Vec::new(),
    };
    let service = TradeService::new(backend.clone(), session, config);

    match args.command {
        Command::Book {
            book,
            counterparty,
            trader,
            settlement,
        } => {
            let mut trade = Trade::draft();
            trade.book_name = Some(book);
            trade.counterparty_name = Some(counterparty);
            trade.trader_user_id = trader;

            let outcome = service.save(&mut trade, settlement.as_deref()).await?;
            println!(
                "Trade {} {}.",
                outcome.trade_id,
                if outcome.created { "booked" } else { "updated" }
            );
            report_settlement(&outcome.settlement);
            // Let the deferred settlement save finish before the process exits.
            if let Some(task) = outcome.settlement_task {
                task.await.ok();
                if let Some(pending) = service.pending_settlement(&outcome.trade_id) {
                    println!(
                        "Settlement instructions were not saved and are pending retry: {}",
                        pending
                    );
                } else if settlement.is_some() {
                    println!("Settlement instructions saved.");
                }
            }
        }
        Command::View { trade_id } => {
            let trade = service.load(&trade_id).await?;
            println!("{}", serde_json::to_string_pretty(&trade)?);
        }
        Command::Terminate { trade_id } => {
            let mut trade = service.load(&trade_id).await?;
            service.terminate(&mut trade).await?;
            println!("Trade {} terminated.", trade_id);
        }
        Command::Cashflows { trade_id } => {
            let mut trade = service.load(&trade_id).await?;
            let rows = service.generate_cashflows(&mut trade).await?;
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Settlement { action } => match action {
            SettlementAction::Get { trade_id } => {
                let text = service.load_settlement(&trade_id).await?;
                if text.is_empty() {
                    println!("No settlement instructions saved.");
                } else {
                    println!("{}", text);
                }
            }
            SettlementAction::Set { trade_id, text } => {
                // Same checks the interactive editor applies, including the
                // strict length floor and the non-standard warning.
                let mut editor = SettlementEditor::new();
                editor.set_text(text);
                if let Some(error) = editor.show_error() {
                    return Err(error.into());
                }
                let keywords = editor.non_standard_matches();
                if !keywords.is_empty() {
                    println!("Warning: non-standard instructions ({}).", keywords.join(", "));
                }
                let mut trade = service.load(&trade_id).await?;
                let outcome = service.save(&mut trade, Some(editor.text())).await?;
                report_settlement(&outcome.settlement);
            }
            SettlementAction::Retry { trade_id } => {
                if service.retry_settlement(&trade_id).await? {
                    println!("Settlement instructions saved.");
                } else {
                    println!("Nothing pending for trade {}.", trade_id);
                }
            }
        },
        Command::Export {
            non_standard_only,
            mine_only,
        } => {
            let export = backend.export_settlements(non_standard_only, mine_only).await?;
            let download = prepare_download(export)?;
            tokio::fs::write(&download.file_name, &download.body).await?;
            println!("Saved {}.", download.file_name);
        }
    }

    Ok(())
}

fn report_settlement(dispatch: &SettlementDispatch) {
    match dispatch {
        SettlementDispatch::NotRequested => {}
        SettlementDispatch::Saved => println!("Settlement instructions saved."),
        SettlementDispatch::Deferred => {}
        SettlementDispatch::Rejected(reason) => {
            println!("Settlement instructions not saved: {}", reason)
        }
        SettlementDispatch::PendingRetry(reason) => println!(
            "Settlement instructions pending retry after failure: {}",
            reason
        ),
    }
}
