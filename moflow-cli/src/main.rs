//! MoFlow CLI
//!
//! Command-line front-end for the MoFlow finance app: records transactions,
//! summarizes them, exports PDF reports and converts currencies.

mod config;

use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Local, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use exchange_rates::CurrencyCode;
use moflow_client::ExchangeRateClient;
use moflow_core::{
    CurrencyService, CurrencyViewModel, FinanceService, FinanceViewModel, HomeViewModel,
};
use moflow_repo::{RemoteCurrencyRepo, Repo, build_repo};
use moflow_types::{
    MonthFilter, TransactionCategory, TransactionId, TransactionRepository, TransactionType,
};

use crate::config::Config;

#[derive(Parser)]
#[command(name = "moflow")]
#[command(author, version, about = "MoFlow personal finance CLI", long_about = None)]
struct Cli {
    /// Database URL (`sqlite://...` or `memory://`)
    #[arg(long, env = "MOFLOW_DATABASE_URL")]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Transaction operations
    Tx {
        #[command(subcommand)]
        action: TxCommands,
    },
    /// Show the latest exchange rates
    Rates {
        /// Base currency
        #[arg(long, default_value = "USD")]
        base: String,
    },
    /// List supported currencies
    Currencies,
    /// Convert an amount between currencies
    Convert {
        amount: String,
        #[arg(long, default_value = "USD")]
        from: String,
        #[arg(long, default_value = "EUR")]
        to: String,
    },
    /// Export the filtered transaction list as a PDF
    Report {
        #[command(flatten)]
        filter: FilterArgs,
        /// Output directory (defaults to MOFLOW_REPORT_DIR)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TxCommands {
    /// Record a new transaction
    Add {
        amount: String,
        /// INCOME or EXPENSE
        #[arg(long = "type", default_value = "EXPENSE")]
        kind: String,
        /// FOOD, TRANSPORT, ENTERTAINMENT, SALARY, GIFT or OTHER
        #[arg(long, default_value = "OTHER")]
        category: String,
        /// YYYY-MM-DD or RFC 3339; defaults to now
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Replace fields of an existing transaction
    Update {
        id: String,
        #[arg(long)]
        amount: Option<String>,
        #[arg(long = "type")]
        kind: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        date: Option<String>,
        #[arg(long)]
        notes: Option<String>,
    },
    /// Delete a transaction
    Delete { id: String },
    /// Show one transaction
    Get { id: String },
    /// List transactions with optional filters
    List {
        #[command(flatten)]
        filter: FilterArgs,
    },
    /// Print the transaction list after every change
    Watch,
    /// Show the five most recent transactions
    Recent,
}

#[derive(clap::Args)]
struct FilterArgs {
    /// Month 1-12 or "all"; defaults to the current month
    #[arg(long)]
    month: Option<String>,
    #[arg(long)]
    category: Option<String>,
    #[arg(long = "type")]
    kind: Option<String>,
}

fn parse_id(s: &str) -> Result<TransactionId> {
    s.parse()
        .map_err(|_| anyhow::anyhow!("Invalid transaction ID: {}", s))
}

fn parse_currency(s: &str) -> Result<CurrencyCode> {
    s.parse().map_err(|e| anyhow::anyhow!("{}", e))
}

fn parse_month(s: &str) -> Result<MonthFilter> {
    if s.eq_ignore_ascii_case("all") {
        return Ok(MonthFilter::All);
    }
    let month: u32 = s
        .parse()
        .map_err(|_| anyhow::anyhow!("Invalid month: {}. Use 1-12 or \"all\"", s))?;
    if !(1..=12).contains(&month) {
        anyhow::bail!("Invalid month: {}. Use 1-12 or \"all\"", s);
    }
    Ok(MonthFilter::month(month - 1)?)
}

fn parse_date(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(s) {
        return Ok(date.with_timezone(&Utc));
    }
    let day = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map_err(|_| anyhow::anyhow!("Invalid date: {}. Use YYYY-MM-DD or RFC 3339", s))?;
    day.and_hms_opt(0, 0, 0)
        .and_then(|midnight| midnight.and_local_timezone(Local).earliest())
        .map(|local| local.with_timezone(&Utc))
        .ok_or_else(|| anyhow::anyhow!("Date does not exist locally: {}", s))
}

fn apply_filters<R: TransactionRepository>(
    vm: &FinanceViewModel<R>,
    filter: &FilterArgs,
) -> Result<()> {
    if let Some(month) = &filter.month {
        vm.set_month_filter(parse_month(month)?);
    }
    if let Some(category) = &filter.category {
        vm.set_category_filter(Some(category.parse::<TransactionCategory>()?));
    }
    if let Some(kind) = &filter.kind {
        vm.set_type_filter(Some(kind.parse::<TransactionType>()?));
    }
    Ok(())
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,moflow_core=debug,moflow_repo=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn currency_service(config: &Config) -> Result<CurrencyService<RemoteCurrencyRepo>> {
    let mut client = ExchangeRateClient::new(&config.exchange_api_url)
        .with_timeout(config.exchange_timeout)
        .context("failed to build HTTP client")?;
    if let Some(key) = &config.exchange_api_key {
        client = client.with_api_key(key);
    } else {
        tracing::warn!("EXCHANGE_RATE_API_KEY is not set; rate requests will fail");
    }
    Ok(CurrencyService::new(RemoteCurrencyRepo::new(client)))
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let mut config = Config::from_env()?;
    if let Some(url) = cli.database_url {
        config.database_url = url;
    }

    if let Err(e) = run(cli.command, &config).await {
        tracing::error!(error = %e, "command failed");
        return Err(e);
    }
    Ok(())
}

async fn run(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Tx { action } => {
            tracing::debug!("Using database: {}", config.database_url);
            let repo = build_repo(&config.database_url).await?;
            run_tx(action, FinanceService::new(repo)).await
        }

        Commands::Rates { base } => {
            let service = currency_service(config)?;
            let rates = service.get_exchange_rates(&parse_currency(&base)?).await?;
            print_json(&rates)
        }

        Commands::Currencies => {
            let service = currency_service(config)?;
            for code in service.supported_currencies().await {
                println!("{}", code);
            }
            Ok(())
        }

        Commands::Convert { amount, from, to } => {
            let from = parse_currency(&from)?;
            let to = parse_currency(&to)?;
            let vm = CurrencyViewModel::new(currency_service(config)?).with_selection(
                from,
                to,
                &amount,
            );
            vm.fetch_exchange_rates().await;

            let state = vm.snapshot();
            if state.amount != amount {
                anyhow::bail!("Invalid amount: {}", amount);
            }
            if let Some(error) = &state.error {
                eprintln!("warning: {}", error);
            }
            println!(
                "{} {} = {:.4} {} (rate {:.6})",
                state.amount, state.from, state.converted_amount, state.to, state.rate
            );
            Ok(())
        }

        Commands::Report { filter, out } => {
            let repo = build_repo(&config.database_url).await?;
            let vm = FinanceViewModel::new(FinanceService::new(repo));
            vm.loaded().await;
            apply_filters(&vm, &filter)?;

            let dir = out.unwrap_or_else(|| config.report_dir.clone());
            match vm.export_report(&dir).await {
                Some(path) => {
                    println!("{}", path.display());
                    Ok(())
                }
                None => anyhow::bail!(
                    "{}",
                    vm.snapshot().error.unwrap_or_else(|| "export failed".into())
                ),
            }
        }
    }
}

async fn run_tx(action: TxCommands, service: FinanceService<Repo>) -> Result<()> {
    match action {
        TxCommands::Add {
            amount,
            kind,
            category,
            date,
            notes,
        } => {
            let vm = FinanceViewModel::new(service.clone());
            vm.open_add_form();
            vm.set_form_amount(amount);
            vm.set_form_type(kind.parse()?);
            vm.set_form_category(category.parse()?);
            if let Some(date) = date {
                vm.set_form_date(parse_date(&date)?);
            }
            vm.set_form_notes(notes);

            let Some(id) = vm.add_transaction().await else {
                anyhow::bail!(
                    "{}",
                    vm.snapshot().error.unwrap_or_else(|| "add failed".into())
                );
            };
            print_json(&service.get_transaction(id).await?)
        }

        TxCommands::Update {
            id,
            amount,
            kind,
            category,
            date,
            notes,
        } => {
            let id = parse_id(&id)?;
            let existing = service.get_transaction(id).await?;

            let vm = FinanceViewModel::new(service.clone());
            vm.open_edit_form(&existing);
            if let Some(amount) = amount {
                vm.set_form_amount(amount);
            }
            if let Some(kind) = kind {
                vm.set_form_type(kind.parse()?);
            }
            if let Some(category) = category {
                vm.set_form_category(category.parse()?);
            }
            if let Some(date) = date {
                vm.set_form_date(parse_date(&date)?);
            }
            if let Some(notes) = notes {
                vm.set_form_notes(notes);
            }

            if !vm.update_transaction().await {
                anyhow::bail!(
                    "{}",
                    vm.snapshot().error.unwrap_or_else(|| "update failed".into())
                );
            }
            print_json(&service.get_transaction(id).await?)
        }

        TxCommands::Delete { id } => {
            let id = parse_id(&id)?;
            service.delete_transaction_by_id(id).await?;
            println!("Deleted {}", id);
            Ok(())
        }

        TxCommands::Get { id } => print_json(&service.get_transaction(parse_id(&id)?).await?),

        TxCommands::List { filter } => {
            let vm = FinanceViewModel::new(service);
            vm.loaded().await;
            apply_filters(&vm, &filter)?;

            let state = vm.snapshot();
            if let Some(error) = &state.error {
                anyhow::bail!("{}", error);
            }
            print_json(&state.filtered)?;
            println!(
                "month {}: income {:.2}, expense {:.2}, balance {:.2}",
                state.filter.month,
                state.monthly_income,
                state.monthly_expense,
                state.monthly_income - state.monthly_expense
            );
            Ok(())
        }

        TxCommands::Watch => {
            let mut live = service.observe_transactions();
            loop {
                tokio::select! {
                    next = live.next() => match next {
                        Some(Ok(list)) => println!("{}", serde_json::to_string(&list)?),
                        Some(Err(e)) => tracing::warn!(error = %e, "live query failed"),
                        None => return Ok(()),
                    },
                    _ = tokio::signal::ctrl_c() => return Ok(()),
                }
            }
        }

        TxCommands::Recent => {
            let home = HomeViewModel::new(&service);
            let state = home.loaded().await;
            if let Some(error) = &state.error {
                anyhow::bail!("{}", error);
            }
            print_json(&state.recent)
        }
    }
}
