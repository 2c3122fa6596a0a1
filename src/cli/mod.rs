use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;

use crate::api::{self, AppState};
use crate::application::LedgerService;
use crate::config::AppConfig;
use crate::currency::CurrencyGateway;
use crate::domain::{format_money, parse_money, Account, AccountNumber};
use crate::telemetry;

/// bankdata - account ledger service
#[derive(Parser)]
#[command(name = "bankdata")]
#[command(about = "Account ledger with deposits, transfers and currency conversion")]
#[command(version)]
pub struct Cli {
    /// Database file path (overrides DATABASE_PATH)
    #[arg(short, long)]
    pub database: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Run the HTTP API
    Serve {
        /// Bind host (overrides APP_HOST)
        #[arg(long)]
        host: Option<String>,

        /// Bind port (overrides APP_PORT)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Deposit money into an account
    Deposit {
        /// Account number
        account: String,

        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,
    },

    /// Transfer money between accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Source account number
        #[arg(long)]
        from: String,

        /// Destination account number
        #[arg(long)]
        to: String,
    },

    /// Show the balance of an account
    Balance {
        /// Account number
        account: String,
    },

    /// Convert an amount between two supported currencies
    Convert {
        /// Amount to convert
        amount: String,

        /// Source currency code
        #[arg(long)]
        from: String,

        /// Target currency code
        #[arg(long)]
        to: String,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Open a new account
    Create {
        /// Account holder's first name
        first_name: String,

        /// Account holder's last name
        last_name: String,
    },

    /// List all accounts
    List,

    /// Show account details
    Show {
        /// Account number
        account: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = AppConfig::from_env()?;
        if let Some(path) = self.database {
            config.database_path = path;
        }

        let default_filter = match (&self.command, self.verbose) {
            (_, true) => "debug",
            (Commands::Serve { .. }, false) => "info",
            _ => "warn",
        };
        telemetry::init(config.log_format, default_filter);

        match self.command {
            Commands::Init => {
                LedgerService::init(&config.database_path).await?;
                println!("Database initialized: {}", config.database_path);
            }

            Commands::Serve { host, port } => {
                if let Some(host) = host {
                    config.app_host = host;
                }
                if let Some(port) = port {
                    config.app_port = port;
                }
                run_server(config).await?;
            }

            Commands::Account(cmd) => {
                let service = LedgerService::connect(&config.database_path).await?;
                run_account_command(&service, cmd).await?;
            }

            Commands::Deposit { account, amount } => {
                let service = LedgerService::connect(&config.database_path).await?;
                let amount =
                    parse_money(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let updated = service
                    .deposit(&AccountNumber::from(account), amount)
                    .await?;
                println!(
                    "Deposited {} into {} (balance {})",
                    format_money(amount),
                    updated.account_number,
                    format_money(updated.balance)
                );
            }

            Commands::Transfer { amount, from, to } => {
                let service = LedgerService::connect(&config.database_path).await?;
                let amount =
                    parse_money(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                service
                    .transfer(
                        &AccountNumber::from(from.as_str()),
                        &AccountNumber::from(to.as_str()),
                        amount,
                    )
                    .await?;
                println!("Transferred {}: {} -> {}", format_money(amount), from, to);
            }

            Commands::Balance { account } => {
                let service = LedgerService::connect(&config.database_path).await?;
                let balance = service.get_balance(&AccountNumber::from(account)).await?;
                println!("{}", format_money(balance));
            }

            Commands::Convert { amount, from, to } => {
                let Some(from) = config.currencies.resolve(&from) else {
                    bail!("Unsupported currency: {}", from);
                };
                let Some(to) = config.currencies.resolve(&to) else {
                    bail!("Unsupported currency: {}", to);
                };
                let amount =
                    parse_money(&amount).context("Invalid amount format. Use '50.00' or '50'")?;

                let gateway = CurrencyGateway::new(config.gateway)?;
                let converted = gateway.convert(amount, &from, &to).await?;
                println!("{} {} = {} {}", amount, from, converted, to);
            }
        }

        Ok(())
    }
}

async fn run_server(config: AppConfig) -> Result<()> {
    if let Err(err) = config.require_gateway() {
        tracing::warn!("{}; currency conversion will fail until it is set", err);
    }

    let ledger = LedgerService::init(&config.database_path).await?;
    let gateway = CurrencyGateway::new(config.gateway.clone())?;
    let state = AppState::new(ledger, gateway, config.currencies.clone());

    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    api::serve(listener, state).await
}

async fn run_account_command(service: &LedgerService, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            first_name,
            last_name,
        } => {
            let account = service.create_account(first_name, last_name).await?;
            println!(
                "Created account {} for {}",
                account.account_number,
                account.full_name()
            );
        }

        AccountCommands::List => {
            let accounts = service.list_accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!("{:<38} {:<30} {:>14}", "ACCOUNT NUMBER", "HOLDER", "BALANCE");
                println!("{}", "-".repeat(84));
                for account in accounts {
                    println!(
                        "{:<38} {:<30} {:>14}",
                        account.account_number,
                        account.full_name(),
                        format_money(account.balance)
                    );
                }
            }
        }

        AccountCommands::Show { account } => {
            let account = service.get_account(&AccountNumber::from(account)).await?;
            print_account(&account);
        }
    }
    Ok(())
}

fn print_account(account: &Account) {
    println!("Account: {}", account.account_number);
    println!("  ID:        {}", account.id);
    println!("  Holder:    {}", account.full_name());
    println!("  Balance:   {}", format_money(account.balance));
    println!(
        "  Opened:    {}",
        account.created_at.format("%Y-%m-%d %H:%M:%S")
    );
}
