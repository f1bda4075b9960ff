//! pool-scout command line
use std::path::PathBuf;

use amm::constants::quote::{DEFAULT_MINIMUM_LIQUIDITY, DEFAULT_SLIPPAGE_BPS};
use amm_core::{FeeBps, TokenRef};
use anyhow::Result;
use clap::{Parser, Subcommand};
use pool_scout::{commands, init_tracing, AppState};
use serde::Serialize;

#[derive(Parser)]
#[command(name = "pool-scout", version)]
#[command(about = "Discover constant-product pools and quote swaps against them", long_about = None)]
struct Cli {
    /// JSON config file (defaults apply when omitted)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show ledger API status
    Status,
    /// Discover all pools of the configured contract
    Discover {
        /// Extra tokens to sweep pairwise, besides the configured ones
        #[arg(long = "token")]
        tokens: Vec<String>,
    },
    /// Quote a swap through the deepest pool
    Quote {
        #[arg(long)]
        token_in: String,

        #[arg(long)]
        token_out: String,

        /// Input amount in human units (e.g. 1.5)
        #[arg(long)]
        amount: String,

        #[arg(long, default_value_t = DEFAULT_SLIPPAGE_BPS)]
        slippage_bps: u128,
    },
    /// Preflight an add-liquidity deposit
    AddLiquidity {
        #[arg(long)]
        token_a: String,

        #[arg(long)]
        token_b: String,

        #[arg(long)]
        fee: FeeBps,

        #[arg(long)]
        amount_a: String,

        #[arg(long)]
        amount_b: String,

        #[arg(long, default_value_t = DEFAULT_MINIMUM_LIQUIDITY)]
        minimum_liquidity: u128,

        #[arg(long, default_value_t = DEFAULT_SLIPPAGE_BPS)]
        slippage_bps: u128,
    },
    /// Preview the amounts returned for burning liquidity shares
    RemoveLiquidity {
        #[arg(long)]
        token_a: String,

        #[arg(long)]
        token_b: String,

        #[arg(long)]
        fee: FeeBps,

        /// Shares in base units
        #[arg(long)]
        shares: u128,
    },
    /// Token balance of an account
    Balance {
        #[arg(long)]
        token: String,

        #[arg(long)]
        account: String,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing()?;
    let cli = Cli::parse();
    let state = AppState::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Status => print_json(&commands::get_node_status(&state).await),
        Commands::Discover { tokens } => {
            let tokens: Vec<TokenRef> = tokens.into_iter().map(TokenRef::new).collect();
            print_json(&commands::get_pools(&state, &tokens).await)
        }
        Commands::Quote {
            token_in,
            token_out,
            amount,
            slippage_bps,
        } => {
            let quote = commands::get_quote(
                &state,
                TokenRef::new(token_in),
                TokenRef::new(token_out),
                &amount,
                slippage_bps,
            )
            .await?;
            print_json(&quote)
        }
        Commands::AddLiquidity {
            token_a,
            token_b,
            fee,
            amount_a,
            amount_b,
            minimum_liquidity,
            slippage_bps,
        } => {
            let preview = commands::preview_add_liquidity(
                &state,
                TokenRef::new(token_a),
                TokenRef::new(token_b),
                fee,
                &amount_a,
                &amount_b,
                minimum_liquidity,
                slippage_bps,
            )
            .await?;
            print_json(&preview)
        }
        Commands::RemoveLiquidity {
            token_a,
            token_b,
            fee,
            shares,
        } => {
            let preview = commands::preview_remove_liquidity(
                &state,
                TokenRef::new(token_a),
                TokenRef::new(token_b),
                fee,
                shares,
            )
            .await?;
            print_json(&preview)
        }
        Commands::Balance { token, account } => {
            let balance =
                commands::get_token_balance(&state, TokenRef::new(token), account).await?;
            print_json(&balance)
        }
    }
}
