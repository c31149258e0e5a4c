use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Args, Parser, Subcommand};
use serde_json::json;

use nomen_types::decode_address;
use nomen_wallet::KeyFile;

/// Nomen gateway CLI
#[derive(Parser, Debug)]
#[command(name = "nomen")]
#[command(about = "Check, register, and transfer subnames against a nomen gateway")]
#[command(version)]
pub struct Cli {
    /// Gateway base URL
    #[arg(long, global = true, default_value = "http://127.0.0.1:8085")]
    pub gateway_url: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Check whether a label is already registered
    Check(LabelArgs),
    /// Register a label and generate a fresh wallet for it
    Register(LabelArgs),
    /// Register a label pointing at an address you already control
    RegisterAddress(RegisterAddressArgs),
    /// Register a label pointing at a predicted smart-wallet address
    RegisterSmartWallet(RegisterSmartWalletArgs),
    /// Transfer ownership of a label to a new owner
    Transfer(TransferArgs),
    /// Generate an operator key file for the node's signing account
    GenerateKey(GenerateKeyArgs),
}

#[derive(Args, Debug)]
pub struct LabelArgs {
    /// Leaf label, e.g. "alice"
    pub label: String,
}

#[derive(Args, Debug)]
pub struct RegisterAddressArgs {
    /// Leaf label, e.g. "alice"
    pub label: String,

    /// Destination address the name should resolve to and be owned by
    #[arg(long)]
    pub destination: String,
}

#[derive(Args, Debug)]
pub struct RegisterSmartWalletArgs {
    /// Leaf label, e.g. "alice"
    pub label: String,

    /// Credential that will own the smart wallet once deployed
    #[arg(long)]
    pub owner: String,

    /// Deploy nonce for the factory's address derivation
    #[arg(long, default_value_t = 0)]
    pub deploy_nonce: u64,
}

#[derive(Args, Debug)]
pub struct TransferArgs {
    /// Leaf label, e.g. "alice"
    pub label: String,

    /// New owner address
    #[arg(long)]
    pub new_owner: String,
}

#[derive(Args, Debug)]
pub struct GenerateKeyArgs {
    /// Output path for the key file
    #[arg(long, default_value = "./keys/operator.key")]
    pub out: PathBuf,

    /// Overwrite the key file if it already exists
    #[arg(long, action = ArgAction::SetTrue)]
    pub force: bool,

    /// Optional free-form notes embedded in the key metadata
    #[arg(long)]
    pub notes: Option<String>,
}

/// Reject a malformed address locally before it costs a round trip.
fn require_address(raw: &str, what: &str) -> Result<()> {
    decode_address(raw).with_context(|| format!("invalid {what}: {raw}"))?;
    Ok(())
}

async fn post_json(
    client: &reqwest::Client,
    url: String,
    body: serde_json::Value,
) -> Result<serde_json::Value> {
    let response = client.post(&url).json(&body).send().await?;
    let status = response.status();
    let body: serde_json::Value = response
        .json()
        .await
        .unwrap_or_else(|_| serde_json::Value::Null);

    if status.is_success() {
        Ok(body)
    } else {
        bail!(
            "gateway answered {status}: {}",
            serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string())
        );
    }
}

fn print_pretty(value: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub async fn run_cli() -> Result<()> {
    let cli = Cli::parse();
    let base = cli.gateway_url.trim_end_matches('/').to_string();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Check(args) => {
            let body = post_json(
                &client,
                format!("{base}/v1/names/check"),
                json!({ "label": args.label }),
            )
            .await?;
            print_pretty(&body)
        }
        Commands::Register(args) => {
            let body = post_json(
                &client,
                format!("{base}/v1/names/register"),
                json!({ "label": args.label }),
            )
            .await?;
            eprintln!("store the private key now; it is not recoverable later");
            print_pretty(&body)
        }
        Commands::RegisterAddress(args) => {
            require_address(&args.destination, "destination address")?;
            let body = post_json(
                &client,
                format!("{base}/v1/names/register-address"),
                json!({ "label": args.label, "destination": args.destination }),
            )
            .await?;
            print_pretty(&body)
        }
        Commands::RegisterSmartWallet(args) => {
            require_address(&args.owner, "owner address")?;
            let body = post_json(
                &client,
                format!("{base}/v1/names/register-smart-wallet"),
                json!({
                    "label": args.label,
                    "owner": args.owner,
                    "deploy_nonce": args.deploy_nonce,
                }),
            )
            .await?;
            print_pretty(&body)
        }
        Commands::Transfer(args) => {
            require_address(&args.new_owner, "new owner address")?;
            let body = post_json(
                &client,
                format!("{base}/v1/names/transfer"),
                json!({ "label": args.label, "new_owner": args.new_owner }),
            )
            .await?;
            print_pretty(&body)
        }
        Commands::GenerateKey(args) => {
            let key_file = KeyFile::generate_to(&args.out, args.force, args.notes)?;
            print_pretty(&json!({
                "address": key_file.address,
                "public_key": key_file.public_key_hex,
                "key_file": args.out,
            }))
        }
    }
}
