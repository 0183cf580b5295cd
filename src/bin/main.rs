//! wallet-keeper daemon
//!
//! Serves the keeper surface over HTTP in front of an account-based ledger
//! node:
//!   wallet-keeper --rpc http://127.0.0.1:8545 \
//!       --accounts /var/lib/wallet-keeper/accounts.json \
//!       --wallet-dir /var/lib/wallet-keeper/keystore \
//!       --listen 127.0.0.1:7080
//!
//! The key-encryption passphrase is read from the environment variable named
//! by --passphrase-env (default WALLET_KEEPER_PASSPHRASE); it never appears
//! on the command line.

use anyhow::Context;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wallet_keeper::logging::init_logging;
use wallet_keeper::{create_router, runtime, EthKeeper, KeeperConfig};

const DEFAULT_PASSPHRASE_ENV: &str = "WALLET_KEEPER_PASSPHRASE";

#[derive(Default)]
struct ParsedArgs {
    rpc_url: Option<String>,
    accounts: Option<String>,
    wallet_dir: Option<String>,
    listen: Option<String>,
    passphrase_env: Option<String>,
    timeout_secs: Option<u64>,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut opts = ParsedArgs::default();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--rpc" => opts.rpc_url = Some(Self::value(args, &mut i)?),
                "--accounts" => opts.accounts = Some(Self::value(args, &mut i)?),
                "--wallet-dir" => opts.wallet_dir = Some(Self::value(args, &mut i)?),
                "--listen" => opts.listen = Some(Self::value(args, &mut i)?),
                "--passphrase-env" => opts.passphrase_env = Some(Self::value(args, &mut i)?),
                "--timeout" => {
                    let raw = Self::value(args, &mut i)?;
                    let secs = raw
                        .parse()
                        .map_err(|_| format!("--timeout wants seconds, got {raw:?}"))?;
                    opts.timeout_secs = Some(secs);
                }
                other => return Err(format!("Unknown argument: {other}")),
            }
            i += 1;
        }

        Ok(opts)
    }

    fn value(args: &[String], i: &mut usize) -> Result<String, String> {
        let flag = args[*i].clone();
        *i += 1;
        args.get(*i)
            .cloned()
            .ok_or_else(|| format!("{flag} requires a value"))
    }
}

fn print_usage() {
    println!(
        "wallet-keeper - uniform wallet surface over an account-based ledger

USAGE:
    wallet-keeper [OPTIONS]

OPTIONS:
    --rpc <url>              Ledger node JSON-RPC endpoint
    --accounts <path>        Account -> address binding file (must exist)
    --wallet-dir <path>      Keystore directory (must exist)
    --listen <addr:port>     HTTP listen address (default 127.0.0.1:7080)
    --passphrase-env <name>  Env var holding the key passphrase
                             (default {DEFAULT_PASSPHRASE_ENV})
    --timeout <seconds>      Per-request ledger RPC timeout (default 10)
    -h, --help               Show this help
    -V, --version            Show version"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let args: Vec<String> = env::args().skip(1).collect();
    let opts = match ParsedArgs::parse(&args) {
        Ok(opts) => opts,
        Err(e) => {
            eprintln!("{e}");
            print_usage();
            std::process::exit(2);
        }
    };

    if opts.help {
        print_usage();
        return Ok(());
    }
    if opts.version {
        println!("wallet-keeper {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let passphrase_env = opts
        .passphrase_env
        .unwrap_or_else(|| DEFAULT_PASSPHRASE_ENV.to_string());
    let passphrase = env::var(&passphrase_env)
        .with_context(|| format!("passphrase env var {passphrase_env} is not set"))?;

    let mut config = KeeperConfig::default().with_passphrase(passphrase);
    if let Some(rpc_url) = opts.rpc_url {
        config.rpc_url = rpc_url;
    }
    if let Some(accounts) = opts.accounts {
        config.account_path = accounts.into();
    }
    if let Some(wallet_dir) = opts.wallet_dir {
        config.wallet_dir = wallet_dir.into();
    }
    if let Some(listen) = opts.listen {
        config.listen = listen
            .parse::<SocketAddr>()
            .with_context(|| format!("bad --listen address {listen:?}"))?;
    }
    if let Some(secs) = opts.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    let keeper = EthKeeper::open(&config).context("starting keeper")?;
    let router = create_router(Arc::new(keeper));

    let listener = tokio::net::TcpListener::bind(config.listen)
        .await
        .with_context(|| format!("binding {}", config.listen))?;
    info!(listen = %config.listen, rpc = %config.rpc_url, "wallet-keeper serving");

    axum::serve(listener, router)
        .with_graceful_shutdown(runtime::shutdown_signal())
        .await
        .context("serving")?;

    Ok(())
}
