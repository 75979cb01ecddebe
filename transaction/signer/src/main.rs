// Copyright (c) 2018-2025 The Botho Foundation

//! Key keeper host emulator.
//!
//! Runs a software key keeper and serves the binary protocol over stdio:
//! one hex-encoded request per input line, one hex-encoded response per
//! output line.

use anyhow::{bail, Context, Result};
use bip39::{Language, Mnemonic, MnemonicType};
use bth_keykeeper::{HostConfig, KeyKeeper, SpendKind, SpendRequest, UserConfirmation};
use bth_keykeeper_core::Path as KdfPath;
use bth_keykeeper_types::Status;
use clap::{Parser, Subcommand};
use rand_core::OsRng;
use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

#[derive(Parser)]
#[command(name = "keykeeper-host")]
#[command(about = "Botho key keeper emulator")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a new key keeper config with a fresh recovery phrase
    Init {
        /// Read an existing recovery phrase from stdin instead
        #[arg(long)]
        recover: bool,
    },

    /// Print the owner key and, optionally, a wallet identity key
    OwnerKey {
        /// Wallet identity to print the public key of
        #[arg(long)]
        identity: Option<u64>,
    },

    /// Serve hex-encoded protocol requests from stdin
    Serve,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = match cli.config {
        Some(path) => path,
        None => HostConfig::default_path().context("Could not find home directory")?,
    };

    match cli.command {
        Commands::Init { recover } => {
            init_logging(cli.verbose);
            init(&config_path, recover)
        }
        Commands::OwnerKey { identity } => {
            let config = HostConfig::load(&config_path)?;
            init_logging(cli.verbose || config.verbose);
            owner_key(&config, identity)
        }
        Commands::Serve => {
            let config = HostConfig::load(&config_path)?;
            init_logging(cli.verbose || config.verbose);
            serve(&config)
        }
    }
}

fn init_logging(verbose: bool) {
    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

fn init(config_path: &std::path::Path, recover: bool) -> Result<()> {
    if config_path.exists() {
        bail!(
            "Config already exists at {}\nUse a different --config path or delete the existing config.",
            config_path.display()
        );
    }

    let mnemonic = if recover {
        eprint!("Enter your recovery phrase: ");
        io::stderr().flush()?;
        let mut phrase = Zeroizing::new(String::new());
        io::stdin().lock().read_line(&mut phrase)?;
        Mnemonic::from_phrase(phrase.trim(), Language::English)
            .map_err(|e| anyhow::anyhow!("Invalid recovery phrase: {}", e))?
    } else {
        let mnemonic = Mnemonic::new(MnemonicType::Words24, Language::English);
        eprintln!("\nYour 24-word recovery phrase:\n");
        for (i, word) in mnemonic.phrase().split_whitespace().enumerate() {
            eprint!("{:2}. {:<12}", i + 1, word);
            if (i + 1) % 4 == 0 {
                eprintln!();
            }
        }
        eprintln!("\nKeep this phrase secret and safe!");
        mnemonic
    };

    let config = HostConfig {
        mnemonic: Some(mnemonic.phrase().to_string()),
        ..Default::default()
    };
    config.save(config_path)?;

    info!("Key keeper initialized at {}", config_path.display());
    Ok(())
}

fn owner_key(config: &HostConfig, identity: Option<u64>) -> Result<()> {
    let kdf = config.kdf()?;
    let keeper = KeyKeeper::new(kdf, config.keykeeper.clone(), HostConfirmation::new(config), OsRng)?;

    let owner = keeper.derive_public(&KdfPath::Root)?;
    println!("owner key: {}", hex::encode(owner.to_bytes()));

    if let Some(id) = identity {
        let pk = keeper.identity_public(id)?;
        println!("identity {}: {}", id, hex::encode(pk.as_bytes()));
    }
    Ok(())
}

fn serve(config: &HostConfig) -> Result<()> {
    let kdf = config.kdf()?;
    let mut keeper = KeyKeeper::new(
        kdf,
        config.keykeeper.clone(),
        HostConfirmation::new(config),
        OsRng,
    )?;
    info!("Serving requests on stdin");

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read request")?;
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let request = match hex::decode(line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Request is not valid hex");
                continue;
            }
        };
        let response = keeper.invoke_vec(&request);
        match Status::from_wire(&response) {
            Some(status) if status.is_ok() => {
                debug!(request_len = request.len(), response_len = response.len(), "Served")
            }
            status => warn!(opcode = request.first().copied(), ?status, "Request failed"),
        }
        writeln!(stdout, "{}", hex::encode(&response))?;
        stdout.flush()?;
    }
    Ok(())
}

/// Confirms spends on the controlling terminal, or approves everything when
/// configured to
struct HostConfirmation {
    auto_approve: bool,
}

impl HostConfirmation {
    fn new(config: &HostConfig) -> Self {
        Self {
            auto_approve: config.auto_approve,
        }
    }

    fn prompt(request: &SpendRequest) -> io::Result<bool> {
        let tty = File::options().read(true).write(true).open("/dev/tty")?;
        let mut out = tty.try_clone()?;
        let what = match request.kind {
            SpendKind::Split => "Split".to_string(),
            SpendKind::Send | SpendKind::SendShielded => format!(
                "Send {} of asset {} to {}",
                request.amount,
                request.asset_id,
                request.peer.map(hex::encode).unwrap_or_default()
            ),
            SpendKind::SelfShielded => "Shielded send to self".to_string(),
        };
        write!(out, "{}, fee {}. Approve? [y/N]: ", what, request.fee)?;
        out.flush()?;

        let mut input = String::new();
        BufReader::new(tty).read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y") || input.trim().eq_ignore_ascii_case("yes"))
    }
}

impl UserConfirmation for HostConfirmation {
    fn confirm_spend(&self, request: &SpendRequest) -> bool {
        if self.auto_approve {
            return true;
        }
        match Self::prompt(request) {
            Ok(approved) => approved,
            Err(e) => {
                warn!(error = %e, "No terminal to confirm on, rejecting spend");
                false
            }
        }
    }
}
