//! universe-vault CLI: seal, unlock and use a private-key vault
//!
//! Usage:
//!   universe-vault seal-key --user <USER> --pem <PEM_FILE>
//!   universe-vault unlock   --user <USER>
//!   universe-vault open     --user <USER> --message <MESSAGE_FILE>
//!   universe-vault inspect  --user <USER>

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use zeroize::Zeroizing;

use universe_vault::config::{ENV_DATA_DIR, ENV_LOG_FORMAT};
use universe_vault::{
    import_private_key, inspect, parse_message_batch, seal_private_key, EnvelopeStore, FileEnvelopeStore,
    LogFormat, MessageOutcome, Session, VaultConfig,
};

#[derive(Parser)]
#[command(name = "universe-vault", version, about = "Client-side key vault and message decryption")]
struct Cli {
    /// Root of local state (envelopes live in <DATA_DIR>/envelopes)
    #[arg(long, global = true, env = ENV_DATA_DIR)]
    data_dir: Option<PathBuf>,

    /// Log output: pretty or json
    #[arg(long, global = true, env = ENV_LOG_FORMAT)]
    log_format: Option<String>,

    /// Read the passphrase from this environment variable instead of prompting
    #[arg(long, global = true)]
    passphrase_env: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Seal a PKCS#8 PEM private key under a passphrase and store it
    SealKey {
        #[arg(long)]
        user: String,
        #[arg(long)]
        pem: PathBuf,
    },
    /// Check that the stored envelope unlocks
    Unlock {
        #[arg(long)]
        user: String,
    },
    /// Decrypt a message file (one message object or an array of them)
    Open {
        #[arg(long)]
        user: String,
        #[arg(long)]
        message: PathBuf,
    },
    /// Show the shape of the stored envelope without decrypting it
    Inspect {
        #[arg(long)]
        user: String,
    },
}

fn init_tracing(format: LogFormat) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "universe_vault=info".into());
    match format {
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .init(),
    }
}

fn read_passphrase(from_env: Option<&str>) -> anyhow::Result<Zeroizing<String>> {
    let passphrase = match from_env {
        Some(var) => Zeroizing::new(
            std::env::var(var).with_context(|| format!("passphrase variable {} is not set", var))?,
        ),
        None => Zeroizing::new(rpassword::prompt_password("Passphrase: ").context("read passphrase")?),
    };
    if passphrase.is_empty() {
        bail!("empty passphrase");
    }
    Ok(passphrase)
}

async fn cmd_seal_key(
    store: &dyn EnvelopeStore,
    user: &str,
    pem: &Path,
    passphrase_env: Option<&str>,
) -> anyhow::Result<()> {
    let pem_text = Zeroizing::new(fs::read_to_string(pem).with_context(|| format!("read {}", pem.display()))?);
    let key = import_private_key(&pem_text)
        .with_context(|| format!("{} is not a PKCS#8 RSA private key", pem.display()))?;
    let canonical = key.to_pkcs8_pem()?;
    let passphrase = read_passphrase(passphrase_env)?;
    let envelope = seal_private_key(&passphrase, &canonical).await?;
    store.put(user, &envelope)?;
    eprintln!("sealed private key for {}", user);
    eprintln!("  {}", inspect(&envelope));
    Ok(())
}

async fn cmd_unlock(store: &dyn EnvelopeStore, user: &str, passphrase_env: Option<&str>) -> anyhow::Result<()> {
    let session = Session::login_from_store(user, store)?;
    let passphrase = read_passphrase(passphrase_env)?;
    let key = session.unlock(&passphrase).await?;
    eprintln!("vault for {} unlocked", user);
    println!("{}", key.public_key().to_pem()?);
    session.logout();
    Ok(())
}

async fn cmd_open(
    store: &dyn EnvelopeStore,
    user: &str,
    message: &Path,
    passphrase_env: Option<&str>,
) -> anyhow::Result<()> {
    let data = fs::read_to_string(message).with_context(|| format!("read {}", message.display()))?;
    let entries = parse_message_batch(&data).with_context(|| format!("parse {}", message.display()))?;
    let labels: Vec<String> = entries
        .iter()
        .enumerate()
        .map(|(i, entry)| match entry {
            Ok(msg) => format!("{} -> {}", msg.sender_id, msg.receiver_id),
            Err(_) => format!("message #{}", i),
        })
        .collect();

    let session = Session::login_from_store(user, store)?;
    let passphrase = read_passphrase(passphrase_env)?;
    session.unlock(&passphrase).await?;

    let outcomes = session.open_batch(entries).await?;
    let mut failed = 0usize;
    for (label, outcome) in labels.iter().zip(&outcomes) {
        match outcome {
            MessageOutcome::Decrypted(text) => println!("{}: {}", label, text),
            MessageOutcome::Undecryptable(e) => {
                failed += 1;
                println!("{}: [cannot decrypt: {}]", label, e);
            }
        }
    }
    session.logout();
    if failed > 0 {
        bail!("{} of {} message(s) could not be decrypted", failed, outcomes.len());
    }
    Ok(())
}

fn cmd_inspect(store: &dyn EnvelopeStore, user: &str) -> anyhow::Result<()> {
    let Some(envelope) = store.get(user)? else {
        bail!("no envelope stored for {}", user);
    };
    println!("{}", inspect(&envelope));
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = VaultConfig::from_env();
    if let Some(dir) = cli.data_dir {
        config.data_dir = dir;
    }
    if let Some(format) = cli.log_format.as_deref() {
        config.log_format = LogFormat::parse(format);
    }
    init_tracing(config.log_format);

    let store = FileEnvelopeStore::new(config.envelope_dir())?;
    tracing::debug!(dir = %store.dir().display(), "using envelope store");
    let passphrase_env = cli.passphrase_env.as_deref();

    match &cli.command {
        Command::SealKey { user, pem } => cmd_seal_key(&store, user, pem, passphrase_env).await,
        Command::Unlock { user } => cmd_unlock(&store, user, passphrase_env).await,
        Command::Open { user, message } => cmd_open(&store, user, message, passphrase_env).await,
        Command::Inspect { user } => cmd_inspect(&store, user),
    }
}
