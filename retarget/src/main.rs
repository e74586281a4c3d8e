use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use powlib::params::{ConsensusConfig, Network};
use powlib::types::Blockchain;
use powlib::util::{to_hex, Savable};
use powlib::{compact, Algorithm, CheckMode, DoubleSha256, Hash, PowHasher, U256};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(author, version, about = "Difficulty retarget and proof-of-work checks", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Network preset
    #[arg(long, global = true, default_value = "main")]
    network: Network,

    /// JSON consensus parameter file, used instead of the network preset
    #[arg(long, global = true)]
    params: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Target the next block on top of a chain file must meet
    Next {
        /// CBOR chain file (see chain_gen)
        #[arg(long)]
        chain: PathBuf,

        /// Candidate block timestamp (unix seconds)
        #[arg(long)]
        time: u32,
    },

    /// Check a hash against compact bits
    Verify {
        /// Compact target, hex
        #[arg(long)]
        bits: String,

        /// Hash as a big-endian hex number
        #[arg(long, conflicts_with = "header", required_unless_present = "header")]
        hash: Option<String>,

        /// Serialized header, hex; hashed with double SHA-256
        #[arg(long)]
        header: Option<String>,

        /// Print the result instead of failing
        #[arg(long)]
        lenient: bool,
    },

    /// Show where the retarget algorithm changes between two heights
    Schedule {
        #[arg(long, default_value = "0")]
        from: u64,

        #[arg(long)]
        to: u64,
    },
}

fn load_config(cli: &Cli) -> Result<ConsensusConfig> {
    let config = match &cli.params {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("reading params file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("parsing params file {}", path.display()))?
        }
        None => ConsensusConfig::for_network(cli.network),
    };
    config.validate()?;
    Ok(config)
}

fn parse_bits(raw: &str) -> Result<u32> {
    u32::from_str_radix(raw.trim_start_matches("0x"), 16)
        .map_err(|e| anyhow!("invalid bits '{raw}': {e}"))
}

fn parse_hash(raw: &str) -> Result<Hash> {
    let bytes = hex::decode(raw.trim_start_matches("0x")).context("hash is not hex")?;
    if bytes.len() != 32 {
        bail!("hash must be 32 bytes, got {}", bytes.len());
    }
    Ok(Hash::from_u256(U256::from_big_endian(&bytes)))
}

fn next(config: &ConsensusConfig, chain_file: &Path, time: u32) -> Result<()> {
    let chain = Blockchain::load_from_file(chain_file)
        .with_context(|| format!("loading chain {}", chain_file.display()))?;
    let next_height = chain.block_height();
    let algorithm = if chain.is_empty() {
        // genesis는 항상 pow limit
        None
    } else {
        Some(Algorithm::for_height(next_height, config))
    };

    let bits = chain.next_target(time, config)?;
    match algorithm {
        Some(algorithm) => println!("height:    {next_height} ({algorithm})"),
        None => println!("height:    0 (genesis)"),
    }
    if let Some(tip) = chain.tip() {
        log::info!("tip {} at {} with bits {:08x}", tip.height, tip.time, tip.bits);
    }
    println!("bits:      {bits:08x}");
    println!("target:    {}", to_hex(compact::decode(bits).target));
    Ok(())
}

fn verify(
    config: &ConsensusConfig,
    bits: &str,
    hash: Option<&str>,
    header: Option<&str>,
    lenient: bool,
) -> Result<()> {
    let bits = parse_bits(bits)?;
    let hash = match (hash, header) {
        (Some(hash), _) => parse_hash(hash)?,
        (None, Some(header)) => {
            let header = hex::decode(header.trim_start_matches("0x")).context("header is not hex")?;
            DoubleSha256.pow_hash(&header)
        }
        (None, None) => bail!("either --hash or --header is required"),
    };
    let mode = if lenient { CheckMode::Lenient } else { CheckMode::Strict };

    println!("hash:      {hash}");
    println!("target:    {}", to_hex(compact::decode(bits).target));
    let valid = powlib::verify(&hash, bits, config, mode)?;
    println!("valid:     {valid}");
    Ok(())
}

fn schedule(config: &ConsensusConfig, from: u64, to: u64) -> Result<()> {
    if to < from {
        bail!("--to must not be below --from");
    }
    let mut current: Option<Algorithm> = None;
    for height in from..=to {
        let algorithm = Algorithm::for_height(height, config);
        if current != Some(algorithm) {
            println!("{height:>10}  {algorithm}");
            current = Some(algorithm);
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match &cli.command {
        Commands::Next { chain, time } => next(&config, chain, *time),
        Commands::Verify {
            bits,
            hash,
            header,
            lenient,
        } => verify(&config, bits, hash.as_deref(), header.as_deref(), *lenient),
        Commands::Schedule { from, to } => schedule(&config, *from, *to),
    }
}
