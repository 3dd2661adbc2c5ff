use std::io::Read;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use hellomask_core::config::{MaskConfig, Randomization};
use hellomask_core::hello::assembler::HelloAssembler;
use hellomask_core::hello::engine::WireEngine;
use hellomask_core::hello::inspect::parse_client_hello;
use hellomask_core::hello::{ja3, synthetic};

mod listen;
mod output;

#[derive(Parser)]
#[command(name = "hellomask")]
#[command(about = "Build ClientHellos that carry a decoy ClientHello in their padding extension")]
struct Cli {
    /// Output format: "text" (human-readable) or "json"
    #[arg(short, long, default_value = "text", global = true)]
    output: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Assemble a ClientHello and print its records as hex
    Build {
        /// Real server name, sent in the outer server_name extension
        #[arg(long)]
        sni: String,

        /// Decoy server name, carried by the hello hidden in the padding
        #[arg(long, default_value = "")]
        fake_sni: String,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Seed the decoy randomization (reproducible output)
        #[arg(long, conflicts_with = "no_randomize")]
        seed: Option<u64>,

        /// Disable decoy randomization entirely
        #[arg(long, default_value_t = false)]
        no_randomize: bool,

        /// Leave out the decoy padding extension
        #[arg(long, default_value_t = false)]
        no_padding: bool,
    },

    /// Decode hex-encoded ClientHello records and show what an observer sees
    Inspect {
        /// File holding the hex dump [default: stdin]
        file: Option<PathBuf>,
    },

    /// Accept TCP connections and print the ClientHello each client sends
    Listen {
        #[arg(short, long, default_value_t = 8443)]
        port: u16,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .init();

    let format = output::OutputFormat::parse(&cli.output)?;

    match cli.command {
        Commands::Build {
            sni,
            fake_sni,
            config,
            seed,
            no_randomize,
            no_padding,
        } => {
            let mut config = match config {
                Some(path) => MaskConfig::load(&path)
                    .with_context(|| format!("Failed to load config {}", path.display()))?,
                None => MaskConfig::default(),
            };
            if let Some(seed) = seed {
                config.randomization = Randomization::Seeded(seed);
            }
            if no_randomize {
                config.randomization = Randomization::Disabled;
            }
            if no_padding {
                config.smart_padding = false;
            }
            info!(randomization = ?config.randomization, "assembling ClientHello");

            let decoy_len = if config.smart_padding {
                Some(synthetic::length(&fake_sni)?)
            } else {
                None
            };
            // A randomized decoy has no single fingerprint to report.
            let decoy_ja3 = if config.smart_padding && config.randomization == Randomization::Disabled {
                Some(ja3::compute(&synthetic::decoy_spec(&fake_sni, None)?))
            } else {
                None
            };

            let assembler = HelloAssembler::new(config);
            let mut engine = WireEngine::new();
            assembler
                .apply(&mut engine, &sni, &fake_sni)
                .with_context(|| format!("Failed to assemble ClientHello for {}", sni))?;

            let spec = engine.spec().context("engine holds no spec")?;
            let records = engine.records().context("engine holds no records")?;
            let report = output::BuildReport {
                sni: &sni,
                fake_sni: assembler.config().smart_padding.then_some(fake_sni.as_str()),
                extensions: spec.extension_types(),
                padding_len: decoy_len,
                outer_ja3: ja3::compute(spec),
                decoy_ja3,
                records,
            };
            output::print_build(&report, format)?;
        }

        Commands::Inspect { file } => {
            let text = match &file {
                Some(path) => std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read {}", path.display()))?,
                None => {
                    let mut buf = String::new();
                    std::io::stdin().read_to_string(&mut buf)?;
                    buf
                }
            };
            let hex: String = text.chars().filter(|c| !c.is_whitespace()).collect();
            let raw = hex::decode(&hex).context("Input is not valid hex")?;
            let info = parse_client_hello(&raw)?;
            output::print_info(&info, format)?;
        }

        Commands::Listen { port } => {
            tokio::runtime::Runtime::new()?.block_on(listen::run(port, format))?;
        }
    }

    Ok(())
}
