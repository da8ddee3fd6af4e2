// src/cli.rs

//! Command-line surface.

use crate::config::{InspectorConfig, OutputFormat};
use crate::errors::{CliError, Result};
use crate::inspector::Inspector;
use crate::wallet::Wallet;
use clap::Parser;
use rand::rngs::OsRng;
use rand::{CryptoRng, RngCore};
use ringscope_core::{hex_to_hash, open_store};
use ringscope_crypto::Network;
use std::io::Write;
use std::path::PathBuf;
use tracing::info;

/// Reconstructs and checks the ring signatures of a pre-RingCT transaction
#[derive(Parser)]
#[command(name = "ringscope", version, about)]
pub struct Cli {
    /// Hash of the transaction to inspect
    #[arg(long = "txhash", value_name = "HEX32")]
    pub tx_hash: String,

    /// Private view key of the wallet that made the transaction
    #[arg(long = "viewkey", value_name = "HEX32")]
    pub view_key: Option<String>,

    /// Private spend key; enables key image reproduction and re-signing
    #[arg(long = "spendkey", value_name = "HEX32")]
    pub spend_key: Option<String>,

    /// Standard address of the wallet
    #[arg(long, value_name = "BASE58")]
    pub address: Option<String>,

    /// Chain snapshot to read
    #[arg(long = "bc-path", value_name = "PATH")]
    pub bc_path: Option<PathBuf>,

    /// Inspect only this input
    #[arg(long, value_name = "N")]
    pub idx: Option<usize>,

    /// JSON configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Network the address is expected on
    #[arg(long, value_parser = parse_network)]
    pub network: Option<Network>,

    /// Print secret material in reports and logs
    #[arg(long)]
    pub unsafe_diagnostics: bool,

    /// Emit the report as JSON
    #[arg(long)]
    pub json: bool,
}

fn parse_network(value: &str) -> std::result::Result<Network, String> {
    match value.to_ascii_lowercase().as_str() {
        "mainnet" => Ok(Network::Mainnet),
        "testnet" => Ok(Network::Testnet),
        "stagenet" => Ok(Network::Stagenet),
        other => Err(format!("unknown network '{}', expected mainnet, testnet or stagenet", other)),
    }
}

/// Process exit code for a failed argument parse
///
/// Help and version requests exit 0, every other parse error exits 1.
pub fn parse_error_exit_code(err: &clap::Error) -> u8 {
    match err.kind() {
        clap::error::ErrorKind::DisplayHelp | clap::error::ErrorKind::DisplayVersion => 0,
        _ => 1,
    }
}

impl Cli {
    /// Loads `--config` if given and applies the flags on top
    pub fn resolve_config(&self) -> Result<InspectorConfig> {
        let mut config = match &self.config {
            Some(path) => InspectorConfig::from_file(path)?,
            None => InspectorConfig::default(),
        };

        if let Some(path) = &self.bc_path {
            config.bc_path = path.clone();
        }
        if let Some(network) = self.network {
            config.network = network;
        }
        if self.unsafe_diagnostics {
            config.unsafe_diagnostics = true;
        }
        if self.json {
            config.output = OutputFormat::Json;
        }
        Ok(config)
    }

    /// Wallet described by the key flags, if any were given
    pub fn wallet(&self, network: Network) -> Result<Option<Wallet>> {
        match &self.view_key {
            Some(view) => Ok(Some(Wallet::from_parts(
                view,
                self.spend_key.as_deref(),
                self.address.as_deref(),
                network,
            )?)),
            None if self.spend_key.is_some() || self.address.is_some() => Err(
                CliError::InvalidArgument("--spendkey and --address need --viewkey".to_string()),
            ),
            None => Ok(None),
        }
    }
}

/// Runs one inspection and writes the report to `out`
///
/// # Returns
/// `true` if every inspected input verified
pub fn run<W: Write>(cli: &Cli, config: &InspectorConfig, out: &mut W) -> Result<bool> {
    run_with_rng(cli, config, out, &mut OsRng)
}

/// [`run`] with a caller-supplied RNG for the fresh signatures
pub fn run_with_rng<W: Write, R: RngCore + CryptoRng>(
    cli: &Cli,
    config: &InspectorConfig,
    out: &mut W,
    rng: &mut R,
) -> Result<bool> {
    let tx_hash = hex_to_hash(&cli.tx_hash)
        .map_err(|e| CliError::InvalidArgument(format!("--txhash: {}", e)))?;

    // Keys are checked before the snapshot is touched
    let wallet = cli.wallet(config.network)?;
    if config.unsafe_diagnostics {
        info!("Unsafe diagnostics enabled, secrets will be printed");
    }

    let store = open_store(&config.bc_path)?;

    let mut inspector = Inspector::new(&store).with_unsafe_diagnostics(config.unsafe_diagnostics);
    if let Some(wallet) = &wallet {
        inspector = inspector.with_wallet(wallet);
    }
    let report = inspector.inspect(&tx_hash, cli.idx, rng)?;

    match config.output {
        OutputFormat::Text => write!(out, "{}", report)?,
        OutputFormat::Json => {
            let json = report
                .to_json()
                .map_err(|e| CliError::ConfigError(format!("Failed to serialize report: {}", e)))?;
            writeln!(out, "{}", json)?;
        }
    }

    Ok(report.all_succeeded())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ringscope").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_txhash_is_required() {
        assert!(Cli::try_parse_from(["ringscope"]).is_err());
    }

    #[test]
    fn test_flags_override_defaults() {
        let cli = parse(&[
            "--txhash",
            &"ab".repeat(32),
            "--bc-path",
            "/tmp/chain.json",
            "--network",
            "Stagenet",
            "--json",
            "--idx",
            "3",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.bc_path, PathBuf::from("/tmp/chain.json"));
        assert_eq!(config.network, Network::Stagenet);
        assert_eq!(config.output, OutputFormat::Json);
        assert!(!config.unsafe_diagnostics);
        assert_eq!(cli.idx, Some(3));
    }

    #[test]
    fn test_unknown_network_rejected() {
        let result =
            Cli::try_parse_from(["ringscope", "--txhash", "00", "--network", "regtest"]);
        assert!(result.is_err());
    }

    fn parse_exit_code(args: &[&str]) -> u8 {
        let err = Cli::try_parse_from(std::iter::once("ringscope").chain(args.iter().copied()))
            .err()
            .unwrap();
        parse_error_exit_code(&err)
    }

    #[test]
    fn test_parse_errors_exit_one() {
        assert_eq!(parse_exit_code(&[]), 1);
        assert_eq!(parse_exit_code(&["--txhash", "00", "--idx", "first"]), 1);
        assert_eq!(parse_exit_code(&["--txhash", "00", "--network", "regtest"]), 1);
        assert_eq!(parse_exit_code(&["--txhash", "00", "--bogus"]), 1);
    }

    #[test]
    fn test_help_and_version_exit_zero() {
        assert_eq!(parse_exit_code(&["--help"]), 0);
        assert_eq!(parse_exit_code(&["--version"]), 0);
    }

    #[test]
    fn test_spend_key_without_view_key() {
        let cli = parse(&["--txhash", "00", "--spendkey", &"01".repeat(32)]);
        assert!(matches!(cli.wallet(Network::Mainnet), Err(CliError::InvalidArgument(_))));
    }

    #[test]
    fn test_no_keys_means_no_wallet() {
        let cli = parse(&["--txhash", "00"]);
        assert!(cli.wallet(Network::Mainnet).unwrap().is_none());
    }

    #[test]
    fn test_bad_txhash_fails_before_store() {
        let cli = parse(&["--txhash", "xyz", "--bc-path", "/nonexistent/chain.json"]);
        let config = cli.resolve_config().unwrap();
        let err = run(&cli, &config, &mut Vec::new()).unwrap_err();
        assert!(matches!(err, CliError::InvalidArgument(_)));
    }
}
