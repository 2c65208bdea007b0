use coinflip_wallet::{
    game::GameSettings,
    network::Network,
    provider::solana::DEFAULT_SOLANA_RPC_URL,
    session::SimulatedBalance,
    wager::FLIP_DELAY,
};
use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use std::{
    path::PathBuf,
    time::Duration,
};

pub const EVM_RPC_URL_ENV: &str = "COINFLIP_EVM_RPC_URL";
pub const SOLANA_RPC_URL_ENV: &str = "COINFLIP_SOLANA_RPC_URL";
pub const SOLANA_WALLET_ENV: &str = "COINFLIP_SOLANA_WALLET";

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);
pub const DEFAULT_RPC_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_LOG_DIR: &str = "~/.coinflip-wallet/logs";

pub const USAGE: &str = "\
Usage: coinflip-wallet [--network <name>] [--evm-rpc-url <url>]
       [--solana-rpc-url <url>] [--solana-wallet <pubkey>]
       [--starting-balance <n>] [--flip-delay-ms <n>] [--poll-ms <n>]
       [--rpc-timeout-ms <n>] [--log-dir <path>]

Flags:
  --network <name>          Network selected at start (ethereum, polygon, solana, bitcoin)
  --evm-rpc-url <url>       JSON-RPC endpoint of the EVM wallet (env COINFLIP_EVM_RPC_URL)
  --solana-rpc-url <url>    Solana JSON-RPC endpoint (env COINFLIP_SOLANA_RPC_URL)
  --solana-wallet <pubkey>  Public key of the Solana wallet (env COINFLIP_SOLANA_WALLET)
  --starting-balance <n>    Starting balance of the dummy account (default 5)
  --flip-delay-ms <n>       Time the coin spends in the air (default 2000)
  --poll-ms <n>             How often the EVM wallet is polled for changes (default 1000)
  --rpc-timeout-ms <n>      Timeout for wallet requests (default 10000)
  --log-dir <path>          Directory for log files (default ~/.coinflip-wallet/logs)";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub game: GameSettings,
    pub evm_rpc_url: Option<String>,
    pub solana_rpc_url: String,
    pub solana_wallet: Option<String>,
    pub poll_interval: Duration,
    pub rpc_timeout: Duration,
    pub log_dir: PathBuf,
}

/// Parses command line flags, falling back to the environment for wallet
/// settings. `Ok(None)` means help was requested.
pub fn parse_cli_args<I, E>(args: I, env: E) -> Result<Option<AppConfig>>
where
    I: IntoIterator<Item = String>,
    E: Fn(&str) -> Option<String>,
{
    let mut args = args.into_iter();
    let mut network: Option<Network> = None;
    let mut evm_rpc_url: Option<String> = None;
    let mut solana_rpc_url: Option<String> = None;
    let mut solana_wallet: Option<String> = None;
    let mut starting_balance: Option<f64> = None;
    let mut flip_delay: Option<Duration> = None;
    let mut poll_interval: Option<Duration> = None;
    let mut rpc_timeout: Option<Duration> = None;
    let mut log_dir: Option<String> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--network" => {
                let value = flag_value(&mut args, &arg)?;
                let parsed = value.parse::<Network>()?;
                set_once(&mut network, parsed, &arg)?;
            }
            "--evm-rpc-url" => {
                let value = flag_value(&mut args, &arg)?;
                set_once(&mut evm_rpc_url, value, &arg)?;
            }
            "--solana-rpc-url" => {
                let value = flag_value(&mut args, &arg)?;
                set_once(&mut solana_rpc_url, value, &arg)?;
            }
            "--solana-wallet" => {
                let value = flag_value(&mut args, &arg)?;
                set_once(&mut solana_wallet, value, &arg)?;
            }
            "--starting-balance" => {
                let value = flag_value(&mut args, &arg)?;
                let parsed = value
                    .parse::<f64>()
                    .ok()
                    .filter(|v| v.is_finite() && *v >= 0.0)
                    .ok_or_else(|| {
                        eyre!("--starting-balance expects a non-negative number, got '{value}'")
                    })?;
                set_once(&mut starting_balance, parsed, &arg)?;
            }
            "--flip-delay-ms" => {
                let parsed = millis(flag_value(&mut args, &arg)?, &arg)?;
                set_once(&mut flip_delay, parsed, &arg)?;
            }
            "--poll-ms" => {
                let parsed = millis(flag_value(&mut args, &arg)?, &arg)?;
                if parsed.is_zero() {
                    return Err(eyre!("--poll-ms must be greater than zero"));
                }
                set_once(&mut poll_interval, parsed, &arg)?;
            }
            "--rpc-timeout-ms" => {
                let parsed = millis(flag_value(&mut args, &arg)?, &arg)?;
                set_once(&mut rpc_timeout, parsed, &arg)?;
            }
            "--log-dir" => {
                let value = flag_value(&mut args, &arg)?;
                set_once(&mut log_dir, value, &arg)?;
            }
            "--help" | "-h" => return Ok(None),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let log_dir = log_dir.unwrap_or_else(|| DEFAULT_LOG_DIR.to_string());
    let log_dir = PathBuf::from(shellexpand::tilde(&log_dir).into_owned());

    Ok(Some(AppConfig {
        game: GameSettings {
            network: network.unwrap_or_default(),
            starting_balance: starting_balance.unwrap_or(SimulatedBalance::STARTING),
            flip_delay: flip_delay.unwrap_or(FLIP_DELAY),
        },
        evm_rpc_url: evm_rpc_url.or_else(|| non_empty(env(EVM_RPC_URL_ENV))),
        solana_rpc_url: solana_rpc_url
            .or_else(|| non_empty(env(SOLANA_RPC_URL_ENV)))
            .unwrap_or_else(|| DEFAULT_SOLANA_RPC_URL.to_string()),
        solana_wallet: solana_wallet.or_else(|| non_empty(env(SOLANA_WALLET_ENV))),
        poll_interval: poll_interval.unwrap_or(DEFAULT_POLL_INTERVAL),
        rpc_timeout: rpc_timeout.unwrap_or(DEFAULT_RPC_TIMEOUT),
        log_dir,
    }))
}

fn flag_value(args: &mut impl Iterator<Item = String>, flag: &str) -> Result<String> {
    args.next()
        .ok_or_else(|| eyre!("{flag} requires an argument"))
}

fn set_once<T>(slot: &mut Option<T>, value: T, flag: &str) -> Result<()> {
    if slot.is_some() {
        return Err(eyre!("{flag} may only be specified once"));
    }
    *slot = Some(value);
    Ok(())
}

fn millis(value: String, flag: &str) -> Result<Duration> {
    value
        .parse::<u64>()
        .map(Duration::from_millis)
        .wrap_err_with(|| format!("{flag} expects milliseconds, got '{value}'"))
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    #![allow(non_snake_case)]

    use super::*;
    use std::collections::HashMap;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn parse_cli_args__defaults() {
        let config = parse_cli_args(args(&[]), no_env).unwrap().unwrap();

        assert_eq!(config.game, GameSettings::default());
        assert_eq!(config.evm_rpc_url, None);
        assert_eq!(config.solana_rpc_url, DEFAULT_SOLANA_RPC_URL);
        assert_eq!(config.poll_interval, DEFAULT_POLL_INTERVAL);
        assert_eq!(config.rpc_timeout, DEFAULT_RPC_TIMEOUT);
    }

    #[test]
    fn parse_cli_args__reads_every_flag() {
        let config = parse_cli_args(
            args(&[
                "--network",
                "solana",
                "--evm-rpc-url",
                "http://localhost:8545",
                "--solana-wallet",
                "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM",
                "--starting-balance",
                "12.5",
                "--flip-delay-ms",
                "0",
                "--poll-ms",
                "250",
                "--rpc-timeout-ms",
                "1500",
                "--log-dir",
                "/tmp/coinflip",
            ]),
            no_env,
        )
        .unwrap()
        .unwrap();

        assert_eq!(config.game.network, Network::Solana);
        assert_eq!(config.game.starting_balance, 12.5);
        assert_eq!(config.game.flip_delay, Duration::ZERO);
        assert_eq!(config.evm_rpc_url.as_deref(), Some("http://localhost:8545"));
        assert_eq!(
            config.solana_wallet.as_deref(),
            Some("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM")
        );
        assert_eq!(config.poll_interval, Duration::from_millis(250));
        assert_eq!(config.rpc_timeout, Duration::from_millis(1500));
        assert_eq!(config.log_dir, PathBuf::from("/tmp/coinflip"));
    }

    #[test]
    fn parse_cli_args__flag_wins_over_environment() {
        let env: HashMap<&str, &str> = HashMap::from([
            (EVM_RPC_URL_ENV, "http://from-env:8545"),
            (SOLANA_WALLET_ENV, "11111111111111111111111111111111"),
        ]);
        let lookup = |key: &str| env.get(key).map(|v| v.to_string());

        let config = parse_cli_args(
            args(&["--evm-rpc-url", "http://from-flag:8545"]),
            lookup,
        )
        .unwrap()
        .unwrap();

        assert_eq!(config.evm_rpc_url.as_deref(), Some("http://from-flag:8545"));
        assert_eq!(
            config.solana_wallet.as_deref(),
            Some("11111111111111111111111111111111")
        );
    }

    #[test]
    fn parse_cli_args__rejects_unknown_and_duplicated_flags() {
        assert!(parse_cli_args(args(&["--bogus"]), no_env).is_err());
        assert!(
            parse_cli_args(args(&["--network", "polygon", "--network", "solana"]), no_env)
                .is_err()
        );
        assert!(parse_cli_args(args(&["--network", "dogecoin"]), no_env).is_err());
        assert!(parse_cli_args(args(&["--poll-ms", "0"]), no_env).is_err());
        assert!(parse_cli_args(args(&["--flip-delay-ms"]), no_env).is_err());
    }

    #[test]
    fn parse_cli_args__help_short_circuits() {
        assert_eq!(parse_cli_args(args(&["--help", "--bogus"]), no_env).unwrap(), None);
    }
}
