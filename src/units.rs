//! Conversions between on-chain base units and the decimal strings the game
//! displays and wagers with.

use crate::{
    error::{
        WalletError,
        WalletResult,
    },
    network::ProviderFamily,
};

/// Places kept on a real balance after a flip.
pub const REAL_BALANCE_PLACES: usize = 4;
/// Places the simulated counter is displayed with.
pub const SIMULATED_BALANCE_PLACES: usize = 2;
/// Places a public-key chain balance is displayed with.
const PUBLIC_KEY_BALANCE_PLACES: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid quantity '{0}'")]
pub struct InvalidQuantity(pub String);

/// Renders `raw / 10^decimals` exactly, trimming trailing zeros.
/// `format_units(50_000_000_000_000_000, 18) == "0.05"`.
pub fn format_units(raw: u128, decimals: u32) -> String {
    let scale = 10u128.pow(decimals);
    let whole = raw / scale;
    let frac = raw % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let digits = format!("{:0width$}", frac, width = decimals as usize);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

/// Parses a JSON-RPC quantity, either `0x` prefixed hex or plain decimal.
pub fn parse_quantity(s: &str) -> Result<u128, InvalidQuantity> {
    let trimmed = s.trim();
    let parsed = match trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
    {
        Some("") => Ok(0),
        Some(hex) => u128::from_str_radix(hex, 16),
        None => trimmed.parse::<u128>(),
    };
    parsed.map_err(|_| InvalidQuantity(s.to_string()))
}

/// Turns a raw base-unit balance into the display string for the family:
/// exact ether for EVM chains, two decimals for public-key chains.
pub fn normalize_balance(family: ProviderFamily, raw: u128) -> Option<String> {
    let decimals = family.native_decimals()?;
    Some(match family {
        ProviderFamily::PublicKey => format_fixed(
            raw as f64 / 10f64.powi(decimals as i32),
            PUBLIC_KEY_BALANCE_PLACES,
        ),
        _ => format_units(raw, decimals),
    })
}

/// Rounds to `places` decimals, ties away from zero.
pub fn round_places(value: f64, places: usize) -> f64 {
    let scale = 10f64.powi(places as i32);
    let scaled = (value * scale).round();
    if scaled.is_finite() { scaled / scale } else { value }
}

/// Fixed-place rendering where ties round up in magnitude: `0.625` shows
/// as `0.63`, not the `0.62` plain `{:.2}` gives.
pub fn format_fixed(value: f64, places: usize) -> String {
    format!("{:.*}", places, round_places(value, places))
}

/// Reads a displayed balance back as a number; anything unparseable counts
/// as an empty wallet.
pub fn parse_balance(balance: Option<&str>) -> f64 {
    balance
        .and_then(|b| b.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Validates a wager typed by the user.
pub fn parse_wager(input: &str) -> WalletResult<f64> {
    match input.trim().parse::<f64>() {
        Ok(v) if v.is_finite() && v > 0.0 => Ok(v),
        _ => Err(WalletError::InvalidWager(input.to_string())),
    }
}
