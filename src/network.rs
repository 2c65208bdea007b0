use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    str::FromStr,
};

/// Blockchain networks a session can target.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum Network {
    #[default]
    Ethereum,
    Polygon,
    Solana,
    Bitcoin,
}

/// How a network's wallet provider is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderFamily {
    /// Account based chains driven through an EVM JSON-RPC wallet.
    Evm,
    /// Chains where the wallet hands out a public key.
    PublicKey,
    /// No wallet integration exists.
    Unimplemented,
}

impl Network {
    pub const ALL: [Network; 4] = [
        Network::Ethereum,
        Network::Polygon,
        Network::Solana,
        Network::Bitcoin,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Network::Ethereum => "Ethereum",
            Network::Polygon => "Polygon",
            Network::Solana => "Solana",
            Network::Bitcoin => "Bitcoin",
        }
    }

    /// Display unit of the network's native currency.
    pub fn symbol(self) -> &'static str {
        match self {
            Network::Ethereum => "ETH",
            Network::Polygon => "MATIC",
            Network::Solana => "SOL",
            Network::Bitcoin => "BTC",
        }
    }

    pub fn family(self) -> ProviderFamily {
        match self {
            Network::Ethereum | Network::Polygon => ProviderFamily::Evm,
            Network::Solana => ProviderFamily::PublicKey,
            Network::Bitcoin => ProviderFamily::Unimplemented,
        }
    }

    pub fn next(self) -> Network {
        let idx = Self::ALL.iter().position(|n| *n == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Network {
        let idx = Self::ALL.iter().position(|n| *n == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

impl ProviderFamily {
    /// Decimals between the chain's base unit and its display unit.
    pub fn native_decimals(self) -> Option<u32> {
        match self {
            ProviderFamily::Evm => Some(18),
            ProviderFamily::PublicKey => Some(9),
            ProviderFamily::Unimplemented => None,
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown network '{0}', expected one of ethereum, polygon, solana, bitcoin")]
pub struct UnknownNetwork(pub String);

impl FromStr for Network {
    type Err = UnknownNetwork;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Ok(Network::Ethereum),
            "polygon" | "matic" => Ok(Network::Polygon),
            "solana" | "sol" => Ok(Network::Solana),
            "bitcoin" | "btc" => Ok(Network::Bitcoin),
            other => Err(UnknownNetwork(other.to_string())),
        }
    }
}
