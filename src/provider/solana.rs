use super::{
    KeyWallet,
    ProviderError,
    ProviderResult,
    rpc::{
        JsonRpcClient,
        RpcError,
    },
};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

pub const DEFAULT_SOLANA_RPC_URL: &str = "https://api.mainnet-beta.solana.com";

const BASE58_ALPHABET: &str =
    "123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";

/// Public-key wallet holding a configured address; balances are read from a
/// Solana JSON-RPC endpoint.
#[derive(Clone, Debug)]
pub struct SolanaWallet {
    public_key: String,
    rpc: JsonRpcClient,
}

#[derive(Deserialize)]
struct BalanceResponse {
    value: u64,
}

impl SolanaWallet {
    pub fn new(
        public_key: impl Into<String>,
        rpc_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, RpcError> {
        Ok(Self {
            public_key: public_key.into(),
            rpc: JsonRpcClient::new(rpc_url, timeout)?,
        })
    }
}

/// Shape check for a base58 encoded 32-byte key.
pub fn looks_like_public_key(key: &str) -> bool {
    (32..=44).contains(&key.len()) && key.chars().all(|c| BASE58_ALPHABET.contains(c))
}

impl KeyWallet for SolanaWallet {
    async fn connect(&self) -> ProviderResult<String> {
        if !looks_like_public_key(&self.public_key) {
            return Err(ProviderError::Rejected(format!(
                "'{}' is not a valid public key",
                self.public_key
            )));
        }
        Ok(self.public_key.clone())
    }

    async fn get_balance(&self, public_key: &str) -> ProviderResult<u64> {
        let response: BalanceResponse = self
            .rpc
            .call("getBalance", json!([public_key, { "commitment": "confirmed" }]))
            .await?;
        Ok(response.value)
    }
}
