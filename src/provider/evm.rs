use super::{
    AccountWallet,
    ProviderError,
    ProviderResult,
    rpc::{
        JsonRpcClient,
        NO_PARAMS,
        RpcError,
    },
};
use crate::units::parse_quantity;
use std::time::Duration;

/// EVM wallet reached over JSON-RPC, e.g. a local node or a wallet bridge.
#[derive(Clone, Debug)]
pub struct EvmWallet {
    rpc: JsonRpcClient,
}

impl EvmWallet {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, RpcError> {
        Ok(Self {
            rpc: JsonRpcClient::new(url, timeout)?,
        })
    }

    pub fn url(&self) -> &str {
        self.rpc.url()
    }
}

impl AccountWallet for EvmWallet {
    async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        Ok(self.rpc.call("eth_requestAccounts", NO_PARAMS).await?)
    }

    async fn accounts(&self) -> ProviderResult<Vec<String>> {
        Ok(self.rpc.call("eth_accounts", NO_PARAMS).await?)
    }

    async fn chain_id(&self) -> ProviderResult<String> {
        Ok(self.rpc.call("eth_chainId", NO_PARAMS).await?)
    }

    async fn get_balance(&self, address: &str) -> ProviderResult<u128> {
        let quantity: String = self
            .rpc
            .call("eth_getBalance", (address, "latest"))
            .await?;
        parse_quantity(&quantity).map_err(|e| ProviderError::Failed(e.to_string()))
    }
}
