//! Wallet provider integrations, one per network family.
//!
//! EVM chains (Ethereum, Polygon) go through an [`AccountWallet`], which hands
//! out addresses and pushes account and chain changes. Public-key chains
//! (Solana) go through a [`KeyWallet`], which hands out a single public key.
//! Bitcoin has no integration and always reports itself as unimplemented.

use crate::{
    error::{
        WalletError,
        WalletResult,
    },
    network::{
        Network,
        ProviderFamily,
    },
};
use std::{
    future::Future,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time,
};
use tracing::{
    debug,
    warn,
};

pub mod evm;
pub mod rpc;
pub mod solana;

pub use evm::EvmWallet;
pub use solana::SolanaWallet;

const EVM_HINT: &str = "Pass --evm-rpc-url or set COINFLIP_EVM_RPC_URL.";
const SOLANA_HINT: &str = "Pass --solana-wallet or set COINFLIP_SOLANA_WALLET.";

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ProviderError {
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("{0}")]
    Failed(String),
}

impl From<rpc::RpcError> for ProviderError {
    fn from(err: rpc::RpcError) -> Self {
        if err.is_user_rejection() {
            ProviderError::Rejected(err.to_string())
        } else {
            ProviderError::Failed(err.to_string())
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Capabilities of an account based (EVM) wallet.
pub trait AccountWallet: Send + Sync {
    /// Asks the wallet to expose its accounts, prompting the user if needed.
    fn request_accounts(&self) -> impl Future<Output = ProviderResult<Vec<String>>> + Send;

    /// Accounts currently exposed, without prompting.
    fn accounts(&self) -> impl Future<Output = ProviderResult<Vec<String>>> + Send;

    fn chain_id(&self) -> impl Future<Output = ProviderResult<String>> + Send;

    /// Balance in wei.
    fn get_balance(&self, address: &str) -> impl Future<Output = ProviderResult<u128>> + Send;
}

/// Capabilities of a public-key wallet.
pub trait KeyWallet: Send + Sync {
    fn connect(&self) -> impl Future<Output = ProviderResult<String>> + Send;

    /// Balance in lamports.
    fn get_balance(&self, public_key: &str)
    -> impl Future<Output = ProviderResult<u64>> + Send;
}

/// Pushed by an account wallet when its state changes underneath the game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

/// The installed wallets. A missing entry means the user has no wallet for
/// that family.
#[derive(Debug, Clone)]
pub struct Providers<A, K> {
    pub evm: Option<A>,
    pub solana: Option<K>,
}

impl<A, K> Default for Providers<A, K> {
    fn default() -> Self {
        Self {
            evm: None,
            solana: None,
        }
    }
}

/// The wallet serving one network.
pub enum Provider<'a, A, K> {
    Evm(&'a A),
    PublicKey(&'a K),
}

impl<A, K> Providers<A, K> {
    pub fn new(evm: Option<A>, solana: Option<K>) -> Self {
        Self { evm, solana }
    }

    /// Picks the wallet for `network`. `operation` names what the caller was
    /// about to do, for the unimplemented case.
    pub fn for_network(
        &self,
        network: Network,
        operation: &'static str,
    ) -> WalletResult<Provider<'_, A, K>> {
        match network.family() {
            ProviderFamily::Evm => self.evm.as_ref().map(Provider::Evm).ok_or(
                WalletError::ProviderUnavailable {
                    network,
                    hint: EVM_HINT,
                },
            ),
            ProviderFamily::PublicKey => self
                .solana
                .as_ref()
                .map(Provider::PublicKey)
                .ok_or(WalletError::ProviderUnavailable {
                    network,
                    hint: SOLANA_HINT,
                }),
            ProviderFamily::Unimplemented => {
                Err(WalletError::NotImplemented { network, operation })
            }
        }
    }
}

impl<A: AccountWallet, K: KeyWallet> Provider<'_, A, K> {
    /// Returns the primary account the wallet exposes.
    pub async fn connect(&self) -> ProviderResult<String> {
        match self {
            Provider::Evm(wallet) => wallet
                .request_accounts()
                .await?
                .into_iter()
                .next()
                .ok_or_else(|| ProviderError::Rejected("wallet returned no accounts".into())),
            Provider::PublicKey(wallet) => wallet.connect().await,
        }
    }

    /// Balance in the family's base unit.
    pub async fn balance(&self, account: &str) -> ProviderResult<u128> {
        match self {
            Provider::Evm(wallet) => wallet.get_balance(account).await,
            Provider::PublicKey(wallet) => wallet.get_balance(account).await.map(u128::from),
        }
    }
}

/// Polls an account wallet and forwards account and chain changes. The first
/// observation only sets the baseline. Stops when the receiver goes away.
pub async fn watch_account_wallet<A: AccountWallet>(
    wallet: A,
    poll_interval: Duration,
    events: mpsc::UnboundedSender<ProviderEvent>,
) {
    let mut ticker = time::interval(poll_interval);
    let mut last_accounts: Option<Vec<String>> = None;
    let mut last_chain: Option<String> = None;

    loop {
        ticker.tick().await;
        if events.is_closed() {
            break;
        }
        match wallet.accounts().await {
            Ok(accounts) => {
                if last_accounts.as_ref().is_some_and(|prev| *prev != accounts) {
                    debug!(?accounts, "wallet accounts changed");
                    if events
                        .send(ProviderEvent::AccountsChanged(accounts.clone()))
                        .is_err()
                    {
                        break;
                    }
                }
                last_accounts = Some(accounts);
            }
            Err(err) => warn!(%err, "polling wallet accounts failed"),
        }
        match wallet.chain_id().await {
            Ok(chain) => {
                if last_chain.as_ref().is_some_and(|prev| *prev != chain) {
                    debug!(%chain, "wallet chain changed");
                    if events.send(ProviderEvent::ChainChanged(chain.clone())).is_err() {
                        break;
                    }
                }
                last_chain = Some(chain);
            }
            Err(err) => warn!(%err, "polling wallet chain id failed"),
        }
    }
}
