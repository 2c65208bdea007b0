//! Wallet session lifecycle: which network is selected, which account is
//! active and what its balance was last seen as.

use crate::{
    error::{
        WalletError,
        WalletResult,
    },
    network::{
        Network,
        ProviderFamily,
    },
    provider::{
        AccountWallet,
        KeyWallet,
        Providers,
    },
    units::{
        SIMULATED_BALANCE_PLACES,
        format_fixed,
        normalize_balance,
    },
};
use tracing::{
    debug,
    info,
};

/// Account id used for the simulated ("dummy") account.
pub const SIMULATED_ACCOUNT_ID: &str = "dummy-account";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub network: Network,
    pub account_id: Option<String>,
    pub balance: Option<String>,
    pub is_simulated: bool,
}

impl Session {
    pub fn new(network: Network) -> Self {
        Self {
            network,
            ..Self::default()
        }
    }

    pub fn is_connected(&self) -> bool {
        self.account_id.is_some()
    }
}

/// Balance of the simulated account. Lives outside [`Session`] so it
/// survives network switches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedBalance(f64);

impl SimulatedBalance {
    pub const STARTING: f64 = 5.0;

    pub fn new(value: f64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    pub fn set(&mut self, value: f64) {
        self.0 = value;
    }

    pub fn formatted(&self) -> String {
        format_fixed(self.0, SIMULATED_BALANCE_PLACES)
    }
}

impl Default for SimulatedBalance {
    fn default() -> Self {
        Self(Self::STARTING)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    ConnectedReal,
    ConnectedSimulated,
}

/// Handed out when a wallet connection starts. The result is only applied
/// while no reset happened in between.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectTicket {
    epoch: u64,
    pub network: Network,
}

/// Handed out when a balance query starts, see [`ConnectTicket`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceTicket {
    epoch: u64,
    pub network: Network,
    pub account: String,
}

/// What a successful wallet connection yielded. The balance may still have
/// failed independently of the account request.
#[derive(Debug, Clone, PartialEq)]
pub struct RealConnection {
    pub account_id: String,
    pub balance: WalletResult<String>,
}

#[derive(Debug, Clone, Default)]
pub struct SessionManager {
    session: Session,
    state: ConnectionState,
    resume_state: ConnectionState,
    epoch: u64,
}

impl SessionManager {
    pub fn new(network: Network) -> Self {
        Self {
            session: Session::new(network),
            ..Self::default()
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn network(&self) -> Network {
        self.session.network
    }

    /// Switches network and drops whatever account was active.
    pub fn select_network(&mut self, network: Network) {
        info!(%network, "network selected");
        self.epoch += 1;
        self.session = Session::new(network);
        self.state = ConnectionState::Disconnected;
    }

    pub fn connect_simulated(&mut self, simulated: &SimulatedBalance) {
        self.epoch += 1;
        self.session.account_id = Some(SIMULATED_ACCOUNT_ID.to_string());
        self.session.balance = Some(simulated.formatted());
        self.session.is_simulated = true;
        self.state = ConnectionState::ConnectedSimulated;
        info!(network = %self.session.network, "simulated account connected");
    }

    /// Moves to `Connecting`. Fails right away when the network has no
    /// usable wallet or a connection is already underway.
    pub fn begin_connect<A, K>(
        &mut self,
        providers: &Providers<A, K>,
    ) -> WalletResult<ConnectTicket> {
        if self.state == ConnectionState::Connecting {
            return Err(WalletError::OperationInProgress("wallet connection"));
        }
        providers.for_network(self.session.network, "wallet connection")?;
        self.resume_state = self.state;
        self.state = ConnectionState::Connecting;
        Ok(ConnectTicket {
            epoch: self.epoch,
            network: self.session.network,
        })
    }

    pub fn finish_connect(
        &mut self,
        ticket: ConnectTicket,
        result: WalletResult<RealConnection>,
    ) -> WalletResult<()> {
        if ticket.epoch != self.epoch || self.state != ConnectionState::Connecting {
            debug!(network = %ticket.network, "discarding stale connection result");
            return Ok(());
        }
        match result {
            Ok(connection) => {
                info!(
                    network = %ticket.network,
                    account = %connection.account_id,
                    "real wallet connected"
                );
                self.epoch += 1;
                self.session.account_id = Some(connection.account_id);
                self.session.is_simulated = false;
                self.state = ConnectionState::ConnectedReal;
                match connection.balance {
                    Ok(balance) => {
                        self.session.balance = Some(balance);
                        Ok(())
                    }
                    Err(err) => {
                        self.session.balance = None;
                        Err(err)
                    }
                }
            }
            Err(err) => {
                self.state = self.resume_state;
                Err(err)
            }
        }
    }

    pub async fn connect_real<A: AccountWallet, K: KeyWallet>(
        &mut self,
        providers: &Providers<A, K>,
    ) -> WalletResult<()> {
        let ticket = self.begin_connect(providers)?;
        let result = request_connection(providers, ticket.network).await;
        self.finish_connect(ticket, result)
    }

    /// Ticket for refreshing the real account's balance; `None` for the
    /// simulated account, which has nothing to fetch.
    pub fn balance_ticket(&self) -> WalletResult<Option<BalanceTicket>> {
        match self.state {
            ConnectionState::Disconnected => Err(WalletError::NotConnected),
            ConnectionState::Connecting => {
                Err(WalletError::OperationInProgress("wallet connection"))
            }
            ConnectionState::ConnectedSimulated => Ok(None),
            ConnectionState::ConnectedReal => {
                let account = self
                    .session
                    .account_id
                    .clone()
                    .ok_or(WalletError::NotConnected)?;
                Ok(Some(BalanceTicket {
                    epoch: self.epoch,
                    network: self.session.network,
                    account,
                }))
            }
        }
    }

    /// Applies a fetched balance. A failure leaves the previous value.
    pub fn apply_balance(
        &mut self,
        ticket: BalanceTicket,
        result: WalletResult<String>,
    ) -> WalletResult<()> {
        if ticket.epoch != self.epoch
            || self.session.account_id.as_deref() != Some(ticket.account.as_str())
        {
            debug!(account = %ticket.account, "discarding stale balance result");
            return Ok(());
        }
        self.session.balance = Some(result?);
        Ok(())
    }

    pub async fn refresh_balance<A: AccountWallet, K: KeyWallet>(
        &mut self,
        providers: &Providers<A, K>,
    ) -> WalletResult<()> {
        let Some(ticket) = self.balance_ticket()? else {
            return Ok(());
        };
        let result = fetch_balance(providers, ticket.network, &ticket.account).await;
        self.apply_balance(ticket, result)
    }

    /// Stores a balance computed locally, e.g. after a flip.
    pub fn record_balance(&mut self, balance: String) {
        self.session.balance = Some(balance);
    }

    /// Reacts to the account wallet exposing a different set of accounts.
    /// Only sessions on an account based network follow the wallet. A real
    /// balance stays on display until the returned ticket's fetch replaces it.
    pub fn accounts_changed(&mut self, accounts: &[String]) -> Option<BalanceTicket> {
        if self.session.network.family() != ProviderFamily::Evm {
            return None;
        }
        self.epoch += 1;
        match accounts.first() {
            Some(primary) => {
                info!(account = %primary, "wallet switched primary account");
                self.session.account_id = Some(primary.clone());
                if self.session.is_simulated {
                    self.session.balance = None;
                }
                self.session.is_simulated = false;
                self.state = ConnectionState::ConnectedReal;
                Some(BalanceTicket {
                    epoch: self.epoch,
                    network: self.session.network,
                    account: primary.clone(),
                })
            }
            None => {
                info!("wallet exposes no accounts, disconnecting");
                self.session = Session::new(self.session.network);
                self.state = ConnectionState::Disconnected;
                None
            }
        }
    }
}

/// Asks the network's wallet for an account and its balance.
pub async fn request_connection<A: AccountWallet, K: KeyWallet>(
    providers: &Providers<A, K>,
    network: Network,
) -> WalletResult<RealConnection> {
    let provider = providers.for_network(network, "wallet connection")?;
    let account_id =
        provider
            .connect()
            .await
            .map_err(|err| WalletError::ConnectionRejected {
                network,
                reason: err.to_string(),
            })?;
    let balance = fetch_balance(providers, network, &account_id).await;
    Ok(RealConnection {
        account_id,
        balance,
    })
}

/// Reads an account's balance and renders it in the network's display unit.
pub async fn fetch_balance<A: AccountWallet, K: KeyWallet>(
    providers: &Providers<A, K>,
    network: Network,
    account: &str,
) -> WalletResult<String> {
    let provider = providers.for_network(network, "balance fetching")?;
    let raw = provider
        .balance(account)
        .await
        .map_err(|err| WalletError::BalanceFetchFailed {
            network,
            reason: err.to_string(),
        })?;
    normalize_balance(network.family(), raw).ok_or(WalletError::NotImplemented {
        network,
        operation: "balance fetching",
    })
}
