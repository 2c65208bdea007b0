use crate::{
    error::{
        WalletError,
        WalletResult,
    },
    network::Network,
    provider::{
        AccountWallet,
        KeyWallet,
        ProviderEvent,
        Providers,
    },
    session::{
        BalanceTicket,
        ConnectTicket,
        ConnectionState,
        RealConnection,
        Session,
        SessionManager,
        SimulatedBalance,
    },
    units::{
        REAL_BALANCE_PLACES,
        format_fixed,
    },
    wager::{
        Coin,
        EngineState,
        FlipOutcome,
        PendingFlip,
        WagerEngine,
        WagerRequest,
        current_balance,
    },
};
use std::time::Duration;
use tracing::{
    error,
    warn,
};

/// Start-up values; a chain change restores all of them.
#[derive(Debug, Clone, PartialEq)]
pub struct GameSettings {
    pub network: Network,
    pub starting_balance: f64,
    pub flip_delay: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            network: Network::default(),
            starting_balance: SimulatedBalance::STARTING,
            flip_delay: crate::wager::FLIP_DELAY,
        }
    }
}

/// The single owner of all game state. Every mutation goes through here.
pub struct CoinFlipGame<A, K, C> {
    settings: GameSettings,
    providers: Providers<A, K>,
    sessions: SessionManager,
    simulated: SimulatedBalance,
    engine: WagerEngine<C>,
    last_outcome: Option<FlipOutcome>,
    last_error: Option<WalletError>,
}

impl<A, K, C> CoinFlipGame<A, K, C>
where
    A: AccountWallet,
    K: KeyWallet,
    C: Coin,
{
    pub fn new(settings: GameSettings, providers: Providers<A, K>, coin: C) -> Self {
        Self {
            sessions: SessionManager::new(settings.network),
            simulated: SimulatedBalance::new(settings.starting_balance),
            engine: WagerEngine::new(coin, settings.flip_delay),
            providers,
            settings,
            last_outcome: None,
            last_error: None,
        }
    }

    pub fn providers(&self) -> &Providers<A, K> {
        &self.providers
    }

    pub fn session(&self) -> &Session {
        self.sessions.session()
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.sessions.state()
    }

    pub fn network(&self) -> Network {
        self.sessions.network()
    }

    pub fn simulated_balance(&self) -> SimulatedBalance {
        self.simulated
    }

    pub fn is_flipping(&self) -> bool {
        self.engine.state() == EngineState::Flipping
    }

    pub fn flip_delay(&self) -> Duration {
        self.engine.delay()
    }

    pub fn last_outcome(&self) -> Option<&FlipOutcome> {
        self.last_outcome.as_ref()
    }

    pub fn last_error(&self) -> Option<&WalletError> {
        self.last_error.as_ref()
    }

    /// Balance wagers are checked against, `None` while disconnected.
    pub fn current_balance(&self) -> Option<f64> {
        let session = self.session();
        session
            .is_connected()
            .then(|| current_balance(session, &self.simulated))
    }

    /// Balance as shown to the user. The simulated account always shows its
    /// live counter.
    pub fn display_balance(&self) -> Option<String> {
        let session = self.session();
        if session.is_simulated {
            Some(self.simulated.formatted())
        } else {
            session.balance.clone()
        }
    }

    pub fn select_network(&mut self, network: Network) {
        self.engine.cancel();
        self.sessions.select_network(network);
        self.last_outcome = None;
        self.last_error = None;
    }

    pub fn connect_simulated(&mut self) {
        self.engine.cancel();
        self.sessions.connect_simulated(&self.simulated);
        self.last_error = None;
    }

    pub fn begin_connect(&mut self) -> WalletResult<ConnectTicket> {
        if self.sessions.state() != ConnectionState::Connecting {
            self.last_error = None;
        }
        let ticket = self.sessions.begin_connect(&self.providers);
        self.record(ticket)
    }

    pub fn finish_connect(
        &mut self,
        ticket: ConnectTicket,
        result: WalletResult<RealConnection>,
    ) -> WalletResult<()> {
        let was_connecting = self.sessions.state() == ConnectionState::Connecting;
        let result = self.sessions.finish_connect(ticket, result);
        if was_connecting && self.sessions.state() == ConnectionState::ConnectedReal {
            self.engine.cancel();
        }
        self.record(result)
    }

    pub async fn connect_real(&mut self) -> WalletResult<()> {
        let ticket = self.begin_connect()?;
        let result =
            crate::session::request_connection(&self.providers, ticket.network).await;
        self.finish_connect(ticket, result)
    }

    pub fn balance_ticket(&mut self) -> WalletResult<Option<BalanceTicket>> {
        let ticket = self.sessions.balance_ticket();
        self.record(ticket)
    }

    pub fn apply_balance(
        &mut self,
        ticket: BalanceTicket,
        result: WalletResult<String>,
    ) -> WalletResult<()> {
        let result = self.sessions.apply_balance(ticket, result);
        self.record(result)
    }

    pub async fn refresh_balance(&mut self) -> WalletResult<()> {
        let Some(ticket) = self.balance_ticket()? else {
            return Ok(());
        };
        let result =
            crate::session::fetch_balance(&self.providers, ticket.network, &ticket.account)
                .await;
        self.apply_balance(ticket, result)
    }

    /// Applies a pushed wallet event. Returns the balance query the caller
    /// should run, if the session now points at a new account.
    pub fn handle_provider_event(&mut self, event: ProviderEvent) -> Option<BalanceTicket> {
        match event {
            ProviderEvent::AccountsChanged(accounts) => {
                let before = self.session().clone();
                let ticket = self.sessions.accounts_changed(&accounts);
                if *self.session() != before {
                    self.engine.cancel();
                }
                ticket
            }
            ProviderEvent::ChainChanged(chain) => {
                warn!(%chain, "wallet switched chain, resetting all state");
                self.reload();
                None
            }
        }
    }

    /// Restores start-up state, as if the program had just started.
    pub fn reload(&mut self) {
        self.engine.cancel();
        self.sessions = SessionManager::new(self.settings.network);
        self.simulated = SimulatedBalance::new(self.settings.starting_balance);
        self.last_outcome = None;
        self.last_error = None;
    }

    /// Puts the coin in the air. A flip already in the air is left alone and
    /// the request is refused.
    pub fn begin_flip(&mut self, request: WagerRequest) -> WalletResult<PendingFlip> {
        let pending = self
            .engine
            .begin(request, self.sessions.session(), &self.simulated);
        if pending.is_ok() {
            self.last_outcome = None;
        }
        self.record(pending)
    }

    /// Lands a flip started with [`Self::begin_flip`] and applies it to the
    /// balance. `None` if the session changed while the coin was in the air.
    pub fn complete_flip(&mut self, pending: PendingFlip) -> Option<FlipOutcome> {
        let simulated = pending.is_simulated();
        let outcome = self.engine.resolve(pending)?;
        self.apply_outcome(outcome, simulated);
        Some(outcome)
    }

    pub async fn flip(&mut self, request: WagerRequest) -> WalletResult<FlipOutcome> {
        let simulated = self.session().is_simulated;
        let outcome = self
            .engine
            .flip(request, self.sessions.session(), &self.simulated)
            .await;
        let outcome = self.record(outcome)?;
        self.apply_outcome(outcome, simulated);
        Ok(outcome)
    }

    fn apply_outcome(&mut self, outcome: FlipOutcome, simulated: bool) {
        if simulated {
            self.simulated.set(outcome.new_balance);
        } else {
            self.sessions
                .record_balance(format_fixed(outcome.new_balance, REAL_BALANCE_PLACES));
        }
        self.last_outcome = Some(outcome);
    }

    fn record<T>(&mut self, result: WalletResult<T>) -> WalletResult<T> {
        match &result {
            Err(err) if !err.is_busy() => {
                error!(kind = ?err.kind(), "{err}");
                self.last_error = Some(err.clone());
            }
            _ => {}
        }
        result
    }
}

#[cfg(test)]
mod tests;
