//! Wager validation and the coin flip itself.

use crate::{
    error::{
        WalletError,
        WalletResult,
    },
    session::{
        Session,
        SimulatedBalance,
    },
    units::{
        REAL_BALANCE_PLACES,
        parse_balance,
        parse_wager,
        round_places,
    },
};
use rand::{
    Rng,
    SeedableRng,
    rngs::StdRng,
};
use serde::{
    Deserialize,
    Serialize,
};
use std::{
    fmt,
    time::Duration,
};
use tracing::{
    debug,
    info,
};

/// Time the coin spends in the air before the result is known.
pub const FLIP_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoinSide {
    #[default]
    Heads,
    Tails,
}

impl CoinSide {
    pub fn other(self) -> CoinSide {
        match self {
            CoinSide::Heads => CoinSide::Tails,
            CoinSide::Tails => CoinSide::Heads,
        }
    }
}

impl fmt::Display for CoinSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoinSide::Heads => f.write_str("Heads"),
            CoinSide::Tails => f.write_str("Tails"),
        }
    }
}

/// Source of flip results.
pub trait Coin {
    fn toss(&mut self) -> CoinSide;
}

/// Unweighted coin backed by a random number generator.
#[derive(Debug, Clone)]
pub struct RandomCoin<R = StdRng> {
    rng: R,
}

impl RandomCoin<StdRng> {
    pub fn from_os_rng() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> RandomCoin<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }
}

impl<R: Rng> Coin for RandomCoin<R> {
    fn toss(&mut self) -> CoinSide {
        if self.rng.random::<f64>() < 0.5 {
            CoinSide::Heads
        } else {
            CoinSide::Tails
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WagerRequest {
    pub amount: f64,
    pub chosen_side: CoinSide,
}

impl WagerRequest {
    /// Builds a request from the amount as the user typed it.
    pub fn parse(amount: &str, chosen_side: CoinSide) -> WalletResult<Self> {
        Ok(Self {
            amount: parse_wager(amount)?,
            chosen_side,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FlipOutcome {
    pub result_side: CoinSide,
    pub won: bool,
    pub new_balance: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum EngineState {
    #[default]
    Idle,
    Flipping,
}

/// A flip whose coin is in the air.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingFlip {
    request: WagerRequest,
    balance: f64,
    simulated: bool,
    generation: u64,
}

impl PendingFlip {
    pub fn request(&self) -> &WagerRequest {
        &self.request
    }

    pub fn is_simulated(&self) -> bool {
        self.simulated
    }
}

/// The balance a wager is checked against.
pub fn current_balance(session: &Session, simulated: &SimulatedBalance) -> f64 {
    if session.is_simulated {
        simulated.value()
    } else {
        parse_balance(session.balance.as_deref())
    }
}

/// Doubles on a win, halves on a loss. Real balances are kept to four
/// places, the simulated counter keeps full precision.
pub fn settle(balance: f64, won: bool, simulated: bool) -> f64 {
    let next = if won { balance * 2.0 } else { balance / 2.0 };
    if simulated {
        next
    } else {
        round_places(next, REAL_BALANCE_PLACES)
    }
}

#[derive(Debug)]
pub struct WagerEngine<C> {
    coin: C,
    state: EngineState,
    delay: Duration,
    generation: u64,
}

impl<C> WagerEngine<C> {
    pub fn new(coin: C, delay: Duration) -> Self {
        Self {
            coin,
            state: EngineState::Idle,
            delay,
            generation: 0,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Abandons a flip in the air; its later resolution is ignored.
    pub fn cancel(&mut self) {
        self.generation += 1;
        self.state = EngineState::Idle;
    }
}

/// Cancels the flip if [`WagerEngine::flip`] is dropped before the coin lands.
struct InFlight<'a, C> {
    engine: &'a mut WagerEngine<C>,
    landed: bool,
}

impl<C> Drop for InFlight<'_, C> {
    fn drop(&mut self) {
        if !self.landed {
            debug!("flip abandoned in the air");
            self.engine.cancel();
        }
    }
}

impl<C: Coin> WagerEngine<C> {

    /// Validates the wager and puts the coin in the air. Nothing changes on
    /// failure.
    pub fn begin(
        &mut self,
        request: WagerRequest,
        session: &Session,
        simulated: &SimulatedBalance,
    ) -> WalletResult<PendingFlip> {
        if self.state == EngineState::Flipping {
            return Err(WalletError::OperationInProgress("coin flip"));
        }
        if !session.is_connected() {
            return Err(WalletError::NotConnected);
        }
        let balance = current_balance(session, simulated);
        if balance < request.amount {
            return Err(WalletError::InsufficientBalance {
                required: request.amount.to_string(),
                symbol: session.network.symbol(),
            });
        }
        self.state = EngineState::Flipping;
        Ok(PendingFlip {
            request,
            balance,
            simulated: session.is_simulated,
            generation: self.generation,
        })
    }

    /// Lands the coin. Returns `None` when the flip was cancelled meanwhile.
    pub fn resolve(&mut self, pending: PendingFlip) -> Option<FlipOutcome> {
        if pending.generation != self.generation {
            return None;
        }
        Some(self.land(pending))
    }

    /// Validates, waits out the flip delay and lands the coin. Dropping the
    /// future midway leaves the engine idle.
    pub async fn flip(
        &mut self,
        request: WagerRequest,
        session: &Session,
        simulated: &SimulatedBalance,
    ) -> WalletResult<FlipOutcome> {
        let pending = self.begin(request, session, simulated)?;
        let delay = self.delay;
        let mut in_flight = InFlight {
            engine: self,
            landed: false,
        };
        tokio::time::sleep(delay).await;
        let outcome = in_flight.engine.land(pending);
        in_flight.landed = true;
        Ok(outcome)
    }

    fn land(&mut self, pending: PendingFlip) -> FlipOutcome {
        let result_side = self.coin.toss();
        let won = result_side == pending.request.chosen_side;
        let new_balance = settle(pending.balance, won, pending.simulated);
        self.state = EngineState::Idle;
        info!(
            %result_side,
            chosen = %pending.request.chosen_side,
            won,
            new_balance,
            "coin landed"
        );
        FlipOutcome {
            result_side,
            won,
            new_balance,
        }
    }
}
