//! Scripted wallets and coins for driving the game without a network.

use crate::{
    game::{
        CoinFlipGame,
        GameSettings,
    },
    provider::{
        AccountWallet,
        KeyWallet,
        ProviderError,
        ProviderResult,
        Providers,
    },
    wager::{
        Coin,
        CoinSide,
    },
};
use std::{
    collections::{
        HashMap,
        VecDeque,
    },
    sync::{
        Arc,
        Mutex,
        MutexGuard,
    },
    time::Duration,
};

pub const WEI_PER_ETH: u128 = 1_000_000_000_000_000_000;
pub const LAMPORTS_PER_SOL: u64 = 1_000_000_000;

pub const ALICE: &str = "0x00000000000000000000000000000000000a11ce";
pub const BOB: &str = "0x0000000000000000000000000000000000000b0b";
pub const SOL_KEY: &str = "9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM";

#[derive(Debug, Default)]
struct AccountWalletState {
    accounts: Vec<String>,
    chain_id: String,
    balances: HashMap<String, u128>,
    reject_requests: bool,
    fail_balance: bool,
    balance_calls: usize,
}

/// In-memory EVM wallet. Clones share state, so a test can keep a handle
/// and change accounts under a running game.
#[derive(Debug, Clone, Default)]
pub struct FakeAccountWallet {
    state: Arc<Mutex<AccountWalletState>>,
}

impl FakeAccountWallet {
    pub fn with_account(address: &str, wei: u128) -> Self {
        let wallet = Self::default();
        {
            let mut state = wallet.state();
            state.accounts = vec![address.to_string()];
            state.chain_id = "0x1".to_string();
            state.balances.insert(address.to_string(), wei);
        }
        wallet
    }

    pub fn set_accounts(&self, accounts: &[&str]) {
        self.state().accounts = accounts.iter().map(|a| a.to_string()).collect();
    }

    pub fn set_balance(&self, address: &str, wei: u128) {
        self.state().balances.insert(address.to_string(), wei);
    }

    pub fn set_chain_id(&self, chain_id: &str) {
        self.state().chain_id = chain_id.to_string();
    }

    pub fn reject_requests(&self, reject: bool) {
        self.state().reject_requests = reject;
    }

    pub fn fail_balance(&self, fail: bool) {
        self.state().fail_balance = fail;
    }

    pub fn balance_calls(&self) -> usize {
        self.state().balance_calls
    }

    fn state(&self) -> MutexGuard<'_, AccountWalletState> {
        self.state.lock().expect("fake wallet state poisoned")
    }
}

impl AccountWallet for FakeAccountWallet {
    async fn request_accounts(&self) -> ProviderResult<Vec<String>> {
        let state = self.state();
        if state.reject_requests {
            return Err(ProviderError::Rejected(
                "rpc error 4001: User rejected the request.".into(),
            ));
        }
        Ok(state.accounts.clone())
    }

    async fn accounts(&self) -> ProviderResult<Vec<String>> {
        Ok(self.state().accounts.clone())
    }

    async fn chain_id(&self) -> ProviderResult<String> {
        Ok(self.state().chain_id.clone())
    }

    async fn get_balance(&self, address: &str) -> ProviderResult<u128> {
        let mut state = self.state();
        state.balance_calls += 1;
        if state.fail_balance {
            return Err(ProviderError::Failed("connection reset".into()));
        }
        Ok(state.balances.get(address).copied().unwrap_or_default())
    }
}

#[derive(Debug, Default)]
struct KeyWalletState {
    public_key: String,
    lamports: u64,
    reject: bool,
}

#[derive(Debug, Clone, Default)]
pub struct FakeKeyWallet {
    state: Arc<Mutex<KeyWalletState>>,
}

impl FakeKeyWallet {
    pub fn with_key(public_key: &str, lamports: u64) -> Self {
        let wallet = Self::default();
        {
            let mut state = wallet.state();
            state.public_key = public_key.to_string();
            state.lamports = lamports;
        }
        wallet
    }

    pub fn reject(&self, reject: bool) {
        self.state().reject = reject;
    }

    fn state(&self) -> MutexGuard<'_, KeyWalletState> {
        self.state.lock().expect("fake wallet state poisoned")
    }
}

impl KeyWallet for FakeKeyWallet {
    async fn connect(&self) -> ProviderResult<String> {
        let state = self.state();
        if state.reject {
            return Err(ProviderError::Rejected("User rejected the request.".into()));
        }
        Ok(state.public_key.clone())
    }

    async fn get_balance(&self, _public_key: &str) -> ProviderResult<u64> {
        Ok(self.state().lamports)
    }
}

/// Always lands on the same side.
#[derive(Debug, Clone, Copy)]
pub struct FixedCoin(pub CoinSide);

impl Coin for FixedCoin {
    fn toss(&mut self) -> CoinSide {
        self.0
    }
}

/// Lands on the queued sides in order, then on heads.
#[derive(Debug, Clone, Default)]
pub struct ScriptedCoin {
    sides: VecDeque<CoinSide>,
}

impl ScriptedCoin {
    pub fn new(sides: impl IntoIterator<Item = CoinSide>) -> Self {
        Self {
            sides: sides.into_iter().collect(),
        }
    }
}

impl Coin for ScriptedCoin {
    fn toss(&mut self) -> CoinSide {
        self.sides.pop_front().unwrap_or_default()
    }
}

pub type TestProviders = Providers<FakeAccountWallet, FakeKeyWallet>;
pub type TestGame<C> = CoinFlipGame<FakeAccountWallet, FakeKeyWallet, C>;

pub fn no_providers() -> TestProviders {
    Providers::default()
}

pub fn evm_providers(wallet: &FakeAccountWallet) -> TestProviders {
    Providers::new(Some(wallet.clone()), None)
}

/// Default settings with the flip delay removed, for tests that do not care
/// about timing.
pub fn instant_settings() -> GameSettings {
    GameSettings {
        flip_delay: Duration::ZERO,
        ..GameSettings::default()
    }
}

pub fn test_game<C: Coin>(providers: TestProviders, coin: C) -> TestGame<C> {
    CoinFlipGame::new(instant_settings(), providers, coin)
}
