//! A coin-flip wagering game played against a real or simulated crypto
//! wallet. Nothing is ever signed or broadcast; balances change in memory.

pub mod error;
pub mod game;
pub mod network;
pub mod provider;
pub mod session;
pub mod units;
pub mod wager;

pub mod test_helpers;
