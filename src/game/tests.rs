#![allow(non_snake_case)]

use super::*;
use crate::{
    error::ErrorKind,
    test_helpers::*,
    wager::CoinSide,
};

fn wager(amount: &str, side: CoinSide) -> WagerRequest {
    WagerRequest::parse(amount, side).unwrap()
}

#[tokio::test]
async fn flip__simulated_win_doubles_counter_only() {
    // given
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));
    game.connect_simulated();

    // when
    let outcome = game.flip(wager("1", CoinSide::Heads)).await.unwrap();

    // then
    assert!(outcome.won);
    assert_eq!(game.simulated_balance().value(), 10.0);
    assert_eq!(game.display_balance().as_deref(), Some("10.00"));
    assert_eq!(game.last_outcome(), Some(&outcome));
}

#[tokio::test]
async fn flip__real_loss_rounds_to_four_places() {
    // given
    let wallet = FakeAccountWallet::with_account(ALICE, 123_450_000_000_000_000);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Tails));
    game.connect_real().await.unwrap();

    // when
    let outcome = game.flip(wager("0.1", CoinSide::Heads)).await.unwrap();

    // then
    assert!(!outcome.won);
    assert_eq!(game.session().balance.as_deref(), Some("0.0617"));
    assert_eq!(game.simulated_balance(), SimulatedBalance::default());
}

#[tokio::test]
async fn flip__insufficient_balance_records_error_without_mutation() {
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH / 20);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Heads));
    game.connect_real().await.unwrap();

    let err = game.flip(wager("0.1", CoinSide::Heads)).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert_eq!(
        err.to_string(),
        "Insufficient balance. You need at least 0.1 ETH to play."
    );
    assert_eq!(game.last_error(), Some(&err));
    assert_eq!(game.session().balance.as_deref(), Some("0.05"));
    assert!(!game.is_flipping());
}

#[test]
fn begin_flip__busy_rejection_is_not_recorded() {
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));
    game.connect_simulated();
    let _pending = game.begin_flip(wager("1", CoinSide::Heads)).unwrap();

    let err = game.begin_flip(wager("1", CoinSide::Heads)).unwrap_err();

    assert!(err.is_busy());
    assert_eq!(game.last_error(), None);
}

#[test]
fn complete_flip__discarded_after_network_switch() {
    // given
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));
    game.connect_simulated();
    let pending = game.begin_flip(wager("1", CoinSide::Heads)).unwrap();

    // when
    game.select_network(Network::Solana);

    // then
    assert_eq!(game.complete_flip(pending), None);
    assert_eq!(game.simulated_balance().value(), SimulatedBalance::STARTING);
    assert!(!game.is_flipping());
}

#[test]
fn select_network__keeps_simulated_counter() {
    let mut game = test_game(no_providers(), ScriptedCoin::new([CoinSide::Tails]));
    game.connect_simulated();
    let pending = game.begin_flip(wager("1", CoinSide::Heads)).unwrap();
    game.complete_flip(pending).unwrap();

    game.select_network(Network::Polygon);
    game.connect_simulated();

    assert_eq!(game.display_balance().as_deref(), Some("2.50"));
    assert_eq!(game.last_outcome(), None);
}

#[tokio::test]
async fn handle_provider_event__chain_change_restores_start_up_state() {
    // given
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));
    game.select_network(Network::Polygon);
    game.connect_simulated();
    game.flip(wager("1", CoinSide::Heads)).await.unwrap();

    // when
    let ticket = game.handle_provider_event(ProviderEvent::ChainChanged("0x89".into()));

    // then
    assert_eq!(ticket, None);
    assert_eq!(game.network(), Network::Ethereum);
    assert_eq!(game.connection_state(), ConnectionState::Disconnected);
    assert_eq!(game.simulated_balance(), SimulatedBalance::default());
    assert_eq!(game.last_outcome(), None);
}

#[tokio::test]
async fn handle_provider_event__account_switch_refetches_balance() {
    // given
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH);
    wallet.set_balance(BOB, 3 * WEI_PER_ETH);
    let providers = evm_providers(&wallet);
    let mut game = test_game(providers.clone(), FixedCoin(CoinSide::Heads));
    game.connect_real().await.unwrap();

    // when
    let ticket = game
        .handle_provider_event(ProviderEvent::AccountsChanged(vec![BOB.to_string()]))
        .unwrap();
    let balance =
        crate::session::fetch_balance(&providers, ticket.network, &ticket.account).await;
    game.apply_balance(ticket, balance).unwrap();

    // then
    assert_eq!(game.session().account_id.as_deref(), Some(BOB));
    assert_eq!(game.display_balance().as_deref(), Some("3"));
}

#[tokio::test]
async fn connect_real__clears_previous_error_on_success() {
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH);
    wallet.reject_requests(true);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Heads));
    assert!(game.connect_real().await.is_err());
    assert_eq!(
        game.last_error().map(WalletError::kind),
        Some(ErrorKind::ConnectionRejected)
    );

    wallet.reject_requests(false);
    game.connect_real().await.unwrap();

    assert_eq!(game.last_error(), None);
    assert_eq!(game.connection_state(), ConnectionState::ConnectedReal);
}

#[test]
fn current_balance__none_while_disconnected() {
    let game = test_game(no_providers(), FixedCoin(CoinSide::Heads));
    assert_eq!(game.current_balance(), None);
    assert_eq!(game.display_balance(), None);
}

#[tokio::test]
async fn display_balance__simulated_ties_round_up() {
    // given
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Tails));
    game.connect_simulated();

    // when
    for _ in 0..3 {
        game.flip(wager("0.1", CoinSide::Heads)).await.unwrap();
    }

    // then
    assert_eq!(game.simulated_balance().value(), 0.625);
    assert_eq!(game.display_balance().as_deref(), Some("0.63"));
}

#[tokio::test]
async fn select_network__clears_error_outcome_and_session() {
    for network in Network::ALL {
        // given
        let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));
        game.select_network(Network::Bitcoin);
        game.connect_simulated();
        game.flip(wager("1", CoinSide::Heads)).await.unwrap();
        assert!(game.connect_real().await.is_err());
        assert_eq!(
            game.last_error().map(WalletError::kind),
            Some(ErrorKind::NotImplemented)
        );
        assert!(game.last_outcome().is_some());

        // when
        game.select_network(network);

        // then
        assert_eq!(game.last_error(), None);
        assert_eq!(game.last_outcome(), None);
        assert_eq!(game.session(), &Session::new(network));
        assert_eq!(game.connection_state(), ConnectionState::Disconnected);
    }
}

#[tokio::test]
async fn handle_provider_event__account_switch_keeps_balance_until_refetched() {
    // given
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Heads));
    game.connect_real().await.unwrap();

    // when
    let ticket =
        game.handle_provider_event(ProviderEvent::AccountsChanged(vec![BOB.to_string()]));

    // then
    assert!(ticket.is_some());
    assert_eq!(game.session().account_id.as_deref(), Some(BOB));
    assert_eq!(game.display_balance().as_deref(), Some("1"));
}
