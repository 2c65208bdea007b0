use coinflip_wallet::{
    error::{
        ErrorKind,
        WalletError,
    },
    network::Network,
    provider::Providers,
    session::{
        ConnectionState,
        Session,
        request_connection,
    },
    test_helpers::*,
    wager::{
        CoinSide,
        WagerRequest,
    },
};

fn wager(amount: &str, side: CoinSide) -> WagerRequest {
    WagerRequest::parse(amount, side).unwrap()
}

#[tokio::test]
async fn dummy_account__win_doubles_five_to_ten() {
    // given
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));
    game.connect_simulated();
    assert_eq!(game.display_balance().as_deref(), Some("5.00"));

    // when
    let outcome = game.flip(wager("0.1", CoinSide::Heads)).await.unwrap();

    // then
    assert_eq!(outcome.result_side, CoinSide::Heads);
    assert!(outcome.won);
    assert_eq!(game.display_balance().as_deref(), Some("10.00"));
}

#[tokio::test]
async fn dummy_account__loss_halves_five_to_two_fifty() {
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Tails));
    game.connect_simulated();

    let outcome = game.flip(wager("0.1", CoinSide::Heads)).await.unwrap();

    assert!(!outcome.won);
    assert_eq!(game.display_balance().as_deref(), Some("2.50"));
}

#[tokio::test]
async fn real_account__wager_above_balance_is_refused() {
    // given
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH / 20);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Heads));
    game.connect_real().await.unwrap();
    assert_eq!(game.display_balance().as_deref(), Some("0.05"));

    // when
    let err = game.flip(wager("0.1", CoinSide::Heads)).await.unwrap_err();

    // then
    assert_eq!(err.kind(), ErrorKind::InsufficientBalance);
    assert_eq!(game.display_balance().as_deref(), Some("0.05"));
    assert_eq!(game.last_outcome(), None);
}

#[tokio::test]
async fn real_account__win_is_kept_to_four_places() {
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH / 3);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Tails));
    game.connect_real().await.unwrap();

    game.flip(wager("0.1", CoinSide::Tails)).await.unwrap();

    assert_eq!(game.display_balance().as_deref(), Some("0.6667"));
}

#[tokio::test]
async fn connect_real__without_wallet_is_provider_unavailable() {
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));

    let err = game.connect_real().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
    assert!(!game.session().is_connected());
    assert_eq!(game.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn connect_real__solana_without_wallet_is_provider_unavailable() {
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Heads));
    game.select_network(Network::Solana);

    let err = game.connect_real().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::ProviderUnavailable);
}

#[tokio::test]
async fn connect_real__solana_wallet_reports_two_decimals() {
    let providers = Providers::new(
        None,
        Some(FakeKeyWallet::with_key(SOL_KEY, 2 * LAMPORTS_PER_SOL)),
    );
    let mut game = test_game(providers, FixedCoin(CoinSide::Heads));
    game.select_network(Network::Solana);

    game.connect_real().await.unwrap();

    assert_eq!(game.session().account_id.as_deref(), Some(SOL_KEY));
    assert_eq!(game.display_balance().as_deref(), Some("2.00"));
}

#[tokio::test]
async fn connect_real__bitcoin_is_not_implemented() {
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));
    game.select_network(Network::Bitcoin);

    let err = game.connect_real().await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::NotImplemented);
    assert_eq!(game.last_error(), Some(&err));
}

#[tokio::test]
async fn select_network__resets_connected_session() {
    // given
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Heads));
    game.connect_real().await.unwrap();

    // when
    game.select_network(Network::Polygon);

    // then
    assert_eq!(game.session(), &Session::new(Network::Polygon));
    assert_eq!(game.connection_state(), ConnectionState::Disconnected);
}

#[tokio::test]
async fn connect_real__result_arriving_after_network_switch_is_dropped() {
    // given
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Heads));
    let ticket = game.begin_connect().unwrap();
    let result = request_connection(game.providers(), ticket.network).await;

    // when
    game.select_network(Network::Polygon);
    game.finish_connect(ticket, result).unwrap();

    // then
    assert!(!game.session().is_connected());
    assert_eq!(game.network(), Network::Polygon);
}

#[tokio::test]
async fn connect_real__second_request_while_connecting_is_busy() {
    let wallet = FakeAccountWallet::with_account(ALICE, WEI_PER_ETH);
    let mut game = test_game(evm_providers(&wallet), FixedCoin(CoinSide::Heads));
    let _ticket = game.begin_connect().unwrap();

    let err = game.connect_real().await.unwrap_err();

    assert_eq!(err, WalletError::OperationInProgress("wallet connection"));
    assert_eq!(game.last_error(), None);
}

#[tokio::test]
async fn flip__before_connecting_is_refused() {
    let mut game = test_game(no_providers(), FixedCoin(CoinSide::Heads));

    let err = game.flip(wager("0.1", CoinSide::Heads)).await.unwrap_err();

    assert_eq!(err, WalletError::NotConnected);
}
