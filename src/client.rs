use crate::{
    config::AppConfig,
    ui,
};
use chrono::{
    DateTime,
    Local,
};
use coinflip_wallet::{
    error::{
        WalletError,
        WalletResult,
    },
    game::CoinFlipGame,
    network::Network,
    provider::{
        EvmWallet,
        ProviderEvent,
        Providers,
        SolanaWallet,
        watch_account_wallet,
    },
    session::{
        BalanceTicket,
        ConnectTicket,
        ConnectionState,
        RealConnection,
        fetch_balance,
        request_connection,
    },
    wager::{
        CoinSide,
        FlipOutcome,
        PendingFlip,
        RandomCoin,
        WagerRequest,
    },
};
use color_eyre::eyre::{
    Result,
    WrapErr,
};
use crossterm::event::Event;
use futures::future::OptionFuture;
use std::{
    collections::VecDeque,
    time::Duration,
};
use tokio::{
    sync::mpsc,
    time::{
        self,
        Instant,
    },
};
use tracing::{
    debug,
    info,
};

pub const DEFAULT_WAGER: &str = "0.1";
const MAX_TOASTS: usize = 6;

pub type LiveProviders = Providers<EvmWallet, SolanaWallet>;
pub type LiveGame = CoinFlipGame<EvmWallet, SolanaWallet, RandomCoin>;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ToastKind {
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Toast {
    pub at: DateTime<Local>,
    pub kind: ToastKind,
    pub text: String,
}

#[derive(Clone, Debug)]
pub struct AppSnapshot {
    pub network: Network,
    pub connection: ConnectionState,
    pub account: Option<String>,
    pub balance: Option<String>,
    pub wager_input: String,
    pub side: CoinSide,
    pub flipping: bool,
    pub last_outcome: Option<FlipOutcome>,
    pub last_error: Option<String>,
    pub toasts: Vec<Toast>,
}

/// Results of wallet requests that ran off the event loop.
enum Job {
    Connected(ConnectTicket, WalletResult<RealConnection>),
    Balance(BalanceTicket, WalletResult<String>),
}

pub struct AppController {
    game: LiveGame,
    wager_input: String,
    side: CoinSide,
    toasts: VecDeque<Toast>,
    in_flight: Option<(PendingFlip, Instant)>,
    jobs: mpsc::UnboundedSender<Job>,
}

impl AppController {
    fn new(game: LiveGame, jobs: mpsc::UnboundedSender<Job>) -> Self {
        Self {
            game,
            wager_input: DEFAULT_WAGER.to_string(),
            side: CoinSide::default(),
            toasts: VecDeque::new(),
            in_flight: None,
            jobs,
        }
    }

    pub fn snapshot(&self) -> AppSnapshot {
        let session = self.game.session();
        AppSnapshot {
            network: self.game.network(),
            connection: self.game.connection_state(),
            account: session.account_id.clone(),
            balance: self.game.display_balance(),
            wager_input: self.wager_input.clone(),
            side: self.side,
            flipping: self.game.is_flipping(),
            last_outcome: self.game.last_outcome().copied(),
            last_error: self.game.last_error().map(ToString::to_string),
            toasts: self.toasts.iter().cloned().collect(),
        }
    }

    pub fn select_network(&mut self, network: Network) {
        self.game.select_network(network);
        self.sync_flip();
    }

    pub fn connect_dummy(&mut self) {
        self.game.connect_simulated();
        self.sync_flip();
        self.toast(ToastKind::Success, "Connected to dummy account!");
    }

    pub fn connect_real(&mut self) {
        let ticket = match self.game.begin_connect() {
            Ok(ticket) => ticket,
            Err(err) => return self.toast_error(err),
        };
        let providers = self.game.providers().clone();
        let jobs = self.jobs.clone();
        tokio::spawn(async move {
            let result = request_connection(&providers, ticket.network).await;
            let _ = jobs.send(Job::Connected(ticket, result));
        });
    }

    pub fn refresh_balance(&mut self) {
        match self.game.balance_ticket() {
            Ok(Some(ticket)) => self.spawn_balance(ticket),
            Ok(None) => {}
            Err(err) => self.toast_error(err),
        }
    }

    pub fn set_wager(&mut self, input: String) {
        self.wager_input = input;
    }

    pub fn choose_side(&mut self, side: CoinSide) {
        self.side = side;
    }

    pub fn flip(&mut self) {
        let request = match WagerRequest::parse(&self.wager_input, self.side) {
            Ok(request) => request,
            Err(err) => return self.toast_error(err),
        };
        match self.game.begin_flip(request) {
            Ok(pending) => {
                let lands_at = Instant::now() + self.game.flip_delay();
                self.in_flight = Some((pending, lands_at));
            }
            Err(err) => self.toast_error(err),
        }
    }

    fn flip_deadline(&self) -> Option<Instant> {
        self.in_flight.as_ref().map(|(_, at)| *at)
    }

    fn land_flip(&mut self) {
        let Some((pending, _)) = self.in_flight.take() else {
            return;
        };
        match self.game.complete_flip(pending) {
            Some(outcome) if outcome.won => {
                self.toast(ToastKind::Success, "Congratulations! You won the coin flip!")
            }
            Some(_) => self.toast(ToastKind::Error, "Sorry, you lost the coin flip."),
            None => debug!("flip landed after the session changed"),
        }
    }

    fn on_job(&mut self, job: Job) {
        match job {
            Job::Connected(ticket, result) => {
                let network = ticket.network;
                let was_connecting = self.game.connection_state() == ConnectionState::Connecting;
                let result = self.game.finish_connect(ticket, result);
                self.sync_flip();
                if was_connecting
                    && self.game.connection_state() == ConnectionState::ConnectedReal
                {
                    let text = match network {
                        Network::Solana => "Successfully connected to your real Solana wallet!",
                        _ => "Successfully connected to your real wallet!",
                    };
                    self.toast(ToastKind::Success, text);
                }
                if let Err(err) = result {
                    self.toast_error(err);
                }
            }
            Job::Balance(ticket, result) => {
                if let Err(err) = self.game.apply_balance(ticket, result) {
                    self.toast_error(err);
                }
            }
        }
    }

    fn on_provider_event(&mut self, event: ProviderEvent) {
        let chain_changed = matches!(event, ProviderEvent::ChainChanged(_));
        let ticket = self.game.handle_provider_event(event);
        self.sync_flip();
        if chain_changed {
            self.wager_input = DEFAULT_WAGER.to_string();
            self.side = CoinSide::default();
            self.toasts.clear();
        }
        if let Some(ticket) = ticket {
            self.spawn_balance(ticket);
        }
    }

    fn spawn_balance(&self, ticket: BalanceTicket) {
        let providers = self.game.providers().clone();
        let jobs = self.jobs.clone();
        tokio::spawn(async move {
            let result = fetch_balance(&providers, ticket.network, &ticket.account).await;
            let _ = jobs.send(Job::Balance(ticket, result));
        });
    }

    /// Forgets the local flip timer once the game has dropped the flip.
    fn sync_flip(&mut self) {
        if !self.game.is_flipping() {
            self.in_flight = None;
        }
    }

    fn toast_error(&mut self, err: WalletError) {
        if !err.is_busy() {
            self.toast(ToastKind::Error, err.to_string());
        }
    }

    fn toast(&mut self, kind: ToastKind, text: impl Into<String>) {
        self.toasts.push_back(Toast {
            at: Local::now(),
            kind,
            text: text.into(),
        });
        while self.toasts.len() > MAX_TOASTS {
            self.toasts.pop_front();
        }
    }
}

fn build_providers(config: &AppConfig) -> Result<LiveProviders> {
    let evm = config
        .evm_rpc_url
        .as_deref()
        .map(|url| EvmWallet::new(url, config.rpc_timeout))
        .transpose()
        .wrap_err("building EVM wallet client")?;
    let solana = config
        .solana_wallet
        .as_deref()
        .map(|key| SolanaWallet::new(key, config.solana_rpc_url.as_str(), config.rpc_timeout))
        .transpose()
        .wrap_err("building Solana wallet client")?;
    Ok(Providers::new(evm, solana))
}

pub async fn run_app(config: AppConfig) -> Result<()> {
    let providers = build_providers(&config)?;
    info!(
        network = %config.game.network,
        evm = config.evm_rpc_url.is_some(),
        solana = config.solana_wallet.is_some(),
        "wallet providers configured"
    );

    let (provider_tx, provider_rx) = mpsc::unbounded_channel();
    if let Some(evm) = providers.evm.clone() {
        tokio::spawn(watch_account_wallet(evm, config.poll_interval, provider_tx));
    }

    let (job_tx, job_rx) = mpsc::unbounded_channel();
    let game = CoinFlipGame::new(config.game.clone(), providers, RandomCoin::from_os_rng());
    let mut controller = AppController::new(game, job_tx);
    let mut ui_state = ui::UiState::default();

    ui::terminal_enter(&mut ui_state)?;
    let input = ui::spawn_input_reader();
    let res = run_loop(&mut controller, &mut ui_state, input, provider_rx, job_rx).await;
    ui::terminal_exit()?;
    res
}

async fn run_loop(
    controller: &mut AppController,
    ui_state: &mut ui::UiState,
    mut input: mpsc::UnboundedReceiver<Event>,
    mut provider_events: mpsc::UnboundedReceiver<ProviderEvent>,
    mut jobs: mpsc::UnboundedReceiver<Job>,
) -> Result<()> {
    let mut ticker = time::interval(Duration::from_millis(250));
    ui::draw(ui_state, &controller.snapshot())?;
    loop {
        let landing: OptionFuture<_> = controller.flip_deadline().map(time::sleep_until).into();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => { break; }
            _ = ticker.tick() => {}
            Some(()) = landing => controller.land_flip(),
            Some(job) = jobs.recv() => controller.on_job(job),
            Some(event) = provider_events.recv() => controller.on_provider_event(event),
            ev = input.recv() => {
                let Some(ev) = ev else { break };
                let snapshot = controller.snapshot();
                match ui::handle_event(ui_state, &ev, &snapshot) {
                    Some(ui::UserEvent::Quit) => break,
                    Some(ui::UserEvent::NextNetwork) => controller.select_network(snapshot.network.next()),
                    Some(ui::UserEvent::PrevNetwork) => controller.select_network(snapshot.network.prev()),
                    Some(ui::UserEvent::ConnectReal) => controller.connect_real(),
                    Some(ui::UserEvent::ConnectDummy) => controller.connect_dummy(),
                    Some(ui::UserEvent::SetWager(amount)) => controller.set_wager(amount),
                    Some(ui::UserEvent::ChooseSide(side)) => controller.choose_side(side),
                    Some(ui::UserEvent::ToggleSide) => controller.choose_side(snapshot.side.other()),
                    Some(ui::UserEvent::Flip) => controller.flip(),
                    Some(ui::UserEvent::RefreshBalance) => controller.refresh_balance(),
                    Some(ui::UserEvent::Redraw) | None => {}
                }
            }
        }
        ui::draw(ui_state, &controller.snapshot())?;
    }
    Ok(())
}
