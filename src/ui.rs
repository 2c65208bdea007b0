use crate::client::{
    AppSnapshot,
    ToastKind,
};
use coinflip_wallet::{
    network::Network,
    session::ConnectionState,
    wager::CoinSide,
};
use color_eyre::eyre::Result;
use crossterm::event::{
    self,
    Event,
    KeyCode,
    KeyEvent,
    KeyEventKind,
    KeyModifiers,
};
use crossterm::terminal::{
    disable_raw_mode,
    enable_raw_mode,
};
use ratatui::prelude::*;
use ratatui::widgets::*;
use std::io::stdout;
use tokio::sync::mpsc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UserEvent {
    Quit,
    NextNetwork,
    PrevNetwork,
    ConnectReal,
    ConnectDummy,
    SetWager(String),
    ChooseSide(CoinSide),
    ToggleSide,
    Flip,
    RefreshBalance,
    Redraw,
}

#[derive(Default)]
pub struct UiState {
    mode: Mode,
    terminal: Option<Terminal<CrosstermBackend<std::io::Stdout>>>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
enum Mode {
    #[default]
    Normal,
    WagerModal(WagerState),
    QuitModal,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct WagerState {
    input: String,
}

pub fn terminal_enter(state: &mut UiState) -> Result<()> {
    enable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    let terminal = Terminal::new(backend)?;
    state.terminal = Some(terminal);
    Ok(())
}

pub fn terminal_exit() -> Result<()> {
    disable_raw_mode()?;
    crossterm::execute!(std::io::stdout(), crossterm::terminal::LeaveAlternateScreen)?;
    Ok(())
}

/// Reads terminal events on a dedicated thread; `event::read` blocks.
pub fn spawn_input_reader() -> mpsc::UnboundedReceiver<Event> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });
    rx
}

pub fn draw(state: &mut UiState, snap: &AppSnapshot) -> Result<()> {
    if let Some(mut term) = state.terminal.take() {
        term.draw(|f| ui(f, state, snap))?;
        state.terminal = Some(term);
    }
    Ok(())
}

pub fn handle_event(state: &mut UiState, ev: &Event, snap: &AppSnapshot) -> Option<UserEvent> {
    match ev {
        Event::Key(key) if key.kind == KeyEventKind::Press => handle_key(state, key, snap),
        Event::Resize(..) => Some(UserEvent::Redraw),
        _ => None,
    }
}

fn handle_key(state: &mut UiState, k: &KeyEvent, snap: &AppSnapshot) -> Option<UserEvent> {
    if k.modifiers.contains(KeyModifiers::CONTROL) && k.code == KeyCode::Char('c') {
        return Some(UserEvent::Quit);
    }
    match &mut state.mode {
        Mode::WagerModal(ws) => match k.code {
            KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Enter => {
                let amount = std::mem::take(&mut ws.input);
                state.mode = Mode::Normal;
                Some(UserEvent::SetWager(amount))
            }
            KeyCode::Backspace => {
                ws.input.pop();
                Some(UserEvent::Redraw)
            }
            KeyCode::Char(c) if c.is_ascii_digit() => {
                ws.input.push(c);
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('.') if !ws.input.contains('.') => {
                ws.input.push('.');
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::QuitModal => match k.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => Some(UserEvent::Quit),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.mode = Mode::Normal;
                Some(UserEvent::Redraw)
            }
            _ => None,
        },
        Mode::Normal => match k.code {
            KeyCode::Char('q') | KeyCode::Esc => {
                state.mode = Mode::QuitModal;
                Some(UserEvent::Redraw)
            }
            KeyCode::Right => Some(UserEvent::NextNetwork),
            KeyCode::Left => Some(UserEvent::PrevNetwork),
            KeyCode::Char('r') => Some(UserEvent::ConnectReal),
            KeyCode::Char('d') => Some(UserEvent::ConnectDummy),
            KeyCode::Char('w') => {
                state.mode = Mode::WagerModal(WagerState {
                    input: snap.wager_input.clone(),
                });
                Some(UserEvent::Redraw)
            }
            KeyCode::Char('h') => Some(UserEvent::ChooseSide(CoinSide::Heads)),
            KeyCode::Char('t') => Some(UserEvent::ChooseSide(CoinSide::Tails)),
            KeyCode::Char(' ') => Some(UserEvent::ToggleSide),
            KeyCode::Char('f') => Some(UserEvent::Flip),
            KeyCode::Char('b') => Some(UserEvent::RefreshBalance),
            _ => None,
        },
    }
}

fn ui(f: &mut Frame, state: &UiState, snap: &AppSnapshot) {
    f.render_widget(Clear, f.area());
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // networks
            Constraint::Length(4), // account
            Constraint::Length(6), // wager
            Constraint::Min(4),    // messages
            Constraint::Length(3), // help
        ])
        .split(f.area());

    draw_networks(f, chunks[0], snap);
    draw_account(f, chunks[1], snap);
    draw_wager(f, chunks[2], snap);
    draw_messages(f, chunks[3], snap);
    draw_help(f, chunks[4]);
    draw_modals(f, state);
}

fn draw_networks(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut spans = Vec::new();
    for network in Network::ALL {
        let label = format!(" {} ", network);
        if network == snap.network {
            spans.push(Span::styled(
                label,
                Style::default().fg(Color::Black).bg(Color::Cyan),
            ));
        } else {
            spans.push(Span::raw(label));
        }
        spans.push(Span::raw(" "));
    }
    let p = Paragraph::new(Line::from(spans))
        .block(Block::default().borders(Borders::ALL).title("Network"));
    f.render_widget(p, area);
}

fn draw_account(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let state = match snap.connection {
        ConnectionState::Disconnected => "Disconnected",
        ConnectionState::Connecting => "Connecting...",
        ConnectionState::ConnectedReal => "Real wallet",
        ConnectionState::ConnectedSimulated => "Dummy account",
    };
    let account = snap.account.as_deref().unwrap_or("-");
    let balance = match &snap.balance {
        Some(b) => format!("{} {}", b, snap.network.symbol()),
        None if snap.account.is_some() => "unknown".to_string(),
        None => "-".to_string(),
    };
    let p = Paragraph::new(format!(
        "Account: {}\nBalance: {} | {}",
        account, balance, state
    ))
    .block(Block::default().borders(Borders::ALL).title("Wallet"));
    f.render_widget(p, area);
}

fn draw_wager(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines = vec![Line::from(format!(
        "Wager: {} {} | Side: {}",
        snap.wager_input,
        snap.network.symbol(),
        snap.side
    ))];
    if snap.flipping {
        lines.push(Line::styled(
            "Flipping...",
            Style::default().fg(Color::Yellow),
        ));
    } else if let Some(outcome) = &snap.last_outcome {
        let (text, color) = if outcome.won {
            ("won", Color::Green)
        } else {
            ("lost", Color::Red)
        };
        lines.push(Line::styled(
            format!("Result: {} ({})", outcome.result_side, text),
            Style::default().fg(color),
        ));
    }
    if let Some(err) = &snap.last_error {
        lines.push(Line::styled(err.clone(), Style::default().fg(Color::Red)));
    }
    let p = Paragraph::new(lines)
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title("Coin Flip"));
    f.render_widget(p, area);
}

fn draw_messages(f: &mut Frame, area: Rect, snap: &AppSnapshot) {
    let mut lines: Vec<Line> = Vec::new();
    if snap.toasts.is_empty() {
        lines.push(Line::styled("No messages", Style::default().fg(Color::DarkGray)));
    }
    for toast in snap.toasts.iter().rev() {
        let color = match toast.kind {
            ToastKind::Success => Color::Green,
            ToastKind::Error => Color::Red,
        };
        lines.push(Line::styled(
            format!("{} {}", toast.at.format("%H:%M:%S"), toast.text),
            Style::default().fg(color),
        ));
    }
    let p = Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Messages"));
    f.render_widget(p, area);
}

fn draw_help(f: &mut Frame, area: Rect) {
    let help = Paragraph::new(
        "←/→ network | r real wallet | d dummy | w wager | h/t/space side | f flip | b balance | q/Esc quit",
    )
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(help, area);
}

fn draw_modals(f: &mut Frame, state: &UiState) {
    match &state.mode {
        Mode::WagerModal(ws) => {
            let area = centered_rect(40, 25, f.area());
            let block = Block::default().borders(Borders::ALL).title("Wager");
            let p = Paragraph::new(format!(
                "Amount: {}\nEnter=confirm Esc=cancel digits or . to edit",
                ws.input
            ));
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::QuitModal => {
            let area = centered_rect(40, 20, f.area());
            let block = Block::default().borders(Borders::ALL).title("Confirm Quit");
            let p = Paragraph::new("Quit the game? (Y/N)");
            f.render_widget(Clear, area);
            f.render_widget(block.clone(), area);
            f.render_widget(p, block.inner(area));
        }
        Mode::Normal => {}
    }
}

fn centered_rect(w_percent: u16, h_percent: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - h_percent) / 2),
            Constraint::Percentage(h_percent),
            Constraint::Percentage((100 - h_percent) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - w_percent) / 2),
            Constraint::Percentage(w_percent),
            Constraint::Percentage((100 - w_percent) / 2),
        ])
        .split(popup_layout[1])[1]
}
