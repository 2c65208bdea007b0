use crate::network::Network;
use thiserror::Error;

pub type WalletResult<T> = std::result::Result<T, WalletError>;

/// Coarse classification of [`WalletError`], used by callers that only care
/// about which kind of failure happened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ProviderUnavailable,
    ConnectionRejected,
    NotImplemented,
    BalanceFetchFailed,
    InsufficientBalance,
    InvalidWager,
    NotConnected,
    OperationInProgress,
}

#[derive(Debug, Clone, Error, PartialEq)]
pub enum WalletError {
    #[error("No {network} wallet provider is configured. {hint}")]
    ProviderUnavailable {
        network: Network,
        hint: &'static str,
    },

    #[error("Failed to connect real {network} wallet: {reason}")]
    ConnectionRejected { network: Network, reason: String },

    #[error("{network} {operation} not implemented.")]
    NotImplemented {
        network: Network,
        operation: &'static str,
    },

    #[error("Failed to fetch {network} balance: {reason}")]
    BalanceFetchFailed { network: Network, reason: String },

    #[error("Insufficient balance. You need at least {required} {symbol} to play.")]
    InsufficientBalance {
        required: String,
        symbol: &'static str,
    },

    #[error("Invalid wager '{0}'. Enter a positive amount.")]
    InvalidWager(String),

    #[error("Connect an account before flipping.")]
    NotConnected,

    #[error("{0} already in progress")]
    OperationInProgress(&'static str),
}

impl WalletError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            WalletError::ProviderUnavailable { .. } => ErrorKind::ProviderUnavailable,
            WalletError::ConnectionRejected { .. } => ErrorKind::ConnectionRejected,
            WalletError::NotImplemented { .. } => ErrorKind::NotImplemented,
            WalletError::BalanceFetchFailed { .. } => ErrorKind::BalanceFetchFailed,
            WalletError::InsufficientBalance { .. } => ErrorKind::InsufficientBalance,
            WalletError::InvalidWager(_) => ErrorKind::InvalidWager,
            WalletError::NotConnected => ErrorKind::NotConnected,
            WalletError::OperationInProgress(_) => ErrorKind::OperationInProgress,
        }
    }

    /// Guard rejections are swallowed by the client instead of being shown.
    pub fn is_busy(&self) -> bool {
        matches!(self, WalletError::OperationInProgress(_))
    }
}
