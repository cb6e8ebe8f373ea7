use hl_core::TransportId;
use hl_routing::RoutingError;
use hl_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("scheduler configuration error: {0}")]
    Config(String),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("store error for {transport}: {source}")]
    Transport {
        transport: TransportId,
        #[source]
        source:    StoreError,
    },

    #[error("routing snapshot rejected: {0}")]
    Routing(#[from] RoutingError),
}

impl SimError {
    /// The transport this error is about, if any.
    pub fn transport(&self) -> Option<TransportId> {
        match self {
            SimError::Transport { transport, .. } => Some(*transport),
            _ => None,
        }
    }

    /// Attach `transport` to a bare store error.
    pub(crate) fn for_transport(self, transport: TransportId) -> Self {
        match self {
            SimError::Store(source) => SimError::Transport { transport, source },
            other => other,
        }
    }
}

pub type SimResult<T> = Result<T, SimError>;
