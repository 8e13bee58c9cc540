use std::time::Duration;
use thiserror::Error;

/// Falhas de uma troca Echo Request / Echo Reply.
#[derive(Error, Debug)]
pub enum PingError {
    #[error("Não foi possível resolver o destino '{dest_addr}'")]
    HostUnknown { dest_addr: String },

    #[error("Esgotado o tempo limite do pedido ({}s)", .timeout.as_secs_f64())]
    Timeout { timeout: Duration },

    #[error("Tempo de vida (TTL) expirado em trânsito")]
    TimeToLiveExpired,

    #[error("Tempo excedido")]
    TimeExceeded,

    #[error("Host de destino inacessível")]
    DestinationHostUnreachable,

    #[error("Destino inacessível")]
    DestinationUnreachable,

    #[error("Pacote malformado: esperava {expected} bytes, recebeu {actual}")]
    MalformedPacket { expected: usize, actual: usize },

    #[error("Erro de I/O no socket: {0}")]
    Io(#[from] std::io::Error),
}

impl PingError {
    /// Verdadeiro para falhas do próprio protocolo (tudo menos I/O do socket).
    pub fn is_protocol(&self) -> bool {
        !matches!(self, PingError::Io(_))
    }
}

pub type Result<T> = std::result::Result<T, PingError>;
