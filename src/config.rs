use std::net::Ipv4Addr;
use std::time::Duration;

/// Unidade do atraso devolvido por `Pinger::ping`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Unit {
    #[default]
    Seconds,
    Milliseconds,
}

impl Unit {
    pub fn convert(self, seconds: f64) -> f64 {
        match self {
            Unit::Seconds => seconds,
            Unit::Milliseconds => seconds * 1000.0,
        }
    }

    pub fn suffix(self) -> &'static str {
        match self {
            Unit::Seconds => "s",
            Unit::Milliseconds => "ms",
        }
    }
}

/// O que `Pinger::ping` faz com um `PingError`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Converte o erro em `PingOutcome::Unresolved` / `PingOutcome::NoReply`.
    #[default]
    Sentinel,
    /// Devolve o erro tipado ao chamador.
    Propagate,
}

/// Se os datagramas lidos do socket trazem o cabeçalho IP na frente.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureMode {
    /// SOCK_RAW (e SOCK_DGRAM fora do Linux): 20 bytes de IP + ICMP.
    WithIpHeader,
    /// SOCK_DGRAM no Linux: só ICMP, com o identifier reescrito pelo kernel.
    IcmpOnly,
}

impl CaptureMode {
    /// Modo de captura de um socket ICMP não privilegiado nesta plataforma.
    pub const fn for_dgram() -> Self {
        if cfg!(target_os = "linux") || cfg!(target_os = "android") {
            CaptureMode::IcmpOnly
        } else {
            CaptureMode::WithIpHeader
        }
    }

    pub const fn has_ip_header(self) -> bool {
        matches!(self, CaptureMode::WithIpHeader)
    }
}

/// Parâmetros de um único ping.
#[derive(Debug, Clone, PartialEq)]
pub struct PingOptions {
    /// Prazo total da espera pela resposta.
    pub timeout: Duration,
    pub unit: Unit,
    /// Endereço local para o bind (só recebe pacotes destinados a ele).
    pub src_addr: Option<Ipv4Addr>,
    /// TTL do pacote enviado; `None` usa o padrão do sistema.
    pub ttl: Option<u32>,
    pub sequence: u16,
    /// Tamanho do payload ICMP (sem cabeçalhos).
    pub size: usize,
    /// Interface de saída (SO_BINDTODEVICE, apenas Linux).
    pub interface: Option<String>,
}

impl Default for PingOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(4),
            unit: Unit::Seconds,
            src_addr: None,
            ttl: None,
            sequence: 0,
            size: 56,
            interface: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_classic_ping() {
        let opts = PingOptions::default();
        assert_eq!(opts.timeout, Duration::from_secs(4));
        assert_eq!(opts.size, 56);
        assert_eq!(opts.sequence, 0);
        assert_eq!(opts.unit, Unit::Seconds);
        assert_eq!(ErrorPolicy::default(), ErrorPolicy::Sentinel);
    }

    #[test]
    fn unit_conversion() {
        assert_eq!(Unit::Seconds.convert(0.25), 0.25);
        assert_eq!(Unit::Milliseconds.convert(0.25), 250.0);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn linux_dgram_has_no_ip_header() {
        assert!(!CaptureMode::for_dgram().has_ip_header());
    }
}
