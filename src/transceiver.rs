//! Envio de um Echo Request e espera pela resposta correspondente.

use crate::config::CaptureMode;
use crate::error::{PingError, Result};
use crate::hook::Hook;
use crate::icmp::{self, IP_HEADER_LEN, IcmpHeader, IcmpType, IpHeader};
use crate::socket::EchoSocket;
use std::net::{IpAddr, Ipv4Addr, SocketAddrV4};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Maior datagrama lido por vez.
pub const RECV_BUF_LEN: usize = 1024;

/// Decisão sobre um pacote recebido.
#[derive(Debug)]
pub enum Verdict {
    /// Não pertence a esta troca; continua esperando.
    Discard(&'static str),
    /// Echo Reply com identifier e sequence esperados.
    Reply,
    /// Erro ICMP que encerra a troca.
    Fail(PingError),
}

/// Classifica um cabeçalho ICMP recebido. A ordem dos testes importa:
/// mensagens de erro não carregam identifier/sequence próprios e encerram
/// a troca antes das comparações de sequence.
pub fn classify(header: &IcmpHeader, ident: u16, seq: u16) -> Verdict {
    if header.identifier != 0 && header.identifier != ident {
        return Verdict::Discard("identifier diferente");
    }
    match header.kind() {
        Some(IcmpType::EchoRequest) => return Verdict::Discard("ECHO_REQUEST"),
        Some(IcmpType::TimeExceeded) => {
            return Verdict::Fail(if header.code == icmp::time_exceeded::TTL_EXPIRED {
                PingError::TimeToLiveExpired
            } else {
                PingError::TimeExceeded
            });
        }
        Some(IcmpType::DestinationUnreachable) => {
            return Verdict::Fail(if header.code == icmp::unreachable::HOST {
                PingError::DestinationHostUnreachable
            } else {
                PingError::DestinationUnreachable
            });
        }
        _ => {}
    }
    if header.identifier != ident {
        return Verdict::Discard("identifier diferente");
    }
    if header.sequence != seq {
        return Verdict::Discard("sequence diferente");
    }
    if header.kind() == Some(IcmpType::EchoReply) {
        Verdict::Reply
    } else {
        Verdict::Discard("tipo ICMP ignorado")
    }
}

/// Segundos desde a época Unix, o relógio gravado no payload.
pub fn wall_clock() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or_default()
}

/// Resolve um nome ou endereço literal para IPv4.
pub async fn resolve_ipv4(dest_addr: &str) -> Result<Ipv4Addr> {
    if let Ok(ip) = dest_addr.parse::<Ipv4Addr>() {
        return Ok(ip);
    }
    let unknown = || PingError::HostUnknown { dest_addr: dest_addr.to_string() };
    let addrs = tokio::net::lookup_host((dest_addr, 0)).await.map_err(|_| unknown())?;
    addrs
        .filter_map(|addr| match addr.ip() {
            IpAddr::V4(ip) => Some(ip),
            IpAddr::V6(_) => None,
        })
        .next()
        .ok_or_else(unknown)
}

/// Executa o protocolo de uma troca sobre um socket emprestado.
#[derive(Clone)]
pub struct Transceiver {
    hook: Arc<dyn Hook>,
}

impl Transceiver {
    pub fn new(hook: Arc<dyn Hook>) -> Self {
        Self { hook }
    }

    /// Envia um Echo Request com timestamp para `dest_addr`. Uma única tentativa.
    pub async fn send<S: EchoSocket>(
        &self,
        sock: &S,
        dest_addr: &str,
        ident: u16,
        seq: u16,
        size: usize,
    ) -> Result<()> {
        self.hook
            .enter("send", format_args!("dest={dest_addr} id={ident} seq={seq} size={size}"));
        let result = self.send_inner(sock, dest_addr, ident, seq, size).await;
        self.hook.exit("send", format_args!("{result:?}"));
        result
    }

    async fn send_inner<S: EchoSocket>(
        &self,
        sock: &S,
        dest_addr: &str,
        ident: u16,
        seq: u16,
        size: usize,
    ) -> Result<()> {
        let ip = resolve_ipv4(dest_addr).await?;
        tracing::debug!("Endereço IP de destino: {ip}");

        let payload = icmp::echo_payload(wall_clock(), size);
        let packet = icmp::build_echo_request(ident, seq, &payload);
        if let Ok(header) = IcmpHeader::decode(&packet) {
            tracing::debug!("ICMP enviado: {header}");
        }

        // Porta 0: ignorada pelo ICMP
        sock.send_to(&packet, SocketAddrV4::new(ip, 0)).await?;
        Ok(())
    }

    /// Espera o Echo Reply de `ident`/`seq` e devolve o RTT em segundos.
    ///
    /// `timeout` é um prazo absoluto contado da entrada no laço; pacotes
    /// alheios não o renovam.
    pub async fn receive<S: EchoSocket>(
        &self,
        sock: &S,
        ident: u16,
        seq: u16,
        timeout: Duration,
        mode: CaptureMode,
    ) -> Result<f64> {
        self.hook
            .enter("receive", format_args!("id={ident} seq={seq} timeout={timeout:?} mode={mode:?}"));
        let deadline = tokio::time::Instant::now() + timeout;
        let result = match tokio::time::timeout_at(deadline, self.receive_loop(sock, ident, seq, mode)).await {
            Ok(result) => result,
            Err(_) => Err(PingError::Timeout { timeout }),
        };
        self.hook.exit("receive", format_args!("{result:?}"));
        result
    }

    async fn receive_loop<S: EchoSocket>(&self, sock: &S, ident: u16, seq: u16, mode: CaptureMode) -> Result<f64> {
        // Sem cabeçalho IP (SOCK_DGRAM no Linux) o kernel reescreve o
        // identifier com a porta local do socket.
        let ident = match mode {
            CaptureMode::WithIpHeader => ident,
            CaptureMode::IcmpOnly => sock.local_port()?,
        };

        let mut buf = [0u8; RECV_BUF_LEN];
        loop {
            let n = sock.recv(&mut buf).await?;
            let recv_time = wall_clock();
            let data = &buf[..n];

            let icmp_start = if mode.has_ip_header() {
                let ip = IpHeader::decode(data)?;
                tracing::debug!("IP recebido: {ip}");
                ip.header_len().max(IP_HEADER_LEN)
            } else {
                0
            };
            let icmp_data = data.get(icmp_start..).unwrap_or_default();
            let header = IcmpHeader::decode(icmp_data)?;
            tracing::debug!("ICMP recebido: {header}");

            match classify(&header, ident, seq) {
                Verdict::Discard(reason) => {
                    tracing::debug!("Pacote descartado: {reason}");
                }
                Verdict::Fail(err) => return Err(err),
                Verdict::Reply => {
                    let sent_time = icmp::read_timestamp(&icmp_data[icmp::ICMP_HEADER_LEN..])?;
                    return Ok(recv_time - sent_time);
                }
            }
        }
    }
}
