use crate::config::{ErrorPolicy, PingOptions};
use crate::error::{PingError, Result};
use crate::hook::{Hook, TracingHook};
use crate::ident::IdentSource;
use crate::socket::{EchoSocket, IcmpSocket};
use crate::transceiver::Transceiver;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

/// Resultado de `Pinger::ping` com a política `ErrorPolicy::Sentinel`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PingOutcome {
    /// Atraso na unidade pedida em `PingOptions::unit`.
    Delay(f64),
    /// Timeout ou erro ICMP (TTL, inacessível...).
    NoReply,
    /// Nome do destino não resolvido.
    Unresolved,
}

/// Ponto de entrada: um Echo Request, uma resposta (ou falha).
pub struct Pinger {
    transceiver: Transceiver,
    hook: Arc<dyn Hook>,
    policy: ErrorPolicy,
    idents: &'static IdentSource,
}

impl Default for Pinger {
    fn default() -> Self {
        Self::new()
    }
}

impl Pinger {
    pub fn new() -> Self {
        Self::with_hook(Arc::new(TracingHook))
    }

    pub fn with_hook(hook: Arc<dyn Hook>) -> Self {
        Self {
            transceiver: Transceiver::new(hook.clone()),
            hook,
            policy: ErrorPolicy::default(),
            idents: IdentSource::global(),
        }
    }

    pub fn policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn ident_source(mut self, idents: &'static IdentSource) -> Self {
        self.idents = idents;
        self
    }

    /// Abre um socket ICMP próprio e faz um ping.
    ///
    /// Falha ao abrir o socket é sempre devolvida como `PingError::Io`.
    pub async fn ping(&self, dest_addr: &str, opts: &PingOptions) -> Result<PingOutcome> {
        let sock = IcmpSocket::open()?;
        self.ping_on(&sock, dest_addr, opts).await
    }

    /// Faz um ping usando um socket do chamador, que continua aberto depois.
    pub async fn ping_on<S: EchoSocket>(&self, sock: &S, dest_addr: &str, opts: &PingOptions) -> Result<PingOutcome> {
        self.hook.enter("ping", format_args!("dest={dest_addr} {opts:?}"));
        self.apply_options(sock, opts);

        let ident = self.idents.next();
        let result = self.exchange(sock, dest_addr, ident, opts).await;
        let outcome = self.settle(result, opts);

        self.hook.exit("ping", format_args!("{outcome:?}"));
        outcome
    }

    // Opções opcionais: falhas só são registradas.
    fn apply_options<S: EchoSocket>(&self, sock: &S, opts: &PingOptions) {
        if let Some(ttl) = opts.ttl {
            match sock.set_ttl(ttl) {
                Ok(()) => tracing::debug!("TTL do socket: {ttl}"),
                Err(err) => tracing::debug!("Falha ao definir IP_TTL em IPPROTO_IP: {err}"),
            }
        }
        if let Some(interface) = opts.interface.as_deref() {
            match sock.bind_interface(interface) {
                Ok(()) => tracing::debug!("Socket ligado à interface: {interface}"),
                Err(err) => tracing::debug!("Falha ao ligar à interface {interface}: {err}"),
            }
        }
        if let Some(src) = opts.src_addr {
            match sock.bind_source(src) {
                Ok(()) => tracing::debug!("Socket ligado ao endereço de origem: {src}"),
                Err(err) => tracing::debug!("Falha ao ligar ao endereço {src}: {err}"),
            }
        }
    }

    async fn exchange<S: EchoSocket>(&self, sock: &S, dest_addr: &str, ident: u16, opts: &PingOptions) -> Result<f64> {
        self.transceiver
            .send(sock, dest_addr, ident, opts.sequence, opts.size)
            .await?;
        self.transceiver
            .receive(sock, ident, opts.sequence, opts.timeout, sock.capture_mode())
            .await
    }

    fn settle(&self, result: Result<f64>, opts: &PingOptions) -> Result<PingOutcome> {
        let err = match result {
            Ok(delay) => return Ok(PingOutcome::Delay(opts.unit.convert(delay))),
            Err(err) => err,
        };
        tracing::debug!("{err}");
        if !err.is_protocol() || self.policy == ErrorPolicy::Propagate {
            return Err(err);
        }
        Ok(match err {
            PingError::HostUnknown { .. } => PingOutcome::Unresolved,
            _ => PingOutcome::NoReply,
        })
    }

    /// Pinga `count` vezes (0 = até `stop`) e escreve uma linha por resposta.
    ///
    /// A sequence de cada ping é o seu índice.
    pub async fn verbose_ping<W: Write>(
        &self,
        out: &mut W,
        dest_addr: &str,
        count: u64,
        interval: Duration,
        opts: &PingOptions,
        stop: &AtomicBool,
    ) -> anyhow::Result<()> {
        let mut i = 0u64;
        while (count == 0 || i < count) && !stop.load(Ordering::SeqCst) {
            if !interval.is_zero() && i > 0 {
                tokio::time::sleep(interval).await;
            }
            let opts = PingOptions { sequence: i as u16, ..opts.clone() };
            let outcome = self.ping(dest_addr, &opts).await?;
            writeln!(out, "{}", describe(dest_addr, &opts, outcome))?;
            i += 1;
        }
        Ok(())
    }
}

/// Linha de saída do `verbose_ping`.
pub fn describe(dest_addr: &str, opts: &PingOptions, outcome: PingOutcome) -> String {
    let mut line = format!("ping '{dest_addr}'");
    if let Some(src) = opts.src_addr {
        line.push_str(&format!(" from '{src}'"));
    }
    line.push_str(" ... ");
    match outcome {
        PingOutcome::Delay(delay) => line.push_str(&format!("{}{}", delay as i64, opts.unit.suffix())),
        PingOutcome::NoReply => line.push_str(&format!("Timeout > {}s", opts.timeout.as_secs_f64())),
        PingOutcome::Unresolved => line.push_str("Error"),
    }
    line
}
