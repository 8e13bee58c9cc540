use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};

/// Gera identifiers ICMP distintos para chamadas do mesmo processo.
///
/// Mistura o PID com um contador atômico, de modo que pings simultâneos
/// compartilhando a fila do socket RAW consigam separar suas respostas.
/// Colisões continuam possíveis (16 bits).
#[derive(Debug)]
pub struct IdentSource {
    pid: u32,
    counter: AtomicU32,
}

static GLOBAL: OnceLock<IdentSource> = OnceLock::new();

impl IdentSource {
    pub const fn new(pid: u32) -> Self {
        Self { pid, counter: AtomicU32::new(0) }
    }

    /// Fonte única do processo, criada no primeiro uso.
    pub fn global() -> &'static IdentSource {
        GLOBAL.get_or_init(|| IdentSource::new(std::process::id()))
    }

    /// Próximo identifier; avança o contador.
    pub fn next(&self) -> u16 {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        (((self.pid << 5) | n) ^ (self.pid >> 11)) as u16
    }
}
