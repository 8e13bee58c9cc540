// Tratamento de erros ergonômico
use anyhow::{Context, Result};

// Ping assíncrono (biblioteca deste crate)
use asyncping::Pinger;

// Sinalização de interrupção entre o handler de Ctrl+C e o laço
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// Logs estruturados
use tracing_subscriber::EnvFilter;

mod args;

/// Programa principal: envia pings para o destino e mostra cada resultado.
/// Sem privilégios usa sockets ICMP SOCK_DGRAM (Linux).
#[tokio::main]
async fn main() -> Result<()> {
    let args = args::parse()?;

    // RUST_LOG tem prioridade; -v liga o nível debug
    let default_level = if args.verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    // Configura handler para Ctrl+C
    let stopped = Arc::new(AtomicBool::new(false));
    let flag = stopped.clone();
    ctrlc::set_handler(move || {
        flag.store(true, Ordering::SeqCst);
    })
    .context("Erro ao configurar handler de Ctrl+C")?;

    let pinger = Pinger::new();
    let mut stdout = std::io::stdout();
    pinger
        .verbose_ping(&mut stdout, &args.dst, args.count, args.interval, &args.options, &stopped)
        .await
        .with_context(|| format!("Falha ao pingar {}", args.dst))?;

    Ok(())
}
