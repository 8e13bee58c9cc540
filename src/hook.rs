//! Pontos de observação nas entradas e saídas de send/receive/ping.

use std::fmt;

/// Capacidade de observação injetada no `Pinger`.
pub trait Hook: Send + Sync {
    fn enter(&self, op: &'static str, detail: fmt::Arguments<'_>);
    fn exit(&self, op: &'static str, outcome: fmt::Arguments<'_>);
}

/// Encaminha para `tracing` em nível debug.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingHook;

impl Hook for TracingHook {
    fn enter(&self, op: &'static str, detail: fmt::Arguments<'_>) {
        tracing::debug!(op = op, "chamada: {}", detail);
    }

    fn exit(&self, op: &'static str, outcome: fmt::Arguments<'_>) {
        tracing::debug!(op = op, "retorno: {}", outcome);
    }
}

/// Não observa nada.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl Hook for NoopHook {
    fn enter(&self, _: &'static str, _: fmt::Arguments<'_>) {}
    fn exit(&self, _: &'static str, _: fmt::Arguments<'_>) {}
}
