use anyhow::{Context, Result};
use asyncping::{PingOptions, Unit};
use std::net::Ipv4Addr;
use std::time::Duration;

pub struct PingArgs {
    pub dst: String,
    pub count: u64,
    pub interval: Duration,
    pub options: PingOptions,
    pub verbose: bool,
}

const USAGE: &str =
    "Uso: asyncping <host> [-c <count>] [-i <intervalo>] [-W <timeout>] [-t <ttl>] [-s <tamanho>] [-S <origem>] [-I <interface>] [-v]";

pub fn parse() -> Result<PingArgs> {
    parse_from(std::env::args().skip(1))
}

pub fn parse_from<I: IntoIterator<Item = String>>(args: I) -> Result<PingArgs> {
    let args: Vec<String> = args.into_iter().collect();
    let mut dst = None;
    let mut count = 4;
    let mut interval = Duration::ZERO;
    let mut verbose = false;
    let mut options = PingOptions { unit: Unit::Milliseconds, ..Default::default() };

    let mut i = 0;
    while i < args.len() {
        let flag = args[i].as_str();
        let mut value = || next_value(&args, &mut i, flag);
        match flag {
            "-c" => count = value()?.parse().context("Valor inválido para -c")?,
            "-i" => {
                let secs: f64 = value()?.parse().context("Valor inválido para -i")?;
                interval = Duration::try_from_secs_f64(secs).context("Valor inválido para -i")?;
            }
            "-W" => {
                let secs: f64 = value()?.parse().context("Valor inválido para -W")?;
                options.timeout = Duration::try_from_secs_f64(secs).context("Valor inválido para -W")?;
            }
            "-t" => options.ttl = Some(value()?.parse().context("Valor inválido para -t")?),
            "-s" => options.size = value()?.parse().context("Valor inválido para -s")?,
            "-S" => {
                let src: Ipv4Addr = value()?.parse().context("Endereço de origem inválido")?;
                options.src_addr = Some(src);
            }
            "-I" => options.interface = Some(value()?.to_string()),
            "-v" => verbose = true,
            val => {
                if dst.is_none() {
                    dst = Some(val.to_string());
                }
            }
        }
        i += 1;
    }

    let dst = dst.context(USAGE)?;

    Ok(PingArgs { dst, count, interval, options, verbose })
}

// Avança para o valor da flag
fn next_value<'a>(args: &'a [String], i: &mut usize, flag: &str) -> Result<&'a str> {
    *i += 1;
    args.get(*i).map(String::as_str).with_context(|| format!("Faltou o valor para {flag}"))
}
