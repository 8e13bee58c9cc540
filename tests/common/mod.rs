#![allow(dead_code)]

use asyncping::icmp::{self, IcmpHeader, IcmpType};
use asyncping::{CaptureMode, EchoSocket};
use std::collections::VecDeque;
use std::io;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::sync::Mutex;
use std::time::Duration;

/// Socket em memória: entrega datagramas roteirizados e, se for um
/// "responder", devolve um Echo Reply para cada Echo Request enviado.
pub struct ScriptedSocket {
    mode: CaptureMode,
    port: u16,
    responder: bool,
    inbox: Mutex<VecDeque<(Duration, Vec<u8>)>>,
    pub sent: Mutex<Vec<(Vec<u8>, SocketAddrV4)>>,
    pub ttl: Mutex<Option<u32>>,
    pub source: Mutex<Option<Ipv4Addr>>,
}

impl ScriptedSocket {
    pub fn new(mode: CaptureMode) -> Self {
        Self {
            mode,
            port: 0,
            responder: false,
            inbox: Mutex::new(VecDeque::new()),
            sent: Mutex::new(Vec::new()),
            ttl: Mutex::new(None),
            source: Mutex::new(None),
        }
    }

    pub fn responder(mode: CaptureMode) -> Self {
        Self { responder: true, ..Self::new(mode) }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enfileira um pacote ICMP, com prefixo IP quando o modo pede.
    pub fn push(&self, header: IcmpHeader, payload: &[u8]) {
        self.push_after(Duration::ZERO, header, payload);
    }

    /// Como `push`, mas a leitura só termina depois de `delay`.
    pub fn push_after(&self, delay: Duration, header: IcmpHeader, payload: &[u8]) {
        let datagram = datagram(self.mode, header, payload);
        self.inbox.lock().unwrap().push_back((delay, datagram));
    }

    pub fn push_raw(&self, bytes: Vec<u8>) {
        self.inbox.lock().unwrap().push_back((Duration::ZERO, bytes));
    }

    pub fn sent_headers(&self) -> Vec<IcmpHeader> {
        self.sent.lock().unwrap().iter().map(|(pkt, _)| IcmpHeader::decode(pkt).unwrap()).collect()
    }
}

impl EchoSocket for ScriptedSocket {
    async fn send_to(&self, packet: &[u8], dest: SocketAddrV4) -> io::Result<usize> {
        self.sent.lock().unwrap().push((packet.to_vec(), dest));
        if self.responder {
            let request = IcmpHeader::decode(packet).unwrap();
            let ident = match self.mode {
                CaptureMode::WithIpHeader => request.identifier,
                CaptureMode::IcmpOnly => self.port,
            };
            let reply = IcmpHeader::new(IcmpType::EchoReply as u8, 0, 0, ident, request.sequence);
            self.push(reply, &packet[icmp::ICMP_HEADER_LEN..]);
        }
        Ok(packet.len())
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        let next = self.inbox.lock().unwrap().pop_front();
        match next {
            Some((delay, datagram)) => {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                let n = datagram.len().min(buf.len());
                buf[..n].copy_from_slice(&datagram[..n]);
                Ok(n)
            }
            None => std::future::pending().await,
        }
    }

    fn local_port(&self) -> io::Result<u16> {
        Ok(self.port)
    }

    fn capture_mode(&self) -> CaptureMode {
        self.mode
    }

    fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        *self.ttl.lock().unwrap() = Some(ttl);
        Ok(())
    }

    fn bind_interface(&self, _name: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "sem interfaces"))
    }

    fn bind_source(&self, addr: Ipv4Addr) -> io::Result<()> {
        *self.source.lock().unwrap() = Some(addr);
        Ok(())
    }
}

/// Cabeçalho IPv4 mínimo (127.0.0.1 -> 127.0.0.1, protocolo ICMP).
pub fn ip_prefix(total_len: usize) -> [u8; icmp::IP_HEADER_LEN] {
    let mut ip = [0u8; icmp::IP_HEADER_LEN];
    ip[0] = 0x45;
    ip[2..4].copy_from_slice(&(total_len as u16).to_be_bytes());
    ip[8] = 64;
    ip[9] = 1;
    ip[12..16].copy_from_slice(&[127, 0, 0, 1]);
    ip[16..20].copy_from_slice(&[127, 0, 0, 1]);
    ip
}

pub fn datagram(mode: CaptureMode, header: IcmpHeader, payload: &[u8]) -> Vec<u8> {
    let mut icmp_part = header.encode().to_vec();
    icmp_part.extend_from_slice(payload);
    let csum = asyncping::checksum::compute(&icmp_part);
    icmp_part[2..4].copy_from_slice(&csum.to_be_bytes());

    match mode {
        CaptureMode::IcmpOnly => icmp_part,
        CaptureMode::WithIpHeader => {
            let mut out = ip_prefix(icmp::IP_HEADER_LEN + icmp_part.len()).to_vec();
            out.extend_from_slice(&icmp_part);
            out
        }
    }
}

/// Payload com timestamp `ago` segundos no passado.
pub fn payload_sent(ago: f64) -> Vec<u8> {
    icmp::echo_payload(asyncping::transceiver::wall_clock() - ago, 56)
}
