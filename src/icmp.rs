//! Formato de fio do ICMPv4 e do prefixo IPv4 recebido em sockets RAW.

use crate::checksum;
use crate::error::{PingError, Result};
use std::fmt;
use std::net::Ipv4Addr;

/// Tamanho fixo do cabeçalho ICMP.
pub const ICMP_HEADER_LEN: usize = 8;

/// Tamanho do cabeçalho IPv4 sem opções.
pub const IP_HEADER_LEN: usize = 20;

/// Bytes do timestamp (double big-endian) no início do payload.
pub const TIMESTAMP_LEN: usize = 8;

/// Byte usado para completar o payload até o tamanho pedido.
pub const PADDING_BYTE: u8 = b'Q';

/// Tipos ICMP tratados pelo ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IcmpType {
    EchoReply = 0,
    DestinationUnreachable = 3,
    EchoRequest = 8,
    TimeExceeded = 11,
}

impl IcmpType {
    pub const fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::EchoReply),
            3 => Some(Self::DestinationUnreachable),
            8 => Some(Self::EchoRequest),
            11 => Some(Self::TimeExceeded),
            _ => None,
        }
    }
}

/// Código do Echo Request/Reply.
pub const DEFAULT_CODE: u8 = 0;

/// Códigos de Time Exceeded (tipo 11).
pub mod time_exceeded {
    pub const TTL_EXPIRED: u8 = 0;
    pub const FRAGMENT_REASSEMBLY: u8 = 1;
}

/// Códigos de Destination Unreachable (tipo 3).
pub mod unreachable {
    pub const NETWORK: u8 = 0;
    pub const HOST: u8 = 1;
    pub const PROTOCOL: u8 = 2;
    pub const PORT: u8 = 3;
}

/// Cabeçalho ICMP: type(1) code(1) checksum(2) identifier(2) sequence(2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub identifier: u16,
    pub sequence: u16,
}

impl IcmpHeader {
    pub const fn new(icmp_type: u8, code: u8, checksum: u16, identifier: u16, sequence: u16) -> Self {
        Self { icmp_type, code, checksum, identifier, sequence }
    }

    /// Serializa em big-endian (ordem de rede).
    pub fn encode(&self) -> [u8; ICMP_HEADER_LEN] {
        let mut out = [0u8; ICMP_HEADER_LEN];
        out[0] = self.icmp_type;
        out[1] = self.code;
        out[2..4].copy_from_slice(&self.checksum.to_be_bytes());
        out[4..6].copy_from_slice(&self.identifier.to_be_bytes());
        out[6..8].copy_from_slice(&self.sequence.to_be_bytes());
        out
    }

    /// Lê os 8 primeiros bytes de `buf`; bytes extras são ignorados.
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < ICMP_HEADER_LEN {
            return Err(PingError::MalformedPacket { expected: ICMP_HEADER_LEN, actual: buf.len() });
        }
        Ok(Self {
            icmp_type: buf[0],
            code: buf[1],
            checksum: u16::from_be_bytes([buf[2], buf[3]]),
            identifier: u16::from_be_bytes([buf[4], buf[5]]),
            sequence: u16::from_be_bytes([buf[6], buf[7]]),
        })
    }

    pub fn kind(&self) -> Option<IcmpType> {
        IcmpType::from_u8(self.icmp_type)
    }
}

impl fmt::Display for IcmpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type={} code={} checksum={:#06x} id={} seq={}",
            self.icmp_type, self.code, self.checksum, self.identifier, self.sequence
        )
    }
}

/// Prefixo IPv4 de 20 bytes entregue junto com o ICMP em sockets RAW.
///
/// Usado só para diagnóstico; nenhum campo participa do casamento de respostas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IpHeader {
    /// Versão (nibble alto) e IHL (nibble baixo).
    pub version_ihl: u8,
    pub tos: u8,
    pub total_length: u16,
    pub id: u16,
    pub flags_fragment: u16,
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src_addr: Ipv4Addr,
    pub dest_addr: Ipv4Addr,
}

impl IpHeader {
    pub fn decode(buf: &[u8]) -> Result<Self> {
        if buf.len() < IP_HEADER_LEN {
            return Err(PingError::MalformedPacket { expected: IP_HEADER_LEN, actual: buf.len() });
        }
        Ok(Self {
            version_ihl: buf[0],
            tos: buf[1],
            total_length: u16::from_be_bytes([buf[2], buf[3]]),
            id: u16::from_be_bytes([buf[4], buf[5]]),
            flags_fragment: u16::from_be_bytes([buf[6], buf[7]]),
            ttl: buf[8],
            protocol: buf[9],
            checksum: u16::from_be_bytes([buf[10], buf[11]]),
            src_addr: Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]),
            dest_addr: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
        })
    }

    pub fn version(&self) -> u8 {
        self.version_ihl >> 4
    }

    /// Comprimento do cabeçalho em bytes, a partir do IHL.
    pub fn header_len(&self) -> usize {
        (self.version_ihl & 0x0F) as usize * 4
    }
}

impl fmt::Display for IpHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "v{} len={} id={} ttl={} proto={} {} -> {}",
            self.version(),
            self.total_length,
            self.id,
            self.ttl,
            self.protocol,
            self.src_addr,
            self.dest_addr
        )
    }
}

/// Payload do Echo: timestamp de envio seguido de preenchimento.
///
/// Tamanhos menores que o timestamp sobem para `TIMESTAMP_LEN`.
pub fn echo_payload(sent_at: f64, size: usize) -> Vec<u8> {
    let size = size.max(TIMESTAMP_LEN);
    let mut payload = Vec::with_capacity(size);
    payload.extend_from_slice(&sent_at.to_be_bytes());
    payload.resize(size, PADDING_BYTE);
    payload
}

/// Extrai o timestamp gravado por `echo_payload`.
pub fn read_timestamp(payload: &[u8]) -> Result<f64> {
    let raw: [u8; TIMESTAMP_LEN] = payload
        .get(..TIMESTAMP_LEN)
        .and_then(|b| b.try_into().ok())
        .ok_or(PingError::MalformedPacket { expected: TIMESTAMP_LEN, actual: payload.len() })?;
    Ok(f64::from_be_bytes(raw))
}

/// Monta um pacote ICMPv4 Echo Request (type=8, code=0).
pub fn build_echo_request(ident: u16, seq: u16, payload: &[u8]) -> Vec<u8> {
    // Cabeçalho com checksum zerado para o cálculo
    let header = IcmpHeader::new(IcmpType::EchoRequest as u8, DEFAULT_CODE, 0, ident, seq);
    let mut pkt = Vec::with_capacity(ICMP_HEADER_LEN + payload.len());
    pkt.extend_from_slice(&header.encode());
    pkt.extend_from_slice(payload);

    // Calcula e escreve o checksum em ordem de rede
    let csum = checksum::compute(&pkt);
    pkt[2..4].copy_from_slice(&csum.to_be_bytes());

    pkt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_roundtrip() {
        for (t, c, k, i, s) in [(0, 0, 0, 0, 0), (8, 0, 0xBEEF, 0x1234, 7), (255, 255, 0xFFFF, 0xFFFF, 0xFFFF)] {
            let h = IcmpHeader::new(t, c, k, i, s);
            assert_eq!(IcmpHeader::decode(&h.encode()).unwrap(), h);
        }
    }

    #[test]
    fn header_is_big_endian() {
        let bytes = IcmpHeader::new(8, 0, 0xA1B2, 0x0102, 0x0304).encode();
        assert_eq!(bytes, [8, 0, 0xA1, 0xB2, 0x01, 0x02, 0x03, 0x04]);
    }

    #[test]
    fn short_icmp_header_is_malformed() {
        let err = IcmpHeader::decode(&[0, 0, 0]).unwrap_err();
        assert!(matches!(err, PingError::MalformedPacket { expected: 8, actual: 3 }));
    }

    #[test]
    fn ip_header_addresses_are_dotted_quad() {
        let mut raw = [0u8; IP_HEADER_LEN];
        raw[12..16].copy_from_slice(&0x0100007Fu32.to_le_bytes());
        raw[16..20].copy_from_slice(&0x0100007Fu32.to_le_bytes());
        let ip = IpHeader::decode(&raw).unwrap();
        assert_eq!(ip.src_addr.to_string(), "127.0.0.1");
        assert_eq!(ip.dest_addr.to_string(), "127.0.0.1");
    }

    #[test]
    fn ip_header_fields() {
        let raw = [
            0x45, 0x00, 0x00, 0x54, 0xAB, 0xCD, 0x40, 0x00, 0x40, 0x01, 0x12, 0x34, 10, 0, 0, 1, 192, 168,
            1, 20,
        ];
        let ip = IpHeader::decode(&raw).unwrap();
        assert_eq!(ip.version(), 4);
        assert_eq!(ip.header_len(), 20);
        assert_eq!(ip.total_length, 84);
        assert_eq!(ip.id, 0xABCD);
        assert_eq!(ip.flags_fragment, 0x4000);
        assert_eq!(ip.ttl, 64);
        assert_eq!(ip.protocol, 1);
        assert_eq!(ip.checksum, 0x1234);
        assert_eq!(ip.dest_addr, Ipv4Addr::new(192, 168, 1, 20));
    }

    #[test]
    fn short_ip_header_is_malformed() {
        assert!(matches!(
            IpHeader::decode(&[0x45; 19]),
            Err(PingError::MalformedPacket { expected: 20, actual: 19 })
        ));
    }

    #[test]
    fn payload_is_raised_to_timestamp_size() {
        let p = echo_payload(1.5, 3);
        assert_eq!(p.len(), TIMESTAMP_LEN);
        assert_eq!(read_timestamp(&p).unwrap(), 1.5);
    }

    #[test]
    fn payload_is_padded() {
        let p = echo_payload(42.25, 56);
        assert_eq!(p.len(), 56);
        assert!(p[TIMESTAMP_LEN..].iter().all(|&b| b == PADDING_BYTE));
        assert_eq!(read_timestamp(&p).unwrap(), 42.25);
    }

    #[test]
    fn echo_request_checksum_verifies() {
        let pkt = build_echo_request(0x4242, 3, &echo_payload(1000.0, 56));
        assert_eq!(pkt.len(), ICMP_HEADER_LEN + 56);
        assert_eq!(pkt[0], IcmpType::EchoRequest as u8);
        assert_eq!(checksum::compute(&pkt), 0);
        let h = IcmpHeader::decode(&pkt).unwrap();
        assert_eq!((h.identifier, h.sequence), (0x4242, 3));
    }
}
