//! Socket ICMP assíncrono sobre `socket2` + `tokio`.

use crate::config::CaptureMode;
use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::io::{self, Read};
use std::net::{Ipv4Addr, SocketAddrV4};
use tokio::io::Interest;
use tokio::io::unix::AsyncFd;

/// O que o transceiver precisa de um socket ICMP.
///
/// O socket pertence ao chamador; o transceiver só lê, escreve e ajusta
/// opções, nunca fecha.
pub trait EchoSocket: Send + Sync {
    /// Espera o socket ficar gravável e envia um datagrama.
    fn send_to(&self, packet: &[u8], dest: SocketAddrV4) -> impl Future<Output = io::Result<usize>> + Send;

    /// Espera o socket ficar legível e lê um datagrama.
    fn recv(&self, buf: &mut [u8]) -> impl Future<Output = io::Result<usize>> + Send;

    /// Porta local atribuída pelo kernel (vira o identifier em SOCK_DGRAM no Linux).
    fn local_port(&self) -> io::Result<u16>;

    fn capture_mode(&self) -> CaptureMode;

    fn set_ttl(&self, ttl: u32) -> io::Result<()>;

    fn bind_interface(&self, name: &str) -> io::Result<()>;

    fn bind_source(&self, addr: Ipv4Addr) -> io::Result<()>;
}

/// Socket ICMPv4 registrado no reator do Tokio.
#[derive(Debug)]
pub struct IcmpSocket {
    inner: AsyncFd<Socket>,
    mode: CaptureMode,
}

impl IcmpSocket {
    /// Abre um socket RAW; sem privilégio (EPERM/EACCES) cai para SOCK_DGRAM.
    ///
    /// Precisa ser chamado dentro de um runtime Tokio.
    pub fn open() -> io::Result<Self> {
        let (sock, mode) = match Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4)) {
            Ok(sock) => (sock, CaptureMode::WithIpHeader),
            Err(err) if matches!(err.raw_os_error(), Some(libc::EPERM) | Some(libc::EACCES)) => {
                tracing::debug!("`{err}` ao criar SOCK_RAW, usando SOCK_DGRAM");
                let sock = Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::ICMPV4))?;
                (sock, CaptureMode::for_dgram())
            }
            Err(err) => return Err(err),
        };
        Self::from_socket(sock, mode)
    }

    /// Adota um socket já criado pelo chamador.
    pub fn from_socket(sock: Socket, mode: CaptureMode) -> io::Result<Self> {
        sock.set_nonblocking(true)?;
        Ok(Self { inner: AsyncFd::new(sock)?, mode })
    }

    pub fn get_ref(&self) -> &Socket {
        self.inner.get_ref()
    }

    pub fn into_inner(self) -> Socket {
        self.inner.into_inner()
    }
}

impl EchoSocket for IcmpSocket {
    async fn send_to(&self, packet: &[u8], dest: SocketAddrV4) -> io::Result<usize> {
        let addr = SockAddr::from(dest);
        self.inner
            .async_io(Interest::WRITABLE, |sock| sock.send_to(packet, &addr))
            .await
    }

    async fn recv(&self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner
            .async_io(Interest::READABLE, |mut sock| sock.read(&mut buf[..]))
            .await
    }

    fn local_port(&self) -> io::Result<u16> {
        self.get_ref()
            .local_addr()?
            .as_socket_ipv4()
            .map(|addr| addr.port())
            .ok_or_else(|| io::Error::other("socket sem endereço IPv4 local"))
    }

    fn capture_mode(&self) -> CaptureMode {
        self.mode
    }

    fn set_ttl(&self, ttl: u32) -> io::Result<()> {
        // IPPROTO_IP / IP_TTL
        self.get_ref().set_ttl_v4(ttl)
    }

    #[cfg(any(target_os = "linux", target_os = "android", target_os = "fuchsia"))]
    fn bind_interface(&self, name: &str) -> io::Result<()> {
        self.get_ref().bind_device(Some(name.as_bytes()))
    }

    #[cfg(not(any(target_os = "linux", target_os = "android", target_os = "fuchsia")))]
    fn bind_interface(&self, _name: &str) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "SO_BINDTODEVICE só existe no Linux"))
    }

    fn bind_source(&self, addr: Ipv4Addr) -> io::Result<()> {
        self.get_ref().bind(&SockAddr::from(SocketAddrV4::new(addr, 0)))
    }
}
