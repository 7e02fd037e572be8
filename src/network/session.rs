//! Connected TCP sessions and the listeners that produce them

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use std::fmt;
use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::time::Duration;
use uuid::Uuid;

use crate::config::NetworkConfig;
use crate::error::NetworkError;

/// Give up on an unreachable peer after this long
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

const LISTEN_BACKLOG: i32 = 4;

/// Which end of the connection this process is
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Sender,
    Receiver,
}

/// What a connection carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelKind {
    Audio,
    Control,
}

impl fmt::Display for ChannelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChannelKind::Audio => f.write_str("audio"),
            ChannelKind::Control => f.write_str("control"),
        }
    }
}

/// One connected TCP stream.
///
/// Dropping the session closes the socket.
pub struct NetworkSession {
    id: Uuid,
    role: Role,
    kind: ChannelKind,
    peer: SocketAddr,
    stream: TcpStream,
}

impl NetworkSession {
    /// Connect to a listening peer as the sending side
    pub fn connect(
        addr: SocketAddr,
        kind: ChannelKind,
        config: &NetworkConfig,
    ) -> Result<Self, NetworkError> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;
        socket
            .set_nodelay(config.tcp_nodelay)
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;
        socket
            .connect_timeout(&SockAddr::from(addr), CONNECT_TIMEOUT)
            .map_err(|e| NetworkError::ConnectionFailed(format!("{}: {}", addr, e)))?;

        let session = Self {
            id: Uuid::new_v4(),
            role: Role::Sender,
            kind,
            peer: addr,
            stream: socket.into(),
        };
        tracing::info!("Connected {} session {} to {}", kind, session.id, addr);
        Ok(session)
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    pub fn peer(&self) -> SocketAddr {
        self.peer
    }

    /// Close both directions; pending reads on either end return
    pub fn shutdown(&self) {
        let _ = self.stream.shutdown(Shutdown::Both);
    }
}

impl Read for NetworkSession {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for NetworkSession {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}

impl fmt::Debug for NetworkSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NetworkSession")
            .field("id", &self.id)
            .field("role", &self.role)
            .field("kind", &self.kind)
            .field("peer", &self.peer)
            .finish()
    }
}

/// Listening socket for one channel kind
pub struct SessionListener {
    listener: TcpListener,
    kind: ChannelKind,
    nodelay: bool,
}

impl SessionListener {
    pub fn bind(
        addr: SocketAddr,
        kind: ChannelKind,
        config: &NetworkConfig,
    ) -> Result<Self, NetworkError> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| NetworkError::BindFailed(e.to_string()))?;
        // Restarting the receiver must not wait out TIME_WAIT
        socket
            .set_reuse_address(true)
            .map_err(|e| NetworkError::BindFailed(e.to_string()))?;
        socket
            .bind(&SockAddr::from(addr))
            .map_err(|e| NetworkError::BindFailed(format!("{}: {}", addr, e)))?;
        socket
            .listen(LISTEN_BACKLOG)
            .map_err(|e| NetworkError::BindFailed(e.to_string()))?;

        let listener = Self {
            listener: socket.into(),
            kind,
            nodelay: config.tcp_nodelay,
        };
        tracing::info!("Listening for {} connections on {}", kind, listener.local_addr()?);
        Ok(listener)
    }

    pub fn local_addr(&self) -> Result<SocketAddr, NetworkError> {
        self.listener
            .local_addr()
            .map_err(|e| NetworkError::BindFailed(e.to_string()))
    }

    pub fn kind(&self) -> ChannelKind {
        self.kind
    }

    /// Block until a peer connects
    pub fn accept(&self) -> Result<NetworkSession, NetworkError> {
        let (stream, peer) = self
            .listener
            .accept()
            .map_err(|e| NetworkError::ConnectionFailed(e.to_string()))?;
        if let Err(e) = stream.set_nodelay(self.nodelay) {
            tracing::warn!("Could not set TCP_NODELAY for {}: {}", peer, e);
        }

        let session = NetworkSession {
            id: Uuid::new_v4(),
            role: Role::Receiver,
            kind: self.kind,
            peer,
            stream,
        };
        tracing::info!("Accepted {} session {} from {}", self.kind, session.id, peer);
        Ok(session)
    }
}
