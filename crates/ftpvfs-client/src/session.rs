//! A logged-in FTP session over tokio sockets.
//!
//! The control connection lives behind a mutex shared with every open
//! [`FtpDataStream`], because a transfer's completion reply arrives on the
//! control connection after the data connection closes. Whoever touches the
//! control connection next reads it: the stream's own `close`, or the next
//! command. Tickets keep the count straight.

use async_trait::async_trait;
use chrono::Utc;
use futures::future::BoxFuture;
use std::net::{IpAddr, SocketAddr};
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt, BufReader, ReadBuf};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;

use ftpvfs::{DataStream, FtpTransport, RemoteEntry, TransportError, TransportResult};

use crate::config::FtpConfig;
use crate::listing::parse_listing;
use crate::reply::{self, Reply, parse_epsv, parse_pasv};

/// Control connection state.
struct Control {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
    peer: IpAddr,
    /// Transfers started with a 1xx reply.
    issued: u64,
    /// Transfers whose completion reply has been read.
    settled: u64,
    epsv: bool,
    passive_use_control_host: bool,
    connect_timeout: Duration,
    command_timeout: Duration,
}

impl Control {
    async fn send(&mut self, command: &str) -> TransportResult<()> {
        if command.starts_with("PASS ") {
            tracing::debug!("ftp > PASS ****");
        } else {
            tracing::debug!("ftp > {}", command);
        }
        self.writer.write_all(command.as_bytes()).await?;
        self.writer.write_all(b"\r\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    async fn read_reply(&mut self) -> TransportResult<Reply> {
        let reply = tokio::time::timeout(self.command_timeout, reply::read_reply(&mut self.reader))
            .await
            .map_err(|_| TransportError::timeout("waiting for server reply"))??;
        tracing::debug!(code = reply.code, "ftp < {}", reply.message());
        Ok(reply)
    }

    /// Send a command and read its first reply, after settling any
    /// finished transfers.
    async fn command(&mut self, command: &str) -> TransportResult<Reply> {
        self.drain_all().await?;
        self.send(command).await?;
        self.read_reply().await
    }

    /// Read the completion reply of one transfer.
    async fn settle_one(&mut self) -> TransportResult<()> {
        let reply = self.read_reply().await?;
        self.settled += 1;
        // 426 and 451 are how servers report a transfer we closed early.
        if !reply.is_completion() {
            tracing::debug!(code = reply.code, "transfer ended without success");
        }
        Ok(())
    }

    async fn drain_through(&mut self, ticket: u64) -> TransportResult<()> {
        while self.settled <= ticket {
            self.settle_one().await?;
        }
        Ok(())
    }

    async fn drain_all(&mut self) -> TransportResult<()> {
        while self.settled < self.issued {
            self.settle_one().await?;
        }
        Ok(())
    }

    /// Open a passive data connection: `EPSV`, falling back to `PASV`.
    async fn open_data(&mut self) -> TransportResult<TcpStream> {
        let mut target = None;

        if self.epsv {
            let reply = self.command("EPSV").await?;
            if reply.code == 229 {
                let port = parse_epsv(&reply.message())?;
                target = Some(SocketAddr::new(self.peer, port));
            } else {
                tracing::debug!(code = reply.code, "EPSV refused, using PASV");
                self.epsv = false;
            }
        }

        let target = match target {
            Some(target) => target,
            None => {
                let reply = self.command("PASV").await?.expect(&[227])?;
                let (ip, port) = parse_pasv(&reply.message())?;
                if self.passive_use_control_host {
                    SocketAddr::new(self.peer, port)
                } else {
                    SocketAddr::new(IpAddr::V4(ip), port)
                }
            }
        };

        tokio::time::timeout(self.connect_timeout, TcpStream::connect(target))
            .await
            .map_err(|_| TransportError::timeout(format!("connecting data channel to {}", target)))?
            .map_err(TransportError::from)
    }
}

/// A logged-in FTP session.
///
/// Cloning shares the control connection.
#[derive(Clone)]
pub struct FtpSession {
    control: Arc<Mutex<Control>>,
}

impl std::fmt::Debug for FtpSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FtpSession").finish_non_exhaustive()
    }
}

impl FtpSession {
    /// Connect, log in and switch to binary mode.
    pub async fn connect(config: &FtpConfig) -> TransportResult<Self> {
        let address = format!("{}:{}", config.host, config.port);
        let stream = tokio::time::timeout(
            config.connect_timeout(),
            TcpStream::connect((config.host.as_str(), config.port)),
        )
        .await
        .map_err(|_| TransportError::timeout(format!("connecting to {}", address)))??;

        let peer = stream.peer_addr()?.ip();
        let (read_half, write_half) = stream.into_split();
        let mut control = Control {
            reader: BufReader::new(read_half),
            writer: write_half,
            peer,
            issued: 0,
            settled: 0,
            epsv: true,
            passive_use_control_host: config.passive_use_control_host,
            connect_timeout: config.connect_timeout(),
            command_timeout: config.command_timeout(),
        };

        let greeting = loop {
            let reply = control.read_reply().await?;
            if !reply.is_preliminary() {
                break reply;
            }
        };
        greeting.expect(&[220])?;

        let user = control.command(&format!("USER {}", config.username)).await?;
        match user.code {
            230 => {}
            331 | 332 => {
                control
                    .command(&format!("PASS {}", config.password))
                    .await?
                    .expect(&[230, 202])?;
            }
            _ => return Err(user.into_error()),
        }

        control.command("TYPE I").await?.expect(&[200])?;
        tracing::info!(%address, user = %config.username, "logged in");

        Ok(Self {
            control: Arc::new(Mutex::new(control)),
        })
    }

    /// Say goodbye. The connection closes when the last handle drops.
    pub async fn quit(&self) -> TransportResult<()> {
        let mut control = self.control.lock().await;
        control.command("QUIT").await?.expect(&[221])?;
        Ok(())
    }
}

#[async_trait]
impl FtpTransport for FtpSession {
    async fn list(&mut self, path: &str) -> TransportResult<Vec<RemoteEntry>> {
        let mut control = self.control.lock().await;
        let mut data = control.open_data().await?;

        let reply = control.command(&format!("LIST {}", path)).await?;
        if !reply.is_preliminary() && !reply.is_completion() {
            return Err(reply.into_error());
        }

        let mut raw = Vec::new();
        tokio::time::timeout(control.command_timeout, data.read_to_end(&mut raw))
            .await
            .map_err(|_| TransportError::timeout(format!("reading listing of {}", path)))??;
        drop(data);

        if reply.is_preliminary() {
            control.read_reply().await?.expect(&[226, 250])?;
        }

        let entries = parse_listing(&String::from_utf8_lossy(&raw), Utc::now());
        tracing::debug!(path, entries = entries.len(), "listed");
        Ok(entries)
    }

    async fn change_dir(&mut self, path: &str) -> TransportResult<()> {
        let mut control = self.control.lock().await;
        control
            .command(&format!("CWD {}", path))
            .await?
            .expect(&[200, 250])?;
        Ok(())
    }

    async fn retr_from(&mut self, path: &str, offset: u64) -> TransportResult<Box<dyn DataStream>> {
        let mut control = self.control.lock().await;
        let data = control.open_data().await?;

        if offset > 0 {
            control
                .command(&format!("REST {}", offset))
                .await?
                .expect(&[350])?;
        }

        let reply = control.command(&format!("RETR {}", path)).await?;
        let ticket = if reply.is_preliminary() {
            let ticket = control.issued;
            control.issued += 1;
            Some(ticket)
        } else if reply.is_completion() {
            // Some servers finish tiny transfers before we ask.
            None
        } else {
            return Err(reply.into_error());
        };

        tracing::debug!(path, offset, "transfer started");
        Ok(Box::new(FtpDataStream {
            data,
            control: Arc::clone(&self.control),
            ticket,
        }))
    }
}

/// The data connection of one `RETR`.
pub struct FtpDataStream {
    data: TcpStream,
    control: Arc<Mutex<Control>>,
    ticket: Option<u64>,
}

impl AsyncRead for FtpDataStream {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.data).poll_read(cx, buf)
    }
}

impl DataStream for FtpDataStream {
    fn close(self: Box<Self>) -> BoxFuture<'static, TransportResult<()>> {
        let FtpDataStream {
            mut data,
            control,
            ticket,
        } = *self;
        Box::pin(async move {
            // The server only sends its completion reply once the data
            // connection is gone.
            let _ = data.shutdown().await;
            drop(data);

            if let Some(ticket) = ticket {
                control.lock().await.drain_through(ticket).await?;
            }
            Ok(())
        })
    }
}
