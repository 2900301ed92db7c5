//! UDP capture receiver
//!
//! One background task owns the socket and the smoothing state. After each
//! datagram it publishes a fresh immutable [`SignalSnapshot`]; readers clone
//! the `Arc` under a short read lock and never see a half-updated map.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::{Mutex, RwLock};
use tokio::net::UdpSocket;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use puppet_core::{PuppetError, PuppetResult, RateLimiter, SignalSnapshot};
use puppet_wire::parse_packet;

use crate::{SignalSmoother, DEFAULT_HISTORY_LEN};

/// Default capture port
pub const DEFAULT_CAPTURE_PORT: u16 = 49983;

/// Largest datagram read in one call
pub const MAX_DATAGRAM_SIZE: usize = 8192;

/// Capture receiver configuration
#[derive(Clone, Debug)]
pub struct ReceiverConfig {
    /// Local address to bind
    pub bind_ip: IpAddr,
    /// Local port to bind (0 picks a free port)
    pub port: u16,
    /// How long one receive call waits before looping
    pub poll_interval: Duration,
    /// Samples averaged per signal
    pub history_len: usize,
    /// Receive buffer size
    pub max_datagram: usize,
    /// Minimum spacing between repeated receive-error warnings
    pub log_interval: Duration,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        ReceiverConfig {
            bind_ip: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: DEFAULT_CAPTURE_PORT,
            poll_interval: Duration::from_millis(100),
            history_len: DEFAULT_HISTORY_LEN,
            max_datagram: MAX_DATAGRAM_SIZE,
            log_interval: Duration::from_secs(2),
        }
    }
}

impl ReceiverConfig {
    /// Loopback on an ephemeral port, for tests and local tools
    pub fn loopback() -> Self {
        ReceiverConfig {
            bind_ip: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 0,
            ..Default::default()
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_ip, self.port)
    }

    pub fn validate(&self) -> PuppetResult<()> {
        if self.poll_interval.is_zero() {
            return Err(PuppetError::InvalidConfig("poll interval must be non-zero".into()));
        }
        if self.max_datagram == 0 {
            return Err(PuppetError::InvalidConfig("max datagram size must be non-zero".into()));
        }
        Ok(())
    }
}

/// Receive loop counters
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    pub packets: u64,
    pub samples: u64,
    pub skipped_segments: u64,
    pub recv_errors: u64,
}

/// Cheap cloneable reader of the latest published snapshot
#[derive(Clone, Debug)]
pub struct SnapshotReader {
    latest: Arc<RwLock<Arc<SignalSnapshot>>>,
}

impl SnapshotReader {
    fn new() -> Self {
        SnapshotReader {
            latest: Arc::new(RwLock::new(Arc::new(SignalSnapshot::empty()))),
        }
    }

    /// Latest smoothed snapshot
    pub fn latest(&self) -> Arc<SignalSnapshot> {
        Arc::clone(&self.latest.read())
    }

    fn publish(&self, snapshot: SignalSnapshot) {
        *self.latest.write() = Arc::new(snapshot);
    }
}

/// Capture receiver bound to a UDP port
pub struct CaptureReceiver {
    local_addr: SocketAddr,
    reader: SnapshotReader,
    stats: Arc<Mutex<ReceiverStats>>,
    shutdown: Option<watch::Sender<bool>>,
    task: Option<JoinHandle<()>>,
}

impl CaptureReceiver {
    /// Bind the socket and spawn the receive loop
    ///
    /// Must be called inside a tokio runtime. On an invalid config or a bind
    /// failure nothing is spawned and the error is returned.
    pub async fn start(config: ReceiverConfig) -> PuppetResult<Self> {
        config.validate()?;

        let addr = config.bind_addr();
        let socket = UdpSocket::bind(addr).await.map_err(|e| PuppetError::Bind {
            addr,
            reason: e.to_string(),
        })?;

        let local_addr = socket
            .local_addr()
            .map_err(|e| PuppetError::TransportError(e.to_string()))?;

        let reader = SnapshotReader::new();
        let stats = Arc::new(Mutex::new(ReceiverStats::default()));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let task = tokio::spawn(receive_loop(
            socket,
            config,
            reader.clone(),
            Arc::clone(&stats),
            shutdown_rx,
        ));

        tracing::info!(%local_addr, "capture receiver started");

        Ok(CaptureReceiver {
            local_addr,
            reader,
            stats,
            shutdown: Some(shutdown_tx),
            task: Some(task),
        })
    }

    /// Address the socket is bound to
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Latest smoothed snapshot
    pub fn latest(&self) -> Arc<SignalSnapshot> {
        self.reader.latest()
    }

    /// Reader handle that outlives borrows of the receiver
    pub fn reader(&self) -> SnapshotReader {
        self.reader.clone()
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats.lock().clone()
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Signal the loop, wait for it to exit and release the socket
    ///
    /// Once this returns no further snapshot is published.
    pub async fn stop(&mut self) -> PuppetResult<()> {
        let task = self.task.take().ok_or(PuppetError::ReceiverStopped)?;
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }

        task.await
            .map_err(|e| PuppetError::TransportError(format!("receive loop failed: {}", e)))?;

        tracing::info!(local_addr = %self.local_addr, "capture receiver stopped");
        Ok(())
    }
}

impl Drop for CaptureReceiver {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(true);
        }
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

async fn receive_loop(
    socket: UdpSocket,
    config: ReceiverConfig,
    reader: SnapshotReader,
    stats: Arc<Mutex<ReceiverStats>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut buf = vec![0u8; config.max_datagram];
    let mut smoother = SignalSmoother::new(config.history_len);
    let mut limiter = RateLimiter::new(config.log_interval);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.changed() => break,

            received = tokio::time::timeout(config.poll_interval, socket.recv_from(&mut buf)) => {
                match received {
                    // Poll interval elapsed with nothing to read
                    Err(_) => continue,
                    Ok(Ok((len, _src))) => {
                        let report = parse_packet(&buf[..len]);
                        {
                            let mut s = stats.lock();
                            s.packets += 1;
                            s.samples += report.samples.len() as u64;
                            s.skipped_segments += report.skipped as u64;
                        }
                        if !report.is_empty() {
                            smoother.apply(&report.samples);
                            reader.publish(smoother.snapshot());
                        }
                    }
                    Ok(Err(e)) => {
                        stats.lock().recv_errors += 1;
                        if limiter.allow() {
                            let suppressed = limiter.take_suppressed();
                            tracing::warn!(error = %e, suppressed, "UDP receive error");
                        }
                    }
                }
            }
        }
    }
}
