//! Frame counters and the optional HTTP endpoint that serves them.
//!
//! The endpoint runs on its own thread with a single-threaded tokio runtime
//! and only ever reads the atomics; it never touches world state.

use std::fmt;
use std::net::{SocketAddr, TcpListener as StdListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

use anyhow::{Context, Result};
use game_core::UpdateReport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Counters written by the frame loop.
#[derive(Debug, Default)]
pub struct FrameCounters {
    frames: AtomicU64,
    ticks: AtomicU64,
    activities_advanced: AtomicU64,
    triggers_fired: AtomicU64,
    vision_updates: AtomicU64,
    deaths: AtomicU64,
    last_frame_micros: AtomicU64,
}

impl FrameCounters {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_frame(&self, report: &UpdateReport, vision_updated: bool, elapsed: Duration) {
        self.frames.fetch_add(1, Ordering::Relaxed);
        self.ticks.store(report.tick.tick.0, Ordering::Relaxed);
        self.activities_advanced
            .fetch_add(report.tick.advanced.len() as u64, Ordering::Relaxed);
        self.triggers_fired.fetch_add(report.fired.len() as u64, Ordering::Relaxed);
        self.deaths
            .fetch_add(report.deaths.removed.len() as u64, Ordering::Relaxed);
        if vision_updated {
            self.vision_updates.fetch_add(1, Ordering::Relaxed);
        }
        let micros = u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX);
        self.last_frame_micros.store(micros, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            frames: self.frames.load(Ordering::Relaxed),
            ticks: self.ticks.load(Ordering::Relaxed),
            activities_advanced: self.activities_advanced.load(Ordering::Relaxed),
            triggers_fired: self.triggers_fired.load(Ordering::Relaxed),
            vision_updates: self.vision_updates.load(Ordering::Relaxed),
            deaths: self.deaths.load(Ordering::Relaxed),
            last_frame_micros: self.last_frame_micros.load(Ordering::Relaxed),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub frames: u64,
    pub ticks: u64,
    pub activities_advanced: u64,
    pub triggers_fired: u64,
    pub vision_updates: u64,
    pub deaths: u64,
    pub last_frame_micros: u64,
}

impl fmt::Display for CounterSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "frames {}", self.frames)?;
        writeln!(f, "ticks {}", self.ticks)?;
        writeln!(f, "activities_advanced {}", self.activities_advanced)?;
        writeln!(f, "triggers_fired {}", self.triggers_fired)?;
        writeln!(f, "vision_updates {}", self.vision_updates)?;
        writeln!(f, "deaths {}", self.deaths)?;
        writeln!(f, "last_frame_micros {}", self.last_frame_micros)
    }
}

/// Binds `127.0.0.1:port` and serves counters from a background thread.
///
/// Binding happens on the caller's thread so a taken port fails here.
pub fn spawn(port: u16, counters: Arc<FrameCounters>) -> Result<(SocketAddr, JoinHandle<()>)> {
    let listener = StdListener::bind(("127.0.0.1", port))
        .with_context(|| format!("failed to bind profiling port {port}"))?;
    listener.set_nonblocking(true)?;
    let addr = listener.local_addr()?;

    let handle = std::thread::Builder::new()
        .name("ruins-pprof".into())
        .spawn(move || {
            let runtime = match tokio::runtime::Builder::new_current_thread().enable_all().build() {
                Ok(runtime) => runtime,
                Err(err) => {
                    tracing::error!(%err, "failed to start profiling runtime");
                    return;
                }
            };
            let result = runtime.block_on(async move {
                let listener = TcpListener::from_std(listener)?;
                serve(listener, counters).await
            });
            if let Err(err) = result {
                tracing::warn!(%err, "profiling endpoint stopped");
            }
        })
        .context("failed to spawn profiling thread")?;

    tracing::info!(%addr, "profiling endpoint listening");
    Ok((addr, handle))
}

/// Answers every connection with a plain-text counter snapshot.
pub async fn serve(listener: TcpListener, counters: Arc<FrameCounters>) -> std::io::Result<()> {
    loop {
        let (mut stream, peer) = listener.accept().await?;
        let counters = counters.clone();
        tokio::spawn(async move {
            // The request line is irrelevant; every path serves the snapshot.
            let mut request = [0u8; 1024];
            let _ = stream.read(&mut request).await;
            let body = counters.snapshot().to_string();
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            if let Err(err) = stream.write_all(response.as_bytes()).await {
                tracing::debug!(%peer, %err, "profiling client went away");
            }
            let _ = stream.shutdown().await;
        });
    }
}

#[cfg(test)]
mod tests {
    use game_core::turns::{Tick, TickReport};
    use game_core::systems::DeathReport;

    use super::*;

    fn report(tick: u64) -> UpdateReport {
        UpdateReport {
            tick: TickReport {
                tick: Tick(tick),
                advanced: Vec::new(),
            },
            fired: Vec::new(),
            decided: Vec::new(),
            deaths: DeathReport::default(),
            descended_to: None,
        }
    }

    #[test]
    fn counters_accumulate() {
        let counters = FrameCounters::new();
        counters.record_frame(&report(1), true, Duration::from_micros(250));
        counters.record_frame(&report(2), false, Duration::from_micros(100));
        let snapshot = counters.snapshot();
        assert_eq!(snapshot.frames, 2);
        assert_eq!(snapshot.ticks, 2);
        assert_eq!(snapshot.vision_updates, 1);
        assert_eq!(snapshot.last_frame_micros, 100);
        assert!(snapshot.to_string().contains("frames 2\n"));
    }

    #[tokio::test]
    async fn endpoint_serves_snapshot() {
        let counters = FrameCounters::new();
        counters.record_frame(&report(7), true, Duration::from_millis(1));

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(serve(listener, counters));

        let mut stream = tokio::net::TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET / HTTP/1.1\r\n\r\n").await.unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).await.unwrap();
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        assert!(response.contains("ticks 7"));
    }

    #[test]
    fn spawned_endpoint_reports_bound_address() {
        let (addr, _handle) = spawn(0, FrameCounters::new()).unwrap();
        assert_ne!(addr.port(), 0);
        let mut stream = std::net::TcpStream::connect(addr).unwrap();
        std::io::Write::write_all(&mut stream, b"GET / HTTP/1.1\r\n\r\n").unwrap();
        let mut response = String::new();
        std::io::Read::read_to_string(&mut stream, &mut response).unwrap();
        assert!(response.contains("frames 0"));
    }
}
