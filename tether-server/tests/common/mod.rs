//! Test utilities for tether-server tests.
//!
//! Provides:
//! - Database settings from `DB_*` for live PostgreSQL tests
//! - A TCP proxy that starts forwarding late, simulating a database that
//!   becomes reachable after the service has started
//! - Helpers for reserving ports and waiting on conditions

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use tether_core::DbSettings;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// Live database settings from `DB_HOST`, `DB_PORT`, ... with defaults.
pub fn live_settings() -> DbSettings {
    DbSettings::from_env_prefixed("DB_").expect("invalid DB_* environment")
}

/// A localhost port nothing is listening on (reserved then released).
pub fn closed_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to reserve port");
    listener.local_addr().expect("no local addr").port()
}

/// Forwarding proxy from `listen` to `target`, started after `delay`.
///
/// Until the delay elapses, connections to `listen` are refused.
pub fn delayed_proxy(listen: SocketAddr, target: SocketAddr, delay: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let listener = TcpListener::bind(listen).await.expect("proxy bind failed");

        loop {
            let Ok((mut inbound, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(async move {
                let Ok(mut outbound) = TcpStream::connect(target).await else {
                    return;
                };
                let _ = tokio::io::copy_bidirectional(&mut inbound, &mut outbound).await;
            });
        }
    })
}

/// Wait for a condition to become true with timeout.
pub async fn wait_for<F>(timeout: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let start = tokio::time::Instant::now();
    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}
