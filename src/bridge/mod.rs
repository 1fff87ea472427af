//! Optional best-effort bridge to an external pressure device, speaking
//! line-delimited JSON over TCP. Absence of the device degrades silently;
//! the manual pump remains the only input source.

use log::{info, warn};
use serde::{Deserialize, Serialize};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::TcpStream,
    sync::mpsc,
};

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum OutboundEvent {
    #[serde(rename_all = "camelCase")]
    BpUpdate { pressure: i32, over_max: bool },
    BpEnd,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum InboundEvent {
    ButtonPressed,
}

/// Sender half of a connected bridge. Sends never block and never fail the
/// caller; a dead socket just drops the messages.
#[derive(Clone)]
pub struct BridgeHandle {
    tx: mpsc::UnboundedSender<OutboundEvent>,
}

impl BridgeHandle {
    pub fn send_update(&self, pressure: i32, over_max: bool) {
        let _ = self.tx.send(OutboundEvent::BpUpdate { pressure, over_max });
    }

    pub fn send_end(&self) {
        let _ = self.tx.send(OutboundEvent::BpEnd);
    }
}

/// Connects to the device and spawns the reader/writer tasks. Device button
/// presses are forwarded to `pump_tx`, one unit per press. Returns None when
/// the device is unreachable.
pub async fn connect(address: &str, pump_tx: mpsc::Sender<()>) -> Option<BridgeHandle> {
    let stream = match TcpStream::connect(address).await {
        Ok(stream) => stream,
        Err(err) => {
            info!("device bridge unavailable at {address}: {err}");
            return None;
        }
    };
    info!("device bridge connected at {address}");

    let (read_half, mut write_half) = stream.into_split();
    let (tx, mut rx) = mpsc::unbounded_channel::<OutboundEvent>();

    tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let mut line = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!("failed to encode bridge event: {err}");
                    continue;
                }
            };
            line.push('\n');
            if let Err(err) = write_half.write_all(line.as_bytes()).await {
                warn!("device bridge write failed: {err}");
                break;
            }
        }
    });

    tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    // Unknown or malformed messages are ignored.
                    if let Ok(InboundEvent::ButtonPressed) = serde_json::from_str(&line) {
                        if pump_tx.send(()).await.is_err() {
                            break;
                        }
                    }
                }
                Ok(None) => {
                    info!("device bridge closed the connection");
                    break;
                }
                Err(err) => {
                    warn!("device bridge read failed: {err}");
                    break;
                }
            }
        }
    });

    Some(BridgeHandle { tx })
}
