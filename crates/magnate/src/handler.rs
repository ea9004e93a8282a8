//! Per-connection handler: decode inbound frames, pump outbound events.
//!
//! Each connection runs two halves. The spawned pump forwards the
//! gateway's event stream into the socket; this task's loop decodes
//! frames into [`ClientEvent`]s and dispatches them. Undecodable frames
//! are stale-UI noise and are dropped with a debug log line, per the
//! error-handling tiers.

use std::sync::Arc;

use magnate_engine::{ClientEvent, ConnId};
use magnate_session::Gateway;
use magnate_transport::WsConnection;

use crate::MagnateError;

pub(crate) async fn handle_connection(
    conn: WsConnection,
    gateway: Arc<Gateway>,
) -> Result<(), MagnateError> {
    let id = ConnId(conn.id().into_inner());
    tracing::debug!(%id, "handling new connection");

    let mut events = gateway.register(id).await;

    // Outbound pump: gateway events → socket, until either side goes away.
    let out_conn = conn.clone();
    let pump = tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            let text = match serde_json::to_string(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::error!(error = %e, "failed to encode server event");
                    continue;
                }
            };
            if out_conn.send(text).await.is_err() {
                break;
            }
        }
    });

    // Inbound loop: socket frames → gateway.
    loop {
        match conn.recv().await {
            Ok(Some(text)) => match serde_json::from_str::<ClientEvent>(&text) {
                Ok(event) => gateway.dispatch(id, event).await,
                Err(e) => {
                    tracing::debug!(%id, error = %e, "ignoring undecodable event");
                }
            },
            Ok(None) => {
                tracing::debug!(%id, "connection closed cleanly");
                break;
            }
            Err(e) => {
                tracing::debug!(%id, error = %e, "recv error");
                break;
            }
        }
    }

    gateway.disconnect(id).await;
    pump.abort();
    let _ = conn.close().await;
    Ok(())
}
