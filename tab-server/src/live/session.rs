//! Per-connection WebSocket loop
//!
//! Server → client: [`LiveEvent`] text frames.
//! Client → server: [`ClientCommand`] (`join` / `leave` a tab room).
//!
//! The token the socket was opened with is re-checked on every ping tick and
//! before each room join, and the socket is closed when the token's `exp`
//! passes. A deactivated or deleted user loses the feed at the next check.

use super::LiveHub;
use crate::auth::{CurrentUser, JwtService, session};
use crate::security_log;
use axum::extract::ws::{CloseFrame, Message, WebSocket, close_code};
use futures::{Sink, SinkExt, Stream, StreamExt};
use shared::error::AppResult;
use shared::live::{ClientCommand, LiveEvent};
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

/// Keep-alive ping period, also the credential re-check period
const PING_INTERVAL: Duration = Duration::from_secs(30);

/// Credential a socket was opened with
#[derive(Clone)]
pub struct LiveCredential {
    pool: SqlitePool,
    jwt_service: Arc<JwtService>,
    token: String,
    /// Token `exp`, epoch seconds
    expires_at: i64,
}

impl LiveCredential {
    /// Validate `token` and resolve its user, as for any protected request
    pub async fn authenticate(
        pool: SqlitePool,
        jwt_service: Arc<JwtService>,
        token: String,
    ) -> AppResult<(Self, CurrentUser)> {
        let (user, claims) = session::authenticate_claims(&pool, &jwt_service, &token).await?;
        Ok((
            Self {
                pool,
                jwt_service,
                token,
                expires_at: claims.exp,
            },
            user,
        ))
    }

    async fn recheck(&self) -> AppResult<CurrentUser> {
        session::authenticate(&self.pool, &self.jwt_service, &self.token).await
    }

    fn time_left(&self) -> Duration {
        let left = self.expires_at - chrono::Utc::now().timestamp();
        Duration::from_secs(left.max(0) as u64)
    }
}

pub async fn run_session(
    socket: WebSocket,
    hub: LiveHub,
    credential: LiveCredential,
    user: CurrentUser,
    shutdown: CancellationToken,
) {
    let (sink, stream) = socket.split();
    drive(sink, stream, hub, credential, user, shutdown, PING_INTERVAL).await;
}

async fn drive<Tx, Rx, E>(
    mut sink: Tx,
    mut stream: Rx,
    hub: LiveHub,
    credential: LiveCredential,
    user: CurrentUser,
    shutdown: CancellationToken,
    ping_every: Duration,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
{
    let mut sub = hub.subscribe();

    tracing::info!(user_id = user.id, email = %user.email, "Live socket connected");

    let mut ping = tokio::time::interval(ping_every);
    ping.tick().await; // first tick fires immediately

    let expiry = tokio::time::sleep(credential.time_left());
    tokio::pin!(expiry);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => {
                let _ = sink.send(Message::Close(None)).await;
                break;
            }

            _ = &mut expiry => {
                security_log!("INFO", "live_token_expired", user_id = user.id);
                close_revoked(&mut sink, "token expired").await;
                break;
            }

            _ = ping.tick() => {
                if let Err(e) = credential.recheck().await {
                    security_log!("WARN", "live_credential_revoked", user_id = user.id, error = format!("{e}"));
                    close_revoked(&mut sink, "credential revoked").await;
                    break;
                }
                if sink.send(Message::Ping(Vec::new().into())).await.is_err() {
                    break;
                }
            }

            event = sub.recv() => {
                match event {
                    Ok(event) => {
                        if send_event(&mut sink, &event).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(missed)) => {
                        tracing::warn!(user_id = user.id, missed, "Live subscriber lagged, asking for resync");
                        if send_event(&mut sink, &LiveEvent::Resync { missed }).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }

            msg = stream.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        let reply = match serde_json::from_str::<ClientCommand>(&text) {
                            Ok(ClientCommand::Join { tab_id }) => {
                                if let Err(e) = credential.recheck().await {
                                    security_log!("WARN", "live_credential_revoked", user_id = user.id, error = format!("{e}"));
                                    close_revoked(&mut sink, "credential revoked").await;
                                    break;
                                }
                                sub.join(tab_id);
                                tracing::debug!(user_id = user.id, tab_id, "Joined tab room");
                                LiveEvent::RoomJoined { tab_id }
                            }
                            Ok(ClientCommand::Leave { tab_id }) => {
                                sub.leave(tab_id);
                                tracing::debug!(user_id = user.id, tab_id, "Left tab room");
                                LiveEvent::RoomLeft { tab_id }
                            }
                            Err(e) => {
                                tracing::debug!(user_id = user.id, error = %e, "Ignoring malformed live command");
                                continue;
                            }
                        };
                        if send_event(&mut sink, &reply).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    _ => {}
                }
            }
        }
    }

    tracing::info!(user_id = user.id, "Live socket disconnected");
}

async fn close_revoked<S>(sink: &mut S, reason: &'static str)
where
    S: Sink<Message> + Unpin,
{
    let frame = CloseFrame {
        code: close_code::POLICY,
        reason: reason.into(),
    };
    let _ = sink.send(Message::Close(Some(frame))).await;
}

async fn send_event<S>(sink: &mut S, event: &LiveEvent) -> Result<(), ()>
where
    S: Sink<Message> + Unpin,
{
    let json = serde_json::to_string(event).map_err(|_| ())?;
    sink.send(Message::Text(json.into())).await.map_err(|_| ())
}
