use crate::domain::catalog::BRAIN_TYPES;
use crate::domain::ports::StoreError;
use crate::domain::{JoinError, PlayerId, PlayerInput};
use crate::interface_adapters::protocol::{
    ArenaDto, BrainTypeDto, ClientMessage, InitDto, PlayerInputDto, ServerMessage,
    WorldUpdateDto,
};
use crate::interface_adapters::state::AppState;
use crate::interface_adapters::utils::ids;
use crate::use_cases::profile::{LoadProfileUseCase, SaveProfileUseCase};
use crate::use_cases::{GameEvent, PlayerSeed, WorldHandle, WorldUpdate};

use axum::{
    Error,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    response::IntoResponse,
};
use futures::SinkExt;
use std::{
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::time::timeout;
use tracing::{Instrument, Span, debug, error, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    #[allow(dead_code)]
    Ws(axum::Error),
    #[allow(dead_code)]
    Serialization(serde_json::Error),
    InputClosed,
    WorldUpdatesClosed,
    JoinRequired,
    JoinTimeout,
    #[allow(dead_code)]
    Auth(StoreError),
    #[allow(dead_code)]
    JoinRejected(JoinError),
    ClosedBeforeJoin,
}

pub async fn world_update_serializer(
    mut world_rx: broadcast::Receiver<WorldUpdate>,
    world_bytes_tx: broadcast::Sender<Utf8Bytes>,
    world_latest_tx: watch::Sender<Utf8Bytes>,
) {
    // Serialize each world update once and broadcast the shared bytes.
    loop {
        match world_rx.recv().await {
            Ok(update) => {
                let msg = ServerMessage::State(WorldUpdateDto::from(update));
                let txt = match serde_json::to_string(&msg) {
                    Ok(txt) => txt,
                    Err(e) => {
                        error!(error = ?e, "failed to serialize world update");
                        continue;
                    }
                };

                let bytes = Utf8Bytes::from(txt);
                // Store the latest bytes for lag recovery and `GET /state`, even with no
                // subscribers.
                world_latest_tx.send_replace(bytes.clone());
                let _ = world_bytes_tx.send(bytes);
            }
            Err(broadcast::error::RecvError::Lagged(n)) => {
                warn!(
                    missed = n,
                    "world serializer lagged; skipping to latest update"
                );
            }
            Err(broadcast::error::RecvError::Closed) => {
                warn!("world updates channel closed; serializer exiting");
                break;
            }
        }
    }
}

pub fn spawn_world_serializer(world: &WorldHandle) {
    tokio::spawn(world_update_serializer(
        world.world_tx.subscribe(),
        world.world_bytes_tx.clone(),
        world.world_latest_tx.clone(),
    ));
}

impl From<axum::Error> for NetError {
    fn from(e: axum::Error) -> Self {
        NetError::Ws(e)
    }
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    // Separate connection id for correlating logs before/after a player_id exists.
    let conn_id = ids::connection_id();
    let span = info_span!("conn", conn_id, player_id = tracing::field::Empty);
    serve_connection(socket, state).instrument(span).await;
}

async fn serve_connection(mut socket: WebSocket, state: Arc<AppState>) {
    let mut ctx = match bootstrap_connection(&mut socket, &state).await {
        Ok(ctx) => ctx,
        Err(NetError::ClosedBeforeJoin) => {
            info!("client disconnected before join handshake");
            return;
        }
        Err(e) => {
            // Handshake failures already sent their own close frame.
            warn!(error = ?e, "join handshake failed");
            let _ = socket.close().await;
            return;
        }
    };

    info!(
        player_id = ctx.player_id,
        name = %ctx.name,
        authenticated = ctx.account.is_some(),
        "client connected"
    );

    if let Err(e) = run_client_loop(&mut socket, &mut ctx, &state).await {
        warn!(error = ?e, "client loop exited with error");
    }
}

async fn send_message(socket: &mut WebSocket, msg: &ServerMessage) -> Result<usize, NetError> {
    let txt = serde_json::to_string(msg).map_err(NetError::Serialization)?;
    let bytes = txt.len();
    socket
        .send(Message::Text(txt.into()))
        .await
        .map_err(NetError::Ws)?;
    Ok(bytes)
}

struct ConnCtx {
    pub player_id: PlayerId,
    pub name: String,
    pub account: Option<String>,
    pub input_tx: mpsc::Sender<GameEvent>,
    pub world_bytes_rx: broadcast::Receiver<Utf8Bytes>,
    pub world_latest_rx: watch::Receiver<Utf8Bytes>,
    pub max_name_len: usize,
    // Count lag recovery snapshots sent to this client.
    pub lag_recovery_count: u64,

    pub msgs_in: u64,
    pub msgs_out: u64,
    pub bytes_in: u64,
    pub bytes_out: u64,

    pub invalid_json: u32,

    pub last_input_full_log: Instant,
    pub last_world_lag_log: Instant,
    pub last_invalid_input_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

#[derive(Debug)]
struct JoinHandshake {
    name: String,
    account: Option<String>,
    seed: Option<PlayerSeed>,
    bytes_in: u64,
    msgs_in: u64,
}

async fn bootstrap_connection(
    socket: &mut WebSocket,
    state: &AppState,
) -> Result<ConnCtx, NetError> {
    // Subscribe to updates *before* doing anything else (awaits) to not miss packets.
    let world_bytes_rx = state.world.world_bytes_tx.subscribe();
    let world_latest_rx = state.world.world_latest_tx.subscribe();
    let max_name_len = state.tuning.player.max_name_len;

    let join = match timeout(
        JOIN_HANDSHAKE_TIMEOUT,
        read_join_handshake(socket, state, max_name_len),
    )
    .await
    {
        Ok(result) => result?,
        Err(_) => {
            let _ = send_close_with_reason(socket, close_code::POLICY, "join timeout").await;
            return Err(NetError::JoinTimeout);
        }
    };

    let player_id = ids::player_id();
    Span::current().record("player_id", player_id);

    // The world task answers with the assigned base or a rejection.
    let (reply_tx, reply_rx) = oneshot::channel();
    state
        .world
        .input_tx
        .send(GameEvent::Join {
            player_id,
            name: join.name.clone(),
            account: join.account.clone(),
            seed: join.seed,
            reply: reply_tx,
        })
        .await
        .map_err(|_| NetError::InputClosed)?;

    let accepted = match reply_rx.await {
        Ok(Ok(accepted)) => accepted,
        Ok(Err(e)) => {
            let reason = match e {
                JoinError::NoBaseAvailable => "no base available",
                JoinError::AlreadyJoined => "already joined",
            };
            let _ = send_close_with_reason(socket, close_code::POLICY, reason).await;
            return Err(NetError::JoinRejected(e));
        }
        Err(_) => return Err(NetError::InputClosed),
    };

    // Tell the client "this is who you are" before any state arrives.
    let init = ServerMessage::Init(InitDto {
        player_id: accepted.player_id.to_string(),
        base_id: accepted.base_id.to_string(),
        arena: ArenaDto::from(&state.tuning.arena),
        brain_types: BRAIN_TYPES.iter().map(BrainTypeDto::from).collect(),
    });
    let init_bytes = match send_message(socket, &init).await {
        Ok(bytes) => bytes,
        Err(e) => {
            // Compensate so a spawned player never outlives a failed handshake.
            leave_and_save(state, player_id).await?;
            return Err(e);
        }
    };

    let now = Instant::now() - LOG_THROTTLE;
    Ok(ConnCtx {
        player_id,
        name: join.name,
        account: join.account,
        input_tx: state.world.input_tx.clone(),
        world_bytes_rx,
        world_latest_rx,
        max_name_len,
        lag_recovery_count: 0,

        msgs_in: join.msgs_in,
        msgs_out: 1,
        bytes_in: join.bytes_in,
        bytes_out: init_bytes as u64,

        invalid_json: 0,

        last_input_full_log: now,
        last_world_lag_log: now,
        last_invalid_input_log: now,

        close_frame: None,
    })
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
const JOIN_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);
const DEFAULT_PLAYER_NAME: &str = "Player";

async fn send_close_with_reason(
    socket: &mut WebSocket,
    code: u16,
    reason: &'static str,
) -> Result<(), NetError> {
    socket
        .send(Message::Close(Some(CloseFrame {
            code,
            reason: reason.into(),
        })))
        .await
        .map_err(NetError::Ws)?;
    socket.close().await.map_err(NetError::Ws)
}

async fn read_join_handshake(
    socket: &mut WebSocket,
    state: &AppState,
    max_name_len: usize,
) -> Result<JoinHandshake, NetError> {
    let mut msgs_in = 0;
    loop {
        let Some(incoming) = socket.recv().await else {
            return Err(NetError::ClosedBeforeJoin);
        };

        let message = incoming.map_err(NetError::Ws)?;
        match message {
            Message::Text(text) => {
                msgs_in += 1;
                let bytes_in = text.len() as u64;
                let payload = match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(payload)) => payload,
                    Ok(ClientMessage::Input(_) | ClientMessage::SetName(_)) => {
                        let _ = send_close_with_reason(socket, close_code::POLICY, "join required")
                            .await;
                        return Err(NetError::JoinRequired);
                    }
                    Err(_) => {
                        let _ = send_close_with_reason(
                            socket,
                            close_code::POLICY,
                            "invalid join payload",
                        )
                        .await;
                        return Err(NetError::JoinRequired);
                    }
                };

                // Credentials are all-or-nothing; a lone username plays as a guest.
                let credentials = match (payload.username.as_deref(), payload.password.as_deref())
                {
                    (Some(username), Some(password)) if !username.trim().is_empty() => {
                        Some((username.trim().to_string(), password.to_string()))
                    }
                    _ => None,
                };

                let (account, seed) = match credentials {
                    Some((username, password)) => {
                        let load = LoadProfileUseCase {
                            store: state.player_store.as_ref(),
                        };
                        match load.execute(&username, &password).await {
                            Ok(seed) => (Some(username), Some(seed)),
                            Err(StoreError::InvalidCredentials) => {
                                let _ = send_close_with_reason(
                                    socket,
                                    close_code::POLICY,
                                    "authentication failed",
                                )
                                .await;
                                return Err(NetError::Auth(StoreError::InvalidCredentials));
                            }
                            Err(StoreError::Unavailable) => {
                                let _ = send_close_with_reason(
                                    socket,
                                    close_code::ERROR,
                                    "persistence unavailable",
                                )
                                .await;
                                return Err(NetError::Auth(StoreError::Unavailable));
                            }
                        }
                    }
                    None => (None, None),
                };

                let name = payload
                    .name
                    .as_deref()
                    .and_then(|raw| sanitize_name(raw, max_name_len))
                    .or_else(|| {
                        account
                            .as_deref()
                            .and_then(|raw| sanitize_name(raw, max_name_len))
                    })
                    .unwrap_or_else(|| DEFAULT_PLAYER_NAME.to_string());

                return Ok(JoinHandshake {
                    name,
                    account,
                    seed,
                    bytes_in,
                    msgs_in,
                });
            }
            Message::Binary(_) => {
                let _ = send_close_with_reason(
                    socket,
                    close_code::UNSUPPORTED,
                    "binary messages not supported",
                )
                .await;
                return Err(NetError::JoinRequired);
            }
            Message::Ping(_) | Message::Pong(_) => {}
            Message::Close(_) => return Err(NetError::ClosedBeforeJoin),
        }
    }
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

/// Strips control characters, trims, and caps the length. Empty results are rejected.
fn sanitize_name(raw: &str, max_len: usize) -> Option<String> {
    let visible: String = raw.chars().filter(|c| !c.is_control()).collect();
    let capped: String = visible.trim().chars().take(max_len).collect();
    let name = capped.trim_end();
    if name.is_empty() {
        None
    } else {
        Some(name.to_string())
    }
}

fn enqueue_event(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    event: GameEvent,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    match input_tx.try_send(event) {
        Ok(()) => Ok(LoopControl::Continue),
        Err(mpsc::error::TrySendError::Full(_evt)) => {
            if should_log(last_input_full_log) {
                warn!(player_id, "input channel full; dropping input");
            }
            Ok(LoopControl::Continue)
        }
        Err(mpsc::error::TrySendError::Closed(_evt)) => Err(NetError::InputClosed),
    }
}

// Shared input handling for both legacy and structured messages.
fn process_input_message(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    dto: &PlayerInputDto,
    max_name_len: usize,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    let input = PlayerInput::from(dto);
    enqueue_event(
        player_id,
        input_tx,
        GameEvent::Input { player_id, input },
        last_input_full_log,
    )?;

    if let Some(raw) = dto.name.as_deref() {
        return process_name_change(player_id, input_tx, raw, max_name_len, last_input_full_log);
    }
    Ok(LoopControl::Continue)
}

fn process_name_change(
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    raw: &str,
    max_name_len: usize,
    last_input_full_log: &mut Instant,
) -> Result<LoopControl, NetError> {
    let Some(name) = sanitize_name(raw, max_name_len) else {
        debug!(player_id, "empty name ignored");
        return Ok(LoopControl::Continue);
    };
    enqueue_event(
        player_id,
        input_tx,
        GameEvent::SetName { player_id, name },
        last_input_full_log,
    )
}

async fn run_client_loop(
    socket: &mut WebSocket,
    ctx: &mut ConnCtx,
    state: &AppState,
) -> Result<(), NetError> {
    let player_id = ctx.player_id;

    // Split borrows so `tokio::select!` can hold them concurrently.
    let ConnCtx {
        input_tx,
        world_bytes_rx,
        world_latest_rx,
        max_name_len,
        lag_recovery_count,
        msgs_in,
        msgs_out,
        bytes_in,
        bytes_out,
        invalid_json,
        last_input_full_log,
        last_world_lag_log,
        last_invalid_input_log,
        close_frame,
        ..
    } = ctx;

    let mut fatal: Option<NetError> = None;

    loop {
        // disconnect becomes true on error
        let disconnect: bool = tokio::select! {
            incoming = socket.recv() => {
                match handle_incoming_ws(
                    incoming,
                    player_id,
                    input_tx,
                    *max_name_len,
                    msgs_in,
                    bytes_in,
                    invalid_json,
                    last_input_full_log,
                    last_invalid_input_log,
                    close_frame,
                ) {
                    Ok(LoopControl::Continue) => false,
                    Ok(LoopControl::Disconnect) => true,
                    Err(e) => {
                        fatal = Some(e);
                        true
                    }
                }
            }

            world_msg = world_bytes_rx.recv() => {
                match world_msg {
                    Ok(bytes) => match forward_world_bytes(bytes, socket, msgs_out, bytes_out).await {
                        LoopControl::Continue => false,
                        LoopControl::Disconnect => true,
                    },
                    Err(broadcast::error::RecvError::Lagged(n)) => {
                        if should_log(last_world_lag_log) {
                            warn!(missed = n, "world updates lagged; sending snapshot");
                        }

                        // Resync strategy: send the latest world snapshot.
                        let latest = world_latest_rx.borrow().clone();
                        if latest.is_empty() {
                            false
                        } else {
                            *lag_recovery_count += 1;
                            match forward_world_bytes(latest, socket, msgs_out, bytes_out).await {
                                LoopControl::Continue => false,
                                LoopControl::Disconnect => true,
                            }
                        }
                    }
                    Err(broadcast::error::RecvError::Closed) => {
                        fatal = Some(NetError::WorldUpdatesClosed);
                        true
                    }
                }
            }
        };

        if disconnect {
            if let Some(frame) = close_frame.take() {
                let _ = socket.send(Message::Close(Some(frame))).await;
            }
            if let Err(err) = socket.close().await.map_err(NetError::Ws) {
                debug!(error = ?err, "socket close error");
            }
            break;
        }
    }

    debug!(
        player_id,
        msgs_in = *msgs_in,
        msgs_out = *msgs_out,
        bytes_in = *bytes_in,
        bytes_out = *bytes_out,
        invalid_json = *invalid_json,
        lag_recovery_count = *lag_recovery_count,
        "connection stats"
    );

    if let Err(e) = leave_and_save(state, player_id).await {
        warn!(error = ?e, "error during disconnect cleanup");
        if fatal.is_none() {
            fatal = Some(e);
        }
    }
    info!(player_id, "client disconnected");

    match fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

#[allow(clippy::too_many_arguments)]
fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    player_id: PlayerId,
    input_tx: &mpsc::Sender<GameEvent>,
    max_name_len: usize,
    msgs_in: &mut u64,
    bytes_in: &mut u64,
    invalid_json: &mut u32,
    last_input_full_log: &mut Instant,
    last_invalid_input_log: &mut Instant,
    close_frame: &mut Option<CloseFrame>,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                *msgs_in += 1;
                *bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::Join(_)) => {
                        // Ignore repeated Join packets after bootstrap to keep the session stable.
                        if should_log(last_invalid_input_log) {
                            warn!(player_id, "duplicate join ignored");
                        }
                        Ok(LoopControl::Continue)
                    }
                    Ok(ClientMessage::Input(dto)) => process_input_message(
                        player_id,
                        input_tx,
                        &dto,
                        max_name_len,
                        last_input_full_log,
                    ),
                    Ok(ClientMessage::SetName(payload)) => process_name_change(
                        player_id,
                        input_tx,
                        &payload.name,
                        max_name_len,
                        last_input_full_log,
                    ),
                    Err(parse_err) => {
                        // Older clients emit bare input records without the envelope.
                        match serde_json::from_str::<PlayerInputDto>(&text) {
                            Ok(dto) => process_input_message(
                                player_id,
                                input_tx,
                                &dto,
                                max_name_len,
                                last_input_full_log,
                            ),
                            Err(_) => {
                                *invalid_json += 1;
                                if should_log(last_invalid_input_log) {
                                    warn!(
                                        player_id,
                                        bytes = text.len(),
                                        error = %parse_err,
                                        "failed to parse client message"
                                    );
                                }

                                if *invalid_json > MAX_INVALID_JSON {
                                    *close_frame = Some(CloseFrame {
                                        code: close_code::POLICY,
                                        reason: "too many invalid messages".into(),
                                    });
                                    return Ok(LoopControl::Disconnect);
                                }

                                Ok(LoopControl::Continue)
                            }
                        }
                    }
                }
            }
            Message::Binary(_) => {
                *close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(player_id, error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!(player_id, "websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn forward_world_bytes(
    world_msg: Utf8Bytes,
    socket: &mut WebSocket,
    msgs_out: &mut u64,
    bytes_out: &mut u64,
) -> LoopControl {
    let bytes_len = world_msg.len();
    match socket
        .send(Message::Text(world_msg))
        .await
        .map_err(NetError::Ws)
    {
        Ok(()) => {
            *msgs_out += 1;
            *bytes_out += bytes_len as u64;
            LoopControl::Continue
        }
        Err(err) => {
            // Log unexpected send failures; disconnect will follow immediately.
            warn!(error = ?err, "failed to send world update");
            LoopControl::Disconnect
        }
    }
}

// Removes the player from the world and persists what it owned.
async fn leave_and_save(state: &AppState, player_id: PlayerId) -> Result<(), NetError> {
    let (reply_tx, reply_rx) = oneshot::channel();
    state
        .world
        .input_tx
        .send(GameEvent::Leave {
            player_id,
            reply: Some(reply_tx),
        })
        .await
        .map_err(|_| NetError::InputClosed)?;

    let Ok(removed) = reply_rx.await else {
        debug!(player_id, "player already gone; nothing to save");
        return Ok(());
    };

    let save = SaveProfileUseCase {
        store: state.player_store.as_ref(),
    };
    match save.execute(&removed).await {
        Ok(true) => info!(
            player_id,
            money = removed.money.floor(),
            brains = removed.stored_kinds.len(),
            "progress saved"
        ),
        Ok(false) => {}
        Err(e) => warn!(player_id, error = %e, "failed to save progress"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_name_strips_control_and_caps_length() {
        assert_eq!(
            sanitize_name("  Ada\u{7}\nLove  ", 20).as_deref(),
            Some("AdaLove")
        );
        assert_eq!(
            sanitize_name("abcdefghijklmnopqrstuvwxyz", 20).as_deref(),
            Some("abcdefghijklmnopqrst")
        );
        assert_eq!(sanitize_name("abc  def", 4).as_deref(), Some("abc"));
    }

    #[test]
    fn blank_names_are_rejected() {
        assert!(sanitize_name("", 20).is_none());
        assert!(sanitize_name(" \t\r\n ", 20).is_none());
    }

    #[test]
    fn input_with_name_enqueues_rename() {
        let (tx, mut rx) = mpsc::channel(4);
        let mut last = Instant::now();
        let dto = PlayerInputDto {
            right: true,
            name: Some(" Neo ".into()),
            ..PlayerInputDto::default()
        };

        let control = process_input_message(7, &tx, &dto, 20, &mut last).unwrap();
        assert!(matches!(control, LoopControl::Continue));

        match rx.try_recv().unwrap() {
            GameEvent::Input { player_id, input } => {
                assert_eq!(player_id, 7);
                assert!(input.right && !input.left);
            }
            other => panic!("unexpected event {other:?}"),
        }
        match rx.try_recv().unwrap() {
            GameEvent::SetName { name, .. } => assert_eq!(name, "Neo"),
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn full_channel_drops_without_disconnecting() {
        let (tx, _rx) = mpsc::channel(1);
        let mut last = Instant::now();
        let dto = PlayerInputDto::default();

        process_input_message(1, &tx, &dto, 20, &mut last).unwrap();
        let control = process_input_message(1, &tx, &dto, 20, &mut last).unwrap();
        assert!(matches!(control, LoopControl::Continue));
    }

    #[test]
    fn closed_channel_is_fatal() {
        let (tx, rx) = mpsc::channel(1);
        drop(rx);
        let mut last = Instant::now();
        let result = process_input_message(1, &tx, &PlayerInputDto::default(), 20, &mut last);
        assert!(matches!(result, Err(NetError::InputClosed)));
    }

    #[test]
    fn bare_input_record_is_accepted_and_garbage_keeps_prior_input() {
        let (tx, mut rx) = mpsc::channel(4);
        let (mut msgs_in, mut bytes_in, mut invalid) = (0, 0, 0);
        let mut last_full = Instant::now();
        let mut last_invalid = Instant::now();
        let mut close_frame = None;

        for text in [r#"{"right":true}"#, r#"{"type":"input","data":{"right":"yes"}}"#] {
            let control = handle_incoming_ws(
                Some(Ok(Message::Text(text.into()))),
                3,
                &tx,
                20,
                &mut msgs_in,
                &mut bytes_in,
                &mut invalid,
                &mut last_full,
                &mut last_invalid,
                &mut close_frame,
            )
            .unwrap();
            assert!(matches!(control, LoopControl::Continue));
        }

        match rx.try_recv().unwrap() {
            GameEvent::Input { player_id, input } => {
                assert_eq!(player_id, 3);
                assert!(input.right);
            }
            other => panic!("unexpected event {other:?}"),
        }
        // The malformed record never reaches the world, so the cached input stands.
        assert!(rx.try_recv().is_err());
        assert_eq!(invalid, 1);
        assert!(close_frame.is_none());
    }

    #[test]
    fn invalid_messages_close_after_limit() {
        let (tx, _rx) = mpsc::channel(4);
        let (mut msgs_in, mut bytes_in, mut invalid) = (0, 0, 0);
        let mut last_full = Instant::now();
        let mut last_invalid = Instant::now();
        let mut close_frame = None;

        for i in 0..=MAX_INVALID_JSON {
            let control = handle_incoming_ws(
                Some(Ok(Message::Text("not json".into()))),
                1,
                &tx,
                20,
                &mut msgs_in,
                &mut bytes_in,
                &mut invalid,
                &mut last_full,
                &mut last_invalid,
                &mut close_frame,
            )
            .unwrap();
            let last = i == MAX_INVALID_JSON;
            assert_eq!(matches!(control, LoopControl::Disconnect), last);
        }
        let frame = close_frame.expect("close frame set");
        assert_eq!(frame.code, close_code::POLICY);
        assert_eq!(frame.reason.as_str(), "too many invalid messages");
    }
}
