//! 会话状态机：一次对话连接的生命周期
//! Idle -> Connecting -> Open -> Closed，Connecting/Open 可进入 Error。
//! Closed 和 Error 是终态，重试由上层重新构造会话。
//!
//! 所有迁移都由纯函数 [`dispatch`] 计算（状态 + 事件 -> 新状态 + 效果），
//! [`SessionController`] 负责执行效果，迁移本身可以在无设备无网络的环境下单测。

use std::collections::VecDeque;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use crate::audio::pcm_codec::{self, DecodedChunk};
use crate::audio::{AudioConfig, AudioError, AudioSystem};
use crate::config::Config;
use crate::net_link::{NetCommand, NetEvent, NetLink};
use crate::protocol::ServerMessage;
use crate::session_log::SessionLog;
use crate::ui_bridge::UiBridge;

// 会话状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Connecting,
    Open,
    Closed,
    Error,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Closed | SessionState::Error)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SessionState::Idle => "idle",
            SessionState::Connecting => "connecting",
            SessionState::Open => "open",
            SessionState::Closed => "closed",
            SessionState::Error => "error",
        }
    }
}

/// 会话级致命错误
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Microphone permission denied: {0}")]
    Permission(String),

    #[error("Audio device failure: {0}")]
    Device(String),

    #[error("Transport failure: {0}")]
    Transport(String),
}

// 输入事件：设备回调、网络回调、用户操作统一走这里
#[derive(Debug)]
pub enum SessionEvent {
    StartRequested,
    StartFailed(SessionError),
    TransportOpened { session_id: Option<String> },
    InboundAudio { data: String, mime: String },
    TurnComplete,
    Transcript(String),
    CaptureFrame(Vec<u8>),
    CaptureEnded,
    TransportClosed,
    TransportFailed(String),
    StopRequested,
}

// dispatch 产出的效果，由控制器执行
#[derive(Debug)]
pub enum Action {
    StartSession,            // 打开音频设备并连接服务器
    SendAudio(Vec<u8>),      // 上行一帧wire音频
    PlayAudio(DecodedChunk), // 解码成功的下行音频交给播放调度
    Teardown,                // 释放音频设备、断开传输
    Log(String),             // 追加会话日志
}

/// 纯状态迁移函数
pub fn dispatch(state: SessionState, event: SessionEvent) -> (SessionState, Vec<Action>) {
    use SessionEvent::*;
    use SessionState::*;

    match (state, event) {
        (Idle, StartRequested) => (
            Connecting,
            vec![
                Action::Log("session starting".to_string()),
                Action::StartSession,
            ],
        ),

        (Connecting, StartFailed(e)) => (
            Error,
            vec![
                Action::Log(format!("session start failed: {}", e)),
                Action::Teardown,
            ],
        ),

        (Connecting, TransportOpened { session_id }) => {
            let line = match session_id {
                Some(id) => format!("transport open, session {}", id),
                None => "transport open".to_string(),
            };
            (Open, vec![Action::Log(line)])
        }

        // 上行音频只在 Open 状态发送；握手完成前采到的帧直接丢弃，不缓存
        (Open, CaptureFrame(frame)) => (Open, vec![Action::SendAudio(frame)]),
        (Connecting, CaptureFrame(_)) => (Connecting, vec![]),

        // 解码失败只丢弃这一块并记录，会话继续
        (Open, InboundAudio { data, mime }) => match pcm_codec::unwrap_chunk(&data, &mime) {
            Ok(chunk) => (Open, vec![Action::PlayAudio(chunk)]),
            Err(e) => (
                Open,
                vec![Action::Log(format!("dropping malformed audio chunk: {}", e))],
            ),
        },

        // turn 是对话层概念，只记录，不影响播放调度
        (Open, TurnComplete) => (Open, vec![Action::Log("turn complete".to_string())]),

        (Open, Transcript(text)) => (Open, vec![Action::Log(format!("transcript: {}", text))]),

        (Idle | Connecting | Open, StopRequested) => (
            Closed,
            vec![Action::Log("session stopped".to_string()), Action::Teardown],
        ),

        (Connecting | Open, TransportClosed) => (
            Closed,
            vec![
                Action::Log("transport closed".to_string()),
                Action::Teardown,
            ],
        ),

        (Connecting | Open, TransportFailed(reason)) => (
            Error,
            vec![
                Action::Log(format!("transport error: {}", reason)),
                Action::Teardown,
            ],
        ),

        (Connecting | Open, CaptureEnded) => (
            Closed,
            vec![Action::Log("capture ended".to_string()), Action::Teardown],
        ),

        (_, StartRequested) => (
            state,
            vec![Action::Log(format!(
                "start ignored in state {:?}",
                state
            ))],
        ),

        // 终态上的 stop 不再有资源可释放；出错后显式停止归于 Closed
        (Closed | Error, StopRequested) => (Closed, vec![]),

        // 终态吞掉一切后续事件
        (Closed | Error, _) => (state, vec![]),

        // 其余组合与当前状态无关，忽略
        (_, _) => (state, vec![]),
    }
}

/// 把服务端消息归类成会话事件
pub fn classify_server_message(msg: ServerMessage) -> Option<SessionEvent> {
    match msg.msg_type.as_str() {
        "audio" => match (msg.data, msg.mime) {
            (Some(data), Some(mime)) => Some(SessionEvent::InboundAudio { data, mime }),
            _ => {
                log::warn!("Audio message missing data or mime tag, dropping");
                None
            }
        },
        "turn_complete" => Some(SessionEvent::TurnComplete),
        "stt" => msg.text.map(SessionEvent::Transcript),
        "error" => Some(SessionEvent::TransportFailed(
            msg.reason
                .unwrap_or_else(|| "unspecified server error".to_string()),
        )),
        other => {
            log::debug!("Unhandled message type: {}", other);
            None
        }
    }
}

// 播放通道深度：256块24kHz音频，足够吸收远端的突发
const PLAYBACK_CHANNEL_DEPTH: usize = 256;
const NET_CMD_CHANNEL_DEPTH: usize = 100;

/// 会话控制器：持有资源，执行 dispatch 产出的效果
pub struct SessionController {
    config: Config,
    state: SessionState,
    current_session_id: Option<String>,
    log: SessionLog,
    ui_bridge: Arc<UiBridge>,

    // start 时交给 NetLink / AudioSystem 的发送端
    tx_net_event: mpsc::Sender<NetEvent>,
    frame_tx: mpsc::Sender<Vec<u8>>,
    meter_tx: mpsc::Sender<f32>,

    // 会话存续期间持有的资源
    tx_net_cmd: Option<mpsc::Sender<NetCommand>>,
    chunk_tx: Option<mpsc::Sender<DecodedChunk>>,
    audio_system: Option<AudioSystem>,
}

impl SessionController {
    pub fn new(
        config: Config,
        ui_bridge: Arc<UiBridge>,
        tx_net_event: mpsc::Sender<NetEvent>,
        frame_tx: mpsc::Sender<Vec<u8>>,
        meter_tx: mpsc::Sender<f32>,
    ) -> Self {
        let log_capacity = config.session_log_capacity;
        Self {
            config,
            state: SessionState::Idle,
            current_session_id: None,
            log: SessionLog::new(log_capacity),
            ui_bridge,
            tx_net_event,
            frame_tx,
            meter_tx,
            tx_net_cmd: None,
            chunk_tx: None,
            audio_system: None,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn session_log(&self) -> &SessionLog {
        &self.log
    }

    pub fn session_id(&self) -> Option<&str> {
        self.current_session_id.as_deref()
    }

    pub async fn start(&mut self) {
        self.handle_event(SessionEvent::StartRequested).await;
    }

    pub async fn stop(&mut self) {
        self.handle_event(SessionEvent::StopRequested).await;
    }

    // 网络事件到会话事件的翻译
    pub async fn handle_net_event(&mut self, event: NetEvent) {
        match event {
            NetEvent::Opened(session_id) => {
                self.handle_event(SessionEvent::TransportOpened { session_id })
                    .await;
            }
            NetEvent::Message(msg) => {
                // 转写文本顺带推给UI
                if msg.msg_type == "stt" {
                    if let Some(text) = &msg.text {
                        self.push_ui(&format!(
                            r#"{{"type":"transcript","text":{}}}"#,
                            serde_json::to_string(text).unwrap_or_default()
                        ))
                        .await;
                    }
                }
                if let Some(event) = classify_server_message(msg) {
                    self.handle_event(event).await;
                }
            }
            NetEvent::Closed => self.handle_event(SessionEvent::TransportClosed).await,
            NetEvent::Failed(reason) => {
                self.handle_event(SessionEvent::TransportFailed(reason)).await
            }
        }
    }

    // 音量是尽力而为的UI反馈，会话结束后停止推送
    pub async fn handle_meter(&mut self, level: f32) {
        if self.state.is_terminal() {
            return;
        }
        self.push_ui(&format!(r#"{{"type":"volume","level":{:.1}}}"#, level))
            .await;
    }

    /// 跑一次 dispatch 并执行效果；效果可能追加新事件（比如启动失败）
    pub async fn handle_event(&mut self, event: SessionEvent) {
        let mut queue = VecDeque::new();
        queue.push_back(event);

        while let Some(event) = queue.pop_front() {
            if let SessionEvent::TransportOpened {
                session_id: Some(id),
            } = &event
            {
                self.current_session_id = Some(id.clone());
            }

            let (next, actions) = dispatch(self.state, event);
            if next != self.state {
                self.log
                    .record(format!("state {} -> {}", self.state.as_str(), next.as_str()));
                self.state = next;
                let state_json = format!(r#"{{"type":"state","state":"{}"}}"#, next.as_str());
                self.push_ui(&state_json).await;
            }

            for action in actions {
                match action {
                    Action::StartSession => {
                        if let Err(e) = self.start_session() {
                            queue.push_back(SessionEvent::StartFailed(e));
                        }
                    }
                    Action::SendAudio(frame) => self.send_audio(frame),
                    Action::PlayAudio(chunk) => self.play_audio(chunk),
                    Action::Teardown => self.teardown(),
                    Action::Log(line) => self.log.record(line),
                }
            }
        }
    }

    // 打开采集/播放设备（两个独立的固定采样率上下文）并拉起网络链接
    fn start_session(&mut self) -> Result<(), SessionError> {
        let audio_config = AudioConfig {
            capture_device: self.config.capture_device.to_string(),
            playback_device: self.config.playback_device.to_string(),
            capture_sample_rate: self.config.capture_sample_rate,
            playback_sample_rate: self.config.playback_sample_rate,
            frame_size: self.config.frame_size,
        };

        let (chunk_tx, chunk_rx) = mpsc::channel(PLAYBACK_CHANNEL_DEPTH);
        let audio_system = AudioSystem::start(
            audio_config,
            self.frame_tx.clone(),
            self.meter_tx.clone(),
            chunk_rx,
        )
        .map_err(|e| match e {
            AudioError::PermissionDenied(inner) => SessionError::Permission(inner.to_string()),
            other => SessionError::Device(other.to_string()),
        })?;
        self.audio_system = Some(audio_system);
        self.chunk_tx = Some(chunk_tx);

        let (tx_net_cmd, rx_net_cmd) = mpsc::channel(NET_CMD_CHANNEL_DEPTH);
        let net_link = NetLink::new(self.config.clone(), self.tx_net_event.clone(), rx_net_cmd);
        tokio::spawn(async move {
            net_link.run().await;
        });
        self.tx_net_cmd = Some(tx_net_cmd);

        Ok(())
    }

    // 上行发送是 fire-and-forget：通道满了宁可丢帧也不能卡住事件循环
    fn send_audio(&mut self, frame: Vec<u8>) {
        let Some(tx) = &self.tx_net_cmd else {
            return;
        };
        match tx.try_send(NetCommand::SendAudio(frame)) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                log::warn!("Net command channel full, dropping outbound frame");
            }
            Err(TrySendError::Closed(_)) => {
                log::warn!("Net command channel closed, dropping outbound frame");
            }
        }
    }

    // 下行播放同理：慢速播放不能反压到网络读取
    fn play_audio(&mut self, chunk: DecodedChunk) {
        let Some(tx) = &self.chunk_tx else {
            return;
        };
        if tx.try_send(chunk).is_err() {
            log::warn!("Playback channel full or closed, dropping inbound chunk");
        }
    }

    // 释放音频设备并丢弃通往网络任务的命令通道，连接随之断开
    fn teardown(&mut self) {
        if let Some(mut audio_system) = self.audio_system.take() {
            audio_system.stop();
        }
        self.chunk_tx.take();
        self.tx_net_cmd.take();
        self.current_session_id = None;
    }

    async fn push_ui(&self, msg: &str) {
        if let Err(e) = self.ui_bridge.send_message(msg).await {
            log::warn!("Failed to push to UI: {}", e);
        }
    }
}
