use crate::audio::pcm_codec;
use crate::config::Config;
use crate::protocol::{AudioFrameMessage, ServerMessage};
use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message};
use url::Url;

#[derive(Debug)]
pub enum NetEvent {
    Opened(Option<String>), // 服务端hello应答，携带会话ID
    Message(ServerMessage),
    Closed,
    Failed(String),
}

#[derive(Debug)]
pub enum NetCommand {
    SendAudio(Vec<u8>), // 上行一帧wire格式音频
    SendText(String),
}

// 音频参数结构体
#[derive(Serialize)]
struct AudioParams {
    format: String,
    sample_rate: u32,
    channels: u8,
    frame_duration: u32,
}

// Hello Message，用于初始化连接
#[derive(Serialize)]
struct HelloMessage {
    #[serde(rename = "type")]
    msg_type: String,
    version: u8,
    transport: String,
    audio_params: AudioParams,
}

pub struct NetLink {
    config: Config,
    tx: mpsc::Sender<NetEvent>,
    rx_cmd: mpsc::Receiver<NetCommand>,
}

impl NetLink {
    pub fn new(
        config: Config,
        tx: mpsc::Sender<NetEvent>,
        rx_cmd: mpsc::Receiver<NetCommand>,
    ) -> Self {
        Self { config, tx, rx_cmd }
    }

    // 连接中断或失败不自动重连：会话状态机把 Closed/Error 视为终态，
    // 重试由上层重新构造会话发起
    pub async fn run(mut self) {
        match self.connect_and_loop().await {
            Ok(()) => {
                let _ = self.tx.send(NetEvent::Closed).await;
            }
            Err(e) => {
                eprintln!("Connection error: {}", e);
                let _ = self.tx.send(NetEvent::Failed(e.to_string())).await;
            }
        }
    }

    // 进入连接和主循环，处理WebSocket消息和发送命令
    async fn connect_and_loop(&mut self) -> anyhow::Result<()> {
        // 根据配置构建WebSocket请求
        let url = Url::parse(self.config.ws_url.as_ref())?;
        let host = url.host_str().unwrap_or("agent.cohost.studio");

        let request = tokio_tungstenite::tungstenite::http::Request::builder()
            .method("GET")
            .uri(self.config.ws_url)
            .header("Host", host)
            .header("Connection", "Upgrade")
            .header("Upgrade", "websocket")
            .header("Sec-WebSocket-Version", "13")
            .header(
                "Sec-WebSocket-Key",
                tokio_tungstenite::tungstenite::handshake::client::generate_key(),
            )
            .header("Authorization", format!("Bearer {}", self.config.ws_token))
            .header("Device-Id", &self.config.device_id)
            .header("Client-Id", &self.config.client_id)
            .header("Protocol-Version", "1")
            .body(())?;

        let connect_timeout = std::time::Duration::from_secs(self.config.connect_timeout_secs);

        println!("Connecting to {}...", self.config.ws_url);
        let (ws_stream, _) = tokio::time::timeout(connect_timeout, connect_async(request))
            .await
            .map_err(|_| {
                anyhow::anyhow!(
                    "connection attempt timed out after {}s",
                    self.config.connect_timeout_secs
                )
            })??;
        println!("Connected!");

        let (mut write, mut read) = ws_stream.split();

        // 发送Hello消息进行初始化链接
        let hello_msg = HelloMessage {
            msg_type: "hello".to_string(),
            version: 1,
            transport: "websocket".to_string(),
            audio_params: AudioParams {
                format: self.config.hello_format.to_string(),
                sample_rate: self.config.hello_sample_rate,
                channels: self.config.hello_channels,
                frame_duration: self.config.hello_frame_duration,
            },
        };
        let hello_json = serde_json::to_string(&hello_msg)?;

        println!("Sending Hello: {}", hello_json);
        write.send(Message::Text(hello_json.into())).await?;

        // 服务端的hello应答在限定时间内必须到达，否则视为连接失败，
        // 不让会话永远停在 Connecting
        let mut opened = false;
        let open_deadline = tokio::time::sleep(connect_timeout);
        tokio::pin!(open_deadline);

        // 主循环，处理读取和写入
        loop {
            tokio::select! {
                _ = &mut open_deadline, if !opened => {
                    anyhow::bail!(
                        "server hello not received within {}s",
                        self.config.connect_timeout_secs
                    );
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(msg)) => {
                            match msg {
                                Message::Text(text) => {
                                    match serde_json::from_str::<ServerMessage>(&text) {
                                        Ok(server_msg) => {
                                            if server_msg.msg_type == "hello" {
                                                // 握手完成，上行音频从这一刻起才有意义
                                                opened = true;
                                                self.tx.send(NetEvent::Opened(server_msg.session_id)).await?;
                                            } else {
                                                self.tx.send(NetEvent::Message(server_msg)).await?;
                                            }
                                        }
                                        Err(e) => {
                                            eprintln!("Unparseable server message ({}): {}", e, text);
                                        }
                                    }
                                }
                                Message::Binary(data) => {
                                    // 协议只用文本帧，二进制帧不在约定内
                                    eprintln!("Ignoring unexpected binary frame ({} bytes)", data.len());
                                }
                                Message::Close(frame) => {
                                    println!("Server closed connection: {:?}", frame);
                                    return Ok(());
                                }
                                _ => {}
                            }
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => return Err(anyhow::anyhow!("connection dropped")),
                    }
                }
                cmd = self.rx_cmd.recv() => {
                    match cmd {
                        Some(NetCommand::SendAudio(wire)) => {
                            let envelope = pcm_codec::wrap_chunk(&wire, self.config.hello_sample_rate);
                            let frame_json = serde_json::to_string(&AudioFrameMessage::new(envelope))?;
                            write.send(Message::Text(frame_json.into())).await?;
                        }
                        Some(NetCommand::SendText(text)) => {
                            write.send(Message::Text(text.into())).await?;
                        }
                        // 命令通道被丢弃说明会话已经停止，让连接随之断开
                        None => return Ok(()),
                    }
                }
            }
        }
    }
}
