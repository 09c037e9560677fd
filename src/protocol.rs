use serde::{Deserialize, Serialize};

use crate::audio::pcm_codec::AudioEnvelope;

// 服务器下发的消息统一结构体
#[derive(Deserialize, Debug, Clone)]
pub struct ServerMessage {
    #[serde(rename = "type")]
    pub msg_type: String,
    pub data: Option<String>, // base64音频数据
    pub mime: Option<String>, // 音频MIME类型，带采样率标签
    pub text: Option<String>, // 转写文本
    pub reason: Option<String>, // 错误原因
    pub session_id: Option<String>, // 会话ID
}

// 上行音频消息，把编码后的一帧包进base64信封
#[derive(Serialize, Debug)]
pub struct AudioFrameMessage {
    #[serde(rename = "type")]
    msg_type: String,
    data: String,
    mime: String,
}

impl AudioFrameMessage {
    pub fn new(envelope: AudioEnvelope) -> Self {
        Self {
            msg_type: "audio".to_string(),
            data: envelope.data,
            mime: envelope.mime,
        }
    }
}
