use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct Config {
    // 音频设备配置
    pub capture_device: &'static str,
    pub playback_device: &'static str,
    pub capture_sample_rate: u32,
    pub playback_sample_rate: u32,
    pub frame_size: usize,

    // UI进程配置
    pub ui_local_port: u16,
    pub ui_remote_port: u16,
    pub ui_buffer_size: usize,

    // 网络配置（静态部分）
    pub ws_url: &'static str,
    pub ws_token: &'static str,
    pub connect_timeout_secs: u64,

    // 设备标识（动态部分，可在运行时修改）
    pub device_id: String,
    pub client_id: String,

    // 会话日志容量
    pub session_log_capacity: usize,

    // Hello消息参数
    pub hello_format: &'static str,
    pub hello_sample_rate: u32,
    pub hello_channels: u8,
    pub hello_frame_duration: u32,
}

impl Config {
    /// 从编译时设置的环境变量创建配置
    /// 所有参数都在编译时从 config.toml 中读取
    pub fn new() -> Result<Self, &'static str> {
        Ok(Self {
            // 音频设备配置
            capture_device: env!("CAPTURE_DEVICE"),
            playback_device: env!("PLAYBACK_DEVICE"),
            capture_sample_rate: env!("CAPTURE_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse CAPTURE_SAMPLE_RATE")?,
            playback_sample_rate: env!("PLAYBACK_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse PLAYBACK_SAMPLE_RATE")?,
            frame_size: env!("FRAME_SIZE").parse()
                .map_err(|_| "Failed to parse FRAME_SIZE")?,

            // UI进程配置
            ui_local_port: env!("UI_LOCAL_PORT").parse()
                .map_err(|_| "Failed to parse UI_LOCAL_PORT")?,
            ui_remote_port: env!("UI_REMOTE_PORT").parse()
                .map_err(|_| "Failed to parse UI_REMOTE_PORT")?,
            ui_buffer_size: env!("UI_BUFFER_SIZE").parse()
                .map_err(|_| "Failed to parse UI_BUFFER_SIZE")?,

            // 网络配置
            ws_url: env!("WS_URL"),
            ws_token: env!("WS_TOKEN"),
            connect_timeout_secs: env!("CONNECT_TIMEOUT_SECS").parse()
                .map_err(|_| "Failed to parse CONNECT_TIMEOUT_SECS")?,

            // 设备标识初始化为config.toml中的值
            device_id: env!("DEVICE_ID").to_string(),
            client_id: env!("CLIENT_ID").to_string(),

            // 会话日志容量
            session_log_capacity: env!("SESSION_LOG_CAPACITY").parse()
                .map_err(|_| "Failed to parse SESSION_LOG_CAPACITY")?,

            // Hello消息参数
            hello_format: env!("HELLO_FORMAT"),
            hello_sample_rate: env!("HELLO_SAMPLE_RATE").parse()
                .map_err(|_| "Failed to parse HELLO_SAMPLE_RATE")?,
            hello_channels: env!("HELLO_CHANNELS").parse()
                .map_err(|_| "Failed to parse HELLO_CHANNELS")?,
            hello_frame_duration: env!("HELLO_FRAME_DURATION").parse()
                .map_err(|_| "Failed to parse HELLO_FRAME_DURATION")?,
        })
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new().expect("Failed to create default Config from build-time environment variables")
    }
}
