use cohost_linux_rs::config::Config;
use cohost_linux_rs::session::{SessionController, SessionEvent};
use cohost_linux_rs::ui_bridge::{UiBridge, UiEvent};

use mac_address::get_mac_address;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::mpsc;
use uuid::Uuid;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 初始化日志
    env_logger::init();

    // 加载配置
    let mut config = Config::new().unwrap_or_default();

    // 设备id和客户端id的处理
    if config.device_id == "unknown-device" {
        config.device_id = match get_mac_address() {
            Ok(Some(mac)) => mac.to_string().to_lowercase(),
            _ => Uuid::new_v4().to_string(),
        };
    }

    // 设备端UUID，先从本地文件读取以保持重启间身份一致，如果不存在则生成新的并保存
    let uuid_file_path = "cohost_uuid.txt";
    if config.client_id == "unknown-client" {
        if let Ok(content) = std::fs::read_to_string(uuid_file_path) {
            let trimmed = content.trim();
            if !trimmed.is_empty() {
                config.client_id = trimmed.to_string();
                println!("Loaded Client ID from file: {}", config.client_id);
            }
        }
    }

    // 生成新的UUID并保存
    if config.client_id == "unknown-client" {
        config.client_id = Uuid::new_v4().to_string();
        println!("Generated new Client ID: {}", config.client_id);
        if let Err(e) = std::fs::write(uuid_file_path, &config.client_id) {
            eprintln!("Failed to save Client ID to file: {}", e);
        } else {
            println!("Saved Client ID to {}", uuid_file_path);
        }
    }

    // 创建通道，用于组件间通信
    // 网络事件通道
    let (tx_net_event, mut rx_net_event) = mpsc::channel(100);

    // 采集帧通道（编码后的wire音频）
    let (frame_tx, mut rx_frame) = mpsc::channel::<Vec<u8>>(100);

    // 音量通道（尽力而为，满了就丢）
    let (meter_tx, mut rx_meter) = mpsc::channel::<f32>(16);

    // UI事件通道
    let (tx_ui_event, mut rx_ui_event) = mpsc::channel::<UiEvent>(100);

    // 启动UI桥，与仪表盘UI进程通信
    let ui_bridge = Arc::new(UiBridge::new(&config, tx_ui_event).await?);
    let ui_bridge_clone = ui_bridge.clone();
    tokio::spawn(async move {
        if let Err(e) = ui_bridge_clone.run().await {
            eprintln!("UiBridge error: {}", e);
        }
    });

    // 会话控制器：同一时间最多一个活动会话
    let mut controller = SessionController::new(
        config.clone(),
        ui_bridge,
        tx_net_event,
        frame_tx,
        meter_tx,
    );
    controller.start().await;

    println!("Cohost Core Started. State: {:?}", controller.state());

    // 主事件循环：采集帧、网络事件、音量、UI指令
    let mut capture_closed = false;
    let mut meter_closed = false;

    loop {
        // 会话进入终态后退出进程，重试由重新启动发起
        if controller.state().is_terminal() {
            println!("Session reached terminal state: {:?}", controller.state());
            break;
        }

        tokio::select! {
            // 监听 Ctrl+C 信号
            _ = signal::ctrl_c() => {
                println!("Received Ctrl+C, shutting down...");
                controller.stop().await;
                break;
            }

            // 监听与服务器的网络事件
            Some(event) = rx_net_event.recv() => {
                controller.handle_net_event(event).await;
            }

            // 监听采集线程编码好的上行帧
            frame = rx_frame.recv(), if !capture_closed => {
                match frame {
                    Some(frame) => controller.handle_event(SessionEvent::CaptureFrame(frame)).await,
                    None => {
                        // 采集线程退出，通道关闭
                        capture_closed = true;
                        controller.handle_event(SessionEvent::CaptureEnded).await;
                    }
                }
            }

            // 监听音量电平，转发给UI
            level = rx_meter.recv(), if !meter_closed => {
                match level {
                    Some(level) => controller.handle_meter(level).await,
                    None => meter_closed = true,
                }
            }

            // 监听来自UI的指令
            Some(event) = rx_ui_event.recv() => {
                match event {
                    UiEvent::Message(msg) => {
                        if msg.trim() == "stop" {
                            println!("Stop requested from UI");
                            controller.stop().await;
                        } else {
                            println!("Unhandled UI message: {}", msg);
                        }
                    }
                }
            }
        }
    }

    Ok(())
}
