/// 蓝牙扫描源适配器
///
/// 薄传输层：周期性轮询蓝牙适配器上的外设，将
/// (ID, 名称, RSSI, 时间戳) 通过通道转发给宿主循环。
/// 不含任何估计逻辑，估计链路见 engine 模块。

use btleplug::api::{Central, Manager, Peripheral};
use btleplug::platform::{Adapter, Manager as PlatformManager};
use chrono::{DateTime, Utc};
use regex::Regex;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::sleep;

use crate::algorithms::Medium;

/// 一次扫描得到的原始观测
#[derive(Clone, Debug)]
pub struct ScanUpdate {
    /// 稳定标识（BLE 为设备地址，Wi-Fi 为 BSSID）
    pub id: String,
    pub name: String,
    pub medium: Medium,
    /// 原始信号强度（dBm）
    pub raw_rssi: f64,
    /// 信道频率提示（MHz），BLE 无此信息
    pub frequency_mhz: Option<f64>,
    pub observed_at: DateTime<Utc>,
}

/// BLE 扫描源
///
/// 持续轮询直到接收端关闭通道。
pub struct ScanSource {
    adapter: Adapter,
    name_filter: Option<Regex>,
    poll_interval: Duration,
}

impl ScanSource {
    /// 使用系统第一个蓝牙适配器创建扫描源
    pub async fn new() -> Result<Self, btleplug::Error> {
        let manager = PlatformManager::new().await?;
        let adapters = manager.adapters().await?;
        let adapter = adapters
            .into_iter()
            .next()
            .ok_or(btleplug::Error::DeviceNotFound)?;

        Ok(ScanSource {
            adapter,
            name_filter: None,
            poll_interval: Duration::from_secs(3),
        })
    }

    /// 仅转发名称匹配该正则的设备；未命名设备一律过滤
    pub fn with_name_filter(mut self, pattern: Regex) -> Self {
        self.name_filter = Some(pattern);
        self
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// 扫描循环
    ///
    /// 启动扫描后按 poll_interval 轮询外设列表，逐个转发观测。
    /// 接收端关闭通道时停止扫描并正常返回。
    pub async fn run(self, tx: mpsc::Sender<ScanUpdate>) -> Result<(), btleplug::Error> {
        self.adapter.start_scan(Default::default()).await?;

        loop {
            sleep(self.poll_interval).await;

            let peripherals = self.adapter.peripherals().await?;
            for peripheral in peripherals {
                let props = match peripheral.properties().await {
                    Ok(Some(props)) => props,
                    _ => continue,
                };
                let rssi = match props.rssi {
                    Some(rssi) => rssi,
                    None => continue,
                };

                let name = props.local_name.unwrap_or_default();
                if let Some(filter) = &self.name_filter {
                    if !filter.is_match(&name) {
                        continue;
                    }
                }

                let update = ScanUpdate {
                    id: peripheral.address().to_string(),
                    name,
                    medium: Medium::Ble,
                    raw_rssi: rssi as f64,
                    frequency_mhz: None,
                    observed_at: Utc::now(),
                };

                if tx.send(update).await.is_err() {
                    self.adapter.stop_scan().await?;
                    return Ok(());
                }
            }
        }
    }
}
