/// 信号强度平滑
///
/// 每个发射源维护一个指数平滑后的强度值，剔除哨兵值（0 / NaN），
/// 并记录最后一次有效观测的时间戳。每个发射源只保留一个活跃的
/// 平滑状态，新采样覆盖旧采样。

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 发射源介质类型
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Medium {
    Ble,
    Wifi,
}

impl Medium {
    /// 平滑系数 α：输出 = prev×α + raw×(1−α)
    ///
    /// Wi-Fi 上报频率更低，容忍的滞后更小，因此系数取得更激进。
    pub fn smoothing_alpha(self) -> f64 {
        match self {
            Medium::Ble => 0.8,
            Medium::Wifi => 0.6,
        }
    }
}

/// 单个发射源的信号状态
#[derive(Clone, Debug)]
pub struct SignalState {
    /// 介质类型，首次观测时确定
    pub medium: Medium,
    /// 显示名称
    pub display_name: String,
    /// 平滑后的强度（dBm），无历史时为 None
    pub smoothed: Option<f64>,
    /// 最后一次有效观测时间
    pub last_seen: DateTime<Utc>,
    /// 跳变滤波用的上一稳定距离（米）
    pub last_distance: Option<f64>,
}

impl SignalState {
    pub fn new(medium: Medium, display_name: impl Into<String>, now: DateTime<Utc>) -> Self {
        SignalState {
            medium,
            display_name: display_name.into(),
            smoothed: None,
            last_seen: now,
            last_distance: None,
        }
    }

    /// 送入一个原始采样
    ///
    /// 哨兵值（恰好为 0 或 NaN）被拒绝：保留之前的平滑值，
    /// last_seen 也不刷新，返回 false。
    pub fn update(&mut self, raw: f64, now: DateTime<Utc>) -> bool {
        if raw == 0.0 || raw.is_nan() {
            return false;
        }

        let alpha = self.medium.smoothing_alpha();
        self.smoothed = Some(match self.smoothed {
            Some(prev) => prev * alpha + raw * (1.0 - alpha),
            None => raw,
        });
        self.last_seen = now;
        true
    }

    /// 距最后一次有效观测的秒数
    pub fn age_seconds(&self, now: DateTime<Utc>) -> f64 {
        (now - self.last_seen).num_milliseconds() as f64 / 1000.0
    }
}
