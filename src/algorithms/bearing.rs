/// 相对方位投影
///
/// 将发射源的位置估计（或无估计时的稳定伪方位）转换为：
/// - 世界方位角（0° = 正北，顺时针，罗盘约定）
/// - 屏幕方位角（按观测者航向修正）
/// - 距离与随观测年龄线性衰减的置信度
///
/// 另提供带 0°/360° 环绕处理的罗盘航向平滑器，供航向源消费方使用。

use crate::algorithms::geo::LocalPoint;
use serde::{Deserialize, Serialize};

/// 置信度衰减下限
pub const CONFIDENCE_FLOOR: f64 = 0.2;

/// 面向呈现层的方位结果，即算即用，不做缓存
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BearingResult {
    /// 世界方位角（度，0 = 正北，顺时针）
    pub world_angle_deg: f64,
    /// 屏幕方位角（度，已按观测者航向修正）
    pub screen_angle_deg: f64,
    /// 距离（米）
    pub distance_meters: f64,
    /// true = 来自多点定位；false = 伪方位回退
    pub is_triangulated: bool,
    /// 置信度 [0.2, 1.0]
    pub confidence: f64,
}

/// 归一化角度到 [0, 360)
pub fn normalize_angle_deg(angle: f64) -> f64 {
    let a = angle % 360.0;
    if a < 0.0 { a + 360.0 } else { a }
}

/// 归一化角度差到 (−180, 180]
pub fn normalize_angle_delta(delta: f64) -> f64 {
    let mut d = (delta + 540.0) % 360.0 - 180.0;
    if d <= -180.0 {
        d += 360.0;
    }
    d
}

/// 观测者 → 目标的罗盘方位与距离
///
/// 方位 = atan2(dx, dy)，0° 指向正北（y 轴），顺时针为正。
/// 注意这是罗盘约定，不是数学极角。
pub fn world_bearing(observer: LocalPoint, target: LocalPoint) -> (f64, f64) {
    let dx = target.x - observer.x;
    let dy = target.y - observer.y;
    let angle = dx.atan2(dy).to_degrees();
    (normalize_angle_deg(angle), dx.hypot(dy))
}

/// 稳定字符串散列（与移动端一致的 (h<<5)−h+c 形式，取绝对值）
pub fn hash_str(s: &str) -> u32 {
    let mut h: i32 = 0;
    for b in s.bytes() {
        h = h.wrapping_shl(5).wrapping_sub(h).wrapping_add(b as i32);
    }
    h.unsigned_abs()
}

/// 无几何估计时的伪方位
///
/// 由发射源 ID 确定性导出，保证同一设备在多次渲染之间
/// 显示位置一致（方向本身是任意的）。
pub fn pseudo_bearing_deg(emitter_id: &str) -> f64 {
    (hash_str(emitter_id) % 360) as f64
}

/// 按观测年龄计算置信度
///
/// 年龄 0 秒 → 1.0，线性衰减到 stale_after 秒处的下限 0.2；
/// 超过 stale_after 则视为过期，返回 None（发射源应整体排除）。
pub fn confidence_for_age(age_seconds: f64, stale_after: f64) -> Option<f64> {
    if age_seconds > stale_after {
        return None;
    }
    let t = (age_seconds / stale_after).clamp(0.0, 1.0);
    Some((1.0 - t * (1.0 - CONFIDENCE_FLOOR)).max(CONFIDENCE_FLOOR))
}

/// 罗盘航向平滑器
///
/// 指数平滑，差值先归一化到 (−180, 180] 再混合，
/// 避免 0°/360° 边界处的平滑伪影。
#[derive(Clone, Debug)]
pub struct HeadingSmoother {
    alpha: f64,
    current: Option<f64>,
}

impl HeadingSmoother {
    /// alpha 为旧值权重：输出 = prev×α + raw×(1−α)
    pub fn new(alpha: f64) -> Self {
        HeadingSmoother { alpha, current: None }
    }

    /// 送入一个原始航向读数（度），返回平滑后的航向
    pub fn update(&mut self, raw_deg: f64) -> f64 {
        let next = match self.current {
            None => normalize_angle_deg(raw_deg),
            Some(prev) => {
                let delta = normalize_angle_delta(raw_deg - prev);
                normalize_angle_deg(prev + (1.0 - self.alpha) * delta)
            }
        };
        self.current = Some(next);
        next
    }

    pub fn heading(&self) -> Option<f64> {
        self.current
    }

    pub fn reset(&mut self) {
        self.current = None;
    }
}
