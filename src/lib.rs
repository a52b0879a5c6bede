/// 信号-位置估计引擎
///
/// 将附近无线发射源（BLE 外设、Wi-Fi 热点）的原始信号强度
/// 转换为相对方位和距离，并利用观测者自身的移动不断修正估计。
///
/// 处理链路：
/// - RSSI 平滑与异常值剔除
/// - 路径损耗模型：信号强度 → 距离
/// - 按移动量门控的 (观测位置, 距离) 历史积累
/// - 多点定位（两圆相交 + 加权候选融合）
/// - 相对方位投影（含置信度时间衰减与伪方位回退）
pub mod algorithms;
pub mod engine;
pub mod scan;

pub use algorithms::*;
pub use engine::{EmitterSummary, EngineConfig, RadarEngine};
pub use scan::{ScanSource, ScanUpdate};
