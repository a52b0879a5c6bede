/// 估计算法模块
///
/// 该模块提供信号-位置估计链路的各个纯计算组件：
/// - 信号强度平滑与哨兵值剔除
/// - 路径损耗距离模型（BLE 双斜率 / Wi-Fi 分档）
/// - 本地平面投影（经纬度 → 以会话原点为锚的局部米制坐标）
/// - 多点定位（两圆相交 + 残差加权候选融合）
/// - 相对方位投影与航向平滑

pub mod bearing;
pub mod distance;
pub mod geo;
pub mod multilateration;
pub mod signal;

pub use bearing::*;
pub use distance::*;
pub use geo::*;
pub use multilateration::*;
pub use signal::*;
