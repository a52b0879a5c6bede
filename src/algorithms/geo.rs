/// 本地平面投影
///
/// 将经纬度转换为以会话原点为锚的局部米制坐标（x = 东，y = 北）。
/// 采用等距圆柱近似，在本系统针对的几十米尺度上误差优于 1%，
/// 无需完整的大地测量计算。

/// 每度纬度对应的米数
pub const METERS_PER_DEG_LAT: f64 = 110540.0;
/// 赤道上每度经度对应的米数
pub const METERS_PER_DEG_LON_AT_EQUATOR: f64 = 111320.0;

/// 大地坐标点（度）
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }
}

/// 局部平面坐标点（米），仅作派生值使用，不做持久存储
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalPoint {
    pub x: f64,
    pub y: f64,
}

impl LocalPoint {
    pub fn new(x: f64, y: f64) -> Self {
        LocalPoint { x, y }
    }

    /// 与另一点的欧几里得距离（米）
    pub fn distance_to(&self, other: &LocalPoint) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

/// 将 (lat, lon) 投影到以 origin 为锚的局部坐标系
///
/// y = (lat − lat₀) × 110540
/// x = (lon − lon₀) × 111320 × cos(lat₀)
pub fn lat_lon_to_local(point: GeoPoint, origin: GeoPoint) -> LocalPoint {
    let y = (point.lat - origin.lat) * METERS_PER_DEG_LAT;
    let x = (point.lon - origin.lon)
        * METERS_PER_DEG_LON_AT_EQUATOR
        * origin.lat.to_radians().cos();
    LocalPoint { x, y }
}

/// 两个大地坐标点之间的地面距离（米），与投影使用同一近似
pub fn ground_distance_m(a: GeoPoint, b: GeoPoint) -> f64 {
    lat_lon_to_local(b, a).distance_to(&LocalPoint::new(0.0, 0.0))
}
