/// 多点定位求解器
///
/// 输入某个发射源的全部测距观测（观测位置映射为局部坐标的圆心，
/// 估计距离为半径），通过两两圆相交枚举候选点，按全量残差打分，
/// 对最优若干候选做逆残差加权融合得到位置估计。
///
/// 求解器无状态：每次调用都从当前历史完整重算，因此结果总与最新
/// 采样一致，无需任何失效逻辑。

use crate::algorithms::geo::LocalPoint;
use std::cmp::Ordering;

/// 两圆不相交判定的容差（米）
const INTERSECT_TOLERANCE_M: f64 = 0.01;
/// 逆残差权重的正则项
const RESIDUAL_EPSILON: f64 = 1e-6;
/// 参与融合的最优候选数量上限
const MAX_FUSED_CANDIDATES: usize = 5;
/// 半径下限（米），过小的半径视为不可用测距
const MIN_RADIUS_M: f64 = 0.5;

/// 一次测距观测映射到局部坐标系后的圆
#[derive(Clone, Copy, Debug)]
pub struct RangeCircle {
    /// 圆心 = 当时的观测者位置
    pub center: LocalPoint,
    /// 半径 = 当时的距离估计（米）
    pub radius: f64,
}

impl RangeCircle {
    pub fn new(center: LocalPoint, radius: f64) -> Self {
        RangeCircle { center, radius }
    }
}

/// 两圆相交
///
/// 返回 0、1 或 2 个交点：
/// - 圆心近乎重合且半径近乎相等 → 退化为公共圆心这一个候选
/// - d > r1+r2 或 d < |r1−r2|（超出容差）→ 无交点
/// - 其余情况按弦中点构造：a = (r1²−r2²+d²)/(2d)，h = √(r1²−a²)，
///   沿圆心连线取中点后垂直偏移 ±h
pub fn intersect_two_circles(c1: &RangeCircle, c2: &RangeCircle) -> Vec<LocalPoint> {
    let d = c1.center.distance_to(&c2.center);
    let r1 = c1.radius;
    let r2 = c2.radius;

    if d <= 1e-6 && (r1 - r2).abs() <= 1e-6 {
        return vec![c1.center];
    }
    if d > r1 + r2 + INTERSECT_TOLERANCE_M || d < (r1 - r2).abs() - INTERSECT_TOLERANCE_M {
        return Vec::new();
    }

    let a = (r1 * r1 - r2 * r2 + d * d) / (2.0 * d);
    let h_sq = r1 * r1 - a * a;
    if h_sq < 0.0 {
        return Vec::new();
    }

    let h = h_sq.sqrt();
    let px = c1.center.x + a * (c2.center.x - c1.center.x) / d;
    let py = c1.center.y + a * (c2.center.y - c1.center.y) / d;

    let p1 = LocalPoint::new(
        px + h * (c2.center.y - c1.center.y) / d,
        py - h * (c2.center.x - c1.center.x) / d,
    );
    let p2 = LocalPoint::new(
        px - h * (c2.center.y - c1.center.y) / d,
        py + h * (c2.center.x - c1.center.x) / d,
    );

    // 相切（h ≈ 0）只产生一个交点
    if h_sq <= 1e-10 {
        return vec![p1];
    }
    vec![p1, p2]
}

/// 候选点对全部观测的残差：Σ (|候选 − 圆心| − 半径)²
fn residual_at(point: &LocalPoint, circles: &[RangeCircle]) -> f64 {
    circles
        .iter()
        .map(|c| {
            let diff = point.distance_to(&c.center) - c.radius;
            diff * diff
        })
        .sum()
}

/// 从测距观测集合估计发射源位置
///
/// min_baseline_m：两个观测位置需至少相距多少米才构成有效基线
/// （也用于判定整组观测是否过于聚集）。
///
/// 以下情况返回 None（数据不足，而非异常）：
/// - 观测少于 2 个
/// - 所有观测都聚集在第一个观测的 min_baseline_m 范围内（几何病态）
/// - 没有任何一对圆产生交点
pub fn solve(circles: &[RangeCircle], min_baseline_m: f64) -> Option<LocalPoint> {
    if circles.len() < 2 {
        return None;
    }

    let circles: Vec<RangeCircle> = circles
        .iter()
        .map(|c| RangeCircle::new(c.center, c.radius.max(MIN_RADIUS_M)))
        .collect();

    let first = circles[0].center;
    if circles[1..]
        .iter()
        .all(|c| c.center.distance_to(&first) < min_baseline_m)
    {
        return None;
    }

    let mut candidates: Vec<(LocalPoint, f64)> = Vec::new();
    for i in 0..circles.len() {
        for j in (i + 1)..circles.len() {
            if circles[i].center.distance_to(&circles[j].center) < min_baseline_m {
                continue;
            }
            for p in intersect_two_circles(&circles[i], &circles[j]) {
                let err = residual_at(&p, &circles);
                candidates.push((p, err));
            }
        }
    }

    if candidates.is_empty() {
        return None;
    }

    // 取残差最小的若干候选做逆残差加权融合：
    // 压低噪声对的贡献，又不至于丢掉单一"最优"对之外的信息
    candidates.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal));
    let top = &candidates[..candidates.len().min(MAX_FUSED_CANDIDATES)];

    let mut sum_w = 0.0;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    for (point, err) in top {
        let w = 1.0 / (err + RESIDUAL_EPSILON);
        sum_w += w;
        sum_x += point.x * w;
        sum_y += point.y * w;
    }

    if sum_w == 0.0 {
        return None;
    }
    Some(LocalPoint::new(sum_x / sum_w, sum_y / sum_w))
}
