/// 路径损耗距离模型
///
/// 将平滑后的信号强度转换为距离估计（米）。两种介质各自一套策略：
/// - BLE：双斜率对数距离模型。单一指数会低估近场、高估远场，
///   按强度阈值切换指数是常见的经验修正。
/// - Wi-Fi：粗粒度分档模型，5 GHz 信道按系数放大。
///
/// 另提供跳变滤波：单采样的大幅突变按噪声处理，保留上一稳定距离。

/// BLE 在 1 米处的参考强度（dBm），固定标定常数
pub const BLE_REFERENCE_DBM: f64 = -59.0;
/// 近场 / 远场切换阈值（dBm）
pub const BLE_NEAR_FIELD_DBM: f64 = -70.0;
/// BLE 距离输出下限（米）
pub const BLE_MIN_DISTANCE_M: f64 = 0.1;
/// BLE 距离输出上限（米）
pub const BLE_MAX_DISTANCE_M: f64 = 50.0;

/// BLE 强度 → 距离
///
/// 强度先钳制到 [-100, -40]，按双斜率对数距离律反解：
/// d = 10^((ref − s) / (10n))，n = 2.0（近场）/ 3.5（远场），
/// 结果钳制到 [0.1, 50] 米。无效输入（NaN / 0）返回 None。
pub fn ble_distance(smoothed: f64) -> Option<f64> {
    if smoothed.is_nan() || smoothed == 0.0 {
        return None;
    }

    let s = smoothed.clamp(-100.0, -40.0);
    let n = if s > BLE_NEAR_FIELD_DBM { 2.0 } else { 3.5 };
    let d = 10_f64.powf((BLE_REFERENCE_DBM - s) / (10.0 * n));
    Some(d.clamp(BLE_MIN_DISTANCE_M, BLE_MAX_DISTANCE_M))
}

/// Wi-Fi 强度 → 距离
///
/// 强度钳制到 [-100, -35]，按四档映射到基础距离 {1, 3, 8, 15} 米。
/// 信道频率 ≥ 5000 MHz 时乘以 band_scale_5ghz（5 GHz 同等标称功率下
/// 衰减更快，上报强度偏低，放大作补偿）。
pub fn wifi_distance(smoothed: f64, frequency_mhz: Option<f64>, band_scale_5ghz: f64) -> Option<f64> {
    if smoothed.is_nan() || smoothed == 0.0 {
        return None;
    }

    let s = smoothed.clamp(-100.0, -35.0);
    let base = if s > -50.0 {
        1.0
    } else if s > -60.0 {
        3.0
    } else if s > -70.0 {
        8.0
    } else {
        15.0
    };

    let scale = match frequency_mhz {
        Some(f) if f >= 5000.0 => band_scale_5ghz,
        _ => 1.0,
    };

    Some(base * scale)
}

/// 跳变滤波
///
/// 新距离超过上一稳定距离的 jump_factor 倍（或低于其倒数）时，
/// 认为是单采样尖峰而非真实移动，保留上一稳定距离。
pub fn apply_jump_filter(previous: Option<f64>, candidate: f64, jump_factor: f64) -> f64 {
    match previous {
        Some(prev)
            if prev > 0.0
                && (candidate > prev * jump_factor || candidate < prev / jump_factor) =>
        {
            prev
        }
        _ => candidate,
    }
}
