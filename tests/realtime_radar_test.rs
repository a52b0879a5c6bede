/// 🎯 实时雷达会话仿真测试
///
/// 模拟三个异步输入源（扫描源、位置源、航向源）通过通道
/// 驱动引擎：观测者沿 L 形路径行走，BLE 发射源静止在局部
/// 坐标 (10, 4) 处。验证完整链路：
/// RSSI 平滑 → 距离模型 → 移动量门控积累 → 多点定位 → 方位投影

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use mobilradar::{
    normalize_angle_delta, GeoPoint, HeadingSmoother, LocalPoint, Medium, RadarEngine,
    METERS_PER_DEG_LAT, METERS_PER_DEG_LON_AT_EQUATOR,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Mutex};
use tokio::time::sleep;

const LAT0: f64 = 59.0;
const LON0: f64 = 10.0;
const EMITTER_ID: &str = "20:A7:16:5E:C5:D6";
/// 发射源真实位置（局部米制坐标）
const EMITTER_LOCAL: (f64, f64) = (10.0, 4.0);
/// 每个停留点发送的信号采样数（让平滑值基本收敛）
const SAMPLES_PER_STEP: usize = 5;

/// 仿真输入：与真实宿主一样，三类更新各自独立到达
#[derive(Clone, Debug)]
enum SimUpdate {
    /// 扫描源：一个原始 RSSI 采样
    Signal { rssi: f64, at: DateTime<Utc> },
    /// 位置源：观测者的新定位
    Fix { lat: f64, lon: f64, at: DateTime<Utc> },
    /// 航向源：原始罗盘读数
    Heading { deg: f64 },
}

fn geo_at(x_m: f64, y_m: f64) -> GeoPoint {
    GeoPoint::new(
        LAT0 + y_m / METERS_PER_DEG_LAT,
        LON0 + x_m / (METERS_PER_DEG_LON_AT_EQUATOR * LAT0.to_radians().cos()),
    )
}

/// 由真实距离反推模拟 RSSI（远场斜率，与距离模型一致）
fn rssi_for_distance(d: f64) -> f64 {
    -59.0 - 35.0 * d.log10()
}

/// 观测者行走路径：先向东再向北（折线避免共线退化）
fn walk_path() -> Vec<(f64, f64)> {
    vec![
        (0.0, 0.0),
        (1.5, 0.0),
        (3.0, 0.0),
        (4.5, 0.0),
        (6.0, 0.0),
        (6.0, 1.5),
        (6.0, 3.0),
        (6.0, 4.5),
    ]
}

/// 仿真源线程：按步发送信号采样与定位更新
async fn simulated_sources(tx: mpsc::Sender<SimUpdate>, t0: DateTime<Utc>) {
    println!("📡 [仿真线程] 开始发送模拟观测序列...");

    for (step, &(x, y)) in walk_path().iter().enumerate() {
        let at = t0 + ChronoDuration::seconds(step as i64);
        let true_distance = LocalPoint::new(x, y)
            .distance_to(&LocalPoint::new(EMITTER_LOCAL.0, EMITTER_LOCAL.1));
        let rssi = rssi_for_distance(true_distance);

        // 航向：行走方向（东段 90°，北段 0°）
        let heading = if y == 0.0 && step > 0 { 90.0 } else { 0.0 };
        let _ = tx.send(SimUpdate::Heading { deg: heading }).await;

        for _ in 0..SAMPLES_PER_STEP {
            let _ = tx.send(SimUpdate::Signal { rssi, at }).await;
            sleep(Duration::from_millis(5)).await;
        }

        let p = geo_at(x, y);
        let _ = tx
            .send(SimUpdate::Fix { lat: p.lat, lon: p.lon, at })
            .await;
    }

    println!("📡 [仿真线程] 观测序列发送完成");
}

/// 消费线程：宿主循环，把各输入源的更新同步送进引擎
async fn host_loop(
    engine: Arc<Mutex<RadarEngine>>,
    heading: Arc<Mutex<HeadingSmoother>>,
    mut rx: mpsc::Receiver<SimUpdate>,
) {
    let mut last_distance: Option<f64> = None;

    while let Some(update) = rx.recv().await {
        match update {
            SimUpdate::Signal { rssi, at } => {
                let mut engine = engine.lock().await;
                last_distance =
                    engine.normalize_and_estimate_distance(EMITTER_ID, rssi, Medium::Ble, None, at);
            }
            SimUpdate::Fix { lat, lon, at } => {
                if let Some(d) = last_distance {
                    let mut engine = engine.lock().await;
                    engine.record_reading(EMITTER_ID, lat, lon, d, at);
                }
            }
            SimUpdate::Heading { deg } => {
                heading.lock().await.update(deg);
            }
        }
    }
}

#[tokio::test]
async fn test_realtime_session_triangulates_emitter() {
    println!("\n========== 实时雷达会话仿真 ==========\n");

    let engine = Arc::new(Mutex::new(RadarEngine::new()));
    let heading = Arc::new(Mutex::new(HeadingSmoother::new(0.8)));
    let t0 = Utc::now();

    let (tx, rx) = mpsc::channel(64);
    let source_task = tokio::spawn(simulated_sources(tx, t0));
    let host_task = tokio::spawn(host_loop(Arc::clone(&engine), Arc::clone(&heading), rx));

    let _ = tokio::join!(source_task, host_task);

    let engine = engine.lock().await;
    let path = walk_path();
    let &(fx, fy) = path.last().unwrap();
    let final_fix = geo_at(fx, fy);
    let now = t0 + ChronoDuration::seconds(path.len() as i64);

    // 历史应当积累了每个停留点各一条观测
    assert_eq!(engine.reading_count(EMITTER_ID), path.len());

    // 位置估计应落在真实位置附近（RSSI 平滑滞后允许偏差）
    let est = engine.estimate_position(EMITTER_ID).unwrap();
    let truth = LocalPoint::new(EMITTER_LOCAL.0, EMITTER_LOCAL.1);
    let err = est.distance_to(&truth);
    println!("📍 位置估计: ({:.2}, {:.2})，真实: ({:.1}, {:.1})，误差 {:.2} 米",
        est.x, est.y, truth.x, truth.y, err);
    assert!(err < 2.5, "估计误差过大: {:.2} m", err);

    // 方位投影：已三角定位、置信度高、方位大致指向发射源
    let smoothed_heading = heading.lock().await.heading().unwrap();
    let bearing = engine
        .project_bearing(EMITTER_ID, final_fix.lat, final_fix.lon, smoothed_heading, now)
        .unwrap();
    println!(
        "🧭 世界方位 {:.1}°，屏幕方位 {:.1}°，距离 {:.2} 米，置信度 {:.2}",
        bearing.world_angle_deg, bearing.screen_angle_deg, bearing.distance_meters,
        bearing.confidence
    );

    assert!(bearing.is_triangulated);
    assert!(bearing.confidence >= 0.9);
    // 真实方位：从 (6, 4.5) 看 (10, 4) ≈ 97°
    assert!(
        normalize_angle_delta(bearing.world_angle_deg - 97.0).abs() < 50.0,
        "world angle {:.1}",
        bearing.world_angle_deg
    );
    assert!(bearing.distance_meters > 1.5 && bearing.distance_meters < 7.0);

    println!("\n========== 仿真完成 ==========\n");
}
