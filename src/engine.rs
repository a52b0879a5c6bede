/// 信号-位置估计引擎
///
/// 持有全部可变状态：每个发射源的信号平滑状态、按移动量门控的
/// 测距历史，以及会话原点。求解与投影组件只读这些状态，
/// 可在每次呈现刷新时无锁调用。
///
/// 错误分类完全是"数据不足"而非异常：无效采样返回 None，
/// 历史不足返回 None，过期发射源静默排除。

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::algorithms::{
    apply_jump_filter, ble_distance, confidence_for_age, ground_distance_m, lat_lon_to_local,
    multilateration, normalize_angle_deg, pseudo_bearing_deg, wifi_distance, world_bearing,
    BearingResult, GeoPoint, LocalPoint, Medium, RangeCircle, SignalState,
};

/// 引擎可调参数
///
/// 默认值来自实测调校，均可按场景覆盖，不是硬性不变量。
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// 观测者最小移动量（米）：小于该值的新采样不含足够的
    /// 几何信息，不入库；同时作为求解器的最小基线
    pub min_movement_m: f64,
    /// 单个发射源的测距历史上限（FIFO 淘汰）
    pub max_readings: usize,
    /// 跳变滤波倍率
    pub jump_factor: f64,
    /// 5 GHz Wi-Fi 距离修正系数（经验值，未经严格标定）
    pub wifi_5ghz_scale: f64,
    /// 超过该秒数未见的发射源视为过期
    pub stale_after_seconds: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            min_movement_m: 0.3,
            max_readings: 50,
            jump_factor: 3.0,
            wifi_5ghz_scale: 1.3,
            stale_after_seconds: 15.0,
        }
    }
}

/// 一次不可变的测距观测：观测者位置 + 当时的距离估计
#[derive(Clone, Copy, Debug)]
pub struct Reading {
    pub lat: f64,
    pub lon: f64,
    pub distance_m: f64,
    pub timestamp: DateTime<Utc>,
}

/// 面向呈现层的发射源摘要
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmitterSummary {
    pub id: String,
    pub display_name: String,
    pub medium: Medium,
    pub smoothed_strength: Option<f64>,
    pub distance_m: Option<f64>,
    pub reading_count: usize,
    pub confidence: f64,
    pub last_seen: DateTime<Utc>,
}

/// 信号-位置估计引擎
pub struct RadarEngine {
    config: EngineConfig,
    /// 每个发射源的信号平滑状态（仅由扫描更新路径写入）
    signals: HashMap<String, SignalState>,
    /// 每个发射源的测距历史（仅由 record_reading 写入）
    histories: HashMap<String, Vec<Reading>>,
    /// 会话原点：本会话第一条测距观测的观测者位置
    origin: Option<GeoPoint>,
}

impl RadarEngine {
    pub fn new() -> Self {
        Self::with_config(EngineConfig::default())
    }

    pub fn with_config(config: EngineConfig) -> Self {
        RadarEngine {
            config,
            signals: HashMap::new(),
            histories: HashMap::new(),
            origin: None,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// 会话原点（尚无测距观测时为 None）
    pub fn origin(&self) -> Option<GeoPoint> {
        self.origin
    }

    /// 某发射源当前的历史长度
    pub fn reading_count(&self, emitter_id: &str) -> usize {
        self.histories.get(emitter_id).map_or(0, Vec::len)
    }

    /// 登记 / 刷新发射源的显示名称
    pub fn set_display_name(&mut self, emitter_id: &str, display_name: &str) {
        if display_name.is_empty() {
            return;
        }
        if let Some(state) = self.signals.get_mut(emitter_id) {
            state.display_name = display_name.to_string();
        }
    }

    /// 归一化一个原始信号采样并估计距离
    ///
    /// 平滑 → 路径损耗模型 → 跳变滤波。返回 None 表示本 tick
    /// 没有位置信息（哨兵值被拒绝），调用方不得当作零距离处理。
    pub fn normalize_and_estimate_distance(
        &mut self,
        emitter_id: &str,
        raw_strength: f64,
        medium: Medium,
        frequency_mhz: Option<f64>,
        now: DateTime<Utc>,
    ) -> Option<f64> {
        let state = self
            .signals
            .entry(emitter_id.to_string())
            .or_insert_with(|| SignalState::new(medium, emitter_id, now));

        if !state.update(raw_strength, now) {
            return None;
        }
        let smoothed = state.smoothed?;

        let modeled = match state.medium {
            Medium::Ble => ble_distance(smoothed),
            Medium::Wifi => wifi_distance(smoothed, frequency_mhz, self.config.wifi_5ghz_scale),
        }?;

        let stable = apply_jump_filter(state.last_distance, modeled, self.config.jump_factor);
        state.last_distance = Some(stable);
        Some(stable)
    }

    /// 记录一条测距观测
    ///
    /// 仅当历史为空、或观测者距离上一条入库观测 ≥ 最小移动量时入库；
    /// 否则丢弃（新增几何信息不足以支付存储）。超出上限后 FIFO 淘汰。
    /// 会话原点在本会话第一条观测时设定。
    pub fn record_reading(
        &mut self,
        emitter_id: &str,
        observer_lat: f64,
        observer_lon: f64,
        distance_m: f64,
        now: DateTime<Utc>,
    ) {
        if !distance_m.is_finite() || distance_m <= 0.0 {
            return;
        }

        let here = GeoPoint::new(observer_lat, observer_lon);
        if self.origin.is_none() {
            self.origin = Some(here);
        }

        let history = self.histories.entry(emitter_id.to_string()).or_default();
        if let Some(last) = history.last() {
            let moved = ground_distance_m(GeoPoint::new(last.lat, last.lon), here);
            if moved < self.config.min_movement_m {
                return;
            }
        }

        history.push(Reading {
            lat: observer_lat,
            lon: observer_lon,
            distance_m,
            timestamp: now,
        });
        if history.len() > self.config.max_readings {
            history.remove(0);
        }
    }

    /// 从当前测距历史估计发射源在局部坐标系中的位置
    ///
    /// 历史不足或几何病态时返回 None。每次调用完整重算。
    pub fn estimate_position(&self, emitter_id: &str) -> Option<LocalPoint> {
        let origin = self.origin?;
        let history = self.histories.get(emitter_id)?;

        let circles: Vec<RangeCircle> = history
            .iter()
            .map(|r| {
                RangeCircle::new(
                    lat_lon_to_local(GeoPoint::new(r.lat, r.lon), origin),
                    r.distance_m,
                )
            })
            .collect();

        multilateration::solve(&circles, self.config.min_movement_m)
    }

    /// 投影为观测者相对方位
    ///
    /// 有位置估计时给出真实方位与距离；否则回退到由 ID 确定的
    /// 稳定伪方位（距离取上一稳定距离估计）。屏幕方位角按观测者
    /// 航向修正。发射源未知或过期（> stale_after_seconds）时返回 None。
    pub fn project_bearing(
        &self,
        emitter_id: &str,
        observer_lat: f64,
        observer_lon: f64,
        observer_heading_deg: f64,
        now: DateTime<Utc>,
    ) -> Option<BearingResult> {
        let state = self.signals.get(emitter_id)?;
        let confidence =
            confidence_for_age(state.age_seconds(now), self.config.stale_after_seconds)?;

        let estimate = self.origin.and_then(|origin| {
            self.estimate_position(emitter_id)
                .map(|pos| (origin, pos))
        });

        let (world_angle_deg, distance_meters, is_triangulated) = match estimate {
            Some((origin, pos)) => {
                let observer =
                    lat_lon_to_local(GeoPoint::new(observer_lat, observer_lon), origin);
                let (angle, dist) = world_bearing(observer, pos);
                (angle, dist, true)
            }
            None => (
                pseudo_bearing_deg(emitter_id),
                state.last_distance.unwrap_or(0.0),
                false,
            ),
        };

        Some(BearingResult {
            world_angle_deg,
            screen_angle_deg: normalize_angle_deg(world_angle_deg - observer_heading_deg),
            distance_meters,
            is_triangulated,
            confidence,
        })
    }

    /// 重置扫描会话
    ///
    /// 清空会话原点与全部测距历史。信号平滑状态保留：
    /// 发射源本身还在空中，只有几何参考系失效了。
    pub fn reset_session(&mut self) {
        self.histories.clear();
        self.origin = None;
    }

    /// 淘汰过期发射源（信号状态与历史一并移除）
    pub fn evict_stale(&mut self, now: DateTime<Utc>) {
        let stale_after = self.config.stale_after_seconds;
        self.signals
            .retain(|_, state| state.age_seconds(now) <= stale_after);
        let signals = &self.signals;
        self.histories.retain(|id, _| signals.contains_key(id));
    }

    /// 非过期发射源的摘要列表（近者在前），供呈现层消费
    pub fn emitter_summaries(&self, now: DateTime<Utc>) -> Vec<EmitterSummary> {
        let mut summaries: Vec<EmitterSummary> = self
            .signals
            .iter()
            .filter_map(|(id, state)| {
                let confidence =
                    confidence_for_age(state.age_seconds(now), self.config.stale_after_seconds)?;
                Some(EmitterSummary {
                    id: id.clone(),
                    display_name: state.display_name.clone(),
                    medium: state.medium,
                    smoothed_strength: state.smoothed,
                    distance_m: state.last_distance,
                    reading_count: self.reading_count(id),
                    confidence,
                    last_seen: state.last_seen,
                })
            })
            .collect();

        summaries.sort_by(|a, b| {
            let da = a.distance_m.unwrap_or(f64::MAX);
            let db = b.distance_m.unwrap_or(f64::MAX);
            da.partial_cmp(&db).unwrap_or(std::cmp::Ordering::Equal)
        });
        summaries
    }
}

impl Default for RadarEngine {
    fn default() -> Self {
        Self::new()
    }
}
