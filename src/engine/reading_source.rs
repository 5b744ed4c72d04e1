// ==========================================
// 危废桶监控系统 - 读数源
// ==========================================
// 职责: 每个 tick 为容器提供 (重量增量, 温度) 样本
// 真实传感器协议不在本系统范围内; 这里只提供随机模拟实现
// ==========================================

use crate::config::SimulatorSettings;
use crate::domain::container::Container;
use crate::domain::reading::ReadingSample;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

// ==========================================
// Trait: ReadingSource
// ==========================================
pub trait ReadingSource: Send {
    /// 为容器采样一次
    ///
    /// # 返回
    /// - Some(sample): 本 tick 的读数
    /// - None: 本 tick 跳过该容器
    fn sample(&mut self, container: &Container) -> Option<ReadingSample>;
}

// ==========================================
// RandomReadingSource - 随机读数模拟
// ==========================================
// 重量增量 ~ U[min, max], 温度 ~ base ± variation, 均保留两位小数
pub struct RandomReadingSource {
    settings: SimulatorSettings,
    rng: StdRng,
}

impl RandomReadingSource {
    pub fn new(settings: SimulatorSettings) -> Self {
        Self {
            settings: settings.normalized(),
            rng: StdRng::from_entropy(),
        }
    }

    /// 固定种子 (可复现)
    pub fn with_seed(settings: SimulatorSettings, seed: u64) -> Self {
        Self {
            settings: settings.normalized(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn settings(&self) -> &SimulatorSettings {
        &self.settings
    }
}

/// [low, high] 上按 t ∈ [0, 1) 线性取点; 端点再大也不会溢出
fn lerp(low: f64, high: f64, t: f64) -> f64 {
    low * (1.0 - t) + high * t
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

impl ReadingSource for RandomReadingSource {
    fn sample(&mut self, _container: &Container) -> Option<ReadingSample> {
        let s = &self.settings;
        if s.skip_probability > 0.0 && self.rng.gen_bool(s.skip_probability) {
            return None;
        }

        let delta = lerp(
            s.weight_increment_min_kg,
            s.weight_increment_max_kg,
            self.rng.gen::<f64>(),
        );
        let offset = lerp(
            -s.temperature_variation_c,
            s.temperature_variation_c,
            self.rng.gen::<f64>(),
        );

        Some(ReadingSample::new(
            round2(delta),
            round2(s.temperature_base_c + offset),
        ))
    }
}
