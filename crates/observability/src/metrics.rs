//! 行分发指标收集模块
//!
//! 通过 `metrics` facade 记录，未安装 recorder 时为 no-op。

use metrics::{counter, gauge, histogram};

/// 记录读入一行
pub fn record_line_read(bytes: usize) {
    counter!("logmux_lines_read_total").increment(1);
    histogram!("logmux_line_bytes").record(bytes as f64);
}

/// 记录一行在某个目标上的分发结果
pub fn record_line_delivered(destination: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "logmux_lines_delivered_total",
        "destination" => destination.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录一次重连尝试
pub fn record_reconnect(destination: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "logmux_reconnects_total",
        "destination" => destination.to_string(),
        "status" => status
    )
    .increment(1);
}

/// 记录一次热加载
pub fn record_reload(success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!("logmux_reloads_total", "status" => status).increment(1);
}

/// 记录当前生效的目标数量
pub fn record_active_destinations(count: usize) {
    gauge!("logmux_active_destinations").set(count as f64);
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.0}, max={:.0}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    /// 摘要
    pub fn summary(&self) -> StatsSummary {
        StatsSummary::from(self)
    }
}
