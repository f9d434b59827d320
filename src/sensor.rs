//! System sensor sampling: CPU/GPU temperature and usage.
//!
//! Real readings come from sysfs/procfs where present. Anything that cannot
//! be read falls back to a bounded random walk from the previous value:
//!
//! | metric          | range   | step |
//! |-----------------|---------|------|
//! | CPU temperature | 30..=85 | ±2   |
//! | CPU usage       | 0..=100 | ±5   |
//! | GPU temperature | 35..=90 | ±3   |
//! | GPU usage       | 0..=100 | ±8   |

use std::collections::VecDeque;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

/// Samples kept per metric.
pub const HISTORY_LEN: usize = 60;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorSample {
    pub cpu_temperature: i32,
    pub cpu_usage: i32,
    pub gpu_temperature: i32,
    pub gpu_usage: i32,
}

/// Which metrics differ from the previous sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SensorChanges {
    pub cpu_temperature: bool,
    pub cpu_usage: bool,
    pub gpu_temperature: bool,
    pub gpu_usage: bool,
}

impl SensorChanges {
    fn between(old: &SensorSample, new: &SensorSample) -> Self {
        Self {
            cpu_temperature: old.cpu_temperature != new.cpu_temperature,
            cpu_usage: old.cpu_usage != new.cpu_usage,
            gpu_temperature: old.gpu_temperature != new.gpu_temperature,
            gpu_usage: old.gpu_usage != new.gpu_usage,
        }
    }

    pub fn any(&self) -> bool {
        self.cpu_temperature || self.cpu_usage || self.gpu_temperature || self.gpu_usage
    }
}

/// Produces a new sample given the previous one.
pub trait SensorSource: Send {
    fn read(&mut self, previous: &SensorSample) -> SensorSample;
}

// ── Random walk ─────────────────────────────────────────────────────

/// SplitMix64 generator. Not cryptographic, only used for simulated values.
#[derive(Debug, Clone)]
pub struct Walk {
    state: u64,
}

impl Walk {
    pub fn new(seed: u64) -> Self {
        Self { state: seed }
    }

    /// Seeded from the wall clock.
    pub fn from_clock() -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos() as u64)
            .unwrap_or(0x5eed);
        Self::new(nanos)
    }

    fn next_u64(&mut self) -> u64 {
        self.state = self.state.wrapping_add(0x9e37_79b9_7f4a_7c15);
        let mut z = self.state;
        z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
        z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
        z ^ (z >> 31)
    }

    /// Move `current` by a uniform step in `-max_step..=max_step`, clamped
    /// to `min..=max`.
    pub fn step(&mut self, current: i32, min: i32, max: i32, max_step: i32) -> i32 {
        let span = (2 * max_step + 1) as u64;
        let change = (self.next_u64() % span) as i32 - max_step;
        (current + change).clamp(min, max)
    }
}

/// Purely simulated sensors.
pub struct SimulatedSensors {
    walk: Walk,
}

impl SimulatedSensors {
    pub fn new(walk: Walk) -> Self {
        Self { walk }
    }
}

impl SensorSource for SimulatedSensors {
    fn read(&mut self, previous: &SensorSample) -> SensorSample {
        SensorSample {
            cpu_temperature: self.walk.step(previous.cpu_temperature, 30, 85, 2),
            cpu_usage: self.walk.step(previous.cpu_usage, 0, 100, 5),
            gpu_temperature: self.walk.step(previous.gpu_temperature, 35, 90, 3),
            gpu_usage: self.walk.step(previous.gpu_usage, 0, 100, 8),
        }
    }
}

// ── Host sensors ────────────────────────────────────────────────────

/// Thermal zone types that report the CPU package.
const CPU_ZONE_TYPES: [&str; 4] = ["x86_pkg_temp", "cpu", "coretemp", "k10temp"];

/// CPU readings from sysfs/procfs, simulated GPU readings.
pub struct SystemSensors {
    thermal_zone: Option<PathBuf>,
    proc_stat: PathBuf,
    last_cpu_times: Option<(u64, u64)>,
    walk: Walk,
}

impl SystemSensors {
    pub fn new(walk: Walk) -> Self {
        Self::with_paths(Path::new("/sys/class/thermal"), Path::new("/proc/stat"), walk)
    }

    pub fn with_paths(thermal_root: &Path, proc_stat: &Path, walk: Walk) -> Self {
        let thermal_zone = find_cpu_zone(thermal_root);
        match &thermal_zone {
            Some(zone) => log::info!("CPU temperature from {}", zone.display()),
            None => log::warn!("No CPU thermal zone found, simulating CPU temperature"),
        }
        Self {
            thermal_zone,
            proc_stat: proc_stat.to_path_buf(),
            last_cpu_times: None,
            walk,
        }
    }

    fn read_cpu_temperature(&self) -> Option<i32> {
        let zone = self.thermal_zone.as_ref()?;
        let raw = fs::read_to_string(zone.join("temp")).ok()?;
        let millis: i64 = raw.trim().parse().ok()?;
        Some((millis / 1000) as i32)
    }

    /// Busy percentage since the previous call. None on the first call.
    fn read_cpu_usage(&mut self) -> Option<i32> {
        let text = fs::read_to_string(&self.proc_stat).ok()?;
        let (total, idle) = parse_cpu_times(&text)?;
        let previous = self.last_cpu_times.replace((total, idle));
        let (prev_total, prev_idle) = previous?;
        let d_total = total.saturating_sub(prev_total);
        let d_idle = idle.saturating_sub(prev_idle);
        if d_total == 0 {
            return None;
        }
        Some((100 * d_total.saturating_sub(d_idle) / d_total) as i32)
    }
}

impl SensorSource for SystemSensors {
    fn read(&mut self, previous: &SensorSample) -> SensorSample {
        let cpu_temperature = match self.read_cpu_temperature() {
            Some(t) => t,
            None => self.walk.step(previous.cpu_temperature, 30, 85, 2),
        };
        let cpu_usage = match self.read_cpu_usage() {
            Some(u) => u.clamp(0, 100),
            None => self.walk.step(previous.cpu_usage, 0, 100, 5),
        };
        SensorSample {
            cpu_temperature,
            cpu_usage,
            gpu_temperature: self.walk.step(previous.gpu_temperature, 35, 90, 3),
            gpu_usage: self.walk.step(previous.gpu_usage, 0, 100, 8),
        }
    }
}

fn find_cpu_zone(root: &Path) -> Option<PathBuf> {
    let mut zones: Vec<PathBuf> = fs::read_dir(root)
        .ok()?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.file_name()
                .is_some_and(|n| n.to_string_lossy().starts_with("thermal_zone"))
        })
        .collect();
    zones.sort();
    zones.into_iter().find(|zone| {
        fs::read_to_string(zone.join("type")).is_ok_and(|kind| {
            let kind = kind.trim().to_ascii_lowercase();
            CPU_ZONE_TYPES.iter().any(|t| kind.contains(t))
        })
    })
}

/// (total, idle) jiffies from the aggregate `cpu` line of /proc/stat.
fn parse_cpu_times(stat: &str) -> Option<(u64, u64)> {
    let line = stat.lines().find(|l| l.starts_with("cpu "))?;
    let fields: Vec<u64> = line
        .split_whitespace()
        .skip(1)
        .filter_map(|f| f.parse().ok())
        .collect();
    if fields.len() < 4 {
        return None;
    }
    // idle + iowait
    let idle = fields[3] + fields.get(4).copied().unwrap_or(0);
    Some((fields.iter().sum(), idle))
}

// ── Monitor ─────────────────────────────────────────────────────────

pub struct SensorMonitor {
    source: Box<dyn SensorSource>,
    current: SensorSample,
    history: VecDeque<SensorSample>,
}

impl SensorMonitor {
    pub fn new(source: Box<dyn SensorSource>) -> Self {
        Self {
            source,
            current: SensorSample::default(),
            history: VecDeque::with_capacity(HISTORY_LEN),
        }
    }

    /// Take a sample, append it to the history and report what changed.
    pub fn poll(&mut self) -> (SensorSample, SensorChanges) {
        let sample = self.source.read(&self.current);
        let changes = SensorChanges::between(&self.current, &sample);
        self.current = sample;
        if self.history.len() == HISTORY_LEN {
            self.history.pop_front();
        }
        self.history.push_back(sample);
        (sample, changes)
    }

    pub fn current(&self) -> SensorSample {
        self.current
    }

    /// Oldest first.
    pub fn history(&self) -> impl Iterator<Item = &SensorSample> {
        self.history.iter()
    }

    pub fn cpu_temperature_history(&self) -> Vec<i32> {
        self.history.iter().map(|s| s.cpu_temperature).collect()
    }

    pub fn gpu_temperature_history(&self) -> Vec<i32> {
        self.history.iter().map(|s| s.gpu_temperature).collect()
    }

    pub fn cpu_usage_history(&self) -> Vec<i32> {
        self.history.iter().map(|s| s.cpu_usage).collect()
    }

    pub fn gpu_usage_history(&self) -> Vec<i32> {
        self.history.iter().map(|s| s.gpu_usage).collect()
    }
}
