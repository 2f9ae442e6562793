use std::sync::atomic::{AtomicU64, Ordering};

/// Current resident set size of this process.
#[cfg(target_os = "linux")]
pub fn resident_bytes() -> Option<u64> {
    use procfs::process::Process;

    let status = Process::myself().and_then(|p| p.status()).ok()?;
    status.vmrss.map(|kb| kb * 1024)
}

#[cfg(not(target_os = "linux"))]
pub fn resident_bytes() -> Option<u64> {
    None
}

// Highest resident set size observed across calls to `sample`.
#[derive(Debug, Default)]
pub struct PeakMemory {
    peak: AtomicU64,
}

impl PeakMemory {
    pub fn new() -> Self {
        let peak = PeakMemory::default();
        peak.sample();
        peak
    }

    pub fn sample(&self) {
        if let Some(current) = resident_bytes() {
            self.peak.fetch_max(current, Ordering::Relaxed);
        }
    }

    pub fn bytes(&self) -> Option<u64> {
        match self.peak.load(Ordering::Relaxed) {
            0 => None,
            peak => Some(peak),
        }
    }
}

pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }

    match unit {
        0 => format!("{} B", bytes),
        _ => format!("{:.2} {}", value, UNITS[unit]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_human_sizes() {
        assert_eq!(format_bytes(0), "0 B");
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.50 KB");
        assert_eq!(format_bytes(3 * 1024 * 1024), "3.00 MB");
        assert_eq!(format_bytes(5 * 1024_u64.pow(5)), "5120.00 TB");
    }

    #[test]
    fn peak_never_decreases() {
        let peak = PeakMemory::new();
        let first = peak.bytes();
        peak.sample();
        match (first, peak.bytes()) {
            (Some(a), Some(b)) => assert!(b >= a),
            (None, _) => {}
            (Some(_), None) => panic!("peak memory went away"),
        }
    }
}
