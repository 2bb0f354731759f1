//! Host snapshot for the console `/sysinfo` command.
//!
//! Everything is read through `sysinfo`. Battery and GPU are not covered by
//! that crate and always report as unavailable.

use std::fmt;
use std::path::Path;
use std::time::Duration;

use sysinfo::{Disks, Networks, System};

/// Gap between the two CPU refreshes; usage is a delta between samples.
const CPU_SAMPLE_INTERVAL: Duration = Duration::from_millis(250);

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;
const MIB: f64 = 1024.0 * 1024.0;

const NOT_AVAILABLE: &str = "N/A";

/// Space on the root filesystem, in bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiskSpace {
    pub total: u64,
    pub available: u64,
}

/// Point-in-time host report. Byte counts are raw; [`fmt::Display`] does the
/// unit conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct SystemReport {
    pub os: String,
    pub os_version: String,
    pub processor: String,
    pub system_name: String,
    pub cpu_usage: f32,
    pub physical_cores: Option<usize>,
    pub logical_cores: usize,
    pub total_memory: u64,
    pub available_memory: u64,
    pub root_disk: Option<DiskSpace>,
    pub network_sent: u64,
    pub network_received: u64,
    pub gpu: Option<String>,
    pub timestamp: String,
}

impl SystemReport {
    /// Sample the host. Takes about [`CPU_SAMPLE_INTERVAL`].
    pub async fn collect() -> Self {
        let mut sys = System::new_all();
        sys.refresh_all();
        tokio::time::sleep(CPU_SAMPLE_INTERVAL).await;
        sys.refresh_all();

        let disks = Disks::new_with_refreshed_list();
        let root_disk = disks
            .iter()
            .find(|d| d.mount_point() == Path::new("/"))
            .or_else(|| disks.iter().next())
            .map(|d| DiskSpace { total: d.total_space(), available: d.available_space() });

        let networks = Networks::new_with_refreshed_list();
        let (network_sent, network_received) = networks
            .iter()
            .fold((0u64, 0u64), |(sent, recv), (_, data)| {
                (sent + data.total_transmitted(), recv + data.total_received())
            });

        let processor = sys
            .cpus()
            .first()
            .map(|c| c.brand().trim().to_string())
            .filter(|b| !b.is_empty())
            .unwrap_or_else(|| std::env::consts::ARCH.to_string());

        Self {
            os: System::name().unwrap_or_else(|| std::env::consts::OS.to_string()),
            os_version: System::os_version().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            processor,
            system_name: System::host_name().unwrap_or_else(|| NOT_AVAILABLE.to_string()),
            cpu_usage: sys.global_cpu_info().cpu_usage(),
            physical_cores: sys.physical_core_count(),
            logical_cores: sys.cpus().len(),
            total_memory: sys.total_memory(),
            available_memory: sys.available_memory(),
            root_disk,
            network_sent,
            network_received,
            gpu: None,
            timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }

    pub fn memory_usage_percent(&self) -> f64 {
        used_percent(self.total_memory, self.available_memory)
    }
}

impl fmt::Display for SystemReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OS: {}", self.os)?;
        writeln!(f, "OS Version: {}", self.os_version)?;
        writeln!(f, "Processor: {}", self.processor)?;
        writeln!(f, "System Name: {}", self.system_name)?;
        writeln!(f, "CPU Usage (%): {:.1}", self.cpu_usage)?;
        match self.physical_cores {
            Some(n) => writeln!(f, "Physical Cores: {n}")?,
            None => writeln!(f, "Physical Cores: {NOT_AVAILABLE}")?,
        }
        writeln!(f, "Logical Cores: {}", self.logical_cores)?;
        writeln!(f, "Total Memory (GB): {:.2}", gib(self.total_memory))?;
        writeln!(f, "Available Memory (GB): {:.2}", gib(self.available_memory))?;
        writeln!(f, "Memory Usage (%): {:.1}", self.memory_usage_percent())?;
        match self.root_disk {
            Some(disk) => {
                writeln!(f, "Total Disk Space (GB): {:.2}", gib(disk.total))?;
                writeln!(f, "Free Disk Space (GB): {:.2}", gib(disk.available))?;
                writeln!(f, "Disk Usage (%): {:.1}", used_percent(disk.total, disk.available))?;
            }
            None => {
                writeln!(f, "Total Disk Space (GB): {NOT_AVAILABLE}")?;
                writeln!(f, "Free Disk Space (GB): {NOT_AVAILABLE}")?;
                writeln!(f, "Disk Usage (%): {NOT_AVAILABLE}")?;
            }
        }
        writeln!(f, "Battery Percentage (%): {NOT_AVAILABLE}")?;
        writeln!(f, "Battery Charging: {NOT_AVAILABLE}")?;
        writeln!(f, "Network Sent (MB): {:.2}", self.network_sent as f64 / MIB)?;
        writeln!(f, "Network Received (MB): {:.2}", self.network_received as f64 / MIB)?;
        writeln!(f, "Timestamp: {}", self.timestamp)?;
        match &self.gpu {
            Some(name) => write!(f, "GPU Name: {name}"),
            None => write!(f, "GPU: No GPU detected"),
        }
    }
}

fn gib(bytes: u64) -> f64 {
    bytes as f64 / GIB
}

/// Share of `total` not in `available`, as a percentage. Zero when `total` is.
fn used_percent(total: u64, available: u64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    total.saturating_sub(available) as f64 / total as f64 * 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SystemReport {
        SystemReport {
            os: "Linux".into(),
            os_version: "22.04".into(),
            processor: "x86_64".into(),
            system_name: "falcon-host".into(),
            cpu_usage: 12.34,
            physical_cores: Some(4),
            logical_cores: 8,
            total_memory: 16 * 1024 * 1024 * 1024,
            available_memory: 12 * 1024 * 1024 * 1024,
            root_disk: Some(DiskSpace { total: 500 * 1024 * 1024 * 1024, available: 125 * 1024 * 1024 * 1024 }),
            network_sent: 3 * 1024 * 1024 + 512 * 1024,
            network_received: 10 * 1024 * 1024,
            gpu: None,
            timestamp: "2024-01-02 03:04:05".into(),
        }
    }

    #[test]
    fn report_lists_every_field() {
        let text = sample().to_string();
        let expected = [
            "OS: Linux",
            "OS Version: 22.04",
            "Processor: x86_64",
            "System Name: falcon-host",
            "CPU Usage (%): 12.3",
            "Physical Cores: 4",
            "Logical Cores: 8",
            "Total Memory (GB): 16.00",
            "Available Memory (GB): 12.00",
            "Memory Usage (%): 25.0",
            "Total Disk Space (GB): 500.00",
            "Free Disk Space (GB): 125.00",
            "Disk Usage (%): 75.0",
            "Battery Percentage (%): N/A",
            "Battery Charging: N/A",
            "Network Sent (MB): 3.50",
            "Network Received (MB): 10.00",
            "Timestamp: 2024-01-02 03:04:05",
            "GPU: No GPU detected",
        ];
        assert_eq!(text.lines().collect::<Vec<_>>(), expected);
    }

    #[test]
    fn missing_disk_and_cores_show_not_available() {
        let report = SystemReport { physical_cores: None, root_disk: None, ..sample() };
        let text = report.to_string();
        assert!(text.contains("Physical Cores: N/A"));
        assert!(text.contains("Total Disk Space (GB): N/A"));
        assert!(text.contains("Disk Usage (%): N/A"));
    }

    #[test]
    fn gpu_name_replaces_fallback() {
        let report = SystemReport { gpu: Some("RTX 4090".into()), ..sample() };
        let text = report.to_string();
        assert!(text.ends_with("GPU Name: RTX 4090"));
        assert!(!text.contains("No GPU detected"));
    }

    #[test]
    fn zero_total_is_zero_percent() {
        assert_eq!(used_percent(0, 0), 0.0);
        assert_eq!(used_percent(100, 150), 0.0);
    }

    #[tokio::test]
    async fn collect_reads_this_host() {
        let report = SystemReport::collect().await;
        assert!(report.logical_cores >= 1);
        assert!(report.total_memory > 0);
        assert!((0.0..=100.0).contains(&report.memory_usage_percent()));
        assert_eq!(report.timestamp.len(), "YYYY-MM-DD HH:MM:SS".len());
        assert!(!report.processor.is_empty());
    }
}
