// SPDX-FileCopyrightText: 2026 TRAPD Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Host inventory collection.
//!
//! [`SystemCollector`] probes the local machine for the host, hardware,
//! and identity sections of the heartbeat envelope. Individual probes
//! degrade to `None` fields rather than failing the snapshot; hardware
//! probes are the expensive ones and sit behind a TTL cache so they run
//! at most once per cache window, not once per tick.

use std::sync::Mutex;
use std::time::{Duration, Instant};

use serde::Serialize;
use sysinfo::{Disks, Networks, System};
use tracing::debug;

use trapd_core::{time, AgentError};

/// How long a hardware probe result stays fresh.
pub const HARDWARE_CACHE_TTL: Duration = Duration::from_secs(300);

/// Produces the per-tick inventory snapshot.
///
/// The worker consumes this seam; tests substitute a stub.
pub trait InventoryCollector: Send + Sync {
    fn collect(&self) -> Result<InventorySnapshot, AgentError>;
}

/// Everything the collector knows about the machine at one instant.
#[derive(Debug, Clone)]
pub struct InventorySnapshot {
    pub host: HostInfo,
    pub hardware: Option<HardwareInfo>,
    pub identity: IdentityInfo,
}

/// Host section of the heartbeat envelope.
#[derive(Debug, Clone, Serialize)]
pub struct HostInfo {
    pub hostname: String,
    pub fqdn: String,
    pub os: String,
    pub os_version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os_build: Option<String>,
    pub arch: String,
    pub primary_ip: String,
    pub ip_addrs: Vec<String>,
    pub mac_addrs: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub boot_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uptime_seconds: Option<u64>,
}

/// Hardware section; every field is best-effort.
#[derive(Debug, Clone, Serialize)]
pub struct HardwareInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ram_total_gb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_total_gb: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disk_free_gb: Option<f64>,
}

/// Directory/identity section.
#[derive(Debug, Clone, Serialize)]
pub struct IdentityInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub joined: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aad_joined: Option<bool>,
}

/// Normalize a target-architecture string to the intake's vocabulary.
pub fn normalize_arch(raw: &str) -> &'static str {
    match raw {
        "x86_64" | "amd64" => "x86_64",
        "aarch64" | "arm64" => "aarch64",
        "x86" | "i686" | "i586" => "i686",
        a if a.starts_with("arm") => "arm",
        _ => "unknown",
    }
}

/// TTL cache for the hardware probe, owned by the collector instead of
/// living in a process-wide static.
pub struct HardwareCache {
    ttl: Duration,
    slot: Mutex<Option<(Instant, Option<HardwareInfo>)>>,
}

impl HardwareCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    /// Return the cached value if fresh, otherwise run `probe` and cache
    /// its result.
    pub fn get_or_probe(
        &self,
        probe: impl FnOnce() -> Option<HardwareInfo>,
    ) -> Option<HardwareInfo> {
        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some((stamped, cached)) = slot.as_ref() {
            if stamped.elapsed() < self.ttl {
                return cached.clone();
            }
        }
        let fresh = probe();
        *slot = Some((Instant::now(), fresh.clone()));
        fresh
    }
}

/// Default collector probing the local system.
pub struct SystemCollector {
    hardware_cache: HardwareCache,
}

impl SystemCollector {
    pub fn new() -> Self {
        Self {
            hardware_cache: HardwareCache::new(HARDWARE_CACHE_TTL),
        }
    }

    fn collect_host(&self) -> HostInfo {
        let raw_hostname = hostname::get()
            .ok()
            .map(|h| h.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unknown".to_string());

        // A dotted kernel hostname doubles as the FQDN.
        let (hostname, fqdn) = match raw_hostname.split_once('.') {
            Some((short, _)) => (short.to_string(), raw_hostname.clone()),
            None => (raw_hostname.clone(), raw_hostname.clone()),
        };

        let (primary_ip, ip_addrs, mac_addrs) = probe_network();

        let boot_time = match System::boot_time() {
            0 => None,
            secs => chrono::DateTime::from_timestamp(secs as i64, 0).map(time::format_utc),
        };

        HostInfo {
            hostname,
            fqdn,
            os: std::env::consts::OS.to_string(),
            os_version: System::os_version().unwrap_or_else(|| "unknown".to_string()),
            os_build: System::kernel_version(),
            arch: normalize_arch(std::env::consts::ARCH).to_string(),
            primary_ip,
            ip_addrs,
            mac_addrs,
            timezone: Some(chrono::Local::now().format("%:z").to_string()),
            boot_time,
            uptime_seconds: Some(System::uptime()),
        }
    }

    fn collect_identity(&self, fqdn: &str) -> IdentityInfo {
        let domain = fqdn
            .split_once('.')
            .map(|(_, d)| d.to_string())
            .filter(|d| !d.is_empty() && d != "local" && d != "localdomain");
        IdentityInfo {
            joined: domain.is_some(),
            domain,
            aad_joined: None,
        }
    }

    fn probe_hardware() -> Option<HardwareInfo> {
        let mut sys = System::new();
        sys.refresh_cpu_all();
        sys.refresh_memory();

        let cpu_model = sys
            .cpus()
            .first()
            .map(|cpu| cpu.brand().trim().to_string())
            .filter(|brand| !brand.is_empty());
        let cpu_cores = match sys.cpus().len() {
            0 => None,
            n => Some(n as u32),
        };
        let ram_total_gb = match sys.total_memory() {
            0 => None,
            bytes => Some(bytes_to_gb(bytes)),
        };

        let disks = Disks::new_with_refreshed_list();
        let (disk_total, disk_free) = disks.iter().fold((0u64, 0u64), |(total, free), disk| {
            (total + disk.total_space(), free + disk.available_space())
        });
        let disk_total_gb = (disk_total > 0).then(|| bytes_to_gb(disk_total));
        let disk_free_gb = (disk_total > 0).then(|| bytes_to_gb(disk_free));

        let info = HardwareInfo {
            cpu_model,
            cpu_cores,
            ram_total_gb,
            disk_total_gb,
            disk_free_gb,
        };

        // A probe with nothing in it is indistinguishable from a failed one.
        if info.cpu_model.is_none() && info.cpu_cores.is_none() && info.ram_total_gb.is_none() {
            None
        } else {
            Some(info)
        }
    }
}

impl Default for SystemCollector {
    fn default() -> Self {
        Self::new()
    }
}

impl InventoryCollector for SystemCollector {
    fn collect(&self) -> Result<InventorySnapshot, AgentError> {
        let host = self.collect_host();
        let identity = self.collect_identity(&host.fqdn);
        let hardware = self.hardware_cache.get_or_probe(Self::probe_hardware);
        if hardware.is_none() {
            debug!("hardware probe yielded nothing, omitting section");
        }
        Ok(InventorySnapshot {
            host,
            hardware,
            identity,
        })
    }
}

/// Enumerate non-loopback addresses; returns (primary, all ips, macs).
fn probe_network() -> (String, Vec<String>, Vec<String>) {
    let networks = Networks::new_with_refreshed_list();

    let mut ip_addrs = Vec::new();
    let mut mac_addrs = Vec::new();
    let mut primary_v4: Option<String> = None;

    for (_name, data) in networks.iter() {
        for ip_network in data.ip_networks() {
            let addr = ip_network.addr;
            if addr.is_loopback() {
                continue;
            }
            let text = addr.to_string();
            if primary_v4.is_none() && addr.is_ipv4() {
                primary_v4 = Some(text.clone());
            }
            ip_addrs.push(text);
        }
        let mac = data.mac_address().to_string();
        if mac != "00:00:00:00:00:00" && !mac_addrs.contains(&mac) {
            mac_addrs.push(mac);
        }
    }

    ip_addrs.sort();
    ip_addrs.dedup();

    let primary_ip = primary_v4
        .or_else(|| ip_addrs.first().cloned())
        .unwrap_or_else(|| "0.0.0.0".to_string());
    (primary_ip, ip_addrs, mac_addrs)
}

fn bytes_to_gb(bytes: u64) -> f64 {
    let gb = bytes as f64 / (1024.0 * 1024.0 * 1024.0);
    (gb * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arch_normalization_covers_the_vocabulary() {
        assert_eq!(normalize_arch("x86_64"), "x86_64");
        assert_eq!(normalize_arch("amd64"), "x86_64");
        assert_eq!(normalize_arch("aarch64"), "aarch64");
        assert_eq!(normalize_arch("arm64"), "aarch64");
        assert_eq!(normalize_arch("armv7"), "arm");
        assert_eq!(normalize_arch("arm"), "arm");
        assert_eq!(normalize_arch("i686"), "i686");
        assert_eq!(normalize_arch("x86"), "i686");
        assert_eq!(normalize_arch("riscv64"), "unknown");
        assert_eq!(normalize_arch(""), "unknown");
    }

    #[test]
    fn bytes_round_to_one_decimal_gb() {
        assert_eq!(bytes_to_gb(16 * 1024 * 1024 * 1024), 16.0);
        assert_eq!(bytes_to_gb(1024 * 1024 * 1024 + 512 * 1024 * 1024), 1.5);
    }

    #[test]
    fn hardware_cache_reuses_fresh_values() {
        let cache = HardwareCache::new(Duration::from_secs(60));
        let mut probes = 0;
        for _ in 0..3 {
            cache.get_or_probe(|| {
                probes += 1;
                Some(HardwareInfo {
                    cpu_model: Some("test".into()),
                    cpu_cores: Some(4),
                    ram_total_gb: Some(8.0),
                    disk_total_gb: None,
                    disk_free_gb: None,
                })
            });
        }
        assert_eq!(probes, 1);
    }

    #[test]
    fn hardware_cache_reprobes_after_ttl() {
        let cache = HardwareCache::new(Duration::from_millis(10));
        let mut probes = 0;
        let mut probe = || {
            probes += 1;
            None
        };
        cache.get_or_probe(&mut probe);
        std::thread::sleep(Duration::from_millis(20));
        cache.get_or_probe(&mut probe);
        assert_eq!(probes, 2);
    }

    #[test]
    fn hardware_cache_caches_none_results_too() {
        let cache = HardwareCache::new(Duration::from_secs(60));
        let mut probes = 0;
        for _ in 0..2 {
            cache.get_or_probe(|| {
                probes += 1;
                None
            });
        }
        assert_eq!(probes, 1);
    }

    #[test]
    fn system_collector_produces_a_plausible_snapshot() {
        let collector = SystemCollector::new();
        let snapshot = collector.collect().unwrap();

        assert!(!snapshot.host.hostname.is_empty());
        assert!(!snapshot.host.os.is_empty());
        assert_ne!(snapshot.host.arch, "");
        // The running target's arch must normalize into the vocabulary.
        assert!(["x86_64", "aarch64", "arm", "i686", "unknown"]
            .contains(&snapshot.host.arch.as_str()));
        // joined implies a domain is present.
        assert_eq!(snapshot.identity.joined, snapshot.identity.domain.is_some());
    }

    #[test]
    fn dotted_hostname_splits_into_short_and_fqdn() {
        // Exercised indirectly through collect_host on machines with a
        // dotted hostname; the split logic is tested in isolation here.
        let raw = "web01.corp.example.com";
        let (short, fqdn) = match raw.split_once('.') {
            Some((s, _)) => (s.to_string(), raw.to_string()),
            None => (raw.to_string(), raw.to_string()),
        };
        assert_eq!(short, "web01");
        assert_eq!(fqdn, "web01.corp.example.com");
    }
}
