//! # Runtime Sampler
//!
//! The agent reads a fixed set of memory and CPU statistics on every poll.
//! `SystemSampler` gathers them for the current process and the host through
//! the `sysinfo` crate.

use sysinfo::{Pid, System};
use tracing::warn;

/// A source of named gauge readings.
pub trait RuntimeSampler: Send {
    /// Takes a fresh reading of every value this sampler knows about.
    fn sample(&mut self) -> Vec<(&'static str, f64)>;
}

/// Samples process and host resource usage via `sysinfo`.
pub struct SystemSampler {
    system: System,
    pid: Option<Pid>,
}

impl SystemSampler {
    pub fn new() -> Self {
        let pid = match sysinfo::get_current_pid() {
            Ok(pid) => Some(pid),
            Err(e) => {
                warn!("Failed to get current PID, process gauges disabled: {}", e);
                None
            }
        };
        Self {
            system: System::new(),
            pid,
        }
    }

    fn sample_host(&mut self, out: &mut Vec<(&'static str, f64)>) {
        self.system.refresh_memory();
        self.system.refresh_cpu();

        out.push(("TotalMemory", self.system.total_memory() as f64));
        out.push(("UsedMemory", self.system.used_memory() as f64));
        out.push(("FreeMemory", self.system.free_memory() as f64));
        out.push(("AvailableMemory", self.system.available_memory() as f64));
        out.push(("TotalSwap", self.system.total_swap() as f64));
        out.push(("UsedSwap", self.system.used_swap() as f64));
        out.push(("FreeSwap", self.system.free_swap() as f64));
        out.push((
            "GlobalCpuUsage",
            self.system.global_cpu_info().cpu_usage() as f64,
        ));
        out.push(("CpuCount", self.system.cpus().len() as f64));

        let load = System::load_average();
        out.push(("LoadAverage1", load.one));
        out.push(("LoadAverage5", load.five));
        out.push(("LoadAverage15", load.fifteen));
        out.push(("Uptime", System::uptime() as f64));
    }

    fn sample_process(&mut self, out: &mut Vec<(&'static str, f64)>) {
        let Some(pid) = self.pid else {
            return;
        };
        if !self.system.refresh_process(pid) {
            warn!("Process with PID {} not found, skipping process gauges", pid);
            return;
        }
        let Some(process) = self.system.process(pid) else {
            return;
        };

        let disk = process.disk_usage();
        out.push(("ProcessResidentMemory", process.memory() as f64));
        out.push(("ProcessVirtualMemory", process.virtual_memory() as f64));
        out.push(("ProcessCpuUsage", process.cpu_usage() as f64));
        out.push(("ProcessRunTime", process.run_time() as f64));
        out.push(("ProcessDiskReadBytes", disk.read_bytes as f64));
        out.push(("ProcessDiskWrittenBytes", disk.written_bytes as f64));
        out.push(("ProcessDiskTotalReadBytes", disk.total_read_bytes as f64));
        out.push((
            "ProcessDiskTotalWrittenBytes",
            disk.total_written_bytes as f64,
        ));
    }
}

impl Default for SystemSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl RuntimeSampler for SystemSampler {
    fn sample(&mut self) -> Vec<(&'static str, f64)> {
        let mut out = Vec::with_capacity(24);
        self.sample_host(&mut out);
        self.sample_process(&mut out);
        out
    }
}
