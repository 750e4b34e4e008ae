//! Real-time isolation for the polling thread
//!
//! On Linux: SCHED_FIFO plus CPU affinity. Elsewhere nothing is requested.
//! Failures are logged and tolerated; the timing statistics show what was
//! actually achieved.

use sp0256_core::TARGET_SYSTEM;

/// What the OS granted the real-time thread
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct IsolationStatus {
    pub requested: bool,
    /// SCHED_FIFO priority, if granted
    pub fifo_priority: Option<i32>,
    /// Pinned CPU, if granted
    pub cpu: Option<usize>,
}

impl IsolationStatus {
    pub fn is_isolated(&self) -> bool {
        self.fifo_priority.is_some()
    }
}

/// Request isolation for the calling thread
pub fn isolate_current_thread(priority: i32, cpu: Option<usize>) -> IsolationStatus {
    let status = IsolationStatus {
        requested: true,
        fifo_priority: set_fifo(priority),
        cpu: cpu.and_then(pin_to_cpu),
    };
    tracing::info!(
        target: TARGET_SYSTEM,
        fifo = ?status.fifo_priority,
        cpu = ?status.cpu,
        "real-time isolation"
    );
    status
}

#[cfg(target_os = "linux")]
fn set_fifo(priority: i32) -> Option<i32> {
    // SAFETY: sched_param is plain data and pid 0 names the calling thread
    let (granted, rc) = unsafe {
        let min = libc::sched_get_priority_min(libc::SCHED_FIFO);
        let max = libc::sched_get_priority_max(libc::SCHED_FIFO);
        let param = libc::sched_param {
            sched_priority: priority.clamp(min, max.max(min)),
        };
        (
            param.sched_priority,
            libc::sched_setscheduler(0, libc::SCHED_FIFO, &param),
        )
    };
    if rc == 0 {
        Some(granted)
    } else {
        tracing::warn!(
            target: TARGET_SYSTEM,
            priority,
            "SCHED_FIFO not granted: {}",
            std::io::Error::last_os_error()
        );
        None
    }
}

#[cfg(target_os = "linux")]
fn pin_to_cpu(cpu: usize) -> Option<usize> {
    // SAFETY: cpu_set_t is plain data, zeroed is a valid empty set
    let rc = unsafe {
        let mut set: libc::cpu_set_t = std::mem::zeroed();
        libc::CPU_ZERO(&mut set);
        libc::CPU_SET(cpu, &mut set);
        libc::sched_setaffinity(0, std::mem::size_of::<libc::cpu_set_t>(), &set)
    };
    if rc == 0 {
        Some(cpu)
    } else {
        tracing::warn!(
            target: TARGET_SYSTEM,
            cpu,
            "CPU affinity not granted: {}",
            std::io::Error::last_os_error()
        );
        None
    }
}

#[cfg(not(target_os = "linux"))]
fn set_fifo(_priority: i32) -> Option<i32> {
    tracing::warn!(target: TARGET_SYSTEM, "real-time scheduling unsupported on this platform");
    None
}

#[cfg(not(target_os = "linux"))]
fn pin_to_cpu(_cpu: usize) -> Option<usize> {
    None
}
