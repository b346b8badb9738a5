//! Thread scheduling, naming and CPU affinity for the harness

use std::ffi::CString;

use nix::{
    sched::{sched_getaffinity, sched_setaffinity, CpuSet},
    unistd::Pid,
};

use crate::error::{MqError, Result};

use super::config::HarnessConfig;

/// Apply thread name, real-time priority and affinity from the config
///
/// Failures are logged and skipped rather than aborting the run; a harness
/// without elevated scheduling still measures, just noisier.
pub fn apply_thread_setup(thread_name: &str, config: &HarnessConfig) {
    if let Err(e) = set_thread_name(thread_name) {
        log::warn!("failed to set thread name: {}", e);
    }

    if config.priority > 0 {
        if let Err(e) = set_fifo_priority(config.priority) {
            log::warn!("failed to set SCHED_FIFO priority: {}", e);
        }
    }

    if config.affinity_mask != 0 {
        match apply_affinity(config.affinity_mask) {
            Ok(()) => match current_affinity() {
                Ok(cpus) => log::info!("running on CPUs {:?} of {}", cpus, online_cpus()),
                Err(e) => log::warn!("failed to read CPU affinity: {}", e),
            },
            Err(e) => log::warn!("failed to set CPU affinity: {}", e),
        }
    }
}

/// Name the calling thread (visible in ps/top)
pub fn set_thread_name(name: &str) -> Result<()> {
    let cname = CString::new(name)
        .map_err(|_| MqError::invalid_parameter("name", "Thread name contains null bytes"))?;
    let rc = unsafe { libc::pthread_setname_np(libc::pthread_self(), cname.as_ptr()) };
    if rc != 0 {
        return Err(MqError::platform(format!(
            "pthread_setname_np failed: {}",
            std::io::Error::from_raw_os_error(rc)
        )));
    }
    Ok(())
}

/// Switch the calling thread to SCHED_FIFO at the given priority
pub fn set_fifo_priority(priority: i32) -> Result<()> {
    let param = libc::sched_param {
        sched_priority: priority,
    };
    let rc = unsafe { libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_FIFO, &param) };
    if rc != 0 {
        return Err(MqError::platform(format!(
            "pthread_setschedparam failed: {}",
            std::io::Error::from_raw_os_error(rc)
        )));
    }
    Ok(())
}

/// Pin the calling thread to the CPUs set in `mask` (bit n = CPU n)
pub fn apply_affinity(mask: u64) -> Result<()> {
    let mut cpu_set = CpuSet::new();
    let max_cpu = CpuSet::count().min(u64::BITS as usize);

    for cpu in 0..max_cpu {
        if mask & (1u64 << cpu) != 0 {
            cpu_set
                .set(cpu)
                .map_err(|e| MqError::platform(format!("CpuSet::set({}) failed: {}", cpu, e)))?;
        }
    }

    sched_setaffinity(Pid::from_raw(0), &cpu_set)
        .map_err(|e| MqError::platform(format!("sched_setaffinity failed: {}", e)))
}

/// CPUs the calling thread is currently allowed to run on
pub fn current_affinity() -> Result<Vec<usize>> {
    let cpu_set = sched_getaffinity(Pid::from_raw(0))
        .map_err(|e| MqError::platform(format!("sched_getaffinity failed: {}", e)))?;

    let mut cpus = Vec::new();
    for cpu in 0..CpuSet::count() {
        if cpu_set.is_set(cpu).unwrap_or(false) {
            cpus.push(cpu);
        }
    }
    Ok(cpus)
}

/// Number of CPUs currently online
pub fn online_cpus() -> usize {
    let n = unsafe { libc::sysconf(libc::_SC_NPROCESSORS_ONLN) };
    if n < 1 {
        1
    } else {
        n as usize
    }
}
