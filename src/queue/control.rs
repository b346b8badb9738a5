//! Cross-process control block: pshared mutex + condition variable,
//! emulated semaphore counter, and ring cursors

use std::{
    mem::MaybeUninit,
    ptr,
    sync::atomic::{AtomicU32, Ordering},
    thread,
    time::{Duration, Instant},
};

use crate::error::{MqError, Result};

/// Magic published by the creator once one-time initialization is complete
const CONTROL_READY: u32 = 0x4D51_5031; // "MQP1"

/// Initial value of the emulated semaphore counter (see DESIGN.md,
/// open questions: almost certainly should be 0, preserved at 1).
const INITIAL_SEMA_COUNT: i32 = 1;

/// How long an attacher waits for the creator to publish the control block
const READY_TIMEOUT: Duration = Duration::from_secs(2);
const READY_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// Shared control header at the head of the mapped region
///
/// Jointly owned by every attached process. The mutex and condition variable
/// are configured `PTHREAD_PROCESS_SHARED`; the condition variable uses
/// `CLOCK_MONOTONIC`. All field access except `ready` happens with the mutex
/// held.
#[repr(C)]
pub(crate) struct ControlBlock {
    /// Cross-process mutex serializing every queue operation
    lock: libc::pthread_mutex_t,
    /// Cross-process condition variable backing the semaphore emulation
    cond: libc::pthread_cond_t,
    /// Emulated semaphore counter; may go transiently negative while a
    /// waiter is blocked
    sema_count: i32,
    /// Readiness word, Release-published by the creator after init
    ready: AtomicU32,
    /// Read cursor: total bytes consumed, never reset
    read_index: u64,
    /// Write cursor: total bytes produced, never reset
    write_index: u64,
}

impl ControlBlock {
    /// Size of the control header in the mapped region
    pub(crate) const SIZE: usize = std::mem::size_of::<Self>();

    /// One-time initialization, performed only by the process that created
    /// the segment. Publishes the readiness word last so attachers cannot
    /// observe a half-initialized block.
    pub(crate) unsafe fn init(ctrl: *mut ControlBlock) -> Result<()> {
        ptr::addr_of_mut!((*ctrl).sema_count).write(INITIAL_SEMA_COUNT);
        ptr::addr_of_mut!((*ctrl).read_index).write(0);
        ptr::addr_of_mut!((*ctrl).write_index).write(0);

        let mut mutex_attr = MaybeUninit::<libc::pthread_mutexattr_t>::uninit();
        check(
            libc::pthread_mutexattr_init(mutex_attr.as_mut_ptr()),
            "pthread_mutexattr_init",
        )?;
        check(
            libc::pthread_mutexattr_setpshared(
                mutex_attr.as_mut_ptr(),
                libc::PTHREAD_PROCESS_SHARED,
            ),
            "pthread_mutexattr_setpshared",
        )?;
        check(
            libc::pthread_mutex_init(ptr::addr_of_mut!((*ctrl).lock), mutex_attr.as_ptr()),
            "pthread_mutex_init",
        )?;
        libc::pthread_mutexattr_destroy(mutex_attr.as_mut_ptr());
        // TODO: mark the mutex robust (PTHREAD_MUTEX_ROBUST) so a crashed
        // holder cannot strand every sibling process

        let mut cond_attr = MaybeUninit::<libc::pthread_condattr_t>::uninit();
        check(
            libc::pthread_condattr_init(cond_attr.as_mut_ptr()),
            "pthread_condattr_init",
        )?;
        check(
            libc::pthread_condattr_setclock(cond_attr.as_mut_ptr(), libc::CLOCK_MONOTONIC),
            "pthread_condattr_setclock",
        )?;
        check(
            libc::pthread_condattr_setpshared(
                cond_attr.as_mut_ptr(),
                libc::PTHREAD_PROCESS_SHARED,
            ),
            "pthread_condattr_setpshared",
        )?;
        check(
            libc::pthread_cond_init(ptr::addr_of_mut!((*ctrl).cond), cond_attr.as_ptr()),
            "pthread_cond_init",
        )?;
        libc::pthread_condattr_destroy(cond_attr.as_mut_ptr());

        (*ctrl).ready.store(CONTROL_READY, Ordering::Release);
        Ok(())
    }

    /// Attach-side barrier: block until the creator has published the
    /// control block, with a bounded wait.
    pub(crate) unsafe fn wait_ready(ctrl: *const ControlBlock) -> Result<()> {
        let deadline = Instant::now() + READY_TIMEOUT;
        while (*ctrl).ready.load(Ordering::Acquire) != CONTROL_READY {
            if Instant::now() >= deadline {
                return Err(MqError::resource(
                    "Control block was never initialized by the creating process",
                ));
            }
            thread::sleep(READY_POLL_INTERVAL);
        }
        Ok(())
    }

    /// Destroy the synchronization objects ahead of namespace removal.
    /// Undefined if any sibling is still blocked on them.
    pub(crate) unsafe fn destroy(ctrl: *mut ControlBlock) -> Result<()> {
        check(
            libc::pthread_mutex_destroy(ptr::addr_of_mut!((*ctrl).lock)),
            "pthread_mutex_destroy",
        )?;
        check(
            libc::pthread_cond_destroy(ptr::addr_of_mut!((*ctrl).cond)),
            "pthread_cond_destroy",
        )?;
        (*ctrl).ready.store(0, Ordering::Release);
        Ok(())
    }
}

/// RAII guard over the control mutex
///
/// All cursor and counter access goes through a live guard, which both
/// documents and enforces "lock held" at the type level.
pub(crate) struct ControlGuard {
    ctrl: *mut ControlBlock,
}

impl ControlGuard {
    pub(crate) fn acquire(ctrl: *mut ControlBlock) -> Result<Self> {
        let rc = unsafe { libc::pthread_mutex_lock(ptr::addr_of_mut!((*ctrl).lock)) };
        check(rc, "pthread_mutex_lock")?;
        Ok(Self { ctrl })
    }

    pub(crate) fn read_index(&self) -> u64 {
        unsafe { (*self.ctrl).read_index }
    }

    pub(crate) fn write_index(&self) -> u64 {
        unsafe { (*self.ctrl).write_index }
    }

    pub(crate) fn advance_read(&mut self, by: u64) {
        unsafe { (*self.ctrl).read_index += by }
    }

    pub(crate) fn advance_write(&mut self, by: u64) {
        unsafe { (*self.ctrl).write_index += by }
    }

    pub(crate) fn sema_count(&self) -> i32 {
        unsafe { (*self.ctrl).sema_count }
    }

    /// Semaphore signal: increment the counter and wake one waiter, all
    /// while this guard's lock is held. Unlocked increment-then-wake would
    /// let a waiter miss the signal between its counter check and its wait.
    pub(crate) fn sema_signal(&mut self) -> Result<()> {
        unsafe {
            (*self.ctrl).sema_count += 1;
            check(
                libc::pthread_cond_signal(ptr::addr_of_mut!((*self.ctrl).cond)),
                "pthread_cond_signal",
            )
        }
    }

    /// Semaphore wait: decrement, then block while the counter is
    /// non-positive. The decrement-before-wait ordering can drive the
    /// counter transiently negative; a later signal recovers it.
    pub(crate) fn sema_wait(&mut self) -> Result<()> {
        unsafe {
            (*self.ctrl).sema_count -= 1;
            while (*self.ctrl).sema_count <= 0 {
                check(
                    libc::pthread_cond_wait(
                        ptr::addr_of_mut!((*self.ctrl).cond),
                        ptr::addr_of_mut!((*self.ctrl).lock),
                    ),
                    "pthread_cond_wait",
                )?;
            }
        }
        Ok(())
    }
}

impl Drop for ControlGuard {
    fn drop(&mut self) {
        unsafe {
            libc::pthread_mutex_unlock(ptr::addr_of_mut!((*self.ctrl).lock));
        }
    }
}

fn check(rc: libc::c_int, what: &str) -> Result<()> {
    if rc == 0 {
        Ok(())
    } else {
        Err(MqError::platform(format!(
            "{} failed: {}",
            what,
            std::io::Error::from_raw_os_error(rc)
        )))
    }
}
