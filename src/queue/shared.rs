//! Cross-process bounded queue over a shared-memory ring

use std::ptr;

use crate::{
    error::{MqError, Result},
    memory::SharedSegment,
};

use super::{
    config::QueueConfig,
    control::{ControlBlock, ControlGuard},
};

/// A fixed-capacity queue of fixed-size elements shared between processes
///
/// The mapped region holds a control block followed by
/// `capacity * element_size` ring bytes. Every operation is one critical
/// section under the control block's cross-process mutex; the only
/// suspension point is the blocking [`dequeue`](SharedQueue::dequeue).
///
/// For one producer and one consumer transfers are strict FIFO. With more
/// contenders only mutual exclusion is guaranteed.
pub struct SharedQueue {
    config: QueueConfig,
    segment: SharedSegment,
    ctrl: *mut ControlBlock,
    data: *mut u8,
    data_len: usize,
}

impl SharedQueue {
    /// Open or create the named queue
    ///
    /// Exactly one of any number of racing openers creates and initializes
    /// the region; the rest attach and observe fully initialized state.
    /// With `config.create` unset the call attaches only and fails with
    /// [`MqError::QueueNotFound`] when the name does not exist.
    pub fn open_or_create(config: QueueConfig) -> Result<Self> {
        config.validate()?;

        let total_size = ControlBlock::SIZE + config.data_len();
        let segment = SharedSegment::open_or_create(&config.segment_config(total_size))?;

        let base = unsafe { segment.as_mut_ptr_unsafe() };
        let ctrl = base as *mut ControlBlock;

        if segment.created() {
            if let Err(e) = unsafe { ControlBlock::init(ctrl) } {
                // A half-created queue must not stay attachable by name
                let _ = segment.unlink();
                return Err(e);
            }
        } else {
            unsafe { ControlBlock::wait_ready(ctrl)? };
        }

        let data = unsafe { base.add(ControlBlock::SIZE) };
        let data_len = config.data_len();

        Ok(Self {
            config,
            segment,
            ctrl,
            data,
            data_len,
        })
    }

    /// Non-blocking enqueue of exactly one element
    ///
    /// Fails closed with [`MqError::LengthMismatch`] before any mutation,
    /// and with [`MqError::QueueFull`] (no mutation) when the ring is full.
    /// Does not wake blocked consumers; pair with
    /// [`try_enqueue_signal`](SharedQueue::try_enqueue_signal) for that.
    pub fn try_enqueue(&self, element: &[u8]) -> Result<()> {
        self.enqueue_locked(element, false)
    }

    /// Non-blocking enqueue that also wakes one blocked consumer
    ///
    /// The counter increment and wake happen under the same lock as the data
    /// write, so the wake cannot be lost relative to the element becoming
    /// visible.
    pub fn try_enqueue_signal(&self, element: &[u8]) -> Result<()> {
        self.enqueue_locked(element, true)
    }

    fn enqueue_locked(&self, element: &[u8], signal: bool) -> Result<()> {
        self.check_element_len(element.len())?;

        let mut guard = ControlGuard::acquire(self.ctrl)?;

        // TODO: occupancy test ignores u64 cursor wraparound
        let occupied = guard.write_index() - guard.read_index();
        if occupied >= self.data_len as u64 {
            return Err(MqError::queue_full(self.config.capacity));
        }

        let offset = (guard.write_index() % self.data_len as u64) as usize;
        self.copy_in(offset, element)?;
        guard.advance_write(self.config.element_size as u64);

        if signal {
            guard.sema_signal()?;
        }

        Ok(())
    }

    /// Blocking dequeue of exactly one element
    ///
    /// Blocks indefinitely until a producer's
    /// [`try_enqueue_signal`](SharedQueue::try_enqueue_signal) wakes it;
    /// there is no timeout and no built-in cancellation. If the wait is
    /// satisfied but the cursors disagree, the call logs a warning and fails
    /// with [`MqError::SpuriousEmpty`] (no mutation, caller may retry).
    pub fn dequeue(&self, out: &mut [u8]) -> Result<()> {
        self.check_element_len(out.len())?;

        let mut guard = ControlGuard::acquire(self.ctrl)?;
        guard.sema_wait()?;

        if guard.read_index() >= guard.write_index() {
            log::warn!(
                "spurious empty on queue {}: read cursor {} >= write cursor {}",
                self.config.name,
                guard.read_index(),
                guard.write_index()
            );
            return Err(MqError::SpuriousEmpty);
        }

        let offset = (guard.read_index() % self.data_len as u64) as usize;
        self.copy_out(offset, out)?;
        guard.advance_read(self.config.element_size as u64);

        Ok(())
    }

    /// Non-blocking dequeue of exactly one element
    ///
    /// An independent lock-only check: never touches the semaphore counter.
    /// Fails with [`MqError::QueueEmpty`] (no mutation) when nothing is
    /// available.
    pub fn try_dequeue(&self, out: &mut [u8]) -> Result<()> {
        self.check_element_len(out.len())?;

        let mut guard = ControlGuard::acquire(self.ctrl)?;

        if guard.read_index() >= guard.write_index() {
            return Err(MqError::QueueEmpty);
        }

        let offset = (guard.read_index() % self.data_len as u64) as usize;
        self.copy_out(offset, out)?;
        guard.advance_read(self.config.element_size as u64);

        Ok(())
    }

    /// Current number of occupied elements
    pub fn len(&self) -> Result<usize> {
        let guard = ControlGuard::acquire(self.ctrl)?;
        let occupied = guard.write_index() - guard.read_index();
        Ok((occupied / self.config.element_size as u64) as usize)
    }

    /// Whether the queue currently holds no elements
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }

    /// Whether the queue is currently at capacity
    pub fn is_full(&self) -> Result<bool> {
        Ok(self.len()? == self.config.capacity)
    }

    /// Maximum number of elements
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Agreed element size in bytes
    pub fn element_size(&self) -> usize {
        self.config.element_size
    }

    /// Queue name as mapped into the OS namespace
    pub fn name(&self) -> &str {
        self.segment.name()
    }

    /// Total mapped size: control header plus ring bytes
    pub fn total_size(&self) -> usize {
        ControlBlock::SIZE + self.data_len
    }

    /// Whether this handle created the queue (vs attached to it)
    pub fn was_created(&self) -> bool {
        self.segment.created()
    }

    /// Tear down this handle
    ///
    /// With `unlink` set, destroys the shared mutex and condition variable
    /// and removes the name from the OS namespace so no future process can
    /// attach. The local view is always unmapped and closed. Calling
    /// `destroy(false)` is safe while siblings remain attached; their
    /// mappings stay valid until they unmap. Which side performs the final
    /// unlink is a convention between the cooperating processes, not
    /// enforced here.
    pub fn destroy(self, unlink: bool) -> Result<()> {
        if unlink {
            unsafe { ControlBlock::destroy(self.ctrl)? };
            self.segment.unlink()?;
        }
        Ok(())
    }

    fn check_element_len(&self, len: usize) -> Result<()> {
        if len != self.config.element_size {
            return Err(MqError::length_mismatch(self.config.element_size, len));
        }
        Ok(())
    }

    fn copy_in(&self, offset: usize, element: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(element.len())
            .ok_or_else(|| MqError::resource("Ring offset overflow"))?;
        if end > self.data_len {
            return Err(MqError::resource(format!(
                "Ring write at {}..{} exceeds data region of {} bytes",
                offset, end, self.data_len
            )));
        }
        unsafe {
            ptr::copy_nonoverlapping(element.as_ptr(), self.data.add(offset), element.len());
        }
        Ok(())
    }

    fn copy_out(&self, offset: usize, out: &mut [u8]) -> Result<()> {
        let end = offset
            .checked_add(out.len())
            .ok_or_else(|| MqError::resource("Ring offset overflow"))?;
        if end > self.data_len {
            return Err(MqError::resource(format!(
                "Ring read at {}..{} exceeds data region of {} bytes",
                offset, end, self.data_len
            )));
        }
        unsafe {
            ptr::copy_nonoverlapping(self.data.add(offset), out.as_mut_ptr(), out.len());
        }
        Ok(())
    }
}

unsafe impl Send for SharedQueue {}
unsafe impl Sync for SharedQueue {}
