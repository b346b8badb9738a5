//! Named POSIX shared-memory segment lifecycle

use std::{
    os::fd::{AsRawFd, OwnedFd},
    thread,
    time::Duration,
};

use memmap2::{MmapMut, MmapOptions};
use nix::{
    errno::Errno,
    fcntl::OFlag,
    sys::mman::{shm_open, shm_unlink},
    sys::stat::{fstat, Mode},
    unistd::ftruncate,
};

use crate::error::{MqError, Result};

use super::config::SegmentConfig;

/// How long an attacher waits for the creator to size the segment.
const ATTACH_SIZE_TIMEOUT: Duration = Duration::from_secs(2);
const ATTACH_POLL_INTERVAL: Duration = Duration::from_millis(1);

/// A named shared-memory segment mapped into this process
///
/// The first process to open a name creates and sizes the object; later
/// openers attach to the existing object. Dropping the segment unmaps and
/// closes the local view only; [`SharedSegment::unlink`] removes the name
/// from the OS namespace.
#[derive(Debug)]
pub struct SharedSegment {
    /// Normalized OS-level name (leading slash)
    name: String,
    /// Memory-mapped view, kept alive for as long as raw pointers are handed out
    mmap: MmapMut,
    /// Owned descriptor for the shm object
    _fd: OwnedFd,
    /// Whether this call created the object (vs attached to an existing one)
    created: bool,
    /// Mapped size in bytes
    size: usize,
}

impl SharedSegment {
    /// Open or create a named segment per the configuration
    ///
    /// With `config.create` set, creation is attempted exclusively first so
    /// exactly one of any number of racing openers becomes the creator; the
    /// losers attach to the object the winner is initializing. With
    /// `config.create` unset the call attaches only and fails when the name
    /// does not exist.
    pub fn open_or_create(config: &SegmentConfig) -> Result<Self> {
        config.validate()?;

        let os_name = config.os_name();
        let mode = Mode::from_bits_truncate(config.permissions);

        let (fd, created) = if config.create {
            match shm_open(
                os_name.as_str(),
                OFlag::O_RDWR | OFlag::O_CREAT | OFlag::O_EXCL,
                mode,
            ) {
                Ok(fd) => (fd, true),
                Err(Errno::EEXIST) => (Self::open_existing(&os_name, mode)?, false),
                Err(e) => {
                    return Err(MqError::resource(format!(
                        "Failed to create shared memory object {}: {}",
                        os_name, e
                    )))
                }
            }
        } else {
            (Self::open_existing(&os_name, mode)?, false)
        };

        if created {
            ftruncate(&fd, config.size as libc::off_t).map_err(|e| {
                MqError::resource(format!("Failed to size shared memory object: {}", e))
            })?;
        } else {
            Self::wait_for_size(&fd, config.size)?;
        }

        let mmap = unsafe {
            MmapOptions::new()
                .len(config.size)
                .map_mut(&fd)
                .map_err(|e| MqError::from_io(e, "Failed to map shared memory object"))?
        };

        Ok(Self {
            name: os_name,
            mmap,
            _fd: fd,
            created,
            size: config.size,
        })
    }

    fn open_existing(os_name: &str, mode: Mode) -> Result<OwnedFd> {
        match shm_open(os_name, OFlag::O_RDWR, mode) {
            Ok(fd) => Ok(fd),
            Err(Errno::ENOENT) => Err(MqError::queue_not_found(os_name)),
            Err(e) => Err(MqError::resource(format!(
                "Failed to open shared memory object {}: {}",
                os_name, e
            ))),
        }
    }

    /// Attachers may observe the object between creation and sizing; wait
    /// until the creator's ftruncate is visible before mapping.
    fn wait_for_size(fd: &OwnedFd, expected: usize) -> Result<()> {
        let deadline = std::time::Instant::now() + ATTACH_SIZE_TIMEOUT;
        loop {
            let stat = fstat(fd.as_raw_fd())
                .map_err(|e| MqError::resource(format!("Failed to stat shm object: {}", e)))?;
            if stat.st_size as usize >= expected {
                return Ok(());
            }
            if std::time::Instant::now() >= deadline {
                return Err(MqError::resource(format!(
                    "Shared memory object never reached expected size ({} < {})",
                    stat.st_size, expected
                )));
            }
            thread::sleep(ATTACH_POLL_INTERVAL);
        }
    }

    /// Whether this handle created the underlying object
    pub fn created(&self) -> bool {
        self.created
    }

    /// Mapped size in bytes
    pub fn size(&self) -> usize {
        self.size
    }

    /// Normalized OS-level name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get a raw pointer to the start of the mapping
    pub fn as_ptr(&self) -> *const u8 {
        self.mmap.as_ptr()
    }

    /// Get a mutable raw pointer to the start of the mapping
    ///
    /// # Safety
    /// Caller must serialize access to the pointed-to memory; the mapping is
    /// shared with other processes.
    pub unsafe fn as_mut_ptr_unsafe(&self) -> *mut u8 {
        self.mmap.as_ptr() as *mut u8
    }

    /// Remove this segment's name from the OS namespace
    ///
    /// Existing mappings (local and in sibling processes) stay valid until
    /// each holder unmaps; only future opens by name are affected.
    pub fn unlink(&self) -> Result<()> {
        Self::unlink_name(&self.name)
    }

    /// Remove a segment name from the OS namespace without opening it
    pub fn unlink_name(name: &str) -> Result<()> {
        let os_name = if name.starts_with('/') {
            name.to_string()
        } else {
            format!("/{}", name)
        };
        match shm_unlink(os_name.as_str()) {
            Ok(()) => Ok(()),
            Err(Errno::ENOENT) => Err(MqError::queue_not_found(os_name)),
            Err(e) => Err(MqError::resource(format!(
                "Failed to unlink shared memory object {}: {}",
                os_name, e
            ))),
        }
    }
}

unsafe impl Send for SharedSegment {}
unsafe impl Sync for SharedSegment {}
