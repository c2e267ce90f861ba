use std::fmt;
use std::io;
use std::path::Path;

use anyhow::Context;
use filetime::FileTime;

/// Set modify and access time to `epoch` seconds.
pub fn set_modify_access_time(path: &Path, epoch: i64) -> anyhow::Result<()> {
    let ft = FileTime::from_unix_time(epoch, 0);
    filetime::set_file_times(path, ft, ft)
        .with_context(|| format!("Setting file times of {}", path.display()))
}

/// Whether this platform lets us set a file's creation time (birthtime).
/// Probed once at startup and handed to the writer through `WriterConfig`.
pub fn creation_time_write_supported() -> bool {
    cfg!(any(windows, target_os = "macos"))
}

/// Failure of the creation-time store.
#[derive(Debug)]
pub enum BirthtimeError {
    /// The platform has no call for setting birthtime
    CapabilityUnavailable,
    Io(io::Error),
}

impl fmt::Display for BirthtimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BirthtimeError::CapabilityUnavailable => {
                write!(f, "capability-unavailable: creation time cannot be set on this platform")
            }
            BirthtimeError::Io(e) => write!(f, "setting creation time: {}", e),
        }
    }
}

impl std::error::Error for BirthtimeError {}

/// Set the creation time to `epoch` seconds, leaving the other times alone.
pub fn set_creation_time(path: &Path, epoch: i64, supported: bool) -> Result<(), BirthtimeError> {
    if !supported {
        return Err(BirthtimeError::CapabilityUnavailable);
    }
    platform::set_created(path, epoch).map_err(BirthtimeError::Io)
}

#[cfg(any(windows, target_os = "macos"))]
mod platform {
    use std::fs::{FileTimes, OpenOptions};
    use std::io;
    #[cfg(target_os = "macos")]
    use std::os::macos::fs::FileTimesExt;
    #[cfg(windows)]
    use std::os::windows::fs::FileTimesExt;
    use std::path::Path;
    use std::time::{Duration, SystemTime, UNIX_EPOCH};

    fn system_time(epoch: i64) -> io::Result<SystemTime> {
        let offset = Duration::from_secs(epoch.unsigned_abs());
        let t = if epoch >= 0 {
            UNIX_EPOCH.checked_add(offset)
        } else {
            UNIX_EPOCH.checked_sub(offset)
        };
        t.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "timestamp out of range"))
    }

    pub fn set_created(path: &Path, epoch: i64) -> io::Result<()> {
        let created = system_time(epoch)?;
        let file = OpenOptions::new().write(true).open(path)?;
        file.set_times(FileTimes::new().set_created(created))
    }
}

#[cfg(not(any(windows, target_os = "macos")))]
mod platform {
    use std::io;
    use std::path::Path;

    pub fn set_created(_path: &Path, _epoch: i64) -> io::Result<()> {
        Err(io::Error::new(io::ErrorKind::Unsupported, "no birthtime syscall"))
    }
}
