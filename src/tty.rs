//! Terminal I/O utilities for the CLI.

use std::io::{self, IsTerminal};

/// Whether stdin is a non-interactive stream with pending data.
///
/// A CI job usually runs with stdin attached to /dev/null or another
/// character device; that must fall through to candidate discovery rather
/// than read as an empty pipe.
pub fn stdin_is_readable() -> bool {
    if io::stdin().is_terminal() {
        return false;
    }

    #[cfg(unix)]
    {
        fd_has_pending_input(libc::STDIN_FILENO)
    }
    #[cfg(not(unix))]
    {
        true
    }
}

/// A pipe counts even before the writer produces bytes; a redirected
/// regular file counts only when it has content. Character devices
/// (/dev/null in particular) never do.
#[cfg(unix)]
fn fd_has_pending_input(fd: std::os::fd::RawFd) -> bool {
    use std::mem::MaybeUninit;

    let mut stat = MaybeUninit::<libc::stat>::uninit();
    if unsafe { libc::fstat(fd, stat.as_mut_ptr()) } != 0 {
        return false;
    }
    let stat = unsafe { stat.assume_init() };

    match stat.st_mode & libc::S_IFMT {
        libc::S_IFIFO => true,
        libc::S_IFREG => stat.st_size > 0,
        _ => false,
    }
}
