// Process liveness and shell ownership

/// Answers whether a process id still refers to a running process
pub trait LivenessCheck {
    fn is_alive(&self, pid: u32) -> bool;
}

impl<F> LivenessCheck for F
where
    F: Fn(u32) -> bool,
{
    fn is_alive(&self, pid: u32) -> bool {
        self(pid)
    }
}

/// Check backed by the OS process table
pub struct OsLivenessCheck;

impl LivenessCheck for OsLivenessCheck {
    fn is_alive(&self, pid: u32) -> bool {
        is_process_alive(pid)
    }
}

fn is_process_alive(pid: u32) -> bool {
    // pid 0 addresses the caller's process group
    if pid == 0 {
        return false;
    }

    #[cfg(unix)]
    {
        use nix::errno::Errno;
        use nix::sys::signal::kill;
        use nix::unistd::Pid;

        let Ok(raw) = i32::try_from(pid) else {
            return false;
        };
        // EPERM means the process exists but belongs to another user
        match kill(Pid::from_raw(raw), None) {
            Ok(()) => true,
            Err(Errno::EPERM) => true,
            Err(_) => false,
        }
    }

    #[cfg(not(unix))]
    {
        std::process::Command::new("tasklist")
            .args(["/FI", &format!("PID eq {}", pid), "/NH"])
            .output()
            .map(|output| String::from_utf8_lossy(&output.stdout).contains(&pid.to_string()))
            .unwrap_or(true)
    }
}

/// Process id that owns sessions created by this invocation
///
/// This is the parent of the CLI process, normally the interactive shell, so
/// every command typed into the same shell resolves to the same session.
pub fn current_owner_pid() -> u32 {
    #[cfg(unix)]
    {
        std::os::unix::process::parent_id()
    }

    #[cfg(not(unix))]
    {
        tracing::debug!("Parent process id unavailable, using own pid as session owner");
        std::process::id()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_process_is_alive() {
        assert!(OsLivenessCheck.is_alive(std::process::id()));
    }

    #[test]
    fn test_pid_zero_is_never_alive() {
        assert!(!OsLivenessCheck.is_alive(0));
    }

    #[cfg(unix)]
    #[test]
    fn test_exited_child_is_not_alive() {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        assert!(!OsLivenessCheck.is_alive(pid));
    }

    #[cfg(unix)]
    #[test]
    fn test_owner_is_parent_process() {
        assert_ne!(current_owner_pid(), std::process::id());
        assert!(OsLivenessCheck.is_alive(current_owner_pid()));
    }

    #[test]
    fn test_closure_check() {
        let check = |pid: u32| pid % 2 == 0;
        assert!(check.is_alive(4));
        assert!(!check.is_alive(5));
    }
}
