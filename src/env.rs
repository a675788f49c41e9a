// Environment detection utilities

/// Check if we're running in a headless environment
///
/// Headless mode is detected when:
/// - `forced` is set (from --headless or the config file)
/// - SSH_TTY or SSH_CONNECTION environment variables are set (SSH session)
/// - TERM is set to "dumb" or is empty
/// - On Linux: DISPLAY environment variable is not set (no X11)
/// - CI environment is detected
///
/// macOS doesn't use DISPLAY, so it is not checked on Darwin.
pub fn is_headless_environment(forced: bool) -> bool {
    if forced {
        tracing::debug!("Headless mode: forced by configuration");
        return true;
    }

    if std::env::var("SSH_TTY").is_ok() {
        tracing::debug!("Headless detected: SSH_TTY set");
        return true;
    }

    if std::env::var("SSH_CONNECTION").is_ok() {
        tracing::debug!("Headless detected: SSH_CONNECTION set");
        return true;
    }

    if std::env::var("CI").is_ok() {
        tracing::debug!("Headless detected: CI environment");
        return true;
    }

    if let Ok(term) = std::env::var("TERM") {
        if term == "dumb" || term.is_empty() {
            tracing::debug!("Headless detected: TERM is '{}'", term);
            return true;
        }
    }

    #[cfg(not(target_os = "macos"))]
    {
        if std::env::var("DISPLAY").is_err() && std::env::var("WAYLAND_DISPLAY").is_err() {
            tracing::debug!("Headless detected: no display server (non-macOS)");
            return true;
        }
    }

    tracing::debug!("Not headless: detected graphical environment");
    false
}
