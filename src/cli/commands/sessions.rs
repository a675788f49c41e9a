use crate::config::Paths;
use crate::error::Result;
use crate::session::{self, LivenessCheck, OsLivenessCheck, SessionStore};

pub fn execute(paths: &Paths) -> Result<()> {
    let sessions = SessionStore::new(paths.sessions_file()).list_sessions()?;

    if sessions.is_empty() {
        println!("No sessions recorded");
        return Ok(());
    }

    let current = session::current_owner_pid();

    println!("{:<3}{:<10}{:<8}{:<32}PROFILE", "", "SHELL", "STATE", "ACCOUNT/ROLE");
    for s in &sessions {
        let marker = if s.owner_pid == current { "*" } else { "" };
        let state = if OsLivenessCheck.is_alive(s.owner_pid) {
            "alive"
        } else {
            "stale"
        };
        println!(
            "{:<3}{:<10}{:<8}{:<32}{}",
            marker,
            s.owner_pid,
            state,
            s.display_name(),
            s.profile_name
        );
    }

    Ok(())
}
