use crate::config::Paths;
use crate::error::Result;
use crate::session::SessionStore;

pub fn execute(paths: &Paths) -> Result<()> {
    let removed = SessionStore::new(paths.sessions_file()).cleanup_stale()?;

    match removed {
        0 => println!("No stale sessions"),
        1 => println!("✓ Removed 1 stale session"),
        n => println!("✓ Removed {} stale sessions", n),
    }

    Ok(())
}
