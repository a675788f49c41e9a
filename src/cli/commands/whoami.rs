use crate::config::Paths;
use crate::error::Result;
use crate::expiry;
use crate::profile::ProfileWriter;
use crate::session::{self, SessionStore};

const EXPIRY_WARNING_MINUTES: i64 = 10;

pub fn execute(paths: &Paths) -> Result<()> {
    let sessions = SessionStore::new(paths.sessions_file());
    let session = sessions.get_session(session::current_owner_pid())?;

    println!("{}", session.full_display());
    println!("  Profile: {}", session.profile_name);
    println!(
        "  Since:   {}",
        session.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );

    // The profile may have been edited or removed by hand since login
    let profiles = ProfileWriter::new(paths, None, None);
    match profiles.find_profile(&session.profile_name)? {
        Some(profile) => match profile.expiration {
            Some(expiration) => {
                let soon = if expiry::is_expiring_soon(&expiration, EXPIRY_WARNING_MINUTES) {
                    " (run 'awsw login' to refresh)"
                } else {
                    ""
                };
                println!(
                    "  Credentials expire in: {}{}",
                    expiry::format_time_remaining(&expiration),
                    soon
                );
            }
            None => println!("  Credentials expiration unknown"),
        },
        None => println!("  Profile no longer present in {}", paths.aws_credentials.display()),
    }

    Ok(())
}
