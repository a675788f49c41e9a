use crate::auth::{AuthManager, TokenCache};
use crate::config::{Config, Paths};
use crate::error::Result;
use crate::session::{self, SessionStore};

pub fn execute(config: &Config, paths: &Paths) -> Result<()> {
    let instance = config.sso_instance()?;

    let auth = AuthManager::new(TokenCache::new(paths.token_dir()), config.headless);
    auth.remove_token(&instance)?;

    let sessions = SessionStore::new(paths.sessions_file());
    if sessions.remove_session(session::current_owner_pid())? {
        // Lets `eval "$(awsw logout)"` clear the shell as well
        println!("unset AWS_PROFILE");
    }

    eprintln!("✓ Logged out successfully");

    Ok(())
}
