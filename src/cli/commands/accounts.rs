use crate::config::Paths;
use crate::directory::AccountCache;
use crate::error::{AwswError, Result};

pub fn execute(paths: &Paths, name: Option<&str>) -> Result<()> {
    let cache = AccountCache::new(paths.accounts_file());

    if let Some(name) = name {
        let account = cache.find_by_name(name).ok_or_else(|| {
            AwswError::AccountCache(format!("Account '{}' not found in cache", name))
        })?;
        println!("{}\t{}", account.id, account.display_name);
        return Ok(());
    }

    let cached = cache.load().ok_or_else(|| {
        AwswError::AccountCache("No cached accounts; run 'awsw login' first".to_string())
    })?;

    eprintln!(
        "{} accounts, listed {}",
        cached.accounts.len(),
        cached.updated_at.format("%Y-%m-%d %H:%M UTC")
    );
    for account in &cached.accounts {
        println!("{}\t{}", account.id, account.display_name);
    }

    Ok(())
}
