use crate::auth::{AuthManager, TokenCache};
use crate::config::{Config, Paths};
use crate::directory::SdkPortal;
use crate::env;
use crate::error::Result;
use crate::login::{LoginRequest, LoginWorkflow};
use crate::select::TerminalPicker;

pub async fn execute(config: &Config, paths: &Paths, request: &LoginRequest) -> Result<()> {
    let instance = config.sso_instance()?;
    let headless = env::is_headless_environment(config.headless);

    let auth = AuthManager::new(TokenCache::new(paths.token_dir()), headless);
    let portal = SdkPortal::new(&instance.region).await;
    let picker = TerminalPicker;

    let workflow = LoginWorkflow::new(config, paths, auth, portal, &picker)?;
    let outcome = workflow.run(request).await?;

    // stdout carries only what the shell should evaluate
    for line in outcome.export_lines() {
        println!("{}", line);
    }

    Ok(())
}
