use crate::cli::ConfigCommand;
use crate::config::{Config, Overrides, Paths};
use crate::error::{AwswError, Result};

pub fn execute(command: ConfigCommand, overrides: &Overrides) -> Result<()> {
    match command {
        ConfigCommand::Init => {
            let path = Config::create_sample()?;
            println!("✓ Created sample config at {}", path.display());
            println!("Edit sso.start_url and sso.region, then run 'awsw login'");
        }
        ConfigCommand::Show => {
            let config_path = Config::config_file_path()?;
            println!("Config file: {}", config_path.display());
            if !config_path.exists() {
                println!("Status: File does not exist (run 'awsw config init')");
            }

            let paths = Paths::resolve()?;
            println!("State directory: {}", paths.state_dir.display());
            println!("AWS credentials: {}", paths.aws_credentials.display());
            println!("AWS config: {}", paths.aws_config.display());

            match Config::load(overrides) {
                Ok(config) => {
                    let rendered = toml::to_string_pretty(&config).map_err(|e| {
                        AwswError::Config(format!("Failed to render config: {}", e))
                    })?;
                    println!("\nEffective configuration:\n{}", rendered);

                    if let Err(e) = config.sso_instance() {
                        println!("Incomplete: {}", e);
                    }
                }
                Err(e) => {
                    println!("Valid: No");
                    println!("Error: {}", e);
                }
            }
        }
    }

    Ok(())
}
