// CLI interface
pub mod commands;

use crate::config::{Config, Overrides, Paths};
use crate::error::Result;
use crate::login::LoginRequest;
use crate::session;
use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "awsw")]
#[command(about = "Per-shell AWS SSO credential profiles", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// SSO start URL
    #[arg(long, env = "AWS_SSO_START_URL", global = true)]
    pub start_url: Option<String>,

    /// SSO region
    #[arg(long, env = "AWS_SSO_REGION", global = true)]
    pub region: Option<String>,

    /// Never open a browser; print the device code instead
    #[arg(long, global = true)]
    pub headless: bool,

    /// Enable verbose/debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Resolve credentials and bind a profile to the current shell
    ///
    /// Progress goes to stderr and the export lines to stdout, so the usual
    /// invocation is:
    ///
    ///   eval "$(awsw login --account Dev --role Admin)"
    Login {
        /// Force re-authentication
        #[arg(short, long)]
        force: bool,

        /// Account name to select without prompting (case-insensitive)
        #[arg(short, long)]
        account: Option<String>,

        /// Role name to select without prompting (case-insensitive)
        #[arg(short, long)]
        role: Option<String>,
    },

    /// Show the session bound to the current shell
    Whoami,

    /// List all recorded sessions
    Sessions,

    /// Remove sessions whose shell has exited
    Cleanup,

    /// Show accounts from the last successful listing
    Accounts {
        /// Look up a single account by name
        name: Option<String>,
    },

    /// Remove the cached SSO token and this shell's session
    Logout,

    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Generate shell completion scripts
    ///
    /// INSTALLATION:
    ///
    /// Bash:
    ///   eval "$(awsw completions bash)"    # Add to ~/.bashrc
    ///
    /// Zsh:
    ///   eval "$(awsw completions zsh)"     # Add to ~/.zshrc
    ///
    /// Fish:
    ///   awsw completions fish > ~/.config/fish/completions/awsw.fish
    Completions {
        /// Shell type to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigCommand {
    /// Write a commented sample config file
    Init,
    /// Print the effective configuration and file locations
    Show,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[allow(clippy::enum_variant_names)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
    Elvish,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        Overrides {
            start_url: self.start_url.clone(),
            region: self.region.clone(),
            headless: self.headless,
        }
    }
}

pub async fn execute(args: Cli) -> Result<()> {
    let overrides = args.overrides();

    match args.command {
        Commands::Login {
            force,
            account,
            role,
        } => {
            let config = Config::load(&overrides)?;
            let paths = Paths::resolve()?;
            let request = LoginRequest {
                force,
                account,
                role,
                owner_pid: session::current_owner_pid(),
            };
            commands::login::execute(&config, &paths, &request).await
        }
        Commands::Whoami => commands::whoami::execute(&Paths::resolve()?),
        Commands::Sessions => commands::sessions::execute(&Paths::resolve()?),
        Commands::Cleanup => commands::cleanup::execute(&Paths::resolve()?),
        Commands::Accounts { name } => {
            commands::accounts::execute(&Paths::resolve()?, name.as_deref())
        }
        Commands::Logout => {
            let config = Config::load(&overrides)?;
            commands::logout::execute(&config, &Paths::resolve()?)
        }
        Commands::Config { command } => commands::config::execute(command, &overrides),
        Commands::Completions { shell } => {
            commands::completions::execute(shell);
            Ok(())
        }
    }
}
