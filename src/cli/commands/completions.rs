use crate::cli::{Cli, Shell};
use clap::CommandFactory;
use clap_complete::{generate, Shell as ClapShell};
use std::io;

const BIN_NAME: &str = "awsw";

fn clap_shell(shell: Shell) -> ClapShell {
    match shell {
        Shell::Bash => ClapShell::Bash,
        Shell::Zsh => ClapShell::Zsh,
        Shell::Fish => ClapShell::Fish,
        Shell::PowerShell => ClapShell::PowerShell,
        Shell::Elvish => ClapShell::Elvish,
    }
}

pub fn execute(shell: Shell) {
    let mut cmd = Cli::command();
    generate(clap_shell(shell), &mut cmd, BIN_NAME, &mut io::stdout());

    // Install hints go to stderr so the script can be redirected cleanly
    match shell {
        Shell::Bash => eprintln!("# Add to ~/.bashrc: eval \"$(awsw completions bash)\""),
        Shell::Zsh => eprintln!("# Add to ~/.zshrc: eval \"$(awsw completions zsh)\""),
        Shell::Fish => {
            eprintln!("# Save with: awsw completions fish > ~/.config/fish/completions/awsw.fish")
        }
        Shell::PowerShell => {
            eprintln!("# Add to profile: awsw completions powershell | Out-String | Invoke-Expression")
        }
        Shell::Elvish => eprintln!("# Add to rc.elv: eval (awsw completions elvish | slurp)"),
    }
}
