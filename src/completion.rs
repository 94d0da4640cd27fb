//! # Shell Completion Module
//!
//! ```bash
//! segue completion bash > ~/.local/share/bash-completion/completions/segue
//! segue completion zsh > ~/.config/zsh/completions/_segue
//! ```

use crate::cli::Shell;
use clap::Command;
use clap_complete::{generate, Generator, Shell as CompletionShell};
use std::io::{self, Write};

/// Write completions for `cmd` to `out`.
pub fn write_completions<G: Generator>(gen: G, cmd: &mut Command, out: &mut dyn Write) {
    let name = cmd.get_name().to_string();
    generate(gen, cmd, name, out);
}

/// Generate shell completions for the given shell on stdout
pub fn generate_completions<G: Generator>(gen: G, cmd: &mut Command) {
    write_completions(gen, cmd, &mut io::stdout());
}

/// Convert our Shell enum to clap_complete Shell
#[must_use]
pub const fn shell_to_completion_shell(shell: &Shell) -> CompletionShell {
    match shell {
        Shell::Bash => CompletionShell::Bash,
        Shell::Zsh => CompletionShell::Zsh,
        Shell::Fish => CompletionShell::Fish,
        Shell::PowerShell => CompletionShell::PowerShell,
        Shell::Elvish => CompletionShell::Elvish,
    }
}
