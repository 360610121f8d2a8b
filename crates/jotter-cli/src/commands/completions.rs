use std::io::{self, Write};
use std::path::Path;

use clap::CommandFactory;
use clap_complete::aot::Generator;
use clap_complete::{generate, shells};

use crate::cli::{Cli, CompletionShell};
use crate::error::CliError;

const BIN_NAME: &str = "jotter";

pub fn completion_script(shell: CompletionShell) -> Vec<u8> {
    match shell {
        CompletionShell::Bash => render(shells::Bash),
        CompletionShell::Zsh => render(shells::Zsh),
        CompletionShell::Fish => render(shells::Fish),
    }
}

pub fn run_completions(shell: CompletionShell, output_path: Option<&Path>) -> Result<(), CliError> {
    let script = completion_script(shell);
    match output_path {
        Some(path) => {
            std::fs::write(path, &script)?;
            println!("{}", path.display());
        }
        None => io::stdout().write_all(&script)?,
    }
    Ok(())
}

fn render(generator: impl Generator) -> Vec<u8> {
    let mut buffer = Vec::new();
    generate(generator, &mut Cli::command(), BIN_NAME, &mut buffer);
    buffer
}
