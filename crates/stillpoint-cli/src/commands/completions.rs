use clap::CommandFactory;
use clap_complete::{generate, Shell};

use super::CmdResult;

pub fn run<C: CommandFactory>(shell: Shell) -> CmdResult {
    let mut cmd = C::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut std::io::stdout());
    Ok(())
}
