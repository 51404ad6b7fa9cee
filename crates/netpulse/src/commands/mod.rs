//! Command dispatch: bridges CLI args -> poller -> output formatting.

pub mod config_cmd;
pub mod devices;
pub mod history;
pub mod poll;
pub mod run;
pub mod util;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Run(args) => run::handle(args, global).await,
        Command::Poll(args) => poll::handle(args, global).await,
        Command::Devices(args) => devices::handle(&args, global),
        Command::History(args) => history::handle(args, global).await,
        Command::Config(args) => config_cmd::handle(&args, global),
    }
}
