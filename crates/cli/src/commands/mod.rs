mod config;
mod eval;
mod serve;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands};
use crate::config::{self as file_config, Settings};

pub async fn dispatch(cli: Cli) -> Result<()> {
	let file = file_config::load(cli.config.as_deref()).context("failed to load configuration")?;

	match cli.command {
		Commands::Serve(args) => serve::run(&Settings::resolve(file, &args)).await?,
		Commands::Eval { session, mode, code } => eval::run(&Settings::resolve(file, &session), mode, &code),
		Commands::Config(args) => config::show(&Settings::resolve(file, &args))?,
	}

	Ok(())
}
