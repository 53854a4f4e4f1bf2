use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rrepl_protocol::InputMode;

#[derive(Parser, Debug)]
#[command(name = "rrepl")]
#[command(about = "Remote evaluation sessions over TCP")]
#[command(version)]
pub struct Cli {
	/// Increase verbosity (-v info, -vv debug, -vvv trace)
	#[arg(short, long, global = true, action = clap::ArgAction::Count)]
	pub verbose: u8,

	/// Read configuration from FILE instead of the default location
	#[arg(long, global = true, value_name = "FILE")]
	pub config: Option<PathBuf>,

	#[command(subcommand)]
	pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
	/// Accept session connections until Ctrl-C
	Serve(SessionArgs),

	/// Run code through a local session and print the transcript
	Eval {
		#[command(flatten)]
		session: SessionArgs,

		/// Input mode to switch to before feeding the code
		#[arg(long, value_name = "MODE")]
		mode: Option<InputMode>,

		/// Chunks of input, fed in order
		#[arg(required = true)]
		code: Vec<String>,
	},

	/// Print the effective configuration as JSON
	Config(SessionArgs),
}

/// Overrides for configuration file values.
#[derive(Args, Debug, Default, Clone)]
pub struct SessionArgs {
	/// Address to listen on
	#[arg(long)]
	pub host: Option<String>,

	/// Port to listen on
	#[arg(long, short)]
	pub port: Option<u16>,

	/// Accept connections from non-loopback peers
	#[arg(long)]
	pub allow_remote: bool,

	/// Script evaluated in every new session before the greeting
	#[arg(long, value_name = "URL")]
	pub init_url: Option<String>,

	/// Base name sessions register under
	#[arg(long, value_name = "BASE")]
	pub name: Option<String>,

	/// Line that ends a unit in multiline mode
	#[arg(long, value_name = "LINE")]
	pub sentinel: Option<String>,
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory;

	use super::*;

	#[test]
	fn command_definition_is_consistent() {
		Cli::command().debug_assert();
	}

	#[test]
	fn serve_flags_parse() {
		let cli = Cli::parse_from(["rrepl", "-vv", "serve", "--port", "5000", "--allow-remote", "--name", "shell"]);
		assert_eq!(cli.verbose, 2);
		let Commands::Serve(args) = cli.command else {
			panic!("expected serve");
		};
		assert_eq!(args.port, Some(5000));
		assert!(args.allow_remote);
		assert_eq!(args.name.as_deref(), Some("shell"));
	}

	#[test]
	fn eval_accepts_mode_aliases() {
		let cli = Cli::parse_from(["rrepl", "eval", "--mode", "syntax-incremental", "1 + 1"]);
		let Commands::Eval { mode, code, .. } = cli.command else {
			panic!("expected eval");
		};
		assert_eq!(mode, Some(InputMode::Syntax));
		assert_eq!(code, vec!["1 + 1".to_string()]);
	}
}
