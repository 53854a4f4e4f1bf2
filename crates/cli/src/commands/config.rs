use anyhow::Result;

use crate::config::Settings;

pub fn show(settings: &Settings) -> Result<()> {
	println!("{}", serde_json::to_string_pretty(settings)?);
	Ok(())
}
