//! `portsmith fetch` command

use anyhow::Result;

use crate::cli::output::status;
use crate::config::defaults;
use crate::core::builder::Builder;

pub fn execute(builder: &Builder, port: Option<&str>) -> Result<()> {
    let selector = port.unwrap_or(defaults::ALL_PORTS);
    builder.fetch(selector)?;
    println!(
        "{} distfiles cached in {}",
        status::SUCCESS,
        builder.config().distfiles.display()
    );
    Ok(())
}
