//! `portsmith build` command

use anyhow::Result;

use crate::config::defaults;
use crate::core::builder::Builder;

pub fn execute(builder: &Builder, port: Option<&str>) -> Result<()> {
    let selector = port.unwrap_or(defaults::ALL_PORTS);
    builder.build(selector)?;
    Ok(())
}
