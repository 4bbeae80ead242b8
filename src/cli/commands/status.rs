//! `portsmith status` command

use anyhow::Result;

use crate::core::builder::Builder;
use crate::core::recipe::RecipeStatus;

pub fn execute(builder: &Builder, json: bool) -> Result<()> {
    let statuses = builder.status();
    if json {
        println!("{}", serde_json::to_string_pretty(&statuses)?);
        return Ok(());
    }

    for status in &statuses {
        println!("{}", render(status));
    }
    Ok(())
}

/// One line per port: `<name-version (filename) [ Configured ] [ Built ]>`
fn render(status: &RecipeStatus) -> String {
    let mut line = format!(
        "<{}-{} ({})",
        status.name, status.version, status.filename
    );
    if status.extracted {
        line.push_str(" [ Extracted ]");
    }
    if status.patched {
        line.push_str(" [ Patched ]");
    }
    if status.configured {
        line.push_str(" [ Configured ]");
    }
    if status.built {
        line.push_str(" [ Built ]");
    }
    if status.installed {
        line.push_str(" [ Installed ]");
    }
    line.push('>');
    line
}
