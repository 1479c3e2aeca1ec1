// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report whether the master is running

use crate::master::Master;
use crate::output::{self, OutputFormat};
use anyhow::Result;

#[derive(clap::Args)]
pub struct StatusArgs {
    /// Print a JSON object instead of text
    #[arg(long)]
    json: bool,
}

pub fn handle(master: &Master, args: StatusArgs) -> Result<()> {
    let status = master.status()?;
    let format = if args.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };
    output::print(&status, format);
    Ok(())
}
