//! `config` commands

use super::Context;
use crate::config::{Config, KEYS};
use anyhow::Result;
use clap::{Args, Subcommand};

#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

impl ConfigArgs {
    pub(super) fn path(&self) -> String {
        let path = match self.command {
            ConfigCommand::List => "list",
            ConfigCommand::Set { .. } => "set",
            ConfigCommand::Unset { .. } => "unset",
        };
        path.to_string()
    }
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show the properties that are set
    List,
    /// Set a property
    Set {
        #[arg(value_parser = clap::builder::PossibleValuesParser::new(KEYS.iter().copied()))]
        key: String,
        value: String,
    },
    /// Remove a property
    Unset {
        #[arg(value_parser = clap::builder::PossibleValuesParser::new(KEYS.iter().copied()))]
        key: String,
    },
}

pub(super) fn run(ctx: &Context, args: ConfigArgs) -> Result<()> {
    let mut config: Config = ctx.config.clone();

    match args.command {
        ConfigCommand::List => {
            let entries = config.entries();
            if entries.is_empty() {
                eprintln!("No properties set.");
            }
            for (key, value) in entries {
                println!("{} = {}", key, value);
            }
            return Ok(());
        }
        ConfigCommand::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            eprintln!("Updated property [{}].", key);
        }
        ConfigCommand::Unset { key } => {
            config.unset(&key)?;
            config.save()?;
            eprintln!("Unset property [{}].", key);
        }
    }
    Ok(())
}
