//! `init`: write a starter configuration.

use linkwatch_config::{config_path, save_config, starter_config};

use crate::cli::{GlobalOpts, InitArgs};
use crate::error::CliError;

pub fn handle(args: InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let path = args
        .path
        .or_else(|| global.config.clone())
        .unwrap_or_else(config_path);

    if path.exists() && !args.force {
        return Err(CliError::AlreadyExists {
            path: path.display().to_string(),
        });
    }

    save_config(&starter_config(), &path)?;
    if !global.quiet {
        eprintln!("Wrote {}", path.display());
    }
    Ok(())
}
