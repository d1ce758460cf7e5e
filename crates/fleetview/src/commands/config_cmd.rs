//! `config show` and `config path`. Neither touches the network.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config;
use crate::error::CliError;
use crate::output;

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Path => {
            let path = global
                .config
                .clone()
                .unwrap_or_else(fleetview_config::config_path);
            output::print_output(&path.display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load(global)?.redacted();
            let view = config::presentation(&cfg, global)?;
            let rendered = match view.format {
                // TOML reads like the file the user edits.
                OutputFormat::Table | OutputFormat::Plain => cfg.to_toml()?,
                format => output::render_single(format, &cfg, |_| String::new(), |_| String::new())?,
            };
            output::print_output(rendered.trim_end(), view.quiet);
            Ok(())
        }
    }
}
