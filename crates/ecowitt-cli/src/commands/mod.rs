//! Command implementations for the CLI.

mod config;
mod discover;
mod info;
mod read;
mod sensors;
mod settings;

pub use config::cmd_config;
pub use discover::{cmd_discover, cmd_listen};
pub use info::{cmd_firmware, cmd_mac, cmd_system_params};
pub use read::{cmd_live_data, cmd_rain};
pub use sensors::cmd_sensors;
pub use settings::{cmd_calibration, cmd_offsets, cmd_services};

use std::path::PathBuf;

use anyhow::Result;
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::config::Config;
use crate::format::{FormatOptions, format_record_csv, format_record_text};
use crate::util::write_output;

/// State shared by every command.
#[derive(Debug)]
pub struct CommandContext<'a> {
    pub config: &'a Config,
    pub config_path: PathBuf,
    pub output: Option<&'a PathBuf>,
    pub quiet: bool,
    pub format: OutputFormat,
    pub opts: FormatOptions,
}

impl CommandContext<'_> {
    /// Write a settings record in the selected format.
    fn emit_record<T: Serialize>(&self, record: &T) -> Result<()> {
        let content = match self.format {
            OutputFormat::Json => self.opts.as_json(record)?,
            OutputFormat::Text => format_record_text(record, &self.opts)?,
            OutputFormat::Csv => format_record_csv(record)?,
        };
        write_output(self.output, &content)
    }
}
