//! Settings for the FIMS CLI
//!
//! Read from `FIMS_*` environment variables, after loading a `.env` file
//! from the working directory when one exists.

use crate::error::{CliError, Result};
use crate::output::OutputFormat;
use fims_common::logging::{LogConfig, LogLevel, LogOutput};

/// Environment variable holding the default output format
pub const OUTPUT_FORMAT_ENV: &str = "FIMS_OUTPUT_FORMAT";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Output format used when `--format` is not given
    pub format: OutputFormat,

    /// Logging setup, see [`LogConfig::from_env`] for the variables
    pub log: LogConfig,
}

impl Settings {
    /// Load `.env` into the process environment
    ///
    /// Must run before argument parsing so `clap` sees the values.
    pub fn load_dotenv() {
        // a missing .env is fine
        let _ = dotenvy::dotenv();
    }

    /// Settings for a run; `verbose` lowers the default log level to debug
    pub fn from_env(verbose: bool) -> Result<Self> {
        let level = if verbose { LogLevel::Debug } else { LogLevel::Warn };
        let log = LogConfig::builder()
            .level(level)
            .output(LogOutput::Console)
            .log_file_prefix("fims-cli")
            .build()
            .merge_env()
            .map_err(|e| CliError::config(e.to_string()))?;

        let format = match std::env::var(OUTPUT_FORMAT_ENV) {
            Ok(value) => value.parse().map_err(CliError::config)?,
            Err(_) => OutputFormat::default(),
        };

        Ok(Self { format, log })
    }

    /// Output format, with the command line flag taking precedence
    pub fn output_format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.unwrap_or(self.format)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_settings_from_env() {
        std::env::set_var(OUTPUT_FORMAT_ENV, "json");
        let settings = Settings::from_env(true).unwrap();
        std::env::remove_var(OUTPUT_FORMAT_ENV);

        assert_eq!(settings.format, OutputFormat::Json);
        assert_eq!(settings.output_format(Some(OutputFormat::Text)), OutputFormat::Text);
        assert_eq!(settings.output_format(None), OutputFormat::Json);
    }

    #[test]
    #[serial]
    fn test_bad_output_format() {
        std::env::set_var(OUTPUT_FORMAT_ENV, "yaml");
        let result = Settings::from_env(false);
        std::env::remove_var(OUTPUT_FORMAT_ENV);

        assert!(matches!(result, Err(CliError::Config(_))));
    }

    #[test]
    #[serial]
    fn test_defaults_without_env() {
        std::env::remove_var(OUTPUT_FORMAT_ENV);
        let settings = Settings::from_env(false).unwrap();
        assert_eq!(settings.format, OutputFormat::Text);
    }
}
