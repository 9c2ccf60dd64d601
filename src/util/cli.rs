/* This file is part of DarkFi (https://dark.fi)
 *
 * Copyright (C) 2020-2026 Dyne.org foundation
 *
 * This program is free software: you can redistribute it and/or modify
 * it under the terms of the GNU Affero General Public License as
 * published by the Free Software Foundation, either version 3 of the
 * License, or (at your option) any later version.
 *
 * This program is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 * GNU Affero General Public License for more details.
 *
 * You should have received a copy of the GNU Affero General Public License
 * along with this program.  If not, see <https://www.gnu.org/licenses/>.
 */

use std::{
    fs::{self, File, OpenOptions},
    io::Write,
    path::Path,
};

use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, LevelFilter, SharedLogger, TermLogger,
    TerminalMode, WriteLogger,
};

use super::path::expand_path;
use crate::Result;

/// Description string for `structopt`, built from the package metadata.
#[macro_export]
macro_rules! cli_desc {
    () => {{
        let desc = format!(
            "{} {}\n{}\n",
            env!("CARGO_PKG_NAME"),
            env!("CARGO_PKG_VERSION"),
            env!("CARGO_PKG_DESCRIPTION"),
        );

        Box::leak(desc.into_boxed_str()) as &'static str
    }};
}

/// Generate `main()` for a binary: load `Args` from the command line
/// and its TOML config (written from `CONFIG_FILE_CONTENTS` on first
/// run), set up logging and run `$realmain(args)` on a tokio runtime.
///
/// The caller must have `Args`, `CONFIG_FILE` and `CONFIG_FILE_CONTENTS`
/// in scope, with `Args` providing `config`, `log` and `verbose`.
#[macro_export]
macro_rules! async_daemonize {
    ($realmain:ident) => {
        fn main() -> $crate::Result<()> {
            let args = Args::from_args_with_toml("").map_err(|e| {
                $crate::Error::ConfigError(format!("Failed parsing arguments: {}", e))
            })?;
            let cfg_path = $crate::util::path::get_config_path(args.config, CONFIG_FILE)?;
            $crate::util::cli::spawn_config(&cfg_path, CONFIG_FILE_CONTENTS.as_bytes())?;

            let args = Args::from_args_with_toml(&std::fs::read_to_string(&cfg_path)?)
                .map_err(|e| {
                    $crate::Error::ConfigError(format!(
                        "Failed parsing config {}: {}",
                        cfg_path.display(),
                        e
                    ))
                })?;

            $crate::util::cli::init_logger(args.verbose, args.log.as_deref())?;

            let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
            let result = runtime.block_on($realmain(args));

            if let Err(ref e) = result {
                log::error!("{}", e);
            }

            result
        }
    };
}

/// Write the default config to `path` if nothing is there yet.
pub fn spawn_config(path: &Path, contents: &[u8]) -> Result<()> {
    if !path.exists() {
        if let Some(parent) = path.parent() {
            println!("Creating config path: {}", path.display());
            fs::create_dir_all(parent)?;
        }

        let mut file = File::create(path)?;
        file.write_all(contents)?;
        println!("Config file created in {}. Please review it and try again.", path.display());
    }

    Ok(())
}

pub fn get_log_level(verbosity_level: u64) -> LevelFilter {
    match verbosity_level {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// Logger config, silencing the HTTP stack underneath the provider.
pub fn get_log_config() -> simplelog::Config {
    ConfigBuilder::new()
        .set_target_level(LevelFilter::Error)
        .set_location_level(LevelFilter::Off)
        .add_filter_ignore_str("hyper")
        .add_filter_ignore_str("reqwest")
        .add_filter_ignore_str("rustls")
        .add_filter_ignore_str("ethers_providers")
        .build()
}

/// Log to stderr, and additionally append to `log_file` when given.
pub fn init_logger(verbose: u8, log_file: Option<&str>) -> Result<()> {
    let log_level = get_log_level(verbose.into());
    let log_config = get_log_config();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![];
    loggers.push(TermLogger::new(
        log_level,
        log_config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    ));

    if let Some(log_file) = log_file {
        let path = expand_path(log_file)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        loggers.push(WriteLogger::new(log_level, log_config, file));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_levels() {
        assert_eq!(get_log_level(0), LevelFilter::Info);
        assert_eq!(get_log_level(1), LevelFilter::Debug);
        assert_eq!(get_log_level(5), LevelFilter::Trace);
    }

    #[test]
    fn config_written_once() {
        let dir = std::env::temp_dir().join(format!("nftdao-spawn-{}", std::process::id()));
        let path = dir.join("daocli_config.toml");
        let _ = fs::remove_dir_all(&dir);

        spawn_config(&path, b"endpoint = \"http://127.0.0.1:8545\"\n").unwrap();
        spawn_config(&path, b"overwritten = true\n").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "endpoint = \"http://127.0.0.1:8545\"\n");

        fs::remove_dir_all(&dir).unwrap();
    }
}
