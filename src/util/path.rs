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
    env,
    ffi::OsString,
    path::{Path, PathBuf},
};

use crate::{Error, Result};

/// Returns `$HOME`, or `None` when unset or empty.
#[cfg(target_family = "unix")]
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("HOME").and_then(|h| if h.is_empty() { None } else { Some(h) }).map(PathBuf::from)
}

#[cfg(target_family = "windows")]
pub fn home_dir() -> Option<PathBuf> {
    env::var_os("APPDATA").map(PathBuf::from)
}

/// Returns `$XDG_CONFIG_HOME`, `$HOME/.config`, or `None`.
pub fn config_dir() -> Option<PathBuf> {
    env::var_os("XDG_CONFIG_HOME")
        .and_then(is_absolute_path)
        .or_else(|| home_dir().map(|h| h.join(".config")))
}

fn is_absolute_path(path: OsString) -> Option<PathBuf> {
    let path = PathBuf::from(path);
    if path.is_absolute() {
        Some(path)
    } else {
        None
    }
}

pub fn expand_path(path: &str) -> Result<PathBuf> {
    let Some(remains) = path.strip_prefix('~') else { return Ok(PathBuf::from(path)) };

    let Some(homedir) = home_dir() else {
        return Err(Error::ConfigError("Could not fetch path for home directory".to_string()))
    };

    match remains.strip_prefix('/') {
        Some(rest) => Ok(homedir.join(rest)),
        None => Ok(homedir),
    }
}

/// Join a path with `config_dir()/nftdao`.
pub fn join_config_path(file: &Path) -> Result<PathBuf> {
    let mut path = PathBuf::new();

    if let Some(v) = config_dir() {
        path.push(v);
    }

    path.push("nftdao");
    path.push(file);

    Ok(path)
}

pub fn get_config_path(arg: Option<String>, fallback: &str) -> Result<PathBuf> {
    if let Some(a) = arg {
        expand_path(&a)
    } else {
        join_config_path(&PathBuf::from(fallback))
    }
}
