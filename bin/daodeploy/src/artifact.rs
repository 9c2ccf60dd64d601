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
    fs,
    path::{Path, PathBuf},
};

use ethers::{abi::Abi, types::Bytes};
use serde::Deserialize;

use nftdao::{Error, Result};

/// Compiled contract as written by Hardhat
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artifact {
    pub contract_name: String,
    pub source_name: String,
    pub abi: Abi,
    pub bytecode: Bytes,
    #[serde(skip)]
    pub path: PathBuf,
}

/// Compiler input and version a contract was built with
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInfo {
    pub solc_long_version: String,
    /// Standard JSON input handed to solc
    pub input: serde_json::Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DebugFile {
    build_info: String,
}

/// Hardhat keeps `<name>.json` under `contracts/<name>.sol/`.
pub fn artifact_path(artifacts_dir: &Path, contract_name: &str) -> PathBuf {
    artifacts_dir
        .join("contracts")
        .join(format!("{contract_name}.sol"))
        .join(format!("{contract_name}.json"))
}

impl Artifact {
    pub fn load(path: &Path) -> Result<Self> {
        let mut artifact = Self::from_json(&fs::read_to_string(path)?)?;
        artifact.path = path.to_path_buf();
        Ok(artifact)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let artifact: Self = serde_json::from_str(json)?;
        if artifact.bytecode.is_empty() {
            return Err(Error::MissingBytecode(artifact.contract_name))
        }
        Ok(artifact)
    }

    /// Fully qualified name, as explorers expect it.
    pub fn qualified_name(&self) -> String {
        format!("{}:{}", self.source_name, self.contract_name)
    }

    /// Resolve the build info through the `.dbg.json` file next to the
    /// artifact.
    pub fn build_info(&self) -> Result<BuildInfo> {
        let dbg_path = self.path.with_extension("dbg.json");
        let dbg: DebugFile = serde_json::from_str(&fs::read_to_string(&dbg_path)?)?;

        let base = dbg_path.parent().unwrap_or(Path::new("."));
        let build_info = fs::read_to_string(base.join(dbg.build_info))?;
        Ok(serde_json::from_str(&build_info)?)
    }
}
