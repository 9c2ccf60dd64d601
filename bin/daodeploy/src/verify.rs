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

use ethers::{
    abi::{encode, Token},
    etherscan::{
        verify::{CodeFormat, VerifyContract},
        Client,
    },
    utils::hex,
};
use log::{info, warn};

use nftdao::{Error, Result};

use crate::deploy::Deployment;

/// Hex-encoded constructor arguments without a `0x` prefix, or `None`
/// for contracts deployed without arguments.
pub fn encode_constructor_args(args: &[Token]) -> Option<String> {
    if args.is_empty() {
        return None
    }

    Some(hex::encode(encode(args)))
}

/// Submit a source verification request for `deployment`.
pub async fn verify_deployment(client: &Client, deployment: &Deployment) -> Result<()> {
    let artifact = &deployment.artifact;
    let build_info = artifact.build_info()?;
    let source = serde_json::to_string(&build_info.input)?;

    let request = VerifyContract::new(
        deployment.address,
        artifact.qualified_name(),
        source,
        format!("v{}", build_info.solc_long_version),
    )
    .code_format(CodeFormat::StandardJsonInput)
    .constructor_arguments(encode_constructor_args(&deployment.constructor_args));

    info!(target: "daodeploy", "Verifying {} at {:?}", artifact.contract_name, deployment.address);
    let response = client
        .submit_contract_verification(&request)
        .await
        .map_err(|e| Error::VerificationFailed(e.to_string()))?;

    if response.status == "1" {
        println!("Verification of {} submitted (guid {})", artifact.contract_name, response.result);
        return Ok(())
    }

    if response.result.to_lowercase().contains("already verified") {
        warn!(target: "daodeploy", "{} is already verified", artifact.contract_name);
        return Ok(())
    }

    Err(Error::VerificationFailed(format!("{}: {}", artifact.contract_name, response.result)))
}
