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

use std::time::Duration;

use ethers::{
    etherscan::Client,
    types::{Address, Chain},
    utils::parse_ether,
};
use log::{info, warn};
use structopt_toml::{serde::Deserialize, structopt::StructOpt, StructOptToml};
use url::Url;

use nftdao::{
    async_daemonize, cli_desc, gateway::ethereum::EthGateway, util::path::expand_path, Error,
    Result,
};

/// Hardhat artifact loading
mod artifact;
use artifact::{artifact_path, Artifact};

/// Contract deployment
mod deploy;
use deploy::deploy_all;

/// Etherscan source verification
mod verify;
use verify::verify_deployment;

const CONFIG_FILE: &str = "daodeploy_config.toml";
const CONFIG_FILE_CONTENTS: &str = include_str!("../daodeploy_config.toml");

#[derive(Clone, Debug, Deserialize, StructOpt, StructOptToml)]
#[serde(default)]
#[structopt(name = "daodeploy", about = cli_desc!())]
struct Args {
    #[structopt(short, long)]
    /// Configuration file to use
    config: Option<String>,

    #[structopt(short, long, default_value = "http://127.0.0.1:8545")]
    /// Ethereum JSON-RPC endpoint
    endpoint: Url,

    #[structopt(long)]
    /// Deployer account
    account: Option<Address>,

    #[structopt(long, default_value = "artifacts")]
    /// Hardhat artifacts directory
    artifacts: String,

    #[structopt(long, default_value = "DaoNFT")]
    /// Name of the membership NFT contract
    nft_contract: String,

    #[structopt(long, default_value = "FakeNFTMarketplace")]
    /// Name of the NFT marketplace contract
    marketplace_contract: String,

    #[structopt(long, default_value = "NftDAO")]
    /// Name of the DAO governance contract
    dao_contract: String,

    #[structopt(long, default_value = "0.3")]
    /// Ether sent to the DAO as initial treasury
    treasury_seed: String,

    #[structopt(long, default_value = "1")]
    /// Confirmations to wait for on each deployment
    confirmations: usize,

    #[structopt(long, default_value = "2000")]
    /// Receipt polling interval in milliseconds
    poll_interval: u64,

    #[structopt(long, default_value = "30")]
    /// Seconds to wait before requesting source verification
    verify_delay: u64,

    #[structopt(long)]
    /// Etherscan API key, verification is skipped without one
    etherscan_api_key: Option<String>,

    #[structopt(short, long)]
    /// Set log file to ouput into
    log: Option<String>,

    #[structopt(short, parse(from_occurrences))]
    /// Increase verbosity (-vvv supported)
    verbose: u8,
}

async_daemonize!(realmain);
async fn realmain(args: Args) -> Result<()> {
    let artifacts = expand_path(&args.artifacts)?;
    let nft = Artifact::load(&artifact_path(&artifacts, &args.nft_contract))?;
    let marketplace = Artifact::load(&artifact_path(&artifacts, &args.marketplace_contract))?;
    let dao = Artifact::load(&artifact_path(&artifacts, &args.dao_contract))?;

    let treasury_seed = parse_ether(&args.treasury_seed)?;

    let gateway = EthGateway::new(
        &args.endpoint,
        args.account,
        args.confirmations,
        Duration::from_millis(args.poll_interval),
    )?;

    let deployments = deploy_all(&gateway, &nft, &marketplace, &dao, treasury_seed).await?;

    let Some(api_key) = args.etherscan_api_key else {
        warn!(target: "daodeploy", "No Etherscan API key configured, skipping verification");
        return Ok(())
    };

    let chain_id = gateway.chain_id().await?;
    let chain = Chain::try_from(chain_id)
        .map_err(|_| Error::VerificationFailed(format!("Unsupported chain ID {chain_id}")))?;
    let client =
        Client::new(chain, api_key).map_err(|e| Error::VerificationFailed(e.to_string()))?;

    info!(
        target: "daodeploy",
        "Waiting {}s for the explorer to index the contracts", args.verify_delay,
    );
    smol::Timer::after(Duration::from_secs(args.verify_delay)).await;

    for deployment in &deployments {
        verify_deployment(&client, deployment).await?;
    }

    Ok(())
}
