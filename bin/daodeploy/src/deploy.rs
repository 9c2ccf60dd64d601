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
    abi::Token,
    types::{Address, U256},
    utils::format_ether,
};
use log::info;

use nftdao::{gateway::ethereum::EthGateway, Result};

use crate::artifact::Artifact;

/// A contract that made it on-chain
#[derive(Debug, Clone)]
pub struct Deployment {
    pub artifact: Artifact,
    pub address: Address,
    pub constructor_args: Vec<Token>,
}

/// The DAO constructor takes the marketplace first, then the NFT.
pub fn dao_constructor_args(marketplace: Address, nft: Address) -> Vec<Token> {
    vec![Token::Address(marketplace), Token::Address(nft)]
}

async fn deploy_one(
    gateway: &EthGateway,
    artifact: &Artifact,
    constructor_args: Vec<Token>,
    value: U256,
) -> Result<Deployment> {
    info!(target: "daodeploy", "Deploying {}", artifact.contract_name);
    let (address, receipt) =
        gateway.deploy(&artifact.abi, &artifact.bytecode, &constructor_args, value).await?;
    info!(
        target: "daodeploy",
        "{} mined in block {:?} (tx {:?})",
        artifact.contract_name,
        receipt.block_number,
        receipt.tx_hash,
    );

    Ok(Deployment { artifact: artifact.clone(), address, constructor_args })
}

/// Deploy the NFT contract, the marketplace, then the DAO seeded with
/// `treasury_seed` wei. Returned in deployment order.
pub async fn deploy_all(
    gateway: &EthGateway,
    nft: &Artifact,
    marketplace: &Artifact,
    dao: &Artifact,
    treasury_seed: U256,
) -> Result<Vec<Deployment>> {
    let nft = deploy_one(gateway, nft, vec![], U256::zero()).await?;
    println!("NFT contract deployed to {:?}", nft.address);

    let marketplace = deploy_one(gateway, marketplace, vec![], U256::zero()).await?;
    println!("NFT marketplace deployed to {:?}", marketplace.address);

    let args = dao_constructor_args(marketplace.address, nft.address);
    let dao = deploy_one(gateway, dao, args, treasury_seed).await?;
    println!(
        "DAO contract deployed to {:?} with {} ETH in its treasury",
        dao.address,
        format_ether(treasury_seed)
    );

    Ok(vec![nft, marketplace, dao])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dao_args_order() {
        let marketplace = Address::repeat_byte(0x11);
        let nft = Address::repeat_byte(0x22);

        assert_eq!(
            dao_constructor_args(marketplace, nft),
            vec![Token::Address(marketplace), Token::Address(nft)]
        );
    }
}
