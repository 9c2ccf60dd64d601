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

use std::sync::Arc;

use ethers::{abi::parse_abi, types::Address};

use super::ContractHandle;
use crate::Result;

/// Name of the governance contract handle
pub const DAO_CONTRACT: &str = "dao";
/// Name of the membership NFT contract handle
pub const NFT_CONTRACT: &str = "nft";

// Governance contract functions
pub const DAO_OWNER: &str = "owner";
pub const DAO_NUM_PROPOSALS: &str = "numProposals";
pub const DAO_PROPOSALS: &str = "proposals";
pub const DAO_CREATE_PROPOSAL: &str = "createProposal";
pub const DAO_VOTE_ON_PROPOSAL: &str = "voteOnProposal";
pub const DAO_EXECUTE_PROPOSAL: &str = "executeProposal";
pub const DAO_WITHDRAW_ETHER: &str = "withdrawEther";

// NFT contract functions
pub const NFT_BALANCE_OF: &str = "balanceOf";

const DAO_ABI: &[&str] = &[
    "function owner() external view returns (address)",
    "function numProposals() external view returns (uint256)",
    "function proposals(uint256) external view returns (uint256 nftTokenId, uint256 deadline, uint256 yayVotes, uint256 nayVotes, bool executed)",
    "function createProposal(uint256 _nftTokenId) external returns (uint256)",
    "function voteOnProposal(uint256 proposalIndex, uint8 vote) external",
    "function executeProposal(uint256 proposalIndex) external",
    "function withdrawEther() external",
];

const NFT_ABI: &[&str] = &["function balanceOf(address owner) external view returns (uint256)"];

/// Handle for the governance contract deployed at `address`.
pub fn dao_contract(address: Address) -> Result<ContractHandle> {
    Ok(ContractHandle { name: DAO_CONTRACT, address, abi: Arc::new(parse_abi(DAO_ABI)?) })
}

/// Handle for the membership NFT contract deployed at `address`.
pub fn nft_contract(address: Address) -> Result<ContractHandle> {
    Ok(ContractHandle { name: NFT_CONTRACT, address, abi: Arc::new(parse_abi(NFT_ABI)?) })
}
