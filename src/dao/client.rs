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

use ethers::{
    abi::Token,
    types::{Address, U256},
};
use log::debug;

use super::{Proposal, Vote};
use crate::{
    gateway::{
        abi::{
            dao_contract, nft_contract, DAO_CREATE_PROPOSAL, DAO_EXECUTE_PROPOSAL,
            DAO_NUM_PROPOSALS, DAO_OWNER, DAO_PROPOSALS, DAO_VOTE_ON_PROPOSAL,
            DAO_WITHDRAW_ETHER, NFT_BALANCE_OF,
        },
        ContractGateway, ContractHandle, TxHandle, TxReceipt,
    },
    Error, Result,
};

/// Typed calls against the governance and NFT contracts.
pub struct DaoClient<G: ContractGateway> {
    gateway: Arc<G>,
    dao: ContractHandle,
    nft: ContractHandle,
}

impl<G: ContractGateway> DaoClient<G> {
    pub fn new(gateway: Arc<G>, dao_address: Address, nft_address: Address) -> Result<Self> {
        Ok(Self { gateway, dao: dao_contract(dao_address)?, nft: nft_contract(nft_address)? })
    }

    pub async fn owner(&self) -> Result<Address> {
        let out = self.gateway.read(&self.dao, DAO_OWNER, &[]).await?;
        match out.as_slice() {
            [Token::Address(owner)] => Ok(*owner),
            _ => Err(Error::DecodeError("owner() must return an address")),
        }
    }

    pub async fn num_proposals(&self) -> Result<u64> {
        let out = self.gateway.read(&self.dao, DAO_NUM_PROPOSALS, &[]).await?;
        let count = single_uint(&out, "numProposals() must return a uint256")?;
        if count > U256::from(u64::MAX) {
            return Err(Error::DecodeError("proposal count out of range"))
        }
        Ok(count.as_u64())
    }

    pub async fn proposal(&self, proposal_id: u64) -> Result<Proposal> {
        debug!(target: "nftdao::dao", "Fetching proposal {}", proposal_id);
        let args = [Token::Uint(U256::from(proposal_id))];
        let out = self.gateway.read(&self.dao, DAO_PROPOSALS, &args).await?;
        Proposal::from_tokens(proposal_id, out)
    }

    /// Number of membership NFTs held by `holder`.
    pub async fn nft_balance(&self, holder: Address) -> Result<U256> {
        let out = self.gateway.read(&self.nft, NFT_BALANCE_OF, &[Token::Address(holder)]).await?;
        single_uint(&out, "balanceOf() must return a uint256")
    }

    /// Native coin held by the governance contract.
    pub async fn treasury_balance(&self) -> Result<U256> {
        self.gateway.native_balance(self.dao.address).await
    }

    pub async fn create_proposal(&self, nft_token_id: U256) -> Result<TxHandle> {
        self.gateway.write(&self.dao, DAO_CREATE_PROPOSAL, &[Token::Uint(nft_token_id)]).await
    }

    pub async fn vote_on_proposal(&self, proposal_id: u64, vote: Vote) -> Result<TxHandle> {
        let args = [Token::Uint(U256::from(proposal_id)), Token::Uint(U256::from(vote.code()))];
        self.gateway.write(&self.dao, DAO_VOTE_ON_PROPOSAL, &args).await
    }

    pub async fn execute_proposal(&self, proposal_id: u64) -> Result<TxHandle> {
        let args = [Token::Uint(U256::from(proposal_id))];
        self.gateway.write(&self.dao, DAO_EXECUTE_PROPOSAL, &args).await
    }

    pub async fn withdraw_ether(&self) -> Result<TxHandle> {
        self.gateway.write(&self.dao, DAO_WITHDRAW_ETHER, &[]).await
    }

    pub async fn confirm(&self, handle: TxHandle) -> Result<TxReceipt> {
        self.gateway.await_confirmation(handle).await
    }
}

fn single_uint(out: &[Token], err: &'static str) -> Result<U256> {
    match out {
        [Token::Uint(value)] => Ok(*value),
        _ => Err(Error::DecodeError(err)),
    }
}
