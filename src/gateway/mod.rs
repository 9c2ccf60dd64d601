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

//! Contract gateway: the boundary between the view-model and whatever
//! wallet/provider library talks to the chain.
//!
//! The view-model only ever sees [`ContractGateway`], so any client
//! library able to issue read calls, submit transactions and wait for
//! their receipts can be plugged in.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use ethers::{
    abi::{Abi, Token},
    types::{Address, H256, U256},
};

use crate::Result;

/// Human-readable contract ABIs and handle constructors
pub mod abi;

/// Gateway implementation on top of an Ethereum JSON-RPC node
pub mod ethereum;

/// In-memory DAO used by tests
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

/// A deployed contract, identified by its address and ABI.
#[derive(Debug, Clone)]
pub struct ContractHandle {
    /// Short name used in logs and by test doubles
    pub name: &'static str,
    /// Address the contract is deployed at
    pub address: Address,
    /// Parsed contract ABI
    pub abi: Arc<Abi>,
}

/// Reference to a submitted transaction, passed back to
/// [`ContractGateway::await_confirmation`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TxHandle(pub H256);

impl fmt::Display for TxHandle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

/// Receipt of a confirmed transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: H256,
    pub block_number: Option<u64>,
    pub gas_used: Option<U256>,
    /// Set for contract creation transactions
    pub contract_address: Option<Address>,
}

#[async_trait]
pub trait ContractGateway: Send + Sync {
    /// The connected wallet, if any. Writes are submitted from it.
    fn account(&self) -> Option<Address>;

    /// Side-effect free call of `function` on `contract`.
    async fn read(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[Token],
    ) -> Result<Vec<Token>>;

    /// Submit a state-changing call. Returns as soon as the transaction
    /// has been accepted for broadcast.
    async fn write(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[Token],
    ) -> Result<TxHandle>;

    /// Wait until the transaction behind `handle` is mined.
    /// Fails with [`crate::Error::TransactionReverted`] when the contract
    /// rejected it.
    async fn await_confirmation(&self, handle: TxHandle) -> Result<TxReceipt>;

    /// Native coin balance of `address`.
    async fn native_balance(&self, address: Address) -> Result<U256>;
}
