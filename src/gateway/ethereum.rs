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

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use ethers::{
    abi::{Abi, Token},
    contract::{ContractError, ContractFactory},
    providers::{Http, Middleware, PendingTransaction, Provider, ProviderError, RpcError},
    types::{
        transaction::eip2718::TypedTransaction, Address, Bytes, TransactionReceipt,
        TransactionRequest, H256, U256, U64,
    },
};
use log::{debug, info};
use url::Url;

use super::{ContractGateway, ContractHandle, TxHandle, TxReceipt};
use crate::{Error, Result};

/// EIP-1193 error code a wallet returns when its holder declines to sign.
pub const USER_REJECTED_CODE: i64 = 4001;
/// JSON-RPC error code nodes return when `eth_call` or gas estimation hits a revert.
pub const EXECUTION_REVERTED_CODE: i64 = 3;

/// [`ContractGateway`] talking to an Ethereum JSON-RPC node over HTTP.
///
/// Transactions are submitted with `eth_sendTransaction` from `account`,
/// so signing is left to the node or the wallet behind the endpoint.
pub struct EthGateway {
    provider: Arc<Provider<Http>>,
    account: Option<Address>,
    confirmations: usize,
    poll_interval: Duration,
}

impl EthGateway {
    pub fn new(
        endpoint: &Url,
        account: Option<Address>,
        confirmations: usize,
        poll_interval: Duration,
    ) -> Result<Self> {
        let provider = Provider::<Http>::try_from(endpoint.as_str())?.interval(poll_interval);
        Ok(Self { provider: Arc::new(provider), account, confirmations, poll_interval })
    }

    /// Chain ID reported by the node.
    pub async fn chain_id(&self) -> Result<u64> {
        let chain_id = self.provider.get_chainid().await.map_err(gateway_error)?;
        Ok(chain_id.as_u64())
    }

    /// Deploy a contract from its creation `bytecode` with the ABI-encoded
    /// constructor `args`, and wait for the receipt.
    pub async fn deploy(
        &self,
        abi: &Abi,
        bytecode: &Bytes,
        args: &[Token],
        value: U256,
    ) -> Result<(Address, TxReceipt)> {
        let Some(from) = self.account else { return Err(Error::WalletNotConnected) };

        let factory = ContractFactory::new(abi.clone(), bytecode.clone(), self.provider.clone());
        let mut deployer = factory
            .deploy_tokens(args.to_vec())
            .map_err(deploy_error)?
            .confirmations(self.confirmations);
        deployer.tx.set_from(from);
        deployer.tx.set_value(value);

        let (contract, receipt) = deployer.send_with_receipt().await.map_err(deploy_error)?;
        let receipt = into_receipt(receipt)?;
        debug!(target: "nftdao::gateway", "Deployed contract at {:?}", contract.address());

        Ok((contract.address(), receipt))
    }

    async fn submit(&self, to: Option<Address>, data: Vec<u8>, value: U256) -> Result<TxHandle> {
        let Some(from) = self.account else { return Err(Error::WalletNotConnected) };

        let mut request = TransactionRequest::new().from(from).data(data).value(value);
        if let Some(to) = to {
            request = request.to(to);
        }

        let pending = self.provider.send_transaction(request, None).await.map_err(gateway_error)?;
        let tx_hash: H256 = *pending;
        debug!(target: "nftdao::gateway", "Submitted transaction {:?}", tx_hash);

        Ok(TxHandle(tx_hash))
    }
}

#[async_trait]
impl ContractGateway for EthGateway {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn read(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[Token],
    ) -> Result<Vec<Token>> {
        let func = contract
            .abi
            .function(function)
            .map_err(|_| Error::UnknownFunction(format!("{}.{}", contract.name, function)))?;
        let data = func.encode_input(args)?;

        let mut request = TransactionRequest::new().to(contract.address).data(data);
        if let Some(from) = self.account {
            request = request.from(from);
        }
        let tx: TypedTransaction = request.into();

        debug!(target: "nftdao::gateway", "--> {}.{}({:?})", contract.name, function, args);
        let output = self.provider.call(&tx, None).await.map_err(gateway_error)?;
        let tokens = func.decode_output(&output)?;
        debug!(target: "nftdao::gateway", "<-- {}.{}: {:?}", contract.name, function, tokens);

        Ok(tokens)
    }

    async fn write(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[Token],
    ) -> Result<TxHandle> {
        let func = contract
            .abi
            .function(function)
            .map_err(|_| Error::UnknownFunction(format!("{}.{}", contract.name, function)))?;
        let data = func.encode_input(args)?;

        info!(target: "nftdao::gateway", "Sending {}.{}({:?})", contract.name, function, args);
        self.submit(Some(contract.address), data, U256::zero()).await
    }

    async fn await_confirmation(&self, handle: TxHandle) -> Result<TxReceipt> {
        let receipt = PendingTransaction::new(handle.0, &*self.provider)
            .interval(self.poll_interval)
            .confirmations(self.confirmations)
            .await
            .map_err(gateway_error)?;

        let Some(receipt) = receipt else {
            return Err(Error::TransactionDropped(handle.to_string()))
        };

        into_receipt(receipt)
    }

    async fn native_balance(&self, address: Address) -> Result<U256> {
        self.provider.get_balance(address, None).await.map_err(gateway_error)
    }
}

/// Turn a mined receipt into a [`TxReceipt`], rejecting failed executions.
fn into_receipt(receipt: TransactionReceipt) -> Result<TxReceipt> {
    if receipt.status != Some(U64::from(1)) {
        return Err(Error::TransactionReverted(format!("{:?}", receipt.transaction_hash)))
    }

    Ok(TxReceipt {
        tx_hash: receipt.transaction_hash,
        block_number: receipt.block_number.map(|n| n.as_u64()),
        gas_used: receipt.gas_used,
        contract_address: receipt.contract_address,
    })
}

fn gateway_error(err: ProviderError) -> Error {
    match err.as_error_response() {
        Some(response) => classify_failure(Some(response.code), &response.message),
        None => classify_failure(None, &err.to_string()),
    }
}

fn deploy_error(err: ContractError<Provider<Http>>) -> Error {
    match err {
        ContractError::MiddlewareError { e } | ContractError::ProviderError { e } => {
            gateway_error(e)
        }
        ContractError::ConstructorError => Error::AbiError(
            "constructor arguments given for a contract without constructor".to_string(),
        ),
        ContractError::ContractNotDeployed => {
            Error::TransactionDropped("contract creation".to_string())
        }
        e => Error::AbiError(e.to_string()),
    }
}

/// Map a provider failure onto the error taxonomy: wallet refusals are
/// [`Error::UserRejected`], contract rejections surfaced while the node
/// estimates or simulates the call are [`Error::TransactionReverted`], and
/// anything else is an [`Error::RpcError`].
pub(crate) fn classify_failure(code: Option<i64>, message: &str) -> Error {
    let lowered = message.to_lowercase();
    if code == Some(USER_REJECTED_CODE) ||
        lowered.contains("user rejected") ||
        lowered.contains("user denied")
    {
        return Error::UserRejected(message.to_string())
    }

    if code == Some(EXECUTION_REVERTED_CODE) || lowered.contains("execution reverted") {
        return Error::TransactionReverted(message.to_string())
    }

    Error::RpcError(message.to_string())
}
