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

//! In-memory stand-in for the governance and NFT contracts.
//!
//! Follows the on-chain rules closely enough for view-model tests:
//! NFT-gated proposal creation and voting, deadlines, one vote per
//! held NFT, owner-only treasury withdrawal. Failures can be injected
//! on reads and writes, and confirmations can be held back to keep a
//! transaction in flight.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use ethers::{
    abi::Token,
    types::{Address, H256, U256},
    utils::parse_ether,
};
use smol::{
    channel::{unbounded, Receiver, Sender},
    lock::Mutex,
};

use super::{
    abi::{
        DAO_CONTRACT, DAO_CREATE_PROPOSAL, DAO_EXECUTE_PROPOSAL, DAO_NUM_PROPOSALS, DAO_OWNER,
        DAO_PROPOSALS, DAO_VOTE_ON_PROPOSAL, DAO_WITHDRAW_ETHER, NFT_BALANCE_OF, NFT_CONTRACT,
    },
    ContractGateway, ContractHandle, TxHandle, TxReceipt,
};
use crate::{Error, Result};

/// Voting period applied to proposals created through the mock
pub const VOTING_PERIOD: u64 = 5 * 60;

/// Price the mock marketplace charges for any NFT, in ether
pub const NFT_PRICE: &str = "0.1";

/// On-chain proposal as the mock keeps it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockProposal {
    pub nft_token_id: U256,
    pub deadline: u64,
    pub yay_votes: U256,
    pub nay_votes: U256,
    pub executed: bool,
    voters: HashSet<Address>,
}

struct ReadFailure {
    function: String,
    proposal_id: Option<u64>,
}

struct MockState {
    dao: Address,
    owner: Address,
    now: u64,
    proposals: Vec<MockProposal>,
    nft_balances: HashMap<Address, U256>,
    treasury: U256,
    purchased: HashSet<U256>,
    next_tx: u64,
    outcomes: HashMap<H256, std::result::Result<u64, String>>,
    read_failures: Vec<ReadFailure>,
    next_write_failure: Option<Error>,
    confirmation_gate: Option<Receiver<()>>,
    read_gate: Option<(String, Receiver<()>)>,
    read_log: Vec<String>,
}

pub struct MockGateway {
    account: Option<Address>,
    state: Mutex<MockState>,
}

impl MockGateway {
    /// Empty DAO deployed at `dao` and owned by `owner`, seen from the
    /// wallet `account`.
    pub fn new(dao: Address, owner: Address, account: Option<Address>, now: u64) -> Self {
        let state = MockState {
            dao,
            owner,
            now,
            proposals: vec![],
            nft_balances: HashMap::new(),
            treasury: U256::zero(),
            purchased: HashSet::new(),
            next_tx: 1,
            outcomes: HashMap::new(),
            read_failures: vec![],
            next_write_failure: None,
            confirmation_gate: None,
            read_gate: None,
            read_log: vec![],
        };

        Self { account, state: Mutex::new(state) }
    }

    pub async fn mint(&self, holder: Address, amount: u64) {
        let mut state = self.state.lock().await;
        let balance = state.nft_balances.entry(holder).or_default();
        *balance += U256::from(amount);
    }

    pub async fn fund_treasury(&self, amount: U256) {
        self.state.lock().await.treasury += amount;
    }

    pub async fn treasury(&self) -> U256 {
        self.state.lock().await.treasury
    }

    pub async fn set_time(&self, now: u64) {
        self.state.lock().await.now = now;
    }

    /// Append a proposal as if it had been created and voted on already.
    pub async fn insert_proposal(
        &self,
        nft_token_id: u64,
        deadline: u64,
        yay_votes: u64,
        nay_votes: u64,
        executed: bool,
    ) {
        self.state.lock().await.proposals.push(MockProposal {
            nft_token_id: U256::from(nft_token_id),
            deadline,
            yay_votes: U256::from(yay_votes),
            nay_votes: U256::from(nay_votes),
            executed,
            voters: HashSet::new(),
        });
    }

    pub async fn proposal(&self, id: u64) -> Option<MockProposal> {
        self.state.lock().await.proposals.get(id as usize).cloned()
    }

    /// Make reads of `function` fail. For `proposals`, `proposal_id`
    /// narrows the failure to a single index.
    pub async fn fail_read(&self, function: &str, proposal_id: Option<u64>) {
        self.state
            .lock()
            .await
            .read_failures
            .push(ReadFailure { function: function.to_string(), proposal_id });
    }

    /// The next `write` call fails with `err` before reaching the chain.
    pub async fn fail_next_write(&self, err: Error) {
        self.state.lock().await.next_write_failure = Some(err);
    }

    /// Hold every confirmation until a message is sent on the returned
    /// channel, one message per confirmation.
    pub async fn hold_confirmations(&self) -> Sender<()> {
        let (sender, receiver) = unbounded();
        self.state.lock().await.confirmation_gate = Some(receiver);
        sender
    }

    /// Hold the next read of `function` until a message is sent on the
    /// returned channel. Later reads are served right away.
    pub async fn hold_next_read(&self, function: &str) -> Sender<()> {
        let (sender, receiver) = unbounded();
        self.state.lock().await.read_gate = Some((function.to_string(), receiver));
        sender
    }

    /// Log of the reads served so far, as `contract.function(args)`.
    pub async fn read_log(&self) -> Vec<String> {
        self.state.lock().await.read_log.clone()
    }
}

impl MockState {
    fn read_fails(&self, function: &str, args: &[Token]) -> bool {
        let id = match args.first() {
            Some(Token::Uint(id)) => Some(id.low_u64()),
            _ => None,
        };

        self.read_failures.iter().any(|f| {
            f.function == function && (f.proposal_id.is_none() || f.proposal_id == id)
        })
    }

    fn nft_balance(&self, holder: &Address) -> U256 {
        self.nft_balances.get(holder).copied().unwrap_or_default()
    }

    fn proposal_mut(&mut self, args: &[Token]) -> std::result::Result<&mut MockProposal, String> {
        let Some(Token::Uint(id)) = args.first() else { return Err("BAD_ARGS".to_string()) };
        let id = id.low_u64() as usize;
        self.proposals.get_mut(id).ok_or_else(|| "INVALID_PROPOSAL".to_string())
    }

    /// Apply a governance call on behalf of `sender`, returning the
    /// revert reason when the contract would reject it.
    fn execute_call(
        &mut self,
        sender: Address,
        function: &str,
        args: &[Token],
    ) -> std::result::Result<(), String> {
        let now = self.now;
        let votes = self.nft_balance(&sender);

        if function == DAO_WITHDRAW_ETHER {
            if sender != self.owner {
                return Err("Ownable: caller is not the owner".to_string())
            }
            if self.treasury.is_zero() {
                return Err("Nothing to withdraw, contract balance empty".to_string())
            }
            self.treasury = U256::zero();
            return Ok(())
        }

        if votes.is_zero() {
            return Err("NOT_A_DAO_MEMBER".to_string())
        }

        match function {
            DAO_CREATE_PROPOSAL => {
                let Some(Token::Uint(token_id)) = args.first() else {
                    return Err("BAD_ARGS".to_string())
                };
                if self.purchased.contains(token_id) {
                    return Err("NFT_NOT_FOR_SALE".to_string())
                }
                self.proposals.push(MockProposal {
                    nft_token_id: *token_id,
                    deadline: now + VOTING_PERIOD,
                    yay_votes: U256::zero(),
                    nay_votes: U256::zero(),
                    executed: false,
                    voters: HashSet::new(),
                });
                Ok(())
            }

            DAO_VOTE_ON_PROPOSAL => {
                let Some(Token::Uint(vote)) = args.get(1).cloned() else {
                    return Err("BAD_ARGS".to_string())
                };
                let proposal = self.proposal_mut(args)?;
                if proposal.deadline <= now {
                    return Err("DEADLINE_EXCEEDED".to_string())
                }
                if !proposal.voters.insert(sender) {
                    return Err("ALREADY_VOTED".to_string())
                }
                match vote.low_u64() {
                    0 => proposal.yay_votes += votes,
                    1 => proposal.nay_votes += votes,
                    _ => return Err("BAD_VOTE".to_string()),
                }
                Ok(())
            }

            DAO_EXECUTE_PROPOSAL => {
                let price = parse_ether(NFT_PRICE).map_err(|e| e.to_string())?;
                let treasury = self.treasury;
                let proposal = self.proposal_mut(args)?;
                if proposal.deadline > now {
                    return Err("DEADLINE_NOT_EXCEEDED".to_string())
                }
                if proposal.executed {
                    return Err("PROPOSAL_ALREADY_EXECUTED".to_string())
                }
                let buy = proposal.yay_votes > proposal.nay_votes;
                if buy && treasury < price {
                    return Err("NOT_ENOUGH_FUNDS".to_string())
                }
                proposal.executed = true;
                let token_id = proposal.nft_token_id;
                if buy {
                    self.treasury -= price;
                    self.purchased.insert(token_id);
                }
                Ok(())
            }

            other => Err(format!("unknown function {other}")),
        }
    }
}

#[async_trait]
impl ContractGateway for MockGateway {
    fn account(&self) -> Option<Address> {
        self.account
    }

    async fn read(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[Token],
    ) -> Result<Vec<Token>> {
        let gate = {
            let mut state = self.state.lock().await;
            match state.read_gate.take() {
                Some((held, gate)) if held == function => Some(gate),
                other => {
                    state.read_gate = other;
                    None
                }
            }
        };
        if let Some(gate) = gate {
            if gate.recv().await.is_err() {
                return Err(Error::RpcError("read gate closed".to_string()))
            }
        }

        let mut state = self.state.lock().await;
        state.read_log.push(format!("{}.{}({:?})", contract.name, function, args));

        if state.read_fails(function, args) {
            return Err(Error::RpcError(format!("injected failure reading {function}")))
        }

        match (contract.name, function) {
            (DAO_CONTRACT, DAO_OWNER) => Ok(vec![Token::Address(state.owner)]),

            (DAO_CONTRACT, DAO_NUM_PROPOSALS) => {
                Ok(vec![Token::Uint(U256::from(state.proposals.len()))])
            }

            (DAO_CONTRACT, DAO_PROPOSALS) => {
                let Some(Token::Uint(id)) = args.first() else {
                    return Err(Error::RpcError("execution reverted".to_string()))
                };
                let Some(p) = state.proposals.get(id.low_u64() as usize) else {
                    return Err(Error::RpcError("execution reverted".to_string()))
                };
                Ok(vec![
                    Token::Uint(p.nft_token_id),
                    Token::Uint(U256::from(p.deadline)),
                    Token::Uint(p.yay_votes),
                    Token::Uint(p.nay_votes),
                    Token::Bool(p.executed),
                ])
            }

            (NFT_CONTRACT, NFT_BALANCE_OF) => {
                let Some(Token::Address(holder)) = args.first() else {
                    return Err(Error::RpcError("execution reverted".to_string()))
                };
                Ok(vec![Token::Uint(state.nft_balance(holder))])
            }

            (name, function) => Err(Error::UnknownFunction(format!("{name}.{function}"))),
        }
    }

    async fn write(
        &self,
        contract: &ContractHandle,
        function: &str,
        args: &[Token],
    ) -> Result<TxHandle> {
        let Some(sender) = self.account else { return Err(Error::WalletNotConnected) };

        let mut state = self.state.lock().await;
        if let Some(err) = state.next_write_failure.take() {
            return Err(err)
        }

        if contract.name != DAO_CONTRACT {
            return Err(Error::UnknownFunction(format!("{}.{}", contract.name, function)))
        }

        let nonce = state.next_tx;
        state.next_tx += 1;
        let tx_hash = H256::from_low_u64_be(nonce);

        let outcome = state.execute_call(sender, function, args).map(|()| nonce);
        state.outcomes.insert(tx_hash, outcome);

        Ok(TxHandle(tx_hash))
    }

    async fn await_confirmation(&self, handle: TxHandle) -> Result<TxReceipt> {
        let gate = self.state.lock().await.confirmation_gate.clone();
        if let Some(gate) = gate {
            if gate.recv().await.is_err() {
                return Err(Error::RpcError("confirmation gate closed".to_string()))
            }
        }

        let outcome = self.state.lock().await.outcomes.remove(&handle.0);
        match outcome {
            Some(Ok(block)) => Ok(TxReceipt {
                tx_hash: handle.0,
                block_number: Some(block),
                gas_used: Some(U256::from(21000)),
                contract_address: None,
            }),
            Some(Err(reason)) => {
                Err(Error::TransactionReverted(format!("{handle} ({reason})")))
            }
            None => Err(Error::TransactionDropped(handle.to_string())),
        }
    }

    /// Only the DAO contract holds ether in the mock; every other
    /// address reports an empty balance.
    async fn native_balance(&self, address: Address) -> Result<U256> {
        let state = self.state.lock().await;
        if address == state.dao {
            return Ok(state.treasury)
        }
        Ok(U256::zero())
    }
}
