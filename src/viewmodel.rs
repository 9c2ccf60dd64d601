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

//! Proposal view-model: fetch cycle, dashboard and serialized writes.
//!
//! Every operation reports its failures through an [`AlertSink`] and
//! the log, then hands the error back to the caller. The committed
//! proposal list only ever changes after a complete fetch cycle.

use std::{
    future::Future,
    str::FromStr,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc,
    },
};

use chrono::{DateTime, Utc};
use ethers::types::U256;
use futures::future::try_join_all;
use log::{debug, error, info};
use serde::Deserialize;
use smol::lock::Mutex;

use crate::{
    dao::{DaoClient, Proposal, Vote},
    gateway::{ContractGateway, TxHandle, TxReceipt},
    render::{select_view, withdraw_label, RenderInputs, View},
    session::{Session, Tab},
    Error, Result,
};

/// Receives user-facing failure notices
pub trait AlertSink: Send + Sync {
    fn alert(&self, message: &str);
}

/// Progress of the proposal fetch cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// No cycle running
    Idle,
    /// Waiting for `numProposals()`
    CountPending,
    /// Waiting for `proposals(i)`. In concurrent mode the whole batch is
    /// outstanding and the index is the first one.
    DecodePending(u64),
    /// Last cycle committed
    Ready,
}

impl FetchState {
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::CountPending | Self::DecodePending(_))
    }
}

/// How proposal tuples are read once the count is known
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchMode {
    /// One awaited read per index
    #[default]
    Sequential,
    /// All reads issued at once, reassembled in index order
    Concurrent,
}

impl FromStr for FetchMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sequential" => Ok(Self::Sequential),
            "concurrent" => Ok(Self::Concurrent),
            _ => Err(Error::ParseFailed("Fetch mode must be one of: sequential, concurrent")),
        }
    }
}

/// DAO overview shown above the tabs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dashboard {
    /// Membership NFTs held by the connected account
    pub nft_balance: U256,
    /// Native coin held by the DAO, in wei
    pub treasury_balance: U256,
    pub num_proposals: u64,
    /// Whether the connected account owns the DAO contract
    pub is_owner: bool,
}

pub struct ProposalViewModel<G: ContractGateway> {
    client: DaoClient<G>,
    session: Arc<Session>,
    alerts: Arc<dyn AlertSink>,
    fetch_mode: FetchMode,
    fetch_state: Mutex<FetchState>,
    /// Tag of the most recently started fetch cycle
    fetch_generation: AtomicU64,
    proposals: Mutex<Vec<Proposal>>,
    dashboard: Mutex<Option<Dashboard>>,
}

impl<G: ContractGateway> ProposalViewModel<G> {
    pub fn new(
        client: DaoClient<G>,
        session: Arc<Session>,
        alerts: Arc<dyn AlertSink>,
        fetch_mode: FetchMode,
    ) -> Self {
        Self {
            client,
            session,
            alerts,
            fetch_mode,
            fetch_state: Mutex::new(FetchState::Idle),
            fetch_generation: AtomicU64::new(0),
            proposals: Mutex::new(vec![]),
            dashboard: Mutex::new(None),
        }
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub async fn fetch_state(&self) -> FetchState {
        *self.fetch_state.lock().await
    }

    /// Last committed proposal list, in creation order.
    pub async fn proposals(&self) -> Vec<Proposal> {
        self.proposals.lock().await.clone()
    }

    pub async fn dashboard(&self) -> Option<Dashboard> {
        self.dashboard.lock().await.clone()
    }

    /// Switch tabs. Entering the proposal list always re-fetches it.
    pub async fn select_tab(&self, tab: Tab) -> Result<()> {
        self.session.set_selected_tab(tab).await;

        if tab == Tab::ViewProposals {
            self.fetch_all_proposals().await?;
        }

        Ok(())
    }

    /// Run a full fetch cycle and commit its result. On failure nothing
    /// is committed and the previous list stays in place. A cycle that
    /// has been overtaken by a newer one neither commits nor touches the
    /// fetch state.
    pub async fn fetch_all_proposals(&self) -> Result<Vec<Proposal>> {
        let generation = self.fetch_generation.fetch_add(1, Ordering::SeqCst) + 1;

        match self.run_fetch_cycle(generation).await {
            Ok(proposals) => {
                let mut state = self.fetch_state.lock().await;
                if self.is_superseded(generation) {
                    debug!(
                        target: "nftdao::viewmodel",
                        "Discarding result of superseded fetch cycle {}", generation,
                    );
                    return Ok(proposals)
                }

                info!(target: "nftdao::viewmodel", "Fetched {} proposals", proposals.len());
                *self.proposals.lock().await = proposals.clone();
                *state = FetchState::Ready;
                Ok(proposals)
            }
            Err(e) => {
                if !self.set_fetch_state(generation, FetchState::Idle).await {
                    debug!(
                        target: "nftdao::viewmodel",
                        "Superseded fetch cycle {} failed: {}", generation, e,
                    );
                    return Err(e)
                }

                self.report("Fetching proposals", &e);
                Err(e)
            }
        }
    }

    async fn run_fetch_cycle(&self, generation: u64) -> Result<Vec<Proposal>> {
        self.set_fetch_state(generation, FetchState::CountPending).await;
        let count = self.client.num_proposals().await?;
        debug!(target: "nftdao::viewmodel", "DAO reports {} proposals", count);

        match self.fetch_mode {
            FetchMode::Sequential => {
                let mut proposals = vec![];
                for id in 0..count {
                    self.set_fetch_state(generation, FetchState::DecodePending(id)).await;
                    proposals.push(self.client.proposal(id).await?);
                }
                Ok(proposals)
            }

            FetchMode::Concurrent => {
                self.set_fetch_state(generation, FetchState::DecodePending(0)).await;
                try_join_all((0..count).map(|id| self.client.proposal(id))).await
            }
        }
    }

    fn is_superseded(&self, generation: u64) -> bool {
        self.fetch_generation.load(Ordering::SeqCst) != generation
    }

    /// Returns `false` and leaves the state alone when `generation` is
    /// no longer the latest cycle.
    async fn set_fetch_state(&self, generation: u64, state: FetchState) -> bool {
        let mut current = self.fetch_state.lock().await;
        if self.is_superseded(generation) {
            return false
        }
        *current = state;
        true
    }

    /// Reload the DAO overview for the connected account.
    pub async fn refresh_dashboard(&self) -> Result<Dashboard> {
        match self.load_dashboard().await {
            Ok(dashboard) => {
                *self.dashboard.lock().await = Some(dashboard.clone());
                Ok(dashboard)
            }
            Err(e) => {
                self.report("Loading DAO overview", &e);
                Err(e)
            }
        }
    }

    async fn load_dashboard(&self) -> Result<Dashboard> {
        let (owner, num_proposals, treasury_balance) = futures::try_join!(
            self.client.owner(),
            self.client.num_proposals(),
            self.client.treasury_balance(),
        )?;

        let (nft_balance, is_owner) = match self.session.account() {
            Some(account) => (self.client.nft_balance(account).await?, account == owner),
            None => (U256::zero(), false),
        };

        Ok(Dashboard { nft_balance, treasury_balance, num_proposals, is_owner })
    }

    pub async fn create_proposal(&self, nft_token_id: U256) -> Result<TxReceipt> {
        self.submit("Creating proposal", self.client.create_proposal(nft_token_id)).await
    }

    /// Create a proposal for the token id typed into the create form.
    pub async fn submit_create_form(&self) -> Result<TxReceipt> {
        let input = self.session.token_id_input().await;
        let input = input.trim();

        let nft_token_id = if input.is_empty() {
            Err(Error::ParseFailed("Token ID must not be empty"))
        } else {
            U256::from_dec_str(input)
                .map_err(|_| Error::ParseFailed("Token ID must be a decimal number"))
        };

        match nft_token_id {
            Ok(id) => self.create_proposal(id).await,
            Err(e) => {
                self.report("Creating proposal", &e);
                Err(e)
            }
        }
    }

    pub async fn vote_on_proposal(&self, proposal_id: u64, vote: Vote) -> Result<TxReceipt> {
        let action = format!("Voting {vote} on proposal {proposal_id}");
        self.submit(&action, self.client.vote_on_proposal(proposal_id, vote)).await
    }

    pub async fn execute_proposal(&self, proposal_id: u64) -> Result<TxReceipt> {
        let action = format!("Executing proposal {proposal_id}");
        self.submit(&action, self.client.execute_proposal(proposal_id)).await
    }

    pub async fn withdraw_ether(&self) -> Result<TxReceipt> {
        self.submit("Withdrawing DAO ether", self.client.withdraw_ether()).await
    }

    /// Hold the busy flag across `write` and its confirmation. Failures
    /// are reported once the flag is released.
    async fn submit<F>(&self, action: &str, write: F) -> Result<TxReceipt>
    where
        F: Future<Output = Result<TxHandle>>,
    {
        let res = self.write_and_confirm(action, write).await;
        if let Err(e) = &res {
            self.report(action, e);
        }
        res
    }

    async fn write_and_confirm<F>(&self, action: &str, write: F) -> Result<TxReceipt>
    where
        F: Future<Output = Result<TxHandle>>,
    {
        let _guard = self.session.try_acquire()?;

        if !self.session.is_connected() {
            return Err(Error::WalletNotConnected)
        }

        let handle = write.await?;
        info!(target: "nftdao::viewmodel", "{}: submitted {}", action, handle);

        let receipt = self.client.confirm(handle).await?;
        info!(
            target: "nftdao::viewmodel",
            "{}: confirmed in block {:?}", action, receipt.block_number,
        );

        Ok(receipt)
    }

    fn report(&self, action: &str, err: &Error) {
        error!(target: "nftdao::viewmodel", "{} failed: {}", action, err);
        self.alerts.alert(&format!("{action} failed: {err}"));
    }

    /// Select what to show at time `now`.
    pub async fn view(&self, now: DateTime<Utc>) -> View {
        let proposals = self.proposals().await;
        let nft_balance = self.dashboard.lock().await.as_ref().map(|d| d.nft_balance);
        let loading = self.session.is_busy() || self.fetch_state().await.is_pending();

        select_view(&RenderInputs {
            connected: self.session.is_connected(),
            selected_tab: self.session.selected_tab().await,
            loading,
            proposals: &proposals,
            nft_balance,
            now,
        })
    }

    /// Label of the owner-only withdraw action, if the connected account
    /// may see it.
    pub async fn withdraw_affordance(&self) -> Option<&'static str> {
        withdraw_label(self.dashboard.lock().await.as_ref(), self.session.is_busy())
    }
}
