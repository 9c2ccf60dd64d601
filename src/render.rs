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

use std::fmt;

use chrono::{DateTime, Local, Utc};
use ethers::{types::U256, utils::format_ether};
use prettytable::{format, row, Table};

use crate::{
    dao::{Affordance, Proposal},
    session::Tab,
    viewmodel::Dashboard,
};

/// Everything the view selection depends on
pub struct RenderInputs<'a> {
    pub connected: bool,
    pub selected_tab: Option<Tab>,
    /// A write or a fetch cycle is running
    pub loading: bool,
    pub proposals: &'a [Proposal],
    /// NFT balance of the connected account, `None` until loaded
    pub nft_balance: Option<U256>,
    pub now: DateTime<Utc>,
}

/// A proposal together with what it currently offers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalCard {
    pub proposal: Proposal,
    pub affordance: Affordance,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    /// No wallet connected
    ConnectWallet,
    /// Connected, no tab selected
    Home,
    Loading,
    /// Create tab for an account without membership NFTs
    NoNft,
    CreateProposalForm,
    NoProposals,
    ProposalList(Vec<ProposalCard>),
}

/// Pick the view for the given inputs.
pub fn select_view(inputs: &RenderInputs) -> View {
    if !inputs.connected {
        return View::ConnectWallet
    }

    match inputs.selected_tab {
        None => View::Home,

        Some(Tab::CreateProposal) => {
            if inputs.nft_balance.is_some_and(|b| b.is_zero()) {
                View::NoNft
            } else if inputs.loading {
                View::Loading
            } else {
                View::CreateProposalForm
            }
        }

        Some(Tab::ViewProposals) => {
            if inputs.loading {
                View::Loading
            } else if inputs.proposals.is_empty() {
                View::NoProposals
            } else {
                let cards = inputs
                    .proposals
                    .iter()
                    .map(|p| ProposalCard {
                        proposal: p.clone(),
                        affordance: p.affordance(inputs.now),
                    })
                    .collect();
                View::ProposalList(cards)
            }
        }
    }
}

/// Withdraw action label, only offered to the DAO owner.
pub fn withdraw_label(dashboard: Option<&Dashboard>, busy: bool) -> Option<&'static str> {
    match dashboard {
        Some(d) if d.is_owner => Some(if busy { "Loading..." } else { "Withdraw DAO ETH" }),
        _ => None,
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::ConnectWallet => {
                write!(f, "No wallet connected. Configure an account to continue.")
            }
            Self::Home => write!(f, "Select a tab: Create Proposal or View Proposals"),
            Self::Loading => write!(f, "Loading... Waiting for transaction..."),
            Self::NoNft => write!(
                f,
                "You do not own any DAO membership NFTs.\nYou cannot create or vote on proposals"
            ),
            Self::CreateProposalForm => write!(f, "NFT Token ID to Purchase: "),
            Self::NoProposals => write!(f, "No proposals have been created"),
            Self::ProposalList(cards) => write!(f, "{}", proposal_table(cards)),
        }
    }
}

pub fn proposal_table(cards: &[ProposalCard]) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.set_titles(row![
        "Proposal ID",
        "NFT to Purchase",
        "Deadline",
        "Yay Votes",
        "Nay Votes",
        "Executed",
        "Actions"
    ]);

    for card in cards {
        let p = &card.proposal;
        let deadline = p.deadline.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S");
        table.add_row(row![
            p.proposal_id,
            p.nft_token_id,
            deadline,
            p.yay_votes,
            p.nay_votes,
            p.executed,
            card.affordance
        ]);
    }

    table
}

pub fn dashboard_table(dashboard: &Dashboard) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_BORDER_LINE_SEPARATOR);
    table.add_row(row!["NFT Balance", dashboard.nft_balance]);
    let treasury = format!("{} ETH", format_ether(dashboard.treasury_balance));
    table.add_row(row!["Treasury Balance", treasury]);
    table.add_row(row!["Total Number of Proposals", dashboard.num_proposals]);
    table
}
