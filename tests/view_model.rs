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

use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use ethers::{
    types::{Address, U256},
    utils::parse_ether,
};

use nftdao::{
    dao::{Affordance, DaoClient, Proposal, Vote},
    gateway::{abi::DAO_PROPOSALS, mock::MockGateway},
    render::View,
    session::{Session, Tab},
    viewmodel::{AlertSink, FetchMode, FetchState, ProposalViewModel},
    Error, Result,
};

const NOW: u64 = 1_700_000_000;
const HOUR: u64 = 3600;

#[derive(Default)]
struct RecordingAlerts(Mutex<Vec<String>>);

impl AlertSink for RecordingAlerts {
    fn alert(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

impl RecordingAlerts {
    fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

struct Harness {
    gateway: Arc<MockGateway>,
    alerts: Arc<RecordingAlerts>,
    vm: ProposalViewModel<MockGateway>,
}

fn owner() -> Address {
    Address::from_low_u64_be(0x0a)
}

fn member() -> Address {
    Address::from_low_u64_be(0x0b)
}

fn now() -> DateTime<Utc> {
    DateTime::from_timestamp(NOW as i64, 0).unwrap()
}

fn harness(account: Option<Address>, fetch_mode: FetchMode) -> Harness {
    let dao = Address::repeat_byte(0xda);
    let gateway = Arc::new(MockGateway::new(dao, owner(), account, NOW));
    let alerts = Arc::new(RecordingAlerts::default());

    let client = DaoClient::new(gateway.clone(), dao, Address::repeat_byte(0x17)).unwrap();
    let session = Arc::new(Session::new(account));
    let vm = ProposalViewModel::new(client, session, alerts.clone(), fetch_mode);

    Harness { gateway, alerts, vm }
}

#[test]
fn fetch_cycle_follows_creation_order() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.mint(member(), 1).await;
        h.gateway.insert_proposal(5, NOW + HOUR, 3, 1, false).await;
        h.gateway.insert_proposal(7, NOW - HOUR, 1, 4, false).await;

        assert_eq!(h.vm.fetch_state().await, FetchState::Idle);
        h.vm.select_tab(Tab::ViewProposals).await?;
        assert_eq!(h.vm.fetch_state().await, FetchState::Ready);

        let proposals = h.vm.proposals().await;
        assert_eq!(proposals.len(), 2);
        assert_eq!(proposals[0].proposal_id, 0);
        assert_eq!(proposals[0].nft_token_id, U256::from(5));
        assert_eq!(proposals[1].proposal_id, 1);
        assert_eq!(proposals[1].nft_token_id, U256::from(7));

        // Count first, then one read per index
        let log = h.gateway.read_log().await;
        assert_eq!(log.len(), 3);
        assert!(log[0].starts_with("dao.numProposals"));
        assert!(log[1].starts_with("dao.proposals"));
        assert!(log[2].starts_with("dao.proposals"));

        let View::ProposalList(cards) = h.vm.view(now()).await else {
            panic!("expected a proposal list")
        };
        assert_eq!(cards[0].affordance, Affordance::Vote);
        assert_eq!(cards[1].affordance, Affordance::Execute(Vote::Nay));
        assert_eq!(cards[1].affordance.to_string(), "Execute Proposal (NAY)");

        assert!(h.alerts.messages().is_empty());
        Ok::<_, Error>(())
    })
}

#[test]
fn empty_dao_shows_empty_state() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.vm.select_tab(Tab::ViewProposals).await?;
        assert!(h.vm.proposals().await.is_empty());
        assert_eq!(h.vm.fetch_state().await, FetchState::Ready);
        assert_eq!(h.vm.view(now()).await, View::NoProposals);
        Ok::<_, Error>(())
    })
}

#[test]
fn every_tab_entry_refetches() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.insert_proposal(5, NOW + HOUR, 0, 0, false).await;
        h.vm.select_tab(Tab::ViewProposals).await?;
        assert_eq!(h.vm.proposals().await.len(), 1);

        h.gateway.insert_proposal(6, NOW + HOUR, 0, 0, false).await;
        h.vm.select_tab(Tab::CreateProposal).await?;
        assert_eq!(h.vm.proposals().await.len(), 1);

        h.vm.select_tab(Tab::ViewProposals).await?;
        assert_eq!(h.vm.proposals().await.len(), 2);
        Ok::<_, Error>(())
    })
}

fn aborted_cycle_commits_nothing(fetch_mode: FetchMode) -> Result<()> {
    let h = harness(Some(member()), fetch_mode);

    smol::block_on(async {
        for token in 0..3 {
            h.gateway.insert_proposal(token, NOW + HOUR, 0, 0, false).await;
        }
        let committed = h.vm.fetch_all_proposals().await?;
        assert_eq!(committed.len(), 3);

        h.gateway.insert_proposal(3, NOW + HOUR, 0, 0, false).await;
        h.gateway.fail_read(DAO_PROPOSALS, Some(2)).await;

        let res = h.vm.select_tab(Tab::ViewProposals).await;
        assert!(matches!(res, Err(Error::RpcError(_))));

        // Previous snapshot kept, no partial list
        assert_eq!(h.vm.proposals().await, committed);
        assert_eq!(h.vm.fetch_state().await, FetchState::Idle);

        let alerts = h.alerts.messages();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Fetching proposals failed"));
        Ok::<_, Error>(())
    })
}

#[test]
fn sequential_abort_commits_nothing() -> Result<()> {
    aborted_cycle_commits_nothing(FetchMode::Sequential)
}

#[test]
fn concurrent_abort_commits_nothing() -> Result<()> {
    aborted_cycle_commits_nothing(FetchMode::Concurrent)
}

#[test]
fn count_failure_aborts_cycle() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.fail_read("numProposals", None).await;
        assert!(h.vm.fetch_all_proposals().await.is_err());
        assert_eq!(h.vm.fetch_state().await, FetchState::Idle);
        assert!(h.vm.proposals().await.is_empty());
        assert_eq!(h.alerts.messages().len(), 1);
        Ok::<_, Error>(())
    })
}

#[test]
fn concurrent_fetch_keeps_index_order() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Concurrent);

    smol::block_on(async {
        for token in [40, 30, 20, 10, 0] {
            h.gateway.insert_proposal(token, NOW + HOUR, 0, 0, false).await;
        }

        let proposals = h.vm.fetch_all_proposals().await?;
        let ids: Vec<u64> = proposals.iter().map(|p| p.proposal_id).collect();
        let tokens: Vec<U256> = proposals.iter().map(|p| p.nft_token_id).collect();
        assert_eq!(ids, vec![0, 1, 2, 3, 4]);
        assert_eq!(tokens, [40u64, 30, 20, 10, 0].map(U256::from).to_vec());
        Ok::<_, Error>(())
    })
}

/// Start a fetch whose first `proposals` read is held, then run a full
/// fetch over a second proposal before letting the held one finish.
async fn overtake_held_fetch(h: &Harness, fail_held: bool) -> Result<Vec<Proposal>> {
    h.gateway.insert_proposal(5, NOW + HOUR, 0, 0, false).await;
    let gate = h.gateway.hold_next_read(DAO_PROPOSALS).await;

    let older = h.vm.fetch_all_proposals();
    let newer = async {
        while h.vm.fetch_state().await != FetchState::DecodePending(0) {
            smol::future::yield_now().await;
        }

        h.gateway.insert_proposal(6, NOW + HOUR, 0, 0, false).await;
        let fresh = h.vm.fetch_all_proposals().await?;
        assert_eq!(fresh.len(), 2);

        if fail_held {
            h.gateway.fail_read(DAO_PROPOSALS, Some(0)).await;
        }
        gate.send(()).await.unwrap();
        Ok::<_, Error>(())
    };

    let (older, newer) = smol::future::zip(older, newer).await;
    newer?;
    older
}

#[test]
fn overtaken_fetch_keeps_the_newer_list() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        let stale = overtake_held_fetch(&h, false).await?;
        assert_eq!(stale.len(), 1);

        assert_eq!(h.vm.fetch_state().await, FetchState::Ready);
        let tokens: Vec<U256> = h.vm.proposals().await.iter().map(|p| p.nft_token_id).collect();
        assert_eq!(tokens, vec![U256::from(5), U256::from(6)]);
        Ok::<_, Error>(())
    })
}

#[test]
fn overtaken_fetch_failure_is_dropped() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        assert!(overtake_held_fetch(&h, true).await.is_err());

        assert_eq!(h.vm.fetch_state().await, FetchState::Ready);
        assert_eq!(h.vm.proposals().await.len(), 2);
        assert!(h.alerts.messages().is_empty());
        Ok::<_, Error>(())
    })
}

#[test]
fn votes_release_the_busy_flag() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.mint(member(), 2).await;
        h.gateway.insert_proposal(5, NOW + HOUR, 0, 0, false).await;
        h.vm.fetch_all_proposals().await?;

        h.vm.vote_on_proposal(0, Vote::Yay).await?;
        assert!(!h.vm.session().is_busy());

        // No optimistic update, only a re-fetch shows the new tally
        assert_eq!(h.vm.proposals().await[0].yay_votes, U256::zero());
        h.vm.fetch_all_proposals().await?;
        assert_eq!(h.vm.proposals().await[0].yay_votes, U256::from(2));

        // Second vote from the same account reverts on-chain
        let res = h.vm.vote_on_proposal(0, Vote::Nay).await;
        assert!(matches!(res, Err(Error::TransactionReverted(_))));
        assert!(!h.vm.session().is_busy());

        let alerts = h.alerts.messages();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].contains("ALREADY_VOTED"));
        Ok::<_, Error>(())
    })
}

#[test]
fn rejected_signature_releases_the_busy_flag() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.mint(member(), 1).await;
        h.gateway.insert_proposal(5, NOW + HOUR, 0, 0, false).await;
        h.gateway.fail_next_write(Error::UserRejected("User denied".to_string())).await;

        let res = h.vm.vote_on_proposal(0, Vote::Yay).await;
        assert!(matches!(res, Err(Error::UserRejected(_))));
        assert!(!h.vm.session().is_busy());
        assert_eq!(h.alerts.messages().len(), 1);

        // Nothing reached the contract
        let p = h.gateway.proposal(0).await.unwrap();
        assert_eq!(p.yay_votes, U256::zero());
        Ok::<_, Error>(())
    })
}

#[test]
fn writes_while_busy_are_rejected() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.mint(member(), 1).await;
        h.gateway.insert_proposal(5, NOW + HOUR, 0, 0, false).await;
        h.gateway.insert_proposal(6, NOW - HOUR, 0, 0, false).await;
        let gate = h.gateway.hold_confirmations().await;

        let first = h.vm.vote_on_proposal(0, Vote::Yay);
        let second = async {
            while !h.vm.session().is_busy() {
                smol::future::yield_now().await;
            }

            let res = h.vm.execute_proposal(1).await;
            assert!(matches!(res, Err(Error::TransactionInFlight)));
            // The first write still holds the flag
            assert!(h.vm.session().is_busy());

            gate.send(()).await.unwrap();
        };

        let (first, ()) = smol::future::zip(first, second).await;
        first?;
        assert!(!h.vm.session().is_busy());

        assert_eq!(h.gateway.proposal(0).await.unwrap().yay_votes, U256::from(1));
        assert!(!h.gateway.proposal(1).await.unwrap().executed);

        let alerts = h.alerts.messages();
        assert_eq!(alerts.len(), 1);
        assert!(alerts[0].starts_with("Executing proposal 1 failed"));
        Ok::<_, Error>(())
    })
}

#[test]
fn create_tab_without_nft() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.vm.refresh_dashboard().await?;
        h.vm.select_tab(Tab::CreateProposal).await?;
        assert_eq!(h.vm.view(now()).await, View::NoNft);

        // The contract agrees
        let res = h.vm.create_proposal(U256::from(1)).await;
        assert!(matches!(res, Err(Error::TransactionReverted(_))));
        assert!(h.alerts.messages()[0].contains("NOT_A_DAO_MEMBER"));

        h.gateway.mint(member(), 1).await;
        h.vm.refresh_dashboard().await?;
        assert_eq!(h.vm.view(now()).await, View::CreateProposalForm);
        Ok::<_, Error>(())
    })
}

#[test]
fn create_form_parses_decimal_token_ids() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.mint(member(), 1).await;

        for bad in ["", "abc", "0x2a", "-1"] {
            h.vm.session().set_token_id_input(bad).await;
            let res = h.vm.submit_create_form().await;
            assert!(matches!(res, Err(Error::ParseFailed(_))), "input {bad:?}");
        }
        assert_eq!(h.alerts.messages().len(), 4);
        assert!(h.gateway.proposal(0).await.is_none());

        h.vm.session().set_token_id_input(" 42 ").await;
        h.vm.submit_create_form().await?;

        let p = h.gateway.proposal(0).await.unwrap();
        assert_eq!(p.nft_token_id, U256::from(42));
        assert_eq!(p.deadline, NOW + 5 * 60);
        assert!(!h.vm.session().is_busy());
        Ok::<_, Error>(())
    })
}

#[test]
fn execute_after_deadline() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.mint(member(), 1).await;
        h.gateway.fund_treasury(parse_ether("0.3")?).await;
        h.gateway.insert_proposal(5, NOW + 60, 0, 0, false).await;

        h.vm.vote_on_proposal(0, Vote::Yay).await?;

        // Too early
        assert!(h.vm.execute_proposal(0).await.is_err());

        h.gateway.set_time(NOW + 60).await;
        h.vm.execute_proposal(0).await?;
        assert_eq!(h.gateway.treasury().await, parse_ether("0.2")?);

        h.vm.select_tab(Tab::ViewProposals).await?;
        let later = now() + chrono::Duration::seconds(60);
        let View::ProposalList(cards) = h.vm.view(later).await else {
            panic!("expected a proposal list")
        };
        assert_eq!(cards[0].affordance, Affordance::Executed);
        Ok::<_, Error>(())
    })
}

#[test]
fn dashboard_and_owner_withdraw() -> Result<()> {
    let h = harness(Some(owner()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.mint(owner(), 3).await;
        h.gateway.fund_treasury(parse_ether("0.3")?).await;
        h.gateway.insert_proposal(5, NOW + HOUR, 0, 0, false).await;

        let dashboard = h.vm.refresh_dashboard().await?;
        assert_eq!(dashboard.nft_balance, U256::from(3));
        assert_eq!(dashboard.treasury_balance, parse_ether("0.3")?);
        assert_eq!(dashboard.num_proposals, 1);
        assert!(dashboard.is_owner);
        assert_eq!(h.vm.withdraw_affordance().await, Some("Withdraw DAO ETH"));

        h.vm.withdraw_ether().await?;
        assert!(h.gateway.treasury().await.is_zero());
        assert!(h.vm.refresh_dashboard().await?.treasury_balance.is_zero());

        // Nothing left to withdraw
        assert!(h.vm.withdraw_ether().await.is_err());
        assert!(!h.vm.session().is_busy());
        Ok::<_, Error>(())
    })
}

#[test]
fn members_cannot_withdraw() -> Result<()> {
    let h = harness(Some(member()), FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.mint(member(), 1).await;
        h.gateway.fund_treasury(parse_ether("0.3")?).await;

        assert!(!h.vm.refresh_dashboard().await?.is_owner);
        assert_eq!(h.vm.withdraw_affordance().await, None);

        let res = h.vm.withdraw_ether().await;
        assert!(matches!(res, Err(Error::TransactionReverted(_))));
        assert_eq!(h.gateway.treasury().await, parse_ether("0.3")?);
        Ok::<_, Error>(())
    })
}

#[test]
fn disconnected_session() -> Result<()> {
    let h = harness(None, FetchMode::Sequential);

    smol::block_on(async {
        h.gateway.insert_proposal(5, NOW + HOUR, 0, 0, false).await;

        h.vm.select_tab(Tab::ViewProposals).await?;
        assert_eq!(h.vm.view(now()).await, View::ConnectWallet);

        let res = h.vm.vote_on_proposal(0, Vote::Yay).await;
        assert!(matches!(res, Err(Error::WalletNotConnected)));
        assert!(!h.vm.session().is_busy());
        assert_eq!(h.alerts.messages().len(), 1);
        Ok::<_, Error>(())
    })
}
