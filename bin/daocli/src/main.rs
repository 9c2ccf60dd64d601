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

use std::{process::exit, sync::Arc, time::Duration};

use chrono::Utc;
use ethers::types::Address;
use structopt_toml::{serde::Deserialize, structopt::StructOpt, StructOptToml};
use url::Url;

use nftdao::{
    async_daemonize, cli_desc,
    dao::{DaoClient, Vote},
    gateway::{ethereum::EthGateway, TxReceipt},
    render::{dashboard_table, View},
    session::{Session, Tab},
    viewmodel::{AlertSink, FetchMode, ProposalViewModel},
    Result,
};

/// Interactive shell
mod interactive;
use interactive::interactive;

const CONFIG_FILE: &str = "daocli_config.toml";
const CONFIG_FILE_CONTENTS: &str = include_str!("../daocli_config.toml");

#[derive(Clone, Debug, Deserialize, StructOpt, StructOptToml)]
#[serde(default)]
#[structopt(name = "daocli", about = cli_desc!())]
struct Args {
    #[structopt(short, long)]
    /// Configuration file to use
    config: Option<String>,

    #[structopt(short, long, default_value = "http://127.0.0.1:8545")]
    /// Ethereum JSON-RPC endpoint
    endpoint: Url,

    #[structopt(long)]
    /// Wallet account to send transactions from
    account: Option<Address>,

    #[structopt(long)]
    /// DAO governance contract address
    dao_address: Option<Address>,

    #[structopt(long)]
    /// Membership NFT contract address
    nft_address: Option<Address>,

    #[structopt(long, default_value = "1")]
    /// Confirmations to wait for on each transaction
    confirmations: usize,

    #[structopt(long, default_value = "2000")]
    /// Receipt polling interval in milliseconds
    poll_interval: u64,

    #[structopt(long, default_value = "sequential")]
    /// Proposal fetch mode (sequential, concurrent)
    fetch_mode: FetchMode,

    #[structopt(subcommand)]
    /// Sub command to execute
    command: Subcmd,

    #[structopt(short, long)]
    /// Set log file to ouput into
    log: Option<String>,

    #[structopt(short, parse(from_occurrences))]
    /// Increase verbosity (-vvv supported)
    verbose: u8,
}

#[derive(Clone, Debug, Deserialize, StructOpt)]
enum Subcmd {
    /// Show the DAO overview for the configured account
    Info,

    /// List all proposals with their available actions
    Proposals,

    /// Create a proposal to buy an NFT
    Create {
        /// Token ID of the NFT to purchase
        token_id: String,
    },

    /// Vote on a proposal
    Vote {
        /// Proposal ID
        proposal_id: u64,

        /// Vote to cast (yay, nay)
        vote: Vote,
    },

    /// Execute a proposal after its deadline
    Execute {
        /// Proposal ID
        proposal_id: u64,
    },

    /// Withdraw the DAO treasury (owner only)
    Withdraw,

    /// Enter the interactive shell
    Interactive,
}

/// Prints alerts to stderr
pub struct TerminalAlerts;

impl AlertSink for TerminalAlerts {
    fn alert(&self, message: &str) {
        eprintln!("Error: {message}");
    }
}

pub type DaoViewModel = ProposalViewModel<EthGateway>;

/// Print the DAO overview, with the withdraw action for the owner.
pub async fn print_info(vm: &DaoViewModel) -> Result<()> {
    let dashboard = vm.refresh_dashboard().await?;
    println!("{}", dashboard_table(&dashboard));

    if let Some(label) = vm.withdraw_affordance().await {
        println!("Owner action: {label}");
    }

    Ok(())
}

pub fn print_receipt(receipt: &TxReceipt) {
    match receipt.block_number {
        Some(block) => println!("Transaction {:?} confirmed in block {}", receipt.tx_hash, block),
        None => println!("Transaction {:?} confirmed", receipt.tx_hash),
    }
}

async_daemonize!(realmain);
async fn realmain(args: Args) -> Result<()> {
    let Some(dao_address) = args.dao_address else {
        eprintln!("Error: No DAO contract address configured (dao_address)");
        exit(2);
    };

    let Some(nft_address) = args.nft_address else {
        eprintln!("Error: No NFT contract address configured (nft_address)");
        exit(2);
    };

    let gateway = EthGateway::new(
        &args.endpoint,
        args.account,
        args.confirmations,
        Duration::from_millis(args.poll_interval),
    )?;
    let client = DaoClient::new(Arc::new(gateway), dao_address, nft_address)?;
    let session = Arc::new(Session::new(args.account));
    let vm = ProposalViewModel::new(client, session, Arc::new(TerminalAlerts), args.fetch_mode);

    if !vm.session().is_connected() && !matches!(args.command, Subcmd::Interactive) {
        eprintln!("{}", View::ConnectWallet);
        exit(2);
    }

    match args.command {
        Subcmd::Info => {
            if print_info(&vm).await.is_err() {
                exit(2);
            }
            Ok(())
        }

        Subcmd::Proposals => {
            if vm.select_tab(Tab::ViewProposals).await.is_err() {
                exit(2);
            }
            println!("{}", vm.view(Utc::now()).await);
            Ok(())
        }

        Subcmd::Create { token_id } => {
            if vm.refresh_dashboard().await.is_err() {
                exit(2);
            }
            vm.select_tab(Tab::CreateProposal).await?;

            let view = vm.view(Utc::now()).await;
            if view == View::NoNft {
                println!("{view}");
                exit(2);
            }

            vm.session().set_token_id_input(&token_id).await;
            match vm.submit_create_form().await {
                Ok(receipt) => print_receipt(&receipt),
                Err(_) => exit(2),
            }
            Ok(())
        }

        Subcmd::Vote { proposal_id, vote } => {
            match vm.vote_on_proposal(proposal_id, vote).await {
                Ok(receipt) => print_receipt(&receipt),
                Err(_) => exit(2),
            }
            Ok(())
        }

        Subcmd::Execute { proposal_id } => {
            match vm.execute_proposal(proposal_id).await {
                Ok(receipt) => print_receipt(&receipt),
                Err(_) => exit(2),
            }
            Ok(())
        }

        Subcmd::Withdraw => {
            match vm.withdraw_ether().await {
                Ok(receipt) => print_receipt(&receipt),
                Err(_) => exit(2),
            }
            Ok(())
        }

        Subcmd::Interactive => {
            interactive(&vm).await;
            Ok(())
        }
    }
}
