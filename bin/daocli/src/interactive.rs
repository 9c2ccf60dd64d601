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

use std::{io::Write, str::FromStr};

use chrono::Utc;
use tokio::io::{stdin, AsyncBufReadExt, BufReader};

use nftdao::{cli_desc, dao::Vote, session::Tab};

use crate::{print_info, print_receipt, DaoViewModel};

fn help() {
    println!("{}", cli_desc!());
    println!("Commands:");
    println!("\thelp: Prints the help message");
    println!("\tinfo: Show the DAO overview");
    println!("\ttab {{create|view}}: Switch tabs, viewing always re-fetches proposals");
    println!("\tinput {{token_id}}: Set the NFT token ID for a new proposal");
    println!("\tsubmit: Create a proposal for the NFT token ID set with `input`");
    println!("\tvote {{proposal_id}} {{yay|nay}}: Vote on a proposal");
    println!("\texecute {{proposal_id}}: Execute a proposal after its deadline");
    println!("\twithdraw: Withdraw the DAO treasury (owner only)");
    println!("\tshow: Render the current tab again");
    println!("\texit: Leave the shell");
}

fn prompt() {
    print!("daocli> ");
    let _ = std::io::stdout().flush();
}

/// Line-oriented shell over the view-model. Every failure has already
/// been alerted by the view-model, so handlers only render outcomes.
pub async fn interactive(vm: &DaoViewModel) {
    help();

    if vm.session().is_connected() {
        let _ = print_info(vm).await;
    }
    show(vm).await;

    let mut lines = BufReader::new(stdin()).lines();

    loop {
        prompt();

        // Grab input or end on Ctrl-D
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                eprintln!("Error while reading input: {e}");
                break
            }
        };

        let parts: Vec<&str> = line.split_whitespace().collect();
        if parts.is_empty() {
            continue
        }

        match parts[0] {
            "help" => help(),
            "info" => {
                let _ = print_info(vm).await;
            }
            "tab" => handle_tab(vm, &parts).await,
            "input" => handle_input(vm, &parts).await,
            "submit" => {
                if let Ok(receipt) = vm.submit_create_form().await {
                    print_receipt(&receipt);
                }
            }
            "vote" => handle_vote(vm, &parts).await,
            "execute" => handle_execute(vm, &parts).await,
            "withdraw" => {
                if let Ok(receipt) = vm.withdraw_ether().await {
                    print_receipt(&receipt);
                }
            }
            "show" => show(vm).await,
            "exit" | "quit" => break,
            _ => println!("Unrecognized command: {}", parts[0]),
        }
    }
}

async fn show(vm: &DaoViewModel) {
    println!("{}", vm.view(Utc::now()).await);
}

async fn handle_tab(vm: &DaoViewModel, parts: &[&str]) {
    if parts.len() != 2 {
        println!("Malformed `tab` command");
        println!("Usage: tab {{create|view}}");
        return
    }

    let tab = match parts[1] {
        "create" => Tab::CreateProposal,
        "view" => Tab::ViewProposals,
        _ => {
            println!("Unknown tab: {}", parts[1]);
            return
        }
    };

    // The create form is gated on the current NFT balance
    if tab == Tab::CreateProposal && vm.session().is_connected() {
        let _ = vm.refresh_dashboard().await;
    }

    let _ = vm.select_tab(tab).await;
    show(vm).await;
}

async fn handle_input(vm: &DaoViewModel, parts: &[&str]) {
    if parts.len() != 2 {
        println!("Malformed `input` command");
        println!("Usage: input {{token_id}}");
        return
    }

    vm.session().set_token_id_input(parts[1]).await;
}

async fn handle_vote(vm: &DaoViewModel, parts: &[&str]) {
    if parts.len() != 3 {
        println!("Malformed `vote` command");
        println!("Usage: vote {{proposal_id}} {{yay|nay}}");
        return
    }

    let proposal_id = match u64::from_str(parts[1]) {
        Ok(id) => id,
        Err(e) => {
            println!("Invalid proposal ID: {e}");
            return
        }
    };

    let vote = match Vote::from_str(parts[2]) {
        Ok(v) => v,
        Err(e) => {
            println!("Invalid vote: {e}");
            return
        }
    };

    if let Ok(receipt) = vm.vote_on_proposal(proposal_id, vote).await {
        print_receipt(&receipt);
    }
}

async fn handle_execute(vm: &DaoViewModel, parts: &[&str]) {
    if parts.len() != 2 {
        println!("Malformed `execute` command");
        println!("Usage: execute {{proposal_id}}");
        return
    }

    let proposal_id = match u64::from_str(parts[1]) {
        Ok(id) => id,
        Err(e) => {
            println!("Invalid proposal ID: {e}");
            return
        }
    };

    if let Ok(receipt) = vm.execute_proposal(proposal_id).await {
        print_receipt(&receipt);
    }
}
