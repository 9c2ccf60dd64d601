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

use std::sync::atomic::{AtomicBool, Ordering};

use ethers::types::Address;
use smol::lock::Mutex;

use crate::{Error, Result};

/// Tabs the client can show
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tab {
    CreateProposal,
    ViewProposals,
}

/// Per-user UI state: connected wallet, busy flag, selected tab and the
/// token id typed into the create form.
pub struct Session {
    account: Option<Address>,
    busy: AtomicBool,
    selected_tab: Mutex<Option<Tab>>,
    token_id_input: Mutex<String>,
}

impl Session {
    pub fn new(account: Option<Address>) -> Self {
        Self {
            account,
            busy: AtomicBool::new(false),
            selected_tab: Mutex::new(None),
            token_id_input: Mutex::new(String::new()),
        }
    }

    pub fn account(&self) -> Option<Address> {
        self.account
    }

    pub fn is_connected(&self) -> bool {
        self.account.is_some()
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::SeqCst)
    }

    /// Claim the busy flag for one write. Fails if another write holds it.
    /// The flag is released when the returned guard is dropped.
    pub fn try_acquire(&self) -> Result<BusyGuard<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| Error::TransactionInFlight)?;

        Ok(BusyGuard { flag: &self.busy })
    }

    pub async fn selected_tab(&self) -> Option<Tab> {
        *self.selected_tab.lock().await
    }

    pub async fn set_selected_tab(&self, tab: Tab) {
        *self.selected_tab.lock().await = Some(tab);
    }

    pub async fn token_id_input(&self) -> String {
        self.token_id_input.lock().await.clone()
    }

    pub async fn set_token_id_input(&self, input: &str) {
        *self.token_id_input.lock().await = input.to_string();
    }
}

/// Holds the session busy flag until dropped.
pub struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use std::panic::{catch_unwind, AssertUnwindSafe};

    use super::*;

    #[test]
    fn busy_flag_is_exclusive() {
        let session = Session::new(None);
        assert!(!session.is_busy());

        let guard = session.try_acquire().unwrap();
        assert!(session.is_busy());
        assert!(matches!(session.try_acquire(), Err(Error::TransactionInFlight)));

        drop(guard);
        assert!(!session.is_busy());
        assert!(session.try_acquire().is_ok());
        assert!(!session.is_busy());
    }

    #[test]
    fn busy_flag_released_on_unwind() {
        let session = Session::new(None);

        let res = catch_unwind(AssertUnwindSafe(|| {
            let _guard = session.try_acquire().unwrap();
            panic!("write blew up");
        }));

        assert!(res.is_err());
        assert!(!session.is_busy());
    }

    #[test]
    fn tab_and_input() {
        let session = Session::new(Some(Address::repeat_byte(1)));
        assert!(session.is_connected());

        smol::block_on(async {
            assert_eq!(session.selected_tab().await, None);
            session.set_selected_tab(Tab::ViewProposals).await;
            assert_eq!(session.selected_tab().await, Some(Tab::ViewProposals));

            session.set_token_id_input("42").await;
            assert_eq!(session.token_id_input().await, "42");
        });
    }
}
