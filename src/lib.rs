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

//! Client for an NFT-gated DAO on an EVM chain.
//!
//! The governance contract keeps the treasury and all proposal state.
//! This crate reads that state through a [`gateway::ContractGateway`],
//! derives what each proposal currently allows, and submits the
//! create/vote/execute/withdraw transactions one at a time.

pub mod error;
pub use error::{Error, Result};

/// Contract gateway trait and implementations
pub mod gateway;

/// Proposal records and typed contract calls
pub mod dao;

/// Per-user UI session state
pub mod session;

/// Proposal view-model
pub mod viewmodel;

/// View selection and terminal rendering
pub mod render;

/// Utility modules
pub mod util;
