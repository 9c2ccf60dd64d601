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

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use ethers::{abi::Token, types::U256};
use serde::Deserialize;

use crate::{Error, Result};

/// Symbolic vote choices accepted by `voteOnProposal`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Vote {
    Yay,
    Nay,
}

impl Vote {
    /// Numeric code the governance contract expects.
    pub fn code(&self) -> u8 {
        match self {
            Self::Yay => 0,
            Self::Nay => 1,
        }
    }
}

impl FromStr for Vote {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "yay" => Ok(Self::Yay),
            "nay" => Ok(Self::Nay),
            _ => Err(Error::ParseFailed("Vote must be one of: yay, nay")),
        }
    }
}

impl fmt::Display for Vote {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Yay => write!(f, "YAY"),
            Self::Nay => write!(f, "NAY"),
        }
    }
}

/// What a proposal currently lets its viewer do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Affordance {
    /// Voting is still open
    Vote,
    /// Deadline passed, the proposal can be executed. Carries the side
    /// currently holding the majority.
    Execute(Vote),
    /// Terminal state, nothing left to do
    Executed,
}

impl fmt::Display for Affordance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Vote => write!(f, "Vote YAY | Vote NAY"),
            Self::Execute(side) => write!(f, "Execute Proposal ({side})"),
            Self::Executed => write!(f, "Proposal Executed"),
        }
    }
}

/// Read-only projection of an on-chain proposal. Never authoritative,
/// always re-fetched through the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Proposal {
    /// Index of the proposal in creation order
    pub proposal_id: u64,
    /// NFT the proposal wants to buy, opaque to us
    pub nft_token_id: U256,
    /// Voting cutoff
    pub deadline: DateTime<Utc>,
    pub yay_votes: U256,
    pub nay_votes: U256,
    pub executed: bool,
}

impl Proposal {
    /// Decode the `(nftTokenId, deadline, yayVotes, nayVotes, executed)`
    /// tuple returned by `proposals(id)`.
    pub fn from_tokens(proposal_id: u64, tokens: Vec<Token>) -> Result<Self> {
        let fields: [Token; 5] = tokens
            .try_into()
            .map_err(|_| Error::DecodeError("proposal tuple must have 5 fields"))?;

        let [
            Token::Uint(nft_token_id),
            Token::Uint(deadline),
            Token::Uint(yay_votes),
            Token::Uint(nay_votes),
            Token::Bool(executed),
        ] = fields
        else {
            return Err(Error::DecodeError("unexpected proposal field types"))
        };

        Ok(Self {
            proposal_id,
            nft_token_id,
            deadline: deadline_from_seconds(deadline)?,
            yay_votes,
            nay_votes,
            executed,
        })
    }

    /// Side holding the majority. Ties go to NAY, like on-chain.
    pub fn majority(&self) -> Vote {
        if self.yay_votes > self.nay_votes {
            Vote::Yay
        } else {
            Vote::Nay
        }
    }

    pub fn affordance(&self, now: DateTime<Utc>) -> Affordance {
        if self.executed {
            return Affordance::Executed
        }

        if now < self.deadline {
            Affordance::Vote
        } else {
            Affordance::Execute(self.majority())
        }
    }
}

/// Convert on-chain seconds since the epoch into a date-time.
pub fn deadline_from_seconds(seconds: U256) -> Result<DateTime<Utc>> {
    if seconds > U256::from(i64::MAX as u64) {
        return Err(Error::DecodeError("deadline out of range"))
    }

    DateTime::from_timestamp(seconds.as_u64() as i64, 0)
        .ok_or(Error::DecodeError("deadline out of range"))
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn tuple(token: u64, deadline: i64, yay: u64, nay: u64, executed: bool) -> Vec<Token> {
        vec![
            Token::Uint(U256::from(token)),
            Token::Uint(U256::from(deadline as u64)),
            Token::Uint(U256::from(yay)),
            Token::Uint(U256::from(nay)),
            Token::Bool(executed),
        ]
    }

    #[test]
    fn decode_proposal_tuple() -> Result<()> {
        let p = Proposal::from_tokens(3, tuple(5, 1_700_000_000, 3, 1, false))?;
        assert_eq!(p.proposal_id, 3);
        assert_eq!(p.nft_token_id, U256::from(5));
        assert_eq!(p.deadline.timestamp(), 1_700_000_000);
        assert_eq!(p.yay_votes, U256::from(3));
        assert_eq!(p.nay_votes, U256::from(1));
        assert!(!p.executed);
        Ok(())
    }

    #[test]
    fn reject_malformed_tuples() {
        let mut short = tuple(5, 1_700_000_000, 3, 1, false);
        short.pop();
        assert!(matches!(Proposal::from_tokens(0, short), Err(Error::DecodeError(_))));

        let mut swapped = tuple(5, 1_700_000_000, 3, 1, false);
        swapped.swap(0, 4);
        assert!(matches!(Proposal::from_tokens(0, swapped), Err(Error::DecodeError(_))));

        let mut huge = tuple(5, 0, 3, 1, false);
        huge[1] = Token::Uint(U256::MAX);
        assert!(matches!(Proposal::from_tokens(0, huge), Err(Error::DecodeError(_))));
    }

    #[test]
    fn affordances_follow_deadline_and_execution() -> Result<()> {
        let now = Utc::now();
        let hour = Duration::hours(1);

        let open = Proposal::from_tokens(0, tuple(5, (now + hour).timestamp(), 3, 1, false))?;
        assert_eq!(open.affordance(now), Affordance::Vote);

        let closed = Proposal::from_tokens(1, tuple(7, (now - hour).timestamp(), 1, 4, false))?;
        assert_eq!(closed.affordance(now), Affordance::Execute(Vote::Nay));
        assert_eq!(closed.affordance(now).to_string(), "Execute Proposal (NAY)");

        let passed = Proposal::from_tokens(2, tuple(9, (now - hour).timestamp(), 4, 1, false))?;
        assert_eq!(passed.affordance(now).to_string(), "Execute Proposal (YAY)");

        // Executed wins over any deadline or tally
        for deadline in [now - hour, now + hour] {
            let done = Proposal::from_tokens(3, tuple(1, deadline.timestamp(), 9, 0, true))?;
            assert_eq!(done.affordance(now), Affordance::Executed);
        }
        Ok(())
    }

    #[test]
    fn deadline_boundary_is_executable() -> Result<()> {
        let p = Proposal::from_tokens(0, tuple(1, 1_700_000_000, 2, 2, false))?;
        assert_eq!(p.affordance(p.deadline), Affordance::Execute(Vote::Nay));
        assert_eq!(p.affordance(p.deadline - Duration::seconds(1)), Affordance::Vote);
        Ok(())
    }

    #[test]
    fn vote_codes() {
        assert_eq!(Vote::Yay.code(), 0);
        assert_eq!(Vote::Nay.code(), 1);
        assert_eq!("YAY".parse::<Vote>().unwrap(), Vote::Yay);
        assert_eq!("nay".parse::<Vote>().unwrap(), Vote::Nay);
        assert!("maybe".parse::<Vote>().is_err());
    }
}
