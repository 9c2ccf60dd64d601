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

// Hello developer. Please add your error to the according subsection
// that is commented, or make a new subsection. Keep it clean.

/// Main result type used throughout the codebase.
pub type Result<T> = std::result::Result<T, Error>;

/// General library errors used throughout the codebase.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    // ==============
    // Parsing errors
    // ==============
    #[error("Parse failed: {0}")]
    ParseFailed(&'static str),

    #[error(transparent)]
    UrlParseError(#[from] url::ParseError),

    #[error("Amount conversion failed: {0}")]
    ConversionError(String),

    // ===============
    // Encoding errors
    // ===============
    #[error("decode failed: {0}")]
    DecodeError(&'static str),

    #[error("ABI error: {0}")]
    AbiError(String),

    #[error("JSON error: {0}")]
    JsonError(String),

    // =====================
    // Gateway related errors
    // =====================
    #[error("RPC request failed: {0}")]
    RpcError(String),

    #[error("Transaction was rejected by the wallet holder: {0}")]
    UserRejected(String),

    #[error("Transaction {0} reverted")]
    TransactionReverted(String),

    #[error("Transaction {0} was dropped from the mempool")]
    TransactionDropped(String),

    #[error("Unknown contract function: {0}")]
    UnknownFunction(String),

    // ========================
    // View-model related errors
    // ========================
    #[error("Another transaction is still waiting for confirmation")]
    TransactionInFlight,

    #[error("No wallet connected")]
    WalletNotConnected,

    // ===============
    // Artifact errors
    // ===============
    #[error("Contract artifact {0} has no bytecode")]
    MissingBytecode(String),

    #[error("Contract verification failed: {0}")]
    VerificationFailed(String),

    // =============
    // Misc errors
    // =============
    #[error("IO error: {0}")]
    Io(std::io::ErrorKind),

    #[error("Set logger failed: {0}")]
    SetLoggerError(String),

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.kind())
    }
}

impl From<log::SetLoggerError> for Error {
    fn from(err: log::SetLoggerError) -> Self {
        Self::SetLoggerError(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Self::JsonError(err.to_string())
    }
}

impl From<ethers::abi::Error> for Error {
    fn from(err: ethers::abi::Error) -> Self {
        Self::AbiError(err.to_string())
    }
}

impl From<ethers::abi::ParseError> for Error {
    fn from(err: ethers::abi::ParseError) -> Self {
        Self::AbiError(err.to_string())
    }
}

impl From<ethers::utils::ConversionError> for Error {
    fn from(err: ethers::utils::ConversionError) -> Self {
        Self::ConversionError(err.to_string())
    }
}
