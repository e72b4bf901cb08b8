//! Call routing
//!
//! A [`Call`] is what a transport hands the ledger: who is calling, how much
//! value came with the call, and an opaque payload. Routing rules:
//!
//! | payload                  | value | route                          |
//! |--------------------------|-------|--------------------------------|
//! | empty                    | any   | receive (same path as deposit) |
//! | `Instruction::Deposit`   | any   | deposit of the attached value  |
//! | `Instruction::Withdraw`  | 0     | withdraw                       |
//! | `Instruction::Withdraw`  | > 0   | rejected, `NonPayable`         |
//! | unrecognized             | 0     | ignored (no-op)                |
//! | unrecognized             | > 0   | rejected, `UnexpectedPayload`  |
//!
//! Ignoring unrecognized zero-value calls keeps existing integrations that
//! probe the endpoint working. Do not copy this into new entry points.

use crate::{
    types::{AccountId, Amount, LedgerEvent},
    Error, Result,
};
use bincode::Options;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Known entry points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    /// Credit the attached value to the caller
    Deposit,
    /// Send `amount` from the caller's vault to the caller
    Withdraw {
        /// Amount to withdraw
        amount: Amount,
    },
}

fn codec() -> impl Options {
    bincode::DefaultOptions::new().reject_trailing_bytes()
}

impl Instruction {
    /// Encode as a call payload
    pub fn encode(&self) -> Result<Bytes> {
        Ok(Bytes::from(codec().serialize(self)?))
    }

    /// Decode a call payload, `None` if it matches no entry point
    pub fn decode(payload: &[u8]) -> Option<Self> {
        codec().deserialize(payload).ok()
    }
}

/// An inbound call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    /// Calling account; also the account operated on
    pub caller: AccountId,

    /// Value attached to the call
    pub value: Amount,

    /// Raw payload
    pub payload: Bytes,
}

impl Call {
    /// Bare value transfer with no payload
    pub fn transfer(caller: AccountId, value: Amount) -> Self {
        Self {
            caller,
            value,
            payload: Bytes::new(),
        }
    }

    /// Call a known entry point
    pub fn instruction(caller: AccountId, value: Amount, instruction: &Instruction) -> Result<Self> {
        Ok(Self {
            caller,
            value,
            payload: instruction.encode()?,
        })
    }

    /// Call with an arbitrary payload
    pub fn raw(caller: AccountId, value: Amount, payload: impl Into<Bytes>) -> Self {
        Self {
            caller,
            value,
            payload: payload.into(),
        }
    }
}

/// Where a call goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Bare value received
    Receive(Amount),
    /// Explicit deposit
    Deposit(Amount),
    /// Explicit withdrawal
    Withdraw(Amount),
    /// Unrecognized payload without value
    Ignore,
}

/// Resolve the route for a call without touching ledger state
pub fn route(call: &Call) -> Result<Route> {
    if call.payload.is_empty() {
        return Ok(Route::Receive(call.value));
    }

    match Instruction::decode(&call.payload) {
        Some(Instruction::Deposit) => Ok(Route::Deposit(call.value)),
        Some(Instruction::Withdraw { .. }) if call.value > 0 => {
            Err(Error::NonPayable { value: call.value })
        }
        Some(Instruction::Withdraw { amount }) => Ok(Route::Withdraw(amount)),
        None if call.value > 0 => Err(Error::UnexpectedPayload {
            len: call.payload.len(),
            value: call.value,
        }),
        None => Ok(Route::Ignore),
    }
}

/// Result of a dispatched call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome {
    /// A deposit or withdrawal completed
    Completed(LedgerEvent),
    /// The call matched nothing and carried no value
    Ignored,
}

impl CallOutcome {
    /// Event of a completed call
    pub fn event(&self) -> Option<&LedgerEvent> {
        match self {
            CallOutcome::Completed(event) => Some(event),
            CallOutcome::Ignored => None,
        }
    }
}
