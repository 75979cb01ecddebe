// Copyright (c) 2018-2025 The Botho Foundation

//! User confirmation of spends.
//!
//! A hardware key keeper shows what is about to leave the wallet and waits
//! for a button press. The decision is abstracted so hosts and tests can
//! supply their own policy.

use bth_keykeeper_types::{Amount, AssetId, UintBig};

/// What kind of spend is being confirmed
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SpendKind {
    /// Only the fee leaves the wallet
    Split,
    /// Value is sent to a peer in a two-party transaction
    Send,
    /// Value is sent to a shielded output of a peer
    SendShielded,
    /// Shielded send back to one of our own identities, only the fee is spent
    SelfShielded,
}

/// A spend awaiting user approval
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SpendRequest {
    /// Kind of spend
    pub kind: SpendKind,
    /// Amount leaving the wallet, excluding the fee
    pub amount: Amount,
    /// Asset of `amount`
    pub asset_id: AssetId,
    /// Receiving peer, if any
    pub peer: Option<UintBig>,
    /// Fee, in the native asset
    pub fee: Amount,
}

/// Decides whether a spend may proceed
pub trait UserConfirmation {
    /// Return `true` to approve the spend
    fn confirm_spend(&self, request: &SpendRequest) -> bool;
}

impl<T: UserConfirmation> UserConfirmation for &T {
    fn confirm_spend(&self, request: &SpendRequest) -> bool {
        <T as UserConfirmation>::confirm_spend(self, request)
    }
}

/// Approves every spend
#[derive(Clone, Copy, Debug, Default)]
pub struct AutoApprove;

impl UserConfirmation for AutoApprove {
    fn confirm_spend(&self, _request: &SpendRequest) -> bool {
        true
    }
}
