// Copyright (c) 2018-2025 The Botho Foundation

//! Single synchronous entry point of the key keeper.

use bth_keykeeper_core::Path;
use bth_keykeeper_types::{ProtoErrorKind, Status};
use rand_core::{CryptoRng, RngCore};
use tracing::{debug, warn};

use super::{
    codec::{Request, Response},
    schema::Opcode,
};
use crate::{confirm::UserConfirmation, keeper::KeyKeeper, Error};

/// Smallest response buffer, enough for any status
pub const MIN_RESPONSE_LEN: usize = 2;

impl<C: UserConfirmation, R: RngCore + CryptoRng> KeyKeeper<C, R> {
    /// Serve one encoded request, writing the encoded response into
    /// `response`. Returns the number of bytes written: zero only when
    /// `response` is shorter than [`MIN_RESPONSE_LEN`].
    ///
    /// Requests are fully validated against the method schema before the
    /// handler runs, so a rejected request changes no state.
    pub fn invoke(&mut self, request: &[u8], response: &mut [u8]) -> usize {
        if response.len() < MIN_RESPONSE_LEN {
            warn!(capacity = response.len(), "Response buffer too small for a status");
            return 0;
        }
        match self.process(request, response) {
            Ok(len) => len,
            Err(err) => {
                let status = err.status();
                warn!(opcode = ?request.first(), error = %err, "Request failed");
                response[0] = status.code();
                if let Status::ProtoError(kind) = status {
                    response[1] = kind as u8;
                }
                status.wire_len()
            }
        }
    }

    /// [`Self::invoke`] with a response buffer sized for the request
    pub fn invoke_vec(&mut self, request: &[u8]) -> Vec<u8> {
        let capacity = request
            .split_first()
            .and_then(|(op, payload)| {
                let schema = Opcode::from_u8(*op)?.schema();
                schema.check_request(payload).ok()?;
                schema.response_len(payload).ok()
            })
            .unwrap_or(0);
        let mut response = vec![0u8; 1 + capacity.max(MIN_RESPONSE_LEN)];
        let len = self.invoke(request, &mut response);
        response.truncate(len);
        response
    }

    fn process(&mut self, request: &[u8], response: &mut [u8]) -> Result<usize, Error> {
        let (op, payload) = request
            .split_first()
            .ok_or(Error::Proto(ProtoErrorKind::LengthMismatch))?;
        let op = Opcode::from_u8(*op).ok_or(Error::Proto(ProtoErrorKind::UnknownOpcode))?;
        let schema = op.schema();
        debug!(method = schema.name, len = payload.len(), "Request");

        schema.check_request(payload)?;
        let len = 1 + schema.response_len(payload)?;
        if response.len() < len {
            return Err(Error::Proto(ProtoErrorKind::ResponseTooSmall));
        }

        let reply = self.handle(Request::decode(op, payload)?)?;
        let bytes = reply.to_bytes();
        debug_assert_eq!(bytes.len() + 1, len, "{} response", schema.name);

        response[0] = Status::OK;
        response[1..1 + bytes.len()].copy_from_slice(&bytes);
        Ok(1 + bytes.len())
    }

    /// Run the handler of a decoded request
    pub fn handle(&mut self, request: Request) -> Result<Response, Error> {
        Ok(match request {
            Request::Version => Response::Version(self.version()),
            Request::GetPKdf(path) => {
                Response::PKdf(self.derive_public(&Path::from_bytes(&path)?)?)
            }
            Request::GetNumSlots => Response::NumSlots(self.num_slots()),
            Request::ReadSlot(slot) => Response::Slot(self.read_slot(slot)?),
            Request::RegenerateSlot(slot) => Response::Slot(self.regenerate_slot(slot)?),
            Request::GetIdentity(id) => Response::Identity(self.identity_public(id)?),
            Request::CreateOutput(req) => Response::CreateOutput(self.create_output(&req)?),
            Request::CreateShieldedInput(req) => {
                Response::CreateShieldedInput(self.create_shielded_input(&req)?)
            }
            Request::CreateShieldedVouchers { count, id, nonce0 } => {
                Response::Vouchers(self.create_shielded_vouchers(id, &nonce0, count)?)
            }
            Request::SignSplit(mut tx) => {
                self.sign_split(&mut tx)?;
                Response::Split(tx.kernel, tx.offset)
            }
            Request::SignReceive(mut tx, mut mutual) => {
                self.sign_receive(&mut tx, &mut mutual)?;
                Response::Receive(tx.kernel, tx.offset, mutual.payment_proof)
            }
            Request::SignSend(mut tx, mutual, mut sender) => {
                self.sign_send(&mut tx, &mutual, &mut sender)?;
                Response::Send(tx.kernel, tx.offset, sender.user_agreement)
            }
            Request::SignSendShielded(mut tx, params) => {
                let output = self.sign_send_shielded(&mut tx, &params)?;
                Response::SendShielded(tx.kernel, tx.offset, output)
            }
        })
    }
}
