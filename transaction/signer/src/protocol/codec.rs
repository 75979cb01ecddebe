// Copyright (c) 2018-2025 The Botho Foundation

//! Typed requests and responses and their byte encoding.
//!
//! Encodings follow the layouts in [`super::schema`]. Decoding assumes the
//! length was already checked against the schema but still fails cleanly
//! on truncated input.

use bth_keykeeper_core::{KdfPub, Signature, TxKernel};
use bth_keykeeper_types::{
    CoinId, ProtoErrorKind, RangeProofPacked, ShieldedInput, ShieldedTxoId, ShieldedTxoUser,
    UintBig, WalletIdentity,
};
use curve25519_dalek::{ristretto::CompressedRistretto, scalar::Scalar};

use super::schema::Opcode;
use crate::tx::{
    CreateOutputRequest, CreateOutputResponse, CreateShieldedInputRequest,
    CreateShieldedInputResponse, ShieldedVoucher, TxCommon, TxMutualInfo, TxSendShieldedParams,
    TxSenderParams,
};

/// A decoded request
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Request {
    /// Protocol version
    Version,
    /// Public key pair of a derivation path, given in its canonical
    /// encoding
    GetPKdf(Vec<u8>),
    /// Number of nonce slots
    GetNumSlots,
    /// Public projection of a nonce slot
    ReadSlot(u32),
    /// Replace a nonce slot
    RegenerateSlot(u32),
    /// Public key of a wallet identity
    GetIdentity(WalletIdentity),
    /// Range proof share of an output
    CreateOutput(CreateOutputRequest),
    /// Spend proof share of a shielded input
    CreateShieldedInput(CreateShieldedInputRequest),
    /// Batch of vouchers
    CreateShieldedVouchers {
        /// Number of vouchers
        count: u32,
        /// Issuing identity
        id: WalletIdentity,
        /// Batch seed
        nonce0: UintBig,
    },
    /// Fee-only transaction
    SignSplit(TxCommon),
    /// Receiver side
    SignReceive(TxCommon, TxMutualInfo),
    /// Sender side, either round
    SignSend(TxCommon, TxMutualInfo, TxSenderParams),
    /// Send to a shielded output
    SignSendShielded(TxCommon, Box<TxSendShieldedParams>),
}

/// A successful response
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Response {
    /// Protocol version
    Version(u32),
    /// Public key pair
    PKdf(KdfPub),
    /// Number of nonce slots
    NumSlots(u32),
    /// Slot projection, after a read or a regeneration
    Slot(CompressedRistretto),
    /// Identity public key
    Identity(CompressedRistretto),
    /// Range proof share
    CreateOutput(CreateOutputResponse),
    /// Spend proof share
    CreateShieldedInput(CreateShieldedInputResponse),
    /// Vouchers
    Vouchers(Vec<ShieldedVoucher>),
    /// Kernel and offset of a split
    Split(TxKernel, Scalar),
    /// Kernel, offset and payment proof of a receive
    Receive(TxKernel, Scalar, Signature),
    /// Kernel, offset and agreement token of a send round
    Send(TxKernel, Scalar, UintBig),
    /// Kernel, offset and output commitment of a shielded send
    SendShielded(TxKernel, Scalar, CompressedRistretto),
}

struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    fn new() -> Self {
        Self { buf: Vec::new() }
    }

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_bytes(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    fn write_point(&mut self, p: &CompressedRistretto) {
        self.write_bytes(p.as_bytes());
    }

    fn write_scalar(&mut self, s: &Scalar) {
        self.write_bytes(s.as_bytes());
    }

    fn write_signature(&mut self, sig: &Signature) {
        self.write_point(&sig.nonce_pub);
        self.write_scalar(&sig.k);
    }

    fn write_coin(&mut self, cid: &CoinId) {
        self.write_u64(cid.key_index);
        self.write_u32(cid.key_type);
        self.write_u32(cid.sub_index);
        self.write_u64(cid.value);
        self.write_u32(cid.asset_id);
    }

    fn write_kernel(&mut self, kernel: &TxKernel) {
        self.write_bytes(&kernel.to_bytes());
    }

    fn write_shielded_input(&mut self, inp: &ShieldedInput) {
        self.write_bytes(&inp.txo.k_ser_g);
        self.write_u32(inp.txo.viewer_index);
        self.write_u8(inp.txo.created_by_viewer as u8);
        self.write_bytes(&inp.txo.user.sender);
        self.write_bytes(&inp.txo.user.message[0]);
        self.write_bytes(&inp.txo.user.message[1]);
        self.write_u64(inp.txo.amount);
        self.write_u32(inp.txo.asset_id);
        self.write_u64(inp.fee);
    }

    fn write_voucher(&mut self, v: &ShieldedVoucher) {
        self.write_point(&v.serial_pub);
        self.write_point(&v.nonce_pub);
        self.write_scalar(&v.pk[0]);
        self.write_scalar(&v.pk[1]);
        self.write_bytes(&v.shared_secret);
        self.write_signature(&v.signature);
    }

    // counts, then the kernel; the coins follow the method fields
    fn write_tx_head(&mut self, tx: &TxCommon) {
        self.write_u32(tx.ins.len() as u32);
        self.write_u32(tx.outs.len() as u32);
        self.write_u32(tx.ins_shielded.len() as u32);
        self.write_kernel(&tx.kernel);
    }

    fn write_tx_tails(&mut self, tx: &TxCommon) {
        for cid in tx.ins.iter().chain(tx.outs.iter()) {
            self.write_coin(cid);
        }
        for inp in &tx.ins_shielded {
            self.write_shielded_input(inp);
        }
    }

    fn write_mutual(&mut self, mutual: &TxMutualInfo) {
        self.write_bytes(&mutual.peer);
        self.write_u64(mutual.my_id_key);
    }

    fn into_vec(self) -> Vec<u8> {
        self.buf
    }
}

struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ProtoErrorKind> {
        let end = self.pos + n;
        let bytes = self
            .data
            .get(self.pos..end)
            .ok_or(ProtoErrorKind::LengthMismatch)?;
        self.pos = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ProtoErrorKind> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, ProtoErrorKind> {
        Ok(self.read_array::<1>()?[0])
    }

    fn read_bool(&mut self) -> Result<bool, ProtoErrorKind> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(ProtoErrorKind::BadEncoding),
        }
    }

    fn read_u32(&mut self) -> Result<u32, ProtoErrorKind> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    fn read_u64(&mut self) -> Result<u64, ProtoErrorKind> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    fn read_hash(&mut self) -> Result<UintBig, ProtoErrorKind> {
        self.read_array()
    }

    fn read_point(&mut self) -> Result<CompressedRistretto, ProtoErrorKind> {
        Ok(CompressedRistretto(self.read_array()?))
    }

    fn read_scalar(&mut self) -> Result<Scalar, ProtoErrorKind> {
        Scalar::from_canonical_bytes(self.read_array()?)
            .into_option()
            .ok_or(ProtoErrorKind::BadEncoding)
    }

    fn read_signature(&mut self) -> Result<Signature, ProtoErrorKind> {
        Signature::from_bytes(&self.read_array()?).map_err(|_| ProtoErrorKind::BadEncoding)
    }

    fn read_coin(&mut self) -> Result<CoinId, ProtoErrorKind> {
        Ok(CoinId {
            key_index: self.read_u64()?,
            key_type: self.read_u32()?,
            sub_index: self.read_u32()?,
            value: self.read_u64()?,
            asset_id: self.read_u32()?,
        })
    }

    fn read_kernel(&mut self) -> Result<TxKernel, ProtoErrorKind> {
        TxKernel::from_bytes(&self.read_array()?).map_err(|_| ProtoErrorKind::BadEncoding)
    }

    fn read_shielded_input(&mut self) -> Result<ShieldedInput, ProtoErrorKind> {
        let k_ser_g = self.read_hash()?;
        let viewer_index = self.read_u32()?;
        let created_by_viewer = self.read_bool()?;
        let user = ShieldedTxoUser {
            sender: self.read_hash()?,
            message: [self.read_hash()?, self.read_hash()?],
        };
        Ok(ShieldedInput {
            txo: ShieldedTxoId {
                k_ser_g,
                viewer_index,
                created_by_viewer,
                user,
                amount: self.read_u64()?,
                asset_id: self.read_u32()?,
            },
            fee: self.read_u64()?,
        })
    }

    fn read_voucher(&mut self) -> Result<ShieldedVoucher, ProtoErrorKind> {
        Ok(ShieldedVoucher {
            serial_pub: self.read_point()?,
            nonce_pub: self.read_point()?,
            pk: [self.read_scalar()?, self.read_scalar()?],
            shared_secret: self.read_hash()?,
            signature: self.read_signature()?,
        })
    }

    fn read_tx_head(&mut self) -> Result<(TxCommon, [u32; 3]), ProtoErrorKind> {
        let counts = [self.read_u32()?, self.read_u32()?, self.read_u32()?];
        let tx = TxCommon {
            kernel: self.read_kernel()?,
            ..Default::default()
        };
        Ok((tx, counts))
    }

    fn read_tx_tails(&mut self, tx: &mut TxCommon, counts: [u32; 3]) -> Result<(), ProtoErrorKind> {
        tx.ins = (0..counts[0])
            .map(|_| self.read_coin())
            .collect::<Result<_, _>>()?;
        tx.outs = (0..counts[1])
            .map(|_| self.read_coin())
            .collect::<Result<_, _>>()?;
        tx.ins_shielded = (0..counts[2])
            .map(|_| self.read_shielded_input())
            .collect::<Result<_, _>>()?;
        Ok(())
    }

    fn read_mutual(&mut self) -> Result<TxMutualInfo, ProtoErrorKind> {
        Ok(TxMutualInfo {
            peer: self.read_hash()?,
            my_id_key: self.read_u64()?,
            ..Default::default()
        })
    }

    fn finish(self) -> Result<(), ProtoErrorKind> {
        if self.pos != self.data.len() {
            return Err(ProtoErrorKind::LengthMismatch);
        }
        Ok(())
    }
}

impl Request {
    /// Opcode of this request
    pub fn opcode(&self) -> Opcode {
        match self {
            Self::Version => Opcode::Version,
            Self::GetPKdf(_) => Opcode::GetPKdf,
            Self::GetNumSlots => Opcode::GetNumSlots,
            Self::ReadSlot(_) => Opcode::ReadSlot,
            Self::RegenerateSlot(_) => Opcode::RegenerateSlot,
            Self::GetIdentity(_) => Opcode::GetIdentity,
            Self::CreateOutput(_) => Opcode::CreateOutput,
            Self::CreateShieldedInput(_) => Opcode::CreateShieldedInput,
            Self::CreateShieldedVouchers { .. } => Opcode::CreateShieldedVouchers,
            Self::SignSplit(_) => Opcode::SignSplit,
            Self::SignReceive(..) => Opcode::SignReceive,
            Self::SignSend(..) => Opcode::SignSend,
            Self::SignSendShielded(..) => Opcode::SignSendShielded,
        }
    }

    /// Encode, opcode byte included
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        w.write_u8(self.opcode() as u8);
        match self {
            Self::Version | Self::GetNumSlots => {}
            Self::GetPKdf(path) => {
                w.write_u32(path.len() as u32);
                w.write_bytes(path);
            }
            Self::ReadSlot(slot) | Self::RegenerateSlot(slot) => w.write_u32(*slot),
            Self::GetIdentity(id) => w.write_u64(*id),
            Self::CreateOutput(req) => {
                w.write_coin(&req.cid);
                w.write_scalar(&req.k_extra[0]);
                w.write_scalar(&req.k_extra[1]);
                w.write_point(&req.t[0]);
                w.write_point(&req.t[1]);
            }
            Self::CreateShieldedInput(req) => {
                w.write_shielded_input(&req.input);
                w.write_u64(req.h_min);
                w.write_u64(req.h_max);
                w.write_u64(req.window_end);
                w.write_u32(req.sigma_m);
                w.write_u32(req.sigma_n);
                w.write_scalar(&req.asset_sk);
                w.write_scalar(&req.outp_sk);
                for p in req.abcd.iter().chain(req.g.iter()) {
                    w.write_point(p);
                }
            }
            Self::CreateShieldedVouchers { count, id, nonce0 } => {
                w.write_u32(*count);
                w.write_u64(*id);
                w.write_bytes(nonce0);
            }
            Self::SignSplit(tx) => {
                w.write_tx_head(tx);
                w.write_tx_tails(tx);
            }
            Self::SignReceive(tx, mutual) => {
                w.write_tx_head(tx);
                w.write_mutual(mutual);
                w.write_tx_tails(tx);
            }
            Self::SignSend(tx, mutual, sender) => {
                w.write_tx_head(tx);
                w.write_mutual(mutual);
                w.write_signature(&mutual.payment_proof);
                w.write_u32(sender.slot);
                w.write_bytes(&sender.user_agreement);
                w.write_tx_tails(tx);
            }
            Self::SignSendShielded(tx, params) => {
                w.write_tx_head(tx);
                w.write_voucher(&params.voucher);
                w.write_bytes(&params.receiver);
                w.write_u64(params.my_id_key);
                w.write_u8(params.hide_asset_always as u8);
                w.write_bytes(&params.range_proof.to_bytes());
                w.write_bytes(&params.sender);
                w.write_bytes(&params.message[0]);
                w.write_bytes(&params.message[1]);
                w.write_tx_tails(tx);
            }
        }
        w.into_vec()
    }

    /// Decode the payload of a request with opcode `op`
    pub fn decode(op: Opcode, payload: &[u8]) -> Result<Self, ProtoErrorKind> {
        let mut r = Reader::new(payload);
        let request = match op {
            Opcode::Version => Self::Version,
            Opcode::GetNumSlots => Self::GetNumSlots,
            Opcode::GetPKdf => {
                // parsed by the handler, a malformed path is a derivation
                // failure rather than a protocol error
                let len = r.read_u32()? as usize;
                Self::GetPKdf(r.read_bytes(len)?.to_vec())
            }
            Opcode::ReadSlot => Self::ReadSlot(r.read_u32()?),
            Opcode::RegenerateSlot => Self::RegenerateSlot(r.read_u32()?),
            Opcode::GetIdentity => Self::GetIdentity(r.read_u64()?),
            Opcode::CreateOutput => Self::CreateOutput(CreateOutputRequest {
                cid: r.read_coin()?,
                k_extra: [r.read_scalar()?, r.read_scalar()?],
                t: [r.read_point()?, r.read_point()?],
            }),
            Opcode::CreateShieldedInput => {
                let input = r.read_shielded_input()?;
                let h_min = r.read_u64()?;
                let h_max = r.read_u64()?;
                let window_end = r.read_u64()?;
                let sigma_m = r.read_u32()?;
                let sigma_n = r.read_u32()?;
                let asset_sk = r.read_scalar()?;
                let outp_sk = r.read_scalar()?;
                let abcd = [
                    r.read_point()?,
                    r.read_point()?,
                    r.read_point()?,
                    r.read_point()?,
                ];
                let g = (0..sigma_m)
                    .map(|_| r.read_point())
                    .collect::<Result<_, _>>()?;
                Self::CreateShieldedInput(CreateShieldedInputRequest {
                    input,
                    h_min,
                    h_max,
                    window_end,
                    sigma_m,
                    sigma_n,
                    asset_sk,
                    outp_sk,
                    abcd,
                    g,
                })
            }
            Opcode::CreateShieldedVouchers => Self::CreateShieldedVouchers {
                count: r.read_u32()?,
                id: r.read_u64()?,
                nonce0: r.read_hash()?,
            },
            Opcode::SignSplit => {
                let (mut tx, counts) = r.read_tx_head()?;
                r.read_tx_tails(&mut tx, counts)?;
                Self::SignSplit(tx)
            }
            Opcode::SignReceive => {
                let (mut tx, counts) = r.read_tx_head()?;
                let mutual = r.read_mutual()?;
                r.read_tx_tails(&mut tx, counts)?;
                Self::SignReceive(tx, mutual)
            }
            Opcode::SignSend => {
                let (mut tx, counts) = r.read_tx_head()?;
                let mut mutual = r.read_mutual()?;
                mutual.payment_proof = r.read_signature()?;
                let sender = TxSenderParams {
                    slot: r.read_u32()?,
                    user_agreement: r.read_hash()?,
                };
                r.read_tx_tails(&mut tx, counts)?;
                Self::SignSend(tx, mutual, sender)
            }
            Opcode::SignSendShielded => {
                let (mut tx, counts) = r.read_tx_head()?;
                let voucher = r.read_voucher()?;
                let receiver = r.read_hash()?;
                let my_id_key = r.read_u64()?;
                let hide_asset_always = r.read_bool()?;
                let range_proof = RangeProofPacked::from_bytes(&r.read_array()?);
                let sender = r.read_hash()?;
                let message = [r.read_hash()?, r.read_hash()?];
                r.read_tx_tails(&mut tx, counts)?;
                Self::SignSendShielded(
                    tx,
                    Box::new(TxSendShieldedParams {
                        voucher,
                        receiver,
                        my_id_key,
                        hide_asset_always,
                        range_proof,
                        sender,
                        message,
                    }),
                )
            }
        };
        r.finish()?;
        Ok(request)
    }
}

impl Response {
    /// Encode the payload, without the status byte
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::new();
        match self {
            Self::Version(v) | Self::NumSlots(v) => w.write_u32(*v),
            Self::PKdf(pkdf) => w.write_bytes(&pkdf.to_bytes()),
            Self::Slot(p) | Self::Identity(p) => w.write_point(p),
            Self::CreateOutput(resp) => {
                w.write_point(&resp.t[0]);
                w.write_point(&resp.t[1]);
                w.write_scalar(&resp.tau_x);
            }
            Self::CreateShieldedInput(resp) => {
                w.write_point(&resp.g0);
                w.write_point(&resp.nonce_pub);
                w.write_scalar(&resp.sig[0]);
                w.write_scalar(&resp.sig[1]);
                w.write_scalar(&resp.z_r);
            }
            Self::Vouchers(vouchers) => {
                w.write_u32(vouchers.len() as u32);
                for v in vouchers {
                    w.write_voucher(v);
                }
            }
            Self::Split(kernel, offset) => {
                w.write_kernel(kernel);
                w.write_scalar(offset);
            }
            Self::Receive(kernel, offset, proof) => {
                w.write_kernel(kernel);
                w.write_scalar(offset);
                w.write_signature(proof);
            }
            Self::Send(kernel, offset, agreement) => {
                w.write_kernel(kernel);
                w.write_scalar(offset);
                w.write_bytes(agreement);
            }
            Self::SendShielded(kernel, offset, output) => {
                w.write_kernel(kernel);
                w.write_scalar(offset);
                w.write_point(output);
            }
        }
        w.into_vec()
    }

    /// Decode the payload of a successful response to a request with
    /// opcode `op`
    pub fn decode(op: Opcode, payload: &[u8]) -> Result<Self, ProtoErrorKind> {
        let mut r = Reader::new(payload);
        let response = match op {
            Opcode::Version => Self::Version(r.read_u32()?),
            Opcode::GetNumSlots => Self::NumSlots(r.read_u32()?),
            Opcode::GetPKdf => Self::PKdf(KdfPub {
                generator_secret: r.read_hash()?,
                cofactor_g: r.read_point()?,
                cofactor_j: r.read_point()?,
            }),
            Opcode::ReadSlot | Opcode::RegenerateSlot => Self::Slot(r.read_point()?),
            Opcode::GetIdentity => Self::Identity(r.read_point()?),
            Opcode::CreateOutput => Self::CreateOutput(CreateOutputResponse {
                t: [r.read_point()?, r.read_point()?],
                tau_x: r.read_scalar()?,
            }),
            Opcode::CreateShieldedInput => Self::CreateShieldedInput(CreateShieldedInputResponse {
                g0: r.read_point()?,
                nonce_pub: r.read_point()?,
                sig: [r.read_scalar()?, r.read_scalar()?],
                z_r: r.read_scalar()?,
            }),
            Opcode::CreateShieldedVouchers => {
                let count = r.read_u32()?;
                Self::Vouchers(
                    (0..count)
                        .map(|_| r.read_voucher())
                        .collect::<Result<_, _>>()?,
                )
            }
            Opcode::SignSplit => Self::Split(r.read_kernel()?, r.read_scalar()?),
            Opcode::SignReceive => {
                Self::Receive(r.read_kernel()?, r.read_scalar()?, r.read_signature()?)
            }
            Opcode::SignSend => Self::Send(r.read_kernel()?, r.read_scalar()?, r.read_hash()?),
            Opcode::SignSendShielded => {
                Self::SendShielded(r.read_kernel()?, r.read_scalar()?, r.read_point()?)
            }
        };
        r.finish()?;
        Ok(response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::schema::fields_width;
    use bth_keykeeper_core::Path;
    use bth_keykeeper_types::KEY_TYPE_REGULAR;

    fn payload_len(request: &Request) -> usize {
        request.to_bytes().len() - 1
    }

    #[test]
    fn fixed_requests_match_their_schema() {
        let cases = [
            Request::Version,
            Request::GetNumSlots,
            Request::ReadSlot(3),
            Request::RegenerateSlot(3),
            Request::GetIdentity(9),
            Request::CreateOutput(CreateOutputRequest::default()),
            Request::CreateShieldedVouchers {
                count: 2,
                id: 1,
                nonce0: [0u8; 32],
            },
            Request::SignSplit(TxCommon::default()),
            Request::SignReceive(TxCommon::default(), TxMutualInfo::default()),
            Request::SignSend(
                TxCommon::default(),
                TxMutualInfo::default(),
                TxSenderParams::default(),
            ),
            Request::SignSendShielded(TxCommon::default(), Box::default()),
        ];
        for request in cases {
            let schema = request.opcode().schema();
            assert_eq!(
                payload_len(&request),
                fields_width(schema.request),
                "{}",
                schema.name
            );
        }
    }

    #[test]
    fn tails_match_their_schema() {
        let mut tx = TxCommon::default();
        tx.ins = vec![CoinId::new(1, KEY_TYPE_REGULAR, 5, 0); 2];
        tx.outs = vec![CoinId::new(2, KEY_TYPE_REGULAR, 5, 0)];
        tx.ins_shielded = vec![ShieldedInput::default(); 3];
        let request = Request::SignSplit(tx);
        let bytes = request.to_bytes();
        let schema = Opcode::SignSplit.schema();
        assert_eq!(schema.check_request(&bytes[1..]), Ok(()));
        assert_eq!(Request::decode(Opcode::SignSplit, &bytes[1..]), Ok(request));

        let request = Request::CreateShieldedInput(CreateShieldedInputRequest {
            sigma_m: 2,
            g: vec![CompressedRistretto::default(); 2],
            ..Default::default()
        });
        let bytes = request.to_bytes();
        let schema = Opcode::CreateShieldedInput.schema();
        assert_eq!(schema.check_request(&bytes[1..]), Ok(()));

        let request = Request::GetPKdf(Path::Child(4).to_bytes());
        let bytes = request.to_bytes();
        assert_eq!(Opcode::GetPKdf.schema().check_request(&bytes[1..]), Ok(()));
        assert_eq!(Request::decode(Opcode::GetPKdf, &bytes[1..]), Ok(request));
    }

    #[test]
    fn responses_match_their_schema() {
        let cases = [
            (Opcode::Version, Response::Version(1)),
            (Opcode::GetPKdf, Response::PKdf(KdfPub::default())),
            (Opcode::GetNumSlots, Response::NumSlots(4)),
            (Opcode::ReadSlot, Response::Slot(CompressedRistretto::default())),
            (Opcode::GetIdentity, Response::Identity(CompressedRistretto::default())),
            (
                Opcode::CreateOutput,
                Response::CreateOutput(CreateOutputResponse::default()),
            ),
            (
                Opcode::CreateShieldedInput,
                Response::CreateShieldedInput(CreateShieldedInputResponse::default()),
            ),
            (
                Opcode::SignSplit,
                Response::Split(TxKernel::default(), Scalar::ZERO),
            ),
            (
                Opcode::SignReceive,
                Response::Receive(TxKernel::default(), Scalar::ZERO, Signature::default()),
            ),
            (
                Opcode::SignSend,
                Response::Send(TxKernel::default(), Scalar::ZERO, [0u8; 32]),
            ),
            (
                Opcode::SignSendShielded,
                Response::SendShielded(
                    TxKernel::default(),
                    Scalar::ZERO,
                    CompressedRistretto::default(),
                ),
            ),
        ];
        for (op, response) in cases {
            let bytes = response.to_bytes();
            assert_eq!(bytes.len(), fields_width(op.schema().response), "{:?}", op);
            assert_eq!(Response::decode(op, &bytes), Ok(response));
        }
    }

    #[test]
    fn bad_encodings() {
        // non-canonical scalar
        let mut bytes = Request::CreateOutput(CreateOutputRequest::default()).to_bytes();
        bytes[1 + 28..1 + 60].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            Request::decode(Opcode::CreateOutput, &bytes[1..]),
            Err(ProtoErrorKind::BadEncoding)
        );

        // non-canonical kernel signature scalar, after the three counts
        let mut bytes = Request::SignSplit(TxCommon::default()).to_bytes();
        bytes[1 + 12 + 120..1 + 12 + 152].copy_from_slice(&[0xff; 32]);
        assert_eq!(
            Request::decode(Opcode::SignSplit, &bytes[1..]),
            Err(ProtoErrorKind::BadEncoding)
        );

        // flag byte other than 0 or 1
        let request = Request::SignSendShielded(TxCommon::default(), Box::default());
        let mut bytes = request.to_bytes();
        let flag = 1 + 12 + 152 + 224 + 32 + 8;
        bytes[flag] = 2;
        assert_eq!(
            Request::decode(Opcode::SignSendShielded, &bytes[1..]),
            Err(ProtoErrorKind::BadEncoding)
        );

        // trailing bytes
        assert_eq!(
            Request::decode(Opcode::ReadSlot, &[0, 0, 0, 0, 0]),
            Err(ProtoErrorKind::LengthMismatch)
        );
    }
}
