// Copyright (c) 2018-2025 The Botho Foundation

//! Wire schema of every method.
//!
//! A request is an opcode byte followed by the fixed request fields and then
//! the tails; a response is a status byte followed, on success, by the fixed
//! response fields and the response tails. A tail is an array whose length
//! is given by a `u32` count field of the request. All integers are
//! little-endian.

use bth_keykeeper_types::ProtoErrorKind;

/// Version reported by [`Opcode::Version`]
pub const PROTO_VERSION: u32 = 1;

/// Encoding of one field
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Layout {
    /// One byte
    U8,
    /// Little-endian u32
    U32,
    /// Little-endian u64
    U64,
    /// Canonical scalar
    Scalar,
    /// Compressed Ristretto point
    Point,
    /// 32 opaque bytes
    Hash,
    /// Fields in order
    Record(&'static [Field]),
    /// Fixed-length array
    Array(&'static Layout, usize),
}

impl Layout {
    /// Encoded width in bytes
    pub const fn width(&self) -> usize {
        match self {
            Self::U8 => 1,
            Self::U32 => 4,
            Self::U64 => 8,
            Self::Scalar | Self::Point | Self::Hash => 32,
            Self::Record(fields) => fields_width(fields),
            Self::Array(element, n) => element.width() * *n,
        }
    }
}

/// A named field
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    /// Name, unique within its record
    pub name: &'static str,
    /// Encoding
    pub layout: Layout,
}

const fn field(name: &'static str, layout: Layout) -> Field {
    Field { name, layout }
}

/// Total width of `fields`
pub const fn fields_width(fields: &[Field]) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < fields.len() {
        total += fields[i].layout.width();
        i += 1;
    }
    total
}

/// A count-prefixed array after the fixed fields
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Tail {
    /// Name of the `u32` request field holding the element count
    pub count_field: &'static str,
    /// Element encoding
    pub element: Layout,
    /// Largest accepted count
    pub max: u32,
}

/// Request opcodes
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[repr(u8)]
pub enum Opcode {
    /// Protocol version
    Version = 0x01,
    /// Public key pair of a derivation path
    GetPKdf = 0x02,
    /// Number of nonce slots
    GetNumSlots = 0x03,
    /// Public projection of a nonce slot
    ReadSlot = 0x04,
    /// Replace a nonce slot
    RegenerateSlot = 0x05,
    /// Public key of a wallet identity
    GetIdentity = 0x06,
    /// Range proof share of an output
    CreateOutput = 0x10,
    /// Spend proof share of a shielded input
    CreateShieldedInput = 0x21,
    /// Batch of shielded vouchers
    CreateShieldedVouchers = 0x22,
    /// Fee-only transaction
    SignSplit = 0x30,
    /// Receiver side of a two-party transaction
    SignReceive = 0x31,
    /// Sender side of a two-party transaction
    SignSend = 0x32,
    /// Send to a shielded output
    SignSendShielded = 0x33,
}

impl Opcode {
    /// Every opcode
    pub const ALL: [Opcode; 13] = [
        Self::Version,
        Self::GetPKdf,
        Self::GetNumSlots,
        Self::ReadSlot,
        Self::RegenerateSlot,
        Self::GetIdentity,
        Self::CreateOutput,
        Self::CreateShieldedInput,
        Self::CreateShieldedVouchers,
        Self::SignSplit,
        Self::SignReceive,
        Self::SignSend,
        Self::SignSendShielded,
    ];

    /// Parse an opcode byte
    pub fn from_u8(raw: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|op| *op as u8 == raw)
    }

    const fn index(self) -> usize {
        match self {
            Self::Version => 0,
            Self::GetPKdf => 1,
            Self::GetNumSlots => 2,
            Self::ReadSlot => 3,
            Self::RegenerateSlot => 4,
            Self::GetIdentity => 5,
            Self::CreateOutput => 6,
            Self::CreateShieldedInput => 7,
            Self::CreateShieldedVouchers => 8,
            Self::SignSplit => 9,
            Self::SignReceive => 10,
            Self::SignSend => 11,
            Self::SignSendShielded => 12,
        }
    }

    /// Schema of this method
    pub fn schema(&self) -> &'static MethodSchema {
        &METHODS[self.index()]
    }
}

/// Wire layout of one method
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MethodSchema {
    /// Opcode
    pub opcode: Opcode,
    /// Name for logs
    pub name: &'static str,
    /// Fixed request fields
    pub request: &'static [Field],
    /// Request tails, in order
    pub request_tails: &'static [Tail],
    /// Fixed response fields
    pub response: &'static [Field],
    /// Response tails, in order
    pub response_tails: &'static [Tail],
}

impl MethodSchema {
    fn count(&self, payload: &[u8], name: &str) -> Option<u32> {
        let mut pos = 0;
        for f in self.request {
            if f.name == name {
                let mut b = [0u8; 4];
                b.copy_from_slice(payload.get(pos..pos + 4)?);
                return Some(u32::from_le_bytes(b));
            }
            pos += f.layout.width();
        }
        None
    }

    fn tails_width(&self, payload: &[u8], tails: &[Tail]) -> Result<usize, ProtoErrorKind> {
        let mut total = 0usize;
        for tail in tails {
            let n = self
                .count(payload, tail.count_field)
                .ok_or(ProtoErrorKind::LengthMismatch)?;
            if n > tail.max {
                return Err(ProtoErrorKind::TooManyElements);
            }
            total += n as usize * tail.element.width();
        }
        Ok(total)
    }

    /// Check `payload` (the request without its opcode) has exactly the
    /// length its count fields announce
    pub fn check_request(&self, payload: &[u8]) -> Result<(), ProtoErrorKind> {
        let fixed = fields_width(self.request);
        if payload.len() < fixed {
            return Err(ProtoErrorKind::LengthMismatch);
        }
        if payload.len() != fixed + self.tails_width(payload, self.request_tails)? {
            return Err(ProtoErrorKind::LengthMismatch);
        }
        Ok(())
    }

    /// Length of the successful response payload (without its status byte)
    /// to the already checked request `payload`
    pub fn response_len(&self, payload: &[u8]) -> Result<usize, ProtoErrorKind> {
        Ok(fields_width(self.response) + self.tails_width(payload, self.response_tails)?)
    }
}

// Records

const HASH_PAIR: Layout = Layout::Array(&Layout::Hash, 2);

const COIN_ID_FIELDS: &[Field] = &[
    field("key_index", Layout::U64),
    field("key_type", Layout::U32),
    field("sub_index", Layout::U32),
    field("value", Layout::U64),
    field("asset_id", Layout::U32),
];

/// Coin descriptor
pub const COIN_ID: Layout = Layout::Record(COIN_ID_FIELDS);

const SIGNATURE_FIELDS: &[Field] = &[
    field("nonce_pub", Layout::Point),
    field("k", Layout::Scalar),
];

/// Schnorr signature
pub const SIGNATURE: Layout = Layout::Record(SIGNATURE_FIELDS);

const KERNEL_FIELDS: &[Field] = &[
    field("fee", Layout::U64),
    field("h_min", Layout::U64),
    field("h_max", Layout::U64),
    field("commitment", Layout::Point),
    field("nested", Layout::Hash),
    field("signature", SIGNATURE),
];

/// Transaction kernel
pub const KERNEL: Layout = Layout::Record(KERNEL_FIELDS);

const SHIELDED_INPUT_FIELDS: &[Field] = &[
    field("k_ser_g", Layout::Hash),
    field("viewer_index", Layout::U32),
    field("created_by_viewer", Layout::U8),
    field("sender", Layout::Hash),
    field("message", Layout::Array(&Layout::Hash, 2)),
    field("amount", Layout::U64),
    field("asset_id", Layout::U32),
    field("fee", Layout::U64),
];

/// Shielded output being spent, with its spend fee
pub const SHIELDED_INPUT: Layout = Layout::Record(SHIELDED_INPUT_FIELDS);

const KDF_PUB_FIELDS: &[Field] = &[
    field("generator_secret", Layout::Hash),
    field("cofactor_g", Layout::Point),
    field("cofactor_j", Layout::Point),
];

/// Public half of a Kdf
pub const KDF_PUB: Layout = Layout::Record(KDF_PUB_FIELDS);

const VOUCHER_FIELDS: &[Field] = &[
    field("serial_pub", Layout::Point),
    field("nonce_pub", Layout::Point),
    field("pk", Layout::Array(&Layout::Scalar, 2)),
    field("shared_secret", Layout::Hash),
    field("signature", SIGNATURE),
];

/// Shielded voucher
pub const VOUCHER: Layout = Layout::Record(VOUCHER_FIELDS);

const RANGE_PROOF_FIELDS: &[Field] = &[
    field("ax", Layout::Hash),
    field("sx", Layout::Hash),
    field("t1x", Layout::Hash),
    field("t2x", Layout::Hash),
    field("taux", Layout::Hash),
    field("mu", Layout::Hash),
    field("t_dot", Layout::Hash),
    field("lr", Layout::Array(&HASH_PAIR, 6)),
    field("condensed", Layout::Array(&Layout::Hash, 2)),
    field("ys", Layout::Array(&Layout::U8, 2)),
];

/// Packed range proof fragment
pub const RANGE_PROOF: Layout = Layout::Record(RANGE_PROOF_FIELDS);

/// Most coins or shielded inputs per transaction
pub const MAX_TX_ELEMENTS: u32 = 64;

const TX_TAILS: &[Tail] = &[
    Tail {
        count_field: "num_ins",
        element: COIN_ID,
        max: MAX_TX_ELEMENTS,
    },
    Tail {
        count_field: "num_outs",
        element: COIN_ID,
        max: MAX_TX_ELEMENTS,
    },
    Tail {
        count_field: "num_ins_shielded",
        element: SHIELDED_INPUT,
        max: MAX_TX_ELEMENTS,
    },
];

const SIGNED: [Field; 2] = [field("kernel", KERNEL), field("offset", Layout::Scalar)];

static METHODS: [MethodSchema; 13] = [
    MethodSchema {
        opcode: Opcode::Version,
        name: "Version",
        request: &[],
        request_tails: &[],
        response: &[field("version", Layout::U32)],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::GetPKdf,
        name: "GetPKdf",
        request: &[field("path_len", Layout::U32)],
        request_tails: &[Tail {
            count_field: "path_len",
            element: Layout::U8,
            max: 29,
        }],
        response: &[field("pkdf", KDF_PUB)],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::GetNumSlots,
        name: "GetNumSlots",
        request: &[],
        request_tails: &[],
        response: &[field("count", Layout::U32)],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::ReadSlot,
        name: "ReadSlot",
        request: &[field("slot", Layout::U32)],
        request_tails: &[],
        response: &[field("nonce_pub", Layout::Point)],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::RegenerateSlot,
        name: "RegenerateSlot",
        request: &[field("slot", Layout::U32)],
        request_tails: &[],
        response: &[field("nonce_pub", Layout::Point)],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::GetIdentity,
        name: "GetIdentity",
        request: &[field("id", Layout::U64)],
        request_tails: &[],
        response: &[field("pk", Layout::Point)],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::CreateOutput,
        name: "CreateOutput",
        request: &[
            field("cid", COIN_ID),
            field("k_extra", Layout::Array(&Layout::Scalar, 2)),
            field("t", Layout::Array(&Layout::Point, 2)),
        ],
        request_tails: &[],
        response: &[
            field("t", Layout::Array(&Layout::Point, 2)),
            field("tau_x", Layout::Scalar),
        ],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::CreateShieldedInput,
        name: "CreateShieldedInput",
        request: &[
            field("input", SHIELDED_INPUT),
            field("h_min", Layout::U64),
            field("h_max", Layout::U64),
            field("window_end", Layout::U64),
            field("sigma_m", Layout::U32),
            field("sigma_n", Layout::U32),
            field("asset_sk", Layout::Scalar),
            field("outp_sk", Layout::Scalar),
            field("abcd", Layout::Array(&Layout::Point, 4)),
        ],
        request_tails: &[Tail {
            count_field: "sigma_m",
            element: Layout::Point,
            max: 20,
        }],
        response: &[
            field("g0", Layout::Point),
            field("nonce_pub", Layout::Point),
            field("sig", Layout::Array(&Layout::Scalar, 2)),
            field("z_r", Layout::Scalar),
        ],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::CreateShieldedVouchers,
        name: "CreateShieldedVouchers",
        request: &[
            field("count", Layout::U32),
            field("id", Layout::U64),
            field("nonce0", Layout::Hash),
        ],
        request_tails: &[],
        response: &[field("count", Layout::U32)],
        response_tails: &[Tail {
            count_field: "count",
            element: VOUCHER,
            max: 30,
        }],
    },
    MethodSchema {
        opcode: Opcode::SignSplit,
        name: "SignSplit",
        request: &[
            field("num_ins", Layout::U32),
            field("num_outs", Layout::U32),
            field("num_ins_shielded", Layout::U32),
            field("kernel", KERNEL),
        ],
        request_tails: TX_TAILS,
        response: &SIGNED,
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::SignReceive,
        name: "SignReceive",
        request: &[
            field("num_ins", Layout::U32),
            field("num_outs", Layout::U32),
            field("num_ins_shielded", Layout::U32),
            field("kernel", KERNEL),
            field("peer", Layout::Hash),
            field("my_id", Layout::U64),
        ],
        request_tails: TX_TAILS,
        response: &[
            SIGNED[0],
            SIGNED[1],
            field("payment_proof", SIGNATURE),
        ],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::SignSend,
        name: "SignSend",
        request: &[
            field("num_ins", Layout::U32),
            field("num_outs", Layout::U32),
            field("num_ins_shielded", Layout::U32),
            field("kernel", KERNEL),
            field("peer", Layout::Hash),
            field("my_id", Layout::U64),
            field("payment_proof", SIGNATURE),
            field("slot", Layout::U32),
            field("user_agreement", Layout::Hash),
        ],
        request_tails: TX_TAILS,
        response: &[
            SIGNED[0],
            SIGNED[1],
            field("user_agreement", Layout::Hash),
        ],
        response_tails: &[],
    },
    MethodSchema {
        opcode: Opcode::SignSendShielded,
        name: "SignSendShielded",
        request: &[
            field("num_ins", Layout::U32),
            field("num_outs", Layout::U32),
            field("num_ins_shielded", Layout::U32),
            field("kernel", KERNEL),
            field("voucher", VOUCHER),
            field("receiver", Layout::Hash),
            field("my_id", Layout::U64),
            field("hide_asset_always", Layout::U8),
            field("range_proof", RANGE_PROOF),
            field("sender", Layout::Hash),
            field("message", Layout::Array(&Layout::Hash, 2)),
        ],
        request_tails: TX_TAILS,
        response: &[
            SIGNED[0],
            SIGNED[1],
            field("output", Layout::Point),
        ],
        response_tails: &[],
    },
];
