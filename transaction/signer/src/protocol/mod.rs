// Copyright (c) 2018-2025 The Botho Foundation

//! Binary request/response protocol of the key keeper

pub mod codec;
pub mod dispatch;
pub mod schema;

pub use codec::{Request, Response};
pub use dispatch::MIN_RESPONSE_LEN;
pub use schema::{MethodSchema, Opcode, PROTO_VERSION};
