//! Credential encryption shared by the infrastructure layer.

pub mod secret_codec;

pub use secret_codec::{CodecError, SecretCodec};
