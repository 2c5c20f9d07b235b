pub mod contracts;
pub mod ethereum;
pub mod reader;
pub mod signer;
