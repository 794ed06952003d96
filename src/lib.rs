#![cfg_attr(not(test), no_std)]
extern crate alloc;

pub mod aont;
mod error;
mod keccak;
pub mod siv;
pub mod sponge;
pub mod stream;
mod vecmac;
// For much heavier tests.
#[cfg(test)]
mod test;

pub use crate::aont::PackageKey;
pub use crate::error::Error;
pub use crate::keccak::{permute, STATE_SIZE_U64, STATE_SIZE_U8};
pub use crate::siv::Siv;
pub use crate::sponge::{Direction, Sponge, SpongeKind};
pub use crate::stream::StreamAead;
pub use crate::vecmac::{VecMac, MAX_INPUTS};
