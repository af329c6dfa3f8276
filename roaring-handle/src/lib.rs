//! Compressed bitmaps over the CRoaring engine with explicit resource
//! lifetimes.
//!
//! This crate provides:
//! - Owned, mutable bitmaps: [`Bitmap`] (one engine handle, freed exactly once)
//! - Zero-copy read-only views over caller memory: [`MemoryBuffer`] and
//!   [`FrozenView`], sharing a reference-counted byte region
//! - Lazy merges with an explicit repair step: [`DirtyBitmap`]
//! - Single-pass cursors ([`Cursor`]) and bulk insertion ([`BulkContext`])
//! - Three serialized layouts: [`Format`]
//!
//! Every type comes in a 32-bit and a 64-bit flavour, selected by the
//! [`Engine`] parameter ([`Roaring32`], [`Roaring64`]).
//!
//! # Examples
//!
//! ```no_run
//! use roaring_handle::{Bitmap32, BitmapRead, Format, MemoryBuffer, Roaring32};
//! # fn main() -> roaring_handle::Result<()> {
//!
//! let mut bitmap = Bitmap32::from_values(&[1, 5, 9])?;
//! bitmap.add_range(100, 200)?;
//!
//! let portable = bitmap.serialize(Format::Portable)?;
//! let copy = Bitmap32::deserialize(Format::Portable, &portable)?;
//! assert_eq!(copy, bitmap);
//!
//! let buffer = MemoryBuffer::from_bitmap(&bitmap, Format::Frozen)?;
//! let view = buffer.to_frozen::<Roaring32>(Format::Frozen)?;
//! assert_eq!(view.and_len(&bitmap), bitmap.len());
//! # Ok(())
//! # }
//! ```

pub mod buffer;
pub mod config;
pub mod engine;
pub mod error;
pub mod serialize;

mod bitmap;
mod bulk;
mod cursor;
mod frozen;
mod handle;
mod lazy;
mod read;

#[cfg(test)]
mod tests_cursor;
#[cfg(test)]
mod tests_lazy;
#[cfg(test)]
mod tests_props;

pub use bitmap::Bitmap;
pub use buffer::MemoryBuffer;
pub use bulk::BulkContext;
pub use config::BitmapOptions;
pub use cursor::Cursor;
pub use engine::{Engine, LazyEngine, Roaring32, Roaring64, Value};
pub use error::{Error, Result};
pub use frozen::FrozenView;
pub use lazy::DirtyBitmap;
pub use read::BitmapRead;
pub use serialize::Format;

pub type Bitmap32 = Bitmap<Roaring32>;
pub type Bitmap64 = Bitmap<Roaring64>;
pub type FrozenView32 = FrozenView<Roaring32>;
pub type FrozenView64 = FrozenView<Roaring64>;
