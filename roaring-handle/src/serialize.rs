//! Serialized layouts and the size-then-fill serialization protocol.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::buffer::AlignedBytes;
use crate::engine::Engine;
use crate::error::{Error, Result};

/// Byte layout used when encoding a bitmap.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Engine-native layout. Most compact, but only readable by the same
    /// engine build.
    Normal,
    /// Self-describing layout, readable across builds and implementations.
    Portable,
    /// Fixed layout that is attached in place through a
    /// [`MemoryBuffer`](crate::MemoryBuffer), never parsed into an owned bitmap.
    Frozen,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Normal, Format::Portable, Format::Frozen];

    pub fn as_str(self) -> &'static str {
        match self {
            Format::Normal => "normal",
            Format::Portable => "portable",
            Format::Frozen => "frozen",
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "normal" | "native" => Ok(Format::Normal),
            "portable" => Ok(Format::Portable),
            "frozen" => Ok(Format::Frozen),
            other => Err(Error::range(format!("unknown serialization format {other:?}"))),
        }
    }
}

/// Fail with a range error when the engine has no encoder for `format`.
pub(crate) fn ensure_supported<E: Engine>(format: Format) -> Result<()> {
    if E::supports(format) {
        Ok(())
    } else {
        Err(Error::range(format!(
            "{format} layout is not available for {}-bit bitmaps",
            E::BITS
        )))
    }
}

/// Exact number of bytes `format` needs for `raw`.
///
/// # Safety
///
/// `raw` must point to a live engine bitmap.
pub(crate) unsafe fn serialized_size<E: Engine>(raw: *const E::Raw, format: Format) -> Result<usize> {
    ensure_supported::<E>(format)?;
    match unsafe { E::serialized_size(raw, format) } {
        // Every layout carries a header, so zero means the engine gave up.
        0 => Err(Error::Allocation("serialized bitmap")),
        size => Ok(size),
    }
}

/// Fill `out` with the `format` encoding of `raw`, returning bytes written.
///
/// # Safety
///
/// `raw` must point to a live engine bitmap.
pub(crate) unsafe fn serialize_into<E: Engine>(
    raw: *const E::Raw,
    format: Format,
    out: &mut [u8],
) -> Result<usize> {
    let size = unsafe { serialized_size::<E>(raw, format)? };
    if out.len() < size {
        return Err(Error::range(format!(
            "{format} encoding needs {size} bytes, buffer holds {}",
            out.len()
        )));
    }

    match format {
        // Frozen encoders assume an aligned destination.
        Format::Frozen => {
            let mut scratch = AlignedBytes::zeroed(size);
            unsafe { E::serialize(raw, format, scratch.as_mut_slice().as_mut_ptr()) };
            out[..size].copy_from_slice(scratch.as_slice());
        }
        Format::Normal | Format::Portable => {
            unsafe { E::serialize(raw, format, out.as_mut_ptr()) };
        }
    }

    Ok(size)
}

/// Encode `raw` into a freshly allocated vector.
///
/// # Safety
///
/// `raw` must point to a live engine bitmap.
pub(crate) unsafe fn serialize<E: Engine>(raw: *const E::Raw, format: Format) -> Result<Vec<u8>> {
    let size = unsafe { serialized_size::<E>(raw, format)? };
    let mut out = vec![0u8; size];
    let written = unsafe { serialize_into::<E>(raw, format, &mut out)? };
    debug_assert_eq!(written, size);
    Ok(out)
}
