use serde::{Deserialize, Serialize};

/// Options for constructing, decoding and lazily merging bitmaps.
///
/// Deserializable so callers can embed it in their own configuration;
/// missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BitmapOptions {
    /// Container capacity hint for newly created bitmaps.
    pub capacity: u32,
    /// Run the engine's structural check on deserialized and attached
    /// bitmaps, turning corrupt input into a decode error.
    pub validate_on_decode: bool,
    /// Let lazy unions convert containers to bitsets eagerly. Faster for
    /// long merge chains, larger until repaired.
    pub lazy_bitset_conversion: bool,
}

impl Default for BitmapOptions {
    fn default() -> Self {
        Self {
            capacity: 0,
            validate_on_decode: true,
            lazy_bitset_conversion: false,
        }
    }
}

impl BitmapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(mut self, capacity: u32) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn with_validate_on_decode(mut self, validate: bool) -> Self {
        self.validate_on_decode = validate;
        self
    }

    pub fn with_lazy_bitset_conversion(mut self, enabled: bool) -> Self {
        self.lazy_bitset_conversion = enabled;
        self
    }
}
