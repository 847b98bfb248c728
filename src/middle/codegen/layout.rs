//! Record layouts
//!
//! Bit positions of every packed header word. A [`Field`] is a run of bits
//! inside a `u16` or `u32` word; reserved runs must read back as zero.

/// A bit field inside a header word
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    pub shift: u32,
    pub width: u32,
}

impl Field {
    pub const fn new(
        shift: u32,
        width: u32,
    ) -> Self {
        Self { shift, width }
    }

    /// Largest value the field holds
    pub const fn max(self) -> u32 {
        if self.width >= 32 {
            u32::MAX
        } else {
            (1 << self.width) - 1
        }
    }

    /// Extract the field from a word
    #[inline]
    pub fn get(
        self,
        word: u32,
    ) -> u32 {
        (word >> self.shift) & self.max()
    }

    #[inline]
    pub fn flag(
        self,
        word: u32,
    ) -> bool {
        self.get(word) != 0
    }

    /// Place a value at the field's position, masking off excess bits
    #[inline]
    pub fn put(
        self,
        value: u32,
    ) -> u32 {
        (value & self.max()) << self.shift
    }

    #[inline]
    pub fn put_flag(
        self,
        set: bool,
    ) -> u32 {
        self.put(u32::from(set))
    }
}

/// `-1` in an `i16` state target or jump slot
pub const NONE_INDEX: i16 = -1;

/// Behaviour graph header (`u32`)
pub mod graph {
    use super::Field;
    pub const START_STATE: Field = Field::new(0, 8);
    pub const PRIORITY: Field = Field::new(8, 8);
    pub const HAS_STARTER: Field = Field::new(16, 1);
    pub const RESERVED: Field = Field::new(17, 7);
    pub const UNKNOWN: Field = Field::new(24, 8);
}

/// Starter assigner word (`u16`)
pub mod assigner {
    use super::Field;
    /// Nibbles in the order `type`, `locality`, `status`, `preference`
    pub const FIELDS: [Field; 4] = [
        Field::new(0, 4),
        Field::new(4, 4),
        Field::new(8, 4),
        Field::new(12, 4),
    ];
}

/// Behaviour state header (`u16`)
pub mod state {
    use super::Field;
    pub const BODY_COUNT: Field = Field::new(0, 5);
    pub const SKIP_FIRST_BODY: Field = Field::new(5, 1);
    pub const NON_BLOCKING: Field = Field::new(6, 1);
    pub const USES_OBJECT_SLOT: Field = Field::new(7, 1);
    pub const HAS_CONTROL_PACKET: Field = Field::new(8, 1);
    pub const HAS_NEXT: Field = Field::new(9, 1);
    pub const RESERVED: Field = Field::new(10, 6);
}

/// State body header (`u16`)
pub mod body {
    use super::Field;
    pub const HAS_CONDITION: Field = Field::new(0, 1);
    pub const HAS_COMMANDS: Field = Field::new(1, 1);
    pub const RESERVED: Field = Field::new(2, 14);
}

/// Condition flags (`u16`)
pub mod condition {
    use super::Field;
    pub const NEGATE: Field = Field::new(0, 1);
    pub const RESERVED: Field = Field::new(1, 15);
}

/// Command word (`u32`)
pub mod command {
    use super::Field;
    pub const ID: Field = Field::new(0, 16);
    pub const ARG_COUNT: Field = Field::new(16, 4);
    pub const RESERVED: Field = Field::new(20, 11);
    pub const HAS_NEXT: Field = Field::new(31, 1);
}

/// Control packet header (`u32`)
pub mod control_packet {
    use super::Field;
    pub const SETTINGS_MASK: Field = Field::new(0, 16);
    pub const DATA_COUNT: Field = Field::new(16, 8);
    pub const RESERVED: Field = Field::new(24, 8);
}

/// Command pack flags (`u16`)
pub mod pack {
    use super::Field;
    pub const HAS_COMMANDS: Field = Field::new(0, 1);
    pub const RESERVED: Field = Field::new(1, 15);
}

/// Behaviour commands sequence header (`u32`)
pub mod sequence {
    use super::Field;
    pub const INSTANCE_TYPE: Field = Field::new(0, 8);
    pub const GLOBAL_INDEX: Field = Field::new(8, 8);
    pub const PACK_COUNT: Field = Field::new(16, 8);
    pub const UNKNOWN: Field = Field::new(24, 8);
}
