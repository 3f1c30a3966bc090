//! Newtype wrappers for resolved name slots.
//!
//! Template names (`$F{amount}`, `$V{total}`, ...) are resolved once at
//! definition time into positional slots, so evaluation never looks names up
//! by string. The newtypes keep a field index from being used as a variable index.

use serde::Serialize;
use std::fmt;

macro_rules! slot_type {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        pub struct $name(usize);

        impl $name {
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            /// Position of the slot in its declaration list.
            pub const fn index(self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

slot_type!(
    /// Index into the template's field declarations.
    FieldSlot,
    "field"
);
slot_type!(
    /// Index into the template's variable declarations.
    VariableSlot,
    "variable"
);
slot_type!(
    /// Index into the template's parameter declarations.
    ParameterSlot,
    "parameter"
);
slot_type!(
    /// Index into the template's group declarations, outermost group first.
    GroupId,
    "group"
);
