//! Strongly typed identifier wrappers.
//!
//! Every persisted entity is keyed by an SQLite rowid, so all ids wrap `i64`.
//! They are `Copy + Ord + Hash` so they can be used as map keys and sorted
//! without ceremony.  The inner integer is `pub` for binding into SQL
//! parameters; prefer [`get`](WarehouseId::get) elsewhere.

use std::fmt;

/// Generate a typed id wrapper around an `i64` rowid.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident;) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub i64);

        impl $name {
            /// The raw rowid.
            #[inline(always)]
            pub fn get(self) -> i64 {
                self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl From<i64> for $name {
            #[inline(always)]
            fn from(raw: i64) -> $name {
                $name(raw)
            }
        }

        impl From<$name> for i64 {
            #[inline(always)]
            fn from(id: $name) -> i64 {
                id.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = std::num::ParseIntError;
            fn from_str(s: &str) -> Result<$name, Self::Err> {
                s.trim().parse::<i64>().map($name)
            }
        }
    };
}

typed_id! {
    /// A warehouse: a node of the routing graph.
    pub struct WarehouseId;
}

typed_id! {
    /// One **directed** connection row.  A two-way route is two of these.
    pub struct ConnectionId;
}

typed_id! {
    /// A transport carrying a cargo manifest toward its final warehouse.
    pub struct TransportId;
}

typed_id! {
    /// One leg (single-connection traversal) of a transport.
    pub struct LegId;
}

typed_id! {
    /// A product kind that can be stocked and transported.
    pub struct ProductId;
}
