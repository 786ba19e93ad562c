use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! numeric_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                $name(raw)
            }

            pub const fn get(&self) -> u64 {
                self.0
            }

            /// Big-endian bytes, used when the id is mixed into a hash
            pub fn to_be_bytes(&self) -> [u8; 8] {
                self.0.to_be_bytes()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}{}", $prefix, self.0)
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                $name(raw)
            }
        }
    };
}

numeric_id!(
    /// Compute-provider node identifier assigned by the node registry
    NodeId,
    "node#"
);

numeric_id!(
    /// Capability pool a node serves and a job requires
    PoolId,
    "pool#"
);

numeric_id!(
    /// Job identifier, allocated sequentially by the scheduler starting at 1
    JobId,
    "job#"
);
