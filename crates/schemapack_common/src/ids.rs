//! Opaque ID newtypes for layout entities.
//!
//! [`ChipId`], [`PinId`], [`GroupId`], and [`NetId`] wrap the caller's string
//! identifiers (e.g. `"U1"`, `"U1.pin3"`); [`NetworkId`] is derived during
//! layout. They are `Ord` and `Hash` so they can key both hash and ordered
//! maps, and they serialize transparently as plain strings.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an ID from anything string-like.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Returns the ID as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_string())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id!(
    /// Identifier of a chip (a placeable component).
    ChipId
);

define_id!(
    /// Identifier of a pin, owned by exactly one chip or group.
    PinId
);

define_id!(
    /// Identifier of a group (a non-placed pin container such as a net label).
    GroupId
);

define_id!(
    /// Identifier of a net (a logical signal joined by weak connections).
    NetId
);

define_id!(
    /// Identifier of a packer network: pads sharing one are pulled together.
    ///
    /// Derived per pin from its net or its strong connection, so it need not
    /// name any declared [`NetId`].
    NetworkId
);
