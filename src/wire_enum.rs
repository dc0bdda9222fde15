// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Macro for the device's prefixed string constants.
//!
//! The management API encodes every enumeration as a prefixed constant such as
//! `LB_METHOD_ROUND_ROBIN` or `STATE_ENABLED`. [`wire_enum!`] generates a Rust
//! enum that:
//!
//! - Serialises to the full prefixed constant
//! - Parses the prefixed constant, the unprefixed suffix, or either in lower case
//! - Implements `Display` with the prefixed constant
//!
//! # Example
//!
//! ```rust,ignore
//! wire_enum! {
//!     /// Enabled state of an object
//!     pub enum EnabledState: "STATE_" {
//!         Enabled => "ENABLED",
//!         Disabled => "DISABLED",
//!     }
//! }
//!
//! assert_eq!("enabled".parse::<EnabledState>()?, EnabledState::Enabled);
//! assert_eq!(EnabledState::Enabled.as_wire(), "STATE_ENABLED");
//! ```

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $prefix:literal {
            $(
                $(#[$vmeta:meta])*
                $variant:ident => $wire:literal,
            )+
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            serde::Serialize,
            serde::Deserialize,
        )]
        #[serde(into = "String", try_from = "String")]
        $vis enum $name {
            $(
                $(#[$vmeta])*
                $variant,
            )+
        }

        impl $name {
            /// Every variant, in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant,)+];

            /// The prefixed constant the device uses for this value.
            #[must_use]
            pub const fn as_wire(self) -> &'static str {
                match self {
                    $($name::$variant => concat!($prefix, $wire),)+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_wire())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::errors::UnknownVariant;

            fn from_str(value: &str) -> Result<Self, Self::Err> {
                let upper = value.trim().to_ascii_uppercase();
                let suffix = upper.strip_prefix($prefix).unwrap_or(&upper);
                match suffix {
                    $($wire => Ok($name::$variant),)+
                    _ => Err($crate::errors::UnknownVariant {
                        kind: stringify!($name),
                        value: value.to_string(),
                    }),
                }
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> String {
                value.as_wire().to_string()
            }
        }

        impl TryFrom<String> for $name {
            type Error = $crate::errors::UnknownVariant;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }
    };
}
