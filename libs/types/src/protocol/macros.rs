//! Protocol literal enumeration macro
//!
//! Header values travel as plain strings (`"EVENT"`, `"UPDATE"`, ...). The
//! `protocol_enum!` macro declares a Rust enum together with its wire literal
//! for each variant and derives `as_str`, `Display`, `FromStr` and serde
//! support from that single table.

macro_rules! protocol_enum {
    (
        $(#[$meta:meta])*
        $name:ident ($kind:literal) {
            $( $(#[$vmeta:meta])* $variant:ident => $literal:literal ),+ $(,)?
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
        pub enum $name {
            $( $(#[$vmeta])* #[serde(rename = $literal)] $variant ),+
        }

        impl $name {
            /// All variants in declaration order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Literal used on the wire and in configuration files
            pub fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $literal ),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = $crate::common::errors::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $( $literal => Ok($name::$variant), )+
                    other => Err($crate::common::errors::ParseEnumError::new($kind, other)),
                }
            }
        }
    };
}
