//! Macro behind the string id types used across the graph.
//!
//! Node and edge ids travel as plain strings on the wire. Giving each kind
//! its own wrapper keeps a node id from being handed where an edge id is
//! expected, and rules out empty ids on every construction path.

/// Define a non-empty string id type.
///
/// The generated type derives what the graph's maps and sort calls need
/// (`Eq`, `Hash`, `Ord`), serializes as a bare string, and rejects the empty
/// string both in `new`/`try_new` and during deserialization.
macro_rules! define_id_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize)]
        $vis struct $Name(String);

        impl $Name {
            /// Wrap an id, panicking if it is empty.
            ///
            /// Use [`try_new`](Self::try_new) for untrusted input.
            pub fn new(id: impl Into<String>) -> Self {
                match Self::try_new(id) {
                    Some(id) => id,
                    None => panic!(concat!(stringify!($Name), " must not be empty")),
                }
            }

            /// Wrap an id, returning `None` if it is empty.
            pub fn try_new(id: impl Into<String>) -> Option<Self> {
                let s = id.into();
                if s.is_empty() {
                    None
                } else {
                    Some(Self(s))
                }
            }

            /// The id as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl<'de> serde::Deserialize<'de> for $Name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                $Name::try_new(s).ok_or_else(|| {
                    serde::de::Error::custom(concat!(stringify!($Name), " must not be empty"))
                })
            }
        }

        impl std::fmt::Display for $Name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl PartialEq<str> for $Name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $Name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl PartialEq<String> for $Name {
            fn eq(&self, other: &String) -> bool {
                self.0 == *other
            }
        }
    };
}

pub(crate) use define_id_string;
