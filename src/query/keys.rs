//! Closed per-screen key enumerations.
//!
//! Every list screen declares which filters it accepts and which columns it
//! can be sorted by. Both are small enums carrying a stable wire name, so a
//! typo in a filter name fails to compile instead of silently matching
//! nothing on the backend.

use std::fmt::Debug;
use std::hash::Hash;

/// A filter name or sortable column drawn from a closed enumeration.
///
pub trait QueryKey: Copy + Eq + Ord + Hash + Debug + Send + Sync + 'static {
    /// Every variant, in declaration order.
    const ALL: &'static [Self];

    /// Name used on the wire and in the location query string.
    fn as_str(&self) -> &'static str;

    /// Return the key matching the given wire name.
    ///
    fn parse(name: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|key| key.as_str() == name)
    }
}

/// Declare a closed enumeration of query keys with their wire names.
///
/// ```ignore
/// query_keys! {
///     pub enum BalanceFilter {
///         Sector => "sector",
///         Biofuel => "biofuel",
///     }
/// }
/// ```
#[macro_export]
macro_rules! query_keys {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $vis enum $name {
            $($variant),+
        }

        impl $crate::query::QueryKey for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire),+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::query::QueryKey::as_str(self))
            }
        }
    };
}
