//! Newtype wrappers for Firefly III resource identifiers.
//!
//! Firefly III hands out identifiers as JSON strings. Wrapping them keeps
//! a budget id from being passed where a budget-limit id is expected.

use serde::{Deserialize, Serialize};

/// Macro to define a newtype ID wrapping a `String` inner type.
macro_rules! define_string_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier from the given string.
            #[inline]
            #[must_use]
            pub const fn new(value: String) -> Self {
                Self(value)
            }

            /// Returns a reference to the inner string.
            #[inline]
            #[must_use]
            pub fn as_inner(&self) -> &str {
                &self.0
            }
        }

        impl core::fmt::Display for $name {
            #[inline]
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                core::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&str> for $name {
            #[inline]
            fn from(value: &str) -> Self {
                Self(value.to_owned())
            }
        }
    };
}

define_string_id! {
    /// Identifier of a spending category.
    CategoryId
}

define_string_id! {
    /// Identifier of a budget.
    BudgetId
}

define_string_id! {
    /// Identifier of a budget limit (the per-period amount of a budget).
    BudgetLimitId
}
