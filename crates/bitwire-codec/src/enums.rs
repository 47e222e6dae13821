//! Bounded enumerations with an invalid sentinel.
//!
//! A wire enum is a transparent newtype over its repr. Any integer up to the
//! largest declared value is accepted as-is; anything above it collapses to
//! `INVALID_ENUM_VALUE`, which sits one past the maximum.

use crate::scalar::WireScalar;

/// Common surface of types declared with [`wire_enum!`](crate::wire_enum).
pub trait WireEnum: Copy + Eq + Sized + 'static {
    /// Underlying integer type.
    type Repr: WireScalar;

    const NAME: &'static str;
    const MAX_VALUE: Self::Repr;
    const INVALID: Self;
    const VARIANTS: &'static [Self];

    fn to_int(self) -> Self::Repr;
    fn from_int(value: Self::Repr) -> Self;

    /// Qualified symbol name, empty for unnamed values.
    fn as_str(self) -> &'static str;

    /// Look up a symbol by its bare or qualified name.
    fn from_symbol(symbol: &str) -> Option<Self> {
        Self::VARIANTS.iter().copied().find(|v| {
            let qualified = v.as_str();
            qualified == symbol
                || qualified
                    .strip_prefix(Self::NAME)
                    .and_then(|rest| rest.strip_prefix("::"))
                    == Some(symbol)
        })
    }
}

#[doc(hidden)]
pub const fn max_of(values: &[u64]) -> u64 {
    let mut max = 0;
    let mut i = 0;
    while i < values.len() {
        if values[i] > max {
            max = values[i];
        }
        i += 1;
    }
    max
}

/// Declare an enum codec over an unsigned repr.
///
/// ```
/// bitwire_codec::wire_enum! {
///     pub enum Mode: u8 {
///         IDLE = 0,
///         RUN = 1,
///     }
/// }
///
/// assert_eq!(Mode::from_int(1), Mode::RUN);
/// assert_eq!(Mode::from_int(7), Mode::INVALID_ENUM_VALUE);
/// assert_eq!(Mode::RUN.to_string(), "Mode::RUN");
/// ```
#[macro_export]
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident : $t:ident {
            $( $(#[$vmeta:meta])* $v:ident = $val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        #[repr(transparent)]
        $vis struct $name($t);

        #[allow(non_upper_case_globals, dead_code)]
        impl $name {
            $(
                $(#[$vmeta])*
                pub const $v: Self = Self($val);
            )+

            /// Largest declared value.
            pub const MAX_VALUE: $t = $crate::enums::max_of(&[$($val as u64),+]) as $t;

            /// Returned by `from_int` for any value above `MAX_VALUE`.
            pub const INVALID_ENUM_VALUE: Self = Self(Self::MAX_VALUE + 1);

            pub const VARIANTS: &'static [Self] = &[$(Self::$v),+];

            pub const BYTES: usize = <$t as $crate::WireScalar>::BYTES;

            #[inline]
            pub const fn from_int(value: $t) -> Self {
                if value > Self::MAX_VALUE {
                    Self::INVALID_ENUM_VALUE
                } else {
                    Self(value)
                }
            }

            #[inline]
            pub const fn to_int(self) -> $t {
                self.0
            }

            pub fn as_str(self) -> &'static str {
                match self {
                    $( Self::$v => concat!(stringify!($name), "::", stringify!($v)), )+
                    Self::INVALID_ENUM_VALUE => concat!(stringify!($name), "::INVALID_ENUM_VALUE"),
                    _ => "",
                }
            }

            /// True for declared symbols.
            pub fn is_valid(self) -> bool {
                Self::VARIANTS.contains(&self)
            }
        }

        impl $crate::WireEnum for $name {
            type Repr = $t;

            const NAME: &'static str = stringify!($name);
            const MAX_VALUE: $t = $name::MAX_VALUE;
            const INVALID: Self = $name::INVALID_ENUM_VALUE;
            const VARIANTS: &'static [Self] = $name::VARIANTS;

            fn to_int(self) -> $t {
                self.0
            }

            fn from_int(value: $t) -> Self {
                $name::from_int(value)
            }

            fn as_str(self) -> &'static str {
                $name::as_str(self)
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::core::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                match self.as_str() {
                    "" => ::core::write!(f, "{}({})", stringify!($name), self.0),
                    name => f.write_str(name),
                }
            }
        }

        impl ::core::convert::From<$name> for $t {
            fn from(value: $name) -> $t {
                value.0
            }
        }
    };
}
