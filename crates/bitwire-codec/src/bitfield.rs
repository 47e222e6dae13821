//! Sub-integer fields packed into one network-order word.
//!
//! [`BitWord`] is the storage cell (owned or borrowed), [`get`] and [`set`] are
//! the raw mask helpers, and [`wire_bitfield!`](crate::wire_bitfield) declares a
//! named bitfield type on top of both.

use std::fmt;

use crate::error::{CodecError, Result};
use crate::scalar::WireScalar;

/// Static description of one sub-field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    pub offset: u32,
    pub width: u32,
}

#[inline]
fn mask(width: u32) -> u64 {
    if width >= u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    }
}

/// Extract `width` bits starting at bit `offset`, right-aligned.
///
/// Bits that fall outside the word read as zero.
#[inline]
pub fn get<T: WireScalar>(value: T, offset: u32, width: u32) -> T {
    let shifted = value.to_u64().checked_shr(offset).unwrap_or(0);
    T::from_u64_truncating(shifted & mask(width))
}

/// Replace `width` bits starting at bit `offset` with the low bits of `field`.
///
/// High bits of `field` beyond `width` are truncated. Bits that would land
/// outside the word are dropped.
#[inline]
pub fn set<T: WireScalar>(value: T, offset: u32, width: u32, field: T) -> T {
    let m = mask(width);
    let clear = m.checked_shl(offset).unwrap_or(0);
    let insert = (field.to_u64() & m).checked_shl(offset).unwrap_or(0);
    T::from_u64_truncating((value.to_u64() & !clear) | insert)
}

/// Lay out `widths` sequentially from bit 0.
pub const fn pack_fields<const N: usize>(
    names: [&'static str; N],
    widths: [u32; N],
) -> [FieldInfo; N] {
    let mut out = [FieldInfo {
        name: "",
        offset: 0,
        width: 0,
    }; N];
    let mut offset = 0;
    let mut i = 0;
    while i < N {
        out[i] = FieldInfo {
            name: names[i],
            offset,
            width: widths[i],
        };
        offset += widths[i];
        i += 1;
    }
    out
}

enum Storage<'a, T: WireScalar> {
    Owned(T::Bytes),
    Borrowed(&'a mut [u8]),
}

/// One scalar word stored in network byte order.
///
/// The owned variant keeps its own bytes; the borrowed variant writes through
/// to caller storage for `'a` and never frees it.
pub struct BitWord<'a, T: WireScalar> {
    storage: Storage<'a, T>,
}

impl<T: WireScalar> BitWord<'static, T> {
    /// A zero word.
    pub fn new() -> Self {
        Self {
            storage: Storage::Owned(T::Bytes::default()),
        }
    }

    /// An owned word holding host-order `value`.
    pub fn from_value(value: T) -> Self {
        let mut word = Self::new();
        word.set_value(value);
        word
    }
}

impl<T: WireScalar> Default for BitWord<'static, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, T: WireScalar> BitWord<'a, T> {
    /// Borrow a word that already holds network-order bits.
    pub fn wrap(word: &'a mut T) -> Self {
        Self {
            storage: Storage::Borrowed(bytemuck::bytes_of_mut(word)),
        }
    }

    /// Borrow the first `T::BYTES` bytes of `bytes`.
    pub fn from_bytes(bytes: &'a mut [u8]) -> Result<Self> {
        if bytes.len() < T::BYTES {
            return Err(CodecError::BufferTooSmall {
                required: T::BYTES,
                actual: bytes.len(),
            });
        }
        Ok(Self {
            storage: Storage::Borrowed(&mut bytes[..T::BYTES]),
        })
    }

    /// Borrow the first `T::BYTES` bytes of a region already known to be large
    /// enough.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `T::BYTES`.
    pub fn over(bytes: &'a mut [u8]) -> Self {
        Self {
            storage: Storage::Borrowed(&mut bytes[..T::BYTES]),
        }
    }

    fn raw(&self) -> &[u8] {
        match &self.storage {
            Storage::Owned(bytes) => bytes.as_ref(),
            Storage::Borrowed(bytes) => &bytes[..],
        }
    }

    fn raw_mut(&mut self) -> &mut [u8] {
        match &mut self.storage {
            Storage::Owned(bytes) => bytes.as_mut(),
            Storage::Borrowed(bytes) => &mut bytes[..],
        }
    }

    /// Host-order value of the word.
    #[inline]
    pub fn value(&self) -> T {
        T::read_be(self.raw())
    }

    /// Store host-order `value` in network order.
    #[inline]
    pub fn set_value(&mut self, value: T) {
        value.write_be(self.raw_mut());
    }

    #[inline]
    pub fn get(&self, offset: u32, width: u32) -> T {
        get(self.value(), offset, width)
    }

    #[inline]
    pub fn set(&mut self, offset: u32, width: u32, field: T) {
        let updated = set(self.value(), offset, width, field);
        self.set_value(updated);
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.storage, Storage::Borrowed(_))
    }

    /// Owned copy of the current value.
    pub fn detach(&self) -> BitWord<'static, T> {
        BitWord::from_value(self.value())
    }
}

impl<T: WireScalar> fmt::Debug for BitWord<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BitWord")
            .field("value", &self.value())
            .field("borrowed", &self.is_borrowed())
            .finish()
    }
}

/// Common surface of types declared with [`wire_bitfield!`](crate::wire_bitfield).
pub trait WireBitfield {
    /// Backing word type.
    type Word: WireScalar;

    const NAME: &'static str;
    const FIELDS: &'static [FieldInfo];

    fn value(&self) -> Self::Word;
    fn set_value(&mut self, value: Self::Word);

    /// Look up a sub-field by name.
    fn field_info(name: &str) -> Option<FieldInfo> {
        Self::FIELDS.iter().find(|f| f.name == name).copied()
    }
}

/// Declare a bitfield type over a `u8`, `u16`, `u32` or `u64` word.
///
/// Fields are packed from bit 0 in declaration order. For each field `f` the
/// type gets `f()`, `set_f(v)`, `f_width()` and an `F_OFFSET` constant.
///
/// ```
/// bitwire_codec::wire_bitfield! {
///     pub struct Control: u8 {
///         ack: 1,
///         window: 3,
///     }
/// }
///
/// let mut c = Control::new();
/// c.set_window(5);
/// assert_eq!(c.value(), 0b1010);
/// assert_eq!(Control::WINDOW_OFFSET, 1);
/// ```
#[macro_export]
macro_rules! wire_bitfield {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident : $t:ident {
            $( $(#[$fmeta:meta])* $f:ident : $w:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis struct $name<'a> {
            word: $crate::BitWord<'a, $t>,
        }

        const _: () = assert!(
            0 $(+ $w)+ <= <$t>::BITS,
            concat!("fields of ", stringify!($name), " exceed the backing word")
        );

        #[allow(dead_code)]
        impl $name<'static> {
            /// Owned, zero-initialised word.
            pub fn new() -> Self {
                Self { word: $crate::BitWord::new() }
            }

            /// Owned word holding host-order `value`.
            pub fn from_value(value: $t) -> Self {
                Self { word: $crate::BitWord::from_value(value) }
            }

            /// Owned word initialised from per-field values.
            #[allow(clippy::too_many_arguments)]
            pub fn with_fields($($f: $t),+) -> Self {
                let mut out = Self::new();
                $crate::paste::paste! {
                    $( out.[<set_ $f>]($f); )+
                }
                out
            }
        }

        impl ::core::default::Default for $name<'static> {
            fn default() -> Self {
                Self::new()
            }
        }

        #[allow(dead_code)]
        impl<'a> $name<'a> {
            pub const BYTES: usize = <$t as $crate::WireScalar>::BYTES;

            /// Borrow a caller word holding network-order bits.
            pub fn wrap(word: &'a mut $t) -> Self {
                Self { word: $crate::BitWord::wrap(word) }
            }

            /// Borrow the first bytes of `bytes` as the word.
            pub fn from_bytes(bytes: &'a mut [u8]) -> $crate::Result<Self> {
                Ok(Self { word: $crate::BitWord::from_bytes(bytes)? })
            }

            #[doc(hidden)]
            pub fn __over(bytes: &'a mut [u8]) -> Self {
                Self { word: $crate::BitWord::over(bytes) }
            }

            #[inline]
            pub fn value(&self) -> $t {
                self.word.value()
            }

            #[inline]
            pub fn set_value(&mut self, value: $t) {
                self.word.set_value(value)
            }

            pub fn is_borrowed(&self) -> bool {
                self.word.is_borrowed()
            }

            /// Owned copy of the current value.
            pub fn detach(&self) -> $name<'static> {
                $name::from_value(self.value())
            }
        }

        $crate::wire_bitfield!(@accessors $name, $t, 0u32; $( $(#[$fmeta])* $f : $w ),+);

        impl<'a> $crate::WireBitfield for $name<'a> {
            type Word = $t;

            const NAME: &'static str = stringify!($name);
            const FIELDS: &'static [$crate::FieldInfo] =
                &$crate::bitfield::pack_fields([$(stringify!($f)),+], [$($w),+]);

            fn value(&self) -> $t {
                self.word.value()
            }

            fn set_value(&mut self, value: $t) {
                self.word.set_value(value)
            }
        }

        impl ::core::fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct(stringify!($name))
                    $( .field(stringify!($f), &self.$f()) )+
                    .finish()
            }
        }

        impl ::core::cmp::PartialEq for $name<'_> {
            fn eq(&self, other: &Self) -> bool {
                self.value() == other.value()
            }
        }

        impl ::core::cmp::Eq for $name<'_> {}
    };

    (@accessors $name:ident, $t:ident, $off:expr; ) => {};

    (@accessors $name:ident, $t:ident, $off:expr;
        $(#[$fmeta:meta])* $f:ident : $w:literal $(, $($rest:tt)*)?
    ) => {
        $crate::paste::paste! {
            #[allow(dead_code)]
            impl<'a> $name<'a> {
                pub const [<$f:upper _OFFSET>]: u32 = $off;

                $(#[$fmeta])*
                #[inline]
                pub fn $f(&self) -> $t {
                    self.word.get($off, $w)
                }

                #[inline]
                pub fn [<set_ $f>](&mut self, value: $t) {
                    self.word.set($off, $w, value)
                }

                #[inline]
                pub const fn [<$f _width>]() -> u32 {
                    $w
                }
            }
        }

        $crate::wire_bitfield!(@accessors $name, $t, $off + $w; $($($rest)*)?);
    };
}
