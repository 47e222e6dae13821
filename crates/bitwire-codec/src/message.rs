//! Fixed-layout messages over a [`Buffer`].
//!
//! A message view addresses its fields at packed byte offsets from the start of
//! the buffer. Construction grows the buffer to the layout size, so every field
//! access afterwards is in bounds.

use tracing::trace;

use crate::buffer::Buffer;
use crate::error::{CodecError, Result};
use crate::scalar::WireScalar;

/// Static description of one message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageField {
    pub name: &'static str,
    pub offset: usize,
    pub size: usize,
}

enum Backing<'a> {
    Owned(Buffer),
    Borrowed(&'a mut Buffer),
}

/// Storage behind a message view: an owned buffer or a caller buffer borrowed
/// for `'a`.
pub struct MessageBuffer<'a> {
    backing: Backing<'a>,
}

impl MessageBuffer<'static> {
    /// A fresh zero-filled buffer of `size` bytes.
    pub fn owned(size: usize) -> Self {
        Self {
            backing: Backing::Owned(Buffer::zeroed(size)),
        }
    }

    /// Take ownership of `buffer`, growing it to `size`.
    pub fn adopt(mut buffer: Buffer, size: usize) -> Self {
        buffer.increase(size);
        Self {
            backing: Backing::Owned(buffer),
        }
    }
}

impl<'a> MessageBuffer<'a> {
    /// Borrow `buffer`, growing it to `size` when it is smaller.
    pub fn borrowed(buffer: &'a mut Buffer, size: usize) -> Self {
        if buffer.size() < size {
            trace!(from = buffer.size(), to = size, "growing message buffer");
            buffer.increase(size);
        }
        Self {
            backing: Backing::Borrowed(buffer),
        }
    }

    pub fn buffer(&self) -> &Buffer {
        match &self.backing {
            Backing::Owned(buffer) => buffer,
            Backing::Borrowed(buffer) => &**buffer,
        }
    }

    pub fn buffer_mut(&mut self) -> &mut Buffer {
        match &mut self.backing {
            Backing::Owned(buffer) => buffer,
            Backing::Borrowed(buffer) => &mut **buffer,
        }
    }

    pub fn is_borrowed(&self) -> bool {
        matches!(self.backing, Backing::Borrowed(_))
    }

    /// Bytes `[offset, offset + len)`, clamped to what the buffer holds.
    pub fn bytes(&self, offset: usize, len: usize) -> &[u8] {
        let data = self.buffer().as_bytes();
        let start = offset.min(data.len());
        let end = offset.saturating_add(len).min(data.len());
        &data[start..end]
    }

    /// Mutable bytes `[offset, offset + len)`.
    ///
    /// Re-grows the buffer if it was shrunk through [`buffer_mut`](Self::buffer_mut).
    pub fn bytes_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        let buffer = self.buffer_mut();
        buffer.increase(offset + len);
        &mut buffer.data(offset)[..len]
    }

    /// Host-order scalar at `offset`; zero if the buffer was shrunk below it.
    #[inline]
    pub fn read<T: WireScalar>(&self, offset: usize) -> T {
        let bytes = self.bytes(offset, T::BYTES);
        if bytes.len() < T::BYTES {
            return T::default();
        }
        T::read_be(bytes)
    }

    /// Store host-order `value` at `offset` in network order.
    #[inline]
    pub fn write<T: WireScalar>(&mut self, offset: usize, value: T) {
        value.write_be(self.bytes_mut(offset, T::BYTES));
    }

    /// Copy `data` into the `capacity`-byte region at `offset`, zero-padding
    /// the tail.
    pub fn fill(
        &mut self,
        field: &'static str,
        offset: usize,
        capacity: usize,
        data: &[u8],
    ) -> Result<()> {
        if data.len() > capacity {
            return Err(CodecError::ArrayOverflow {
                field,
                size: data.len(),
                capacity,
            });
        }
        let region = self.bytes_mut(offset, capacity);
        region[..data.len()].copy_from_slice(data);
        region[data.len()..].fill(0);
        Ok(())
    }
}

/// Common surface of types declared with [`wire_message!`](crate::wire_message).
pub trait WireMessage {
    const NAME: &'static str;
    /// Byte extent of the fixed-layout region.
    const SIZE: usize;
    const FIELDS: &'static [MessageField];

    fn buffer(&self) -> &Buffer;
    fn buffer_mut(&mut self) -> &mut Buffer;

    /// Append the fixed-layout region to `out`.
    fn serialize(&self, out: &mut Buffer) {
        let data = self.buffer().as_bytes();
        out.append(&data[..Self::SIZE.min(data.len())]);
        if data.len() < Self::SIZE {
            out.increase(out.size() + Self::SIZE - data.len());
        }
    }

    /// Copy the fixed-layout region from the front of `input`.
    ///
    /// Returns the number of bytes consumed. Fails without touching the
    /// message when `input` is shorter than `SIZE`.
    fn deserialize(&mut self, input: &[u8]) -> Result<usize> {
        if input.len() < Self::SIZE {
            return Err(CodecError::Incomplete {
                missing: Self::SIZE - input.len(),
            });
        }
        let buffer = self.buffer_mut();
        buffer.increase(Self::SIZE);
        buffer.data(0)[..Self::SIZE].copy_from_slice(&input[..Self::SIZE]);
        Ok(Self::SIZE)
    }

    fn field(name: &str) -> Option<MessageField> {
        Self::FIELDS.iter().find(|f| f.name == name).copied()
    }
}

/// Declare a fixed-layout message.
///
/// Field forms: `name: u16` (scalar), `name: [u8; N]` (array),
/// `name: enum E` (a [`wire_enum!`](crate::wire_enum) type) and
/// `name: bits B` (a [`wire_bitfield!`](crate::wire_bitfield) type). Fields are
/// packed in declaration order with no padding.
///
/// ```
/// use bitwire_codec::{wire_message, Buffer, WireMessage};
///
/// wire_message! {
///     pub struct Ping {
///         seq: u32,
///         tag: [u8; 4],
///     }
/// }
///
/// let mut buf = Buffer::new();
/// let mut ping = Ping::from_buffer(&mut buf);
/// ping.set_seq(7);
/// ping.set_tag(b"hi").unwrap();
/// assert_eq!(Ping::SIZE, 8);
/// assert_eq!(buf.as_bytes(), &[0, 0, 0, 7, b'h', b'i', 0, 0]);
/// ```
#[macro_export]
macro_rules! wire_message {
    (@accessors $name:ident, $off:expr, [$($done:ident)*]; ) => {
        $crate::paste::paste! {
            #[allow(dead_code)]
            impl<'a> $name<'a> {
                pub const SIZE: usize = $off;

                pub const FIELDS: &'static [$crate::MessageField] = &[
                    $(
                        $crate::MessageField {
                            name: stringify!($done),
                            offset: Self::[<$done:upper _OFFSET>],
                            size: Self::[<$done:upper _SIZE>],
                        },
                    )*
                ];
            }
        }

        impl ::core::fmt::Debug for $name<'_> {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.debug_struct(stringify!($name))
                    $( .field(stringify!($done), &self.$done()) )*
                    .finish()
            }
        }
    };

    (@accessors $name:ident, $off:expr, [$($done:ident)*];
        $(#[$fmeta:meta])* $f:ident : [$et:ident ; $n:literal] $(, $($rest:tt)*)?
    ) => {
        $crate::paste::paste! {
            #[allow(dead_code)]
            impl<'a> $name<'a> {
                pub const [<$f:upper _OFFSET>]: usize = $off;
                pub const [<$f:upper _SIZE>]: usize = $n * <$et as $crate::WireScalar>::BYTES;
                pub const [<$f:upper _COUNT>]: usize = $n;

                $(#[$fmeta])*
                #[inline]
                pub fn $f(&self) -> &[u8] {
                    self.buf.bytes(Self::[<$f:upper _OFFSET>], Self::[<$f:upper _SIZE>])
                }

                #[inline]
                pub fn [<$f _mut>](&mut self) -> &mut [u8] {
                    self.buf.bytes_mut(Self::[<$f:upper _OFFSET>], Self::[<$f:upper _SIZE>])
                }

                /// Copy `data` in, zero-padding the rest of the field.
                pub fn [<set_ $f>](&mut self, data: &[u8]) -> $crate::Result<()> {
                    self.buf.fill(
                        stringify!($f),
                        Self::[<$f:upper _OFFSET>],
                        Self::[<$f:upper _SIZE>],
                        data,
                    )
                }
            }
        }

        $crate::wire_message!(@accessors $name,
            $off + $n * <$et as $crate::WireScalar>::BYTES, [$($done)* $f];
            $($($rest)*)?);
    };

    (@accessors $name:ident, $off:expr, [$($done:ident)*];
        $(#[$fmeta:meta])* $f:ident : enum $e:ident $(, $($rest:tt)*)?
    ) => {
        $crate::paste::paste! {
            #[allow(dead_code)]
            impl<'a> $name<'a> {
                pub const [<$f:upper _OFFSET>]: usize = $off;
                pub const [<$f:upper _SIZE>]: usize = $e::BYTES;

                $(#[$fmeta])*
                #[inline]
                pub fn $f(&self) -> $e {
                    $e::from_int(self.buf.read(Self::[<$f:upper _OFFSET>]))
                }

                #[inline]
                pub fn [<set_ $f>](&mut self, value: $e) {
                    self.buf.write(Self::[<$f:upper _OFFSET>], value.to_int())
                }
            }
        }

        $crate::wire_message!(@accessors $name, $off + $e::BYTES, [$($done)* $f];
            $($($rest)*)?);
    };

    (@accessors $name:ident, $off:expr, [$($done:ident)*];
        $(#[$fmeta:meta])* $f:ident : bits $b:ident $(, $($rest:tt)*)?
    ) => {
        $crate::paste::paste! {
            #[allow(dead_code)]
            impl<'a> $name<'a> {
                pub const [<$f:upper _OFFSET>]: usize = $off;
                pub const [<$f:upper _SIZE>]: usize = $b::BYTES;

                $(#[$fmeta])*
                #[inline]
                pub fn $f(&self) -> $b<'static> {
                    $b::from_value(self.buf.read(Self::[<$f:upper _OFFSET>]))
                }

                /// Bitfield view writing through to the message buffer.
                #[inline]
                pub fn [<$f _mut>](&mut self) -> $b<'_> {
                    $b::__over(
                        self.buf.bytes_mut(Self::[<$f:upper _OFFSET>], Self::[<$f:upper _SIZE>]),
                    )
                }

                #[inline]
                pub fn [<set_ $f>](&mut self, value: &$b<'_>) {
                    self.buf.write(Self::[<$f:upper _OFFSET>], value.value())
                }
            }
        }

        $crate::wire_message!(@accessors $name, $off + $b::BYTES, [$($done)* $f];
            $($($rest)*)?);
    };

    (@accessors $name:ident, $off:expr, [$($done:ident)*];
        $(#[$fmeta:meta])* $f:ident : $t:ident $(, $($rest:tt)*)?
    ) => {
        $crate::paste::paste! {
            #[allow(dead_code)]
            impl<'a> $name<'a> {
                pub const [<$f:upper _OFFSET>]: usize = $off;
                pub const [<$f:upper _SIZE>]: usize = <$t as $crate::WireScalar>::BYTES;

                $(#[$fmeta])*
                #[inline]
                pub fn $f(&self) -> $t {
                    self.buf.read::<$t>(Self::[<$f:upper _OFFSET>])
                }

                #[inline]
                pub fn [<set_ $f>](&mut self, value: $t) {
                    self.buf.write::<$t>(Self::[<$f:upper _OFFSET>], value)
                }
            }
        }

        $crate::wire_message!(@accessors $name,
            $off + <$t as $crate::WireScalar>::BYTES, [$($done)* $f];
            $($($rest)*)?);
    };

    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $($body:tt)*
        }
    ) => {
        $(#[$meta])*
        $vis struct $name<'a> {
            buf: $crate::MessageBuffer<'a>,
        }

        #[allow(dead_code)]
        impl $name<'static> {
            /// Message over a fresh owned zero-filled buffer.
            pub fn new() -> Self {
                Self { buf: $crate::MessageBuffer::owned(Self::SIZE) }
            }

            /// Take ownership of `buffer`, growing it to `SIZE`.
            pub fn from_owned(buffer: $crate::Buffer) -> Self {
                Self { buf: $crate::MessageBuffer::adopt(buffer, Self::SIZE) }
            }
        }

        impl ::core::default::Default for $name<'static> {
            fn default() -> Self {
                Self::new()
            }
        }

        #[allow(dead_code)]
        impl<'a> $name<'a> {
            /// View over a caller buffer, grown to `SIZE` if smaller.
            pub fn from_buffer(buffer: &'a mut $crate::Buffer) -> Self {
                Self { buf: $crate::MessageBuffer::borrowed(buffer, Self::SIZE) }
            }

            pub fn buffer(&self) -> &$crate::Buffer {
                self.buf.buffer()
            }

            pub fn buffer_mut(&mut self) -> &mut $crate::Buffer {
                self.buf.buffer_mut()
            }

            pub fn is_borrowed(&self) -> bool {
                self.buf.is_borrowed()
            }

            /// Owned copy of the fixed-layout region.
            pub fn to_owned_message(&self) -> $name<'static> {
                let mut out = $name::new();
                let src = self.buf.bytes(0, Self::SIZE);
                out.buf.bytes_mut(0, src.len()).copy_from_slice(src);
                out
            }
        }

        $crate::wire_message!(@accessors $name, 0usize, []; $($body)*);

        impl<'a> $crate::WireMessage for $name<'a> {
            const NAME: &'static str = stringify!($name);
            const SIZE: usize = $name::SIZE;
            const FIELDS: &'static [$crate::MessageField] = $name::FIELDS;

            fn buffer(&self) -> &$crate::Buffer {
                self.buf.buffer()
            }

            fn buffer_mut(&mut self) -> &mut $crate::Buffer {
                self.buf.buffer_mut()
            }
        }
    };
}
