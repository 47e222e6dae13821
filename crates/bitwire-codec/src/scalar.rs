//! Unsigned wire scalars and their network byte order.
//!
//! Every value that crosses the byte boundary is stored big-endian. Host code
//! only ever sees host-order integers; the conversion happens on each access.

use std::fmt;

/// An unsigned integer that can live inside a wire buffer.
///
/// Implemented for `u8`, `u16`, `u32` and `u64`.
pub trait WireScalar:
    Copy + Eq + Ord + Default + fmt::Debug + fmt::Display + bytemuck::Pod + Send + Sync + 'static
{
    /// Width in bytes.
    const BYTES: usize;
    /// Width in bits.
    const BITS: u32;
    /// Largest representable value.
    const MAX: Self;

    /// Fixed-size byte representation.
    type Bytes: AsRef<[u8]> + AsMut<[u8]> + Copy + Default + fmt::Debug + Send + Sync;

    /// Host to network order.
    fn to_network(self) -> Self;

    /// Network to host order.
    fn from_network(self) -> Self;

    /// Reads a big-endian value from the first `BYTES` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `BYTES`.
    fn read_be(bytes: &[u8]) -> Self;

    /// Writes the value big-endian into the first `BYTES` bytes.
    ///
    /// # Panics
    ///
    /// Panics if `bytes` is shorter than `BYTES`.
    fn write_be(self, bytes: &mut [u8]);

    /// Widens to `u64`.
    fn to_u64(self) -> u64;

    /// Narrows from `u64`, dropping the high bits.
    fn from_u64_truncating(value: u64) -> Self;

    /// Narrows from `u64`, `None` if the value does not fit.
    fn try_from_u64(value: u64) -> Option<Self>;
}

macro_rules! impl_wire_scalar {
    ($($t:ty),*) => {
        $(
            impl WireScalar for $t {
                const BYTES: usize = std::mem::size_of::<$t>();
                const BITS: u32 = <$t>::BITS;
                const MAX: Self = <$t>::MAX;

                type Bytes = [u8; std::mem::size_of::<$t>()];

                #[inline(always)]
                fn to_network(self) -> Self {
                    self.to_be()
                }

                #[inline(always)]
                fn from_network(self) -> Self {
                    <$t>::from_be(self)
                }

                #[inline(always)]
                fn read_be(bytes: &[u8]) -> Self {
                    let mut raw = [0u8; std::mem::size_of::<$t>()];
                    raw.copy_from_slice(&bytes[..Self::BYTES]);
                    <$t>::from_be_bytes(raw)
                }

                #[inline(always)]
                fn write_be(self, bytes: &mut [u8]) {
                    bytes[..Self::BYTES].copy_from_slice(&self.to_be_bytes());
                }

                #[inline(always)]
                fn to_u64(self) -> u64 {
                    self as u64
                }

                #[inline(always)]
                fn from_u64_truncating(value: u64) -> Self {
                    value as $t
                }

                #[inline(always)]
                fn try_from_u64(value: u64) -> Option<Self> {
                    <$t>::try_from(value).ok()
                }
            }
        )*
    };
}
impl_wire_scalar!(u8, u16, u32, u64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_endian_layout() {
        let mut buf = [0u8; 8];
        0x1234u16.write_be(&mut buf);
        assert_eq!(&buf[..2], &[0x12, 0x34]);

        0x0102_0304u32.write_be(&mut buf);
        assert_eq!(&buf[..4], &[1, 2, 3, 4]);
        assert_eq!(u32::read_be(&buf), 0x0102_0304);
    }

    #[test]
    fn single_byte_conversion_is_identity() {
        assert_eq!(0xABu8.to_network(), 0xAB);
        assert_eq!(0xABu8.from_network(), 0xAB);
    }

    #[test]
    fn network_conversion_swaps_on_little_endian_hosts() {
        let v = 0x1122_3344_5566_7788u64;
        assert_eq!(v.to_network().from_network(), v);
        assert_eq!(v.to_network().to_ne_bytes(), v.to_be_bytes());
    }

    #[test]
    fn narrowing() {
        assert_eq!(u8::from_u64_truncating(0x1FF), 0xFF);
        assert_eq!(u16::try_from_u64(0x1_0000), None);
        assert_eq!(u16::try_from_u64(0xFFFF), Some(0xFFFF));
    }

    #[test]
    fn widths() {
        assert_eq!(<u8 as WireScalar>::BYTES, 1);
        assert_eq!(<u16 as WireScalar>::BITS, 16);
        assert_eq!(<u64 as WireScalar>::BYTES, 8);
    }
}
