use bitwire_codec::{
    wire_bitfield, wire_enum, wire_message, Buffer, CodecError, WireBitfield, WireEnum,
    WireMessage,
};
use proptest::prelude::*;

wire_bitfield! {
    /// Two counters squeezed into one word.
    pub struct Squeezed: u32 {
        squeezed_one: 15,
        squeezed_two: 12,
    }
}

wire_enum! {
    pub enum Signal: u16 {
        VALUE_1 = 0,
        VALUE_3 = 1,
        VALUE_BLA = 2,
        NO_STRICT_NAMING = 3,
    }
}

wire_message! {
    /// Mixed scalar and array fields.
    pub struct Sample {
        version: u32,
        first: u8,
        second: u16,
        buf: [u8; 10],
    }
}

wire_message! {
    pub struct Envelope {
        squeezed: bits Squeezed,
        signal: enum Signal,
        stamp: u64,
    }
}

#[test]
fn squeezed_fields() {
    let mut field = Squeezed::new();
    assert_eq!(Squeezed::squeezed_one_width(), 15);
    assert_eq!(Squeezed::squeezed_two_width(), 12);

    field.set_squeezed_one(123);
    field.set_squeezed_two(3);
    assert_eq!(field.squeezed_one(), 123);
    assert_eq!(field.squeezed_two(), 3);
    assert_eq!(field.value(), 0x1807B);

    field.set_value(0x12_3412);
    assert_eq!(field.squeezed_one(), 0x3412);
    assert_eq!(field.squeezed_two(), 0x24);
}

#[test]
fn squeezed_fields_do_not_interfere() {
    let mut field = Squeezed::new();
    field.set_squeezed_one(1337);
    field.set_squeezed_two(15);
    assert_eq!(field.squeezed_one(), 1337);
    field.set_squeezed_two(0);
    assert_eq!(field.squeezed_one(), 1337);
    field.set_squeezed_one(987);
    assert_eq!(field.squeezed_two(), 0);
}

#[test]
fn dense_enum_contract() {
    assert_eq!(Signal::VALUE_BLA.as_str(), "Signal::VALUE_BLA");
    assert_eq!(Signal::INVALID_ENUM_VALUE.as_str(), "Signal::INVALID_ENUM_VALUE");
    assert_eq!(Signal::INVALID_ENUM_VALUE.to_int(), 4);
    assert_eq!(Signal::from_int(3), Signal::NO_STRICT_NAMING);
    assert_eq!(Signal::from_int(4), Signal::INVALID_ENUM_VALUE);
    assert_eq!(Signal::from_int(9), Signal::INVALID_ENUM_VALUE);
    assert!(Signal::VARIANTS.iter().all(|v| v.is_valid()));
    assert_eq!(<Signal as WireEnum>::MAX_VALUE, 3);
}

#[test]
fn read_existing_bytes() {
    let mut buf = Buffer::new();
    buf.append(&0xBEEF_DEADu32.to_be_bytes());
    buf.append(&[0xFE]);
    buf.append(&0xDEADu16.to_be_bytes());
    buf.append(b"abc");
    buf.append(&[0xAB; 7]);
    assert_eq!(buf.size(), Sample::SIZE);

    let s = Sample::from_buffer(&mut buf);
    assert_eq!(s.version(), 0xBEEF_DEAD);
    assert_eq!(s.first(), 0xFE);
    assert_eq!(s.second(), 0xDEAD);
    assert_eq!(&s.buf()[..3], b"abc");
    assert_eq!(&s.buf()[3..], &[0xAB; 7]);
}

#[test]
fn write_lands_at_fixed_offsets() {
    let mut buf = Buffer::zeroed(25);
    {
        let mut s = Sample::from_buffer(&mut buf);
        s.set_version(0xBEEF_DEAD);
        s.set_first(0xFE);
        s.set_second(0xDEAD);
        s.set_buf(&[0xAB; 10]).unwrap();
    }
    assert_eq!(buf.size(), 25);
    assert_eq!(buf.const_data(0)[..4], [0xBE, 0xEF, 0xDE, 0xAD]);
    assert_eq!(buf.const_data(4)[0], 0xFE);
    assert_eq!(buf.const_data(5)[..2], [0xDE, 0xAD]);
    assert_eq!(buf.const_data(7)[..10], [0xAB; 10]);
}

#[test]
fn enum_field_maps_out_of_range_to_sentinel() {
    let mut msg = Envelope::new();
    msg.set_signal(Signal::NO_STRICT_NAMING);
    assert_eq!(msg.signal(), Signal::NO_STRICT_NAMING);

    msg.set_signal(Signal::INVALID_ENUM_VALUE);
    assert_eq!(msg.signal(), Signal::INVALID_ENUM_VALUE);

    msg.set_signal(Signal::from_int(Signal::INVALID_ENUM_VALUE.to_int() + 2));
    assert_eq!(msg.signal(), Signal::INVALID_ENUM_VALUE);

    let off = Envelope::SIGNAL_OFFSET;
    msg.buffer_mut().data(off)[..2].copy_from_slice(&40u16.to_be_bytes());
    assert_eq!(msg.signal(), Signal::INVALID_ENUM_VALUE);
}

#[test]
fn bitfield_field_inside_message() {
    let mut msg = Envelope::new();
    {
        let mut view = msg.squeezed_mut();
        assert!(view.is_borrowed());
        view.set_squeezed_one(1337);
    }
    assert_eq!(msg.squeezed().squeezed_one(), 1337);
    assert_eq!(msg.squeezed().squeezed_two(), 0);
    assert_eq!(Envelope::SIZE, 4 + 2 + 8);
}

#[test]
fn layout_table_matches_constants() {
    let names: Vec<_> = Sample::FIELDS.iter().map(|f| f.name).collect();
    assert_eq!(names, ["version", "first", "second", "buf"]);
    assert_eq!(Sample::field("buf").map(|f| f.offset), Some(7));
    assert_eq!(<Sample as WireMessage>::SIZE, 17);
    assert_eq!(<Squeezed as WireBitfield>::FIELDS[1].offset, 15);
}

#[test]
fn deserialize_reports_missing_bytes() {
    let mut s = Sample::new();
    let err = s.deserialize(&[0u8; 10]).unwrap_err();
    assert_eq!(err, CodecError::Incomplete { missing: 7 });
}

proptest! {
    #[test]
    fn bitfield_value_round_trips(v in any::<u32>()) {
        let mut field = Squeezed::new();
        field.set_value(v);
        prop_assert_eq!(field.value(), v);
    }

    #[test]
    fn disjoint_fields_are_isolated(a in any::<u32>(), b in any::<u32>(), start in any::<u32>()) {
        let mut field = Squeezed::from_value(start);
        field.set_squeezed_two(b);
        let before = field.squeezed_two();
        field.set_squeezed_one(a);
        prop_assert_eq!(field.squeezed_two(), before);
        prop_assert_eq!(field.squeezed_one(), a & 0x7FFF);
        prop_assert_eq!(before, b & 0xFFF);
    }

    #[test]
    fn message_scalars_round_trip(version in any::<u32>(), first in any::<u8>(), second in any::<u16>(), stamp in any::<u64>()) {
        let mut s = Sample::new();
        s.set_version(version);
        s.set_first(first);
        s.set_second(second);
        prop_assert_eq!(s.version(), version);
        prop_assert_eq!(s.first(), first);
        prop_assert_eq!(s.second(), second);

        let mut e = Envelope::new();
        e.set_stamp(stamp);
        prop_assert_eq!(e.stamp(), stamp);
    }

    #[test]
    fn undersized_buffers_grow_with_zeros(prefix in proptest::collection::vec(any::<u8>(), 0..17)) {
        let mut buf = Buffer::from_slice(&prefix);
        let s = Sample::from_buffer(&mut buf);
        prop_assert_eq!(s.buffer().size(), Sample::SIZE);
        prop_assert!(s.buffer().const_data(prefix.len()).iter().all(|b| *b == 0));
    }

    #[test]
    fn enum_from_int_is_bounded(v in any::<u16>()) {
        let e = Signal::from_int(v);
        if v <= Signal::MAX_VALUE {
            prop_assert_eq!(e.to_int(), v);
            prop_assert!(e.is_valid());
        } else {
            prop_assert_eq!(e, Signal::INVALID_ENUM_VALUE);
        }
    }
}

/// Types generated for a narrow use compile cleanly without touching every
/// accessor.
#[deny(dead_code)]
mod partially_used {
    use super::*;

    wire_bitfield! {
        struct Mini: u8 {
            low: 3,
            high: 2,
        }
    }

    wire_enum! {
        enum Tiny: u8 {
            OFF = 0,
            ON = 1,
        }
    }

    wire_message! {
        struct Partial {
            mode: enum Tiny,
            mini: bits Mini,
            seq: u16,
        }
    }

    #[test]
    fn only_some_accessors_used() {
        let msg = Partial::new();
        assert_eq!(Partial::SIZE, 4);
        assert_eq!(msg.seq(), 0);
    }
}
