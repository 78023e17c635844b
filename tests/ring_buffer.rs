use sla_charger::ring_buffer::RingBuffer;

#[test]
fn fifo_order() {
    let mut buf = RingBuffer::<4>::new();
    assert_eq!(buf.get(), None);
    buf.append(1);
    buf.append(2);
    buf.append(3);
    assert_eq!(buf.available(), 3);
    assert_eq!(buf.peek(), Some(1));
    assert_eq!(buf.get(), Some(1));
    assert_eq!(buf.get(), Some(2));
    assert_eq!(buf.available(), 1);
}

#[test]
fn overwrite_sets_overflow_once() {
    let mut buf = RingBuffer::<3>::new();
    for v in 1..=3 {
        buf.append(v);
    }
    assert!(!buf.overflow());

    buf.append(4);
    buf.append(5);
    assert_eq!(buf.available(), 3);
    assert!(buf.overflow());
    assert!(!buf.overflow());

    let mut out = [0u16; 3];
    assert_eq!(buf.copy_to(&mut out), 3);
    assert_eq!(out, [3, 4, 5]);
    assert_eq!(buf.available(), 3);
}

#[test]
fn average_and_clear() {
    let mut buf = RingBuffer::<10>::new();
    assert_eq!(buf.average(), 0);
    for v in [100, 200, 300, 400] {
        buf.append(v);
    }
    assert_eq!(buf.average(), 250);

    buf.append(1);
    buf.clear();
    assert!(buf.is_empty());
    assert_eq!(buf.average(), 0);
}

#[test]
fn copy_to_short_slice() {
    let mut buf = RingBuffer::<5>::new();
    for v in 10..15 {
        buf.append(v);
    }
    let mut out = [0u16; 2];
    assert_eq!(buf.copy_to(&mut out), 2);
    assert_eq!(out, [10, 11]);
}
