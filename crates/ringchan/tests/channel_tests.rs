use ringchan::{ChannelConfig, ChannelError, HeapRegion, Producer, RingChannel};
use ringchan::{Field, ACK_NEW_DATA};
use std::sync::Arc;

type Shared = Arc<HeapRegion>;

fn pair(size: u32) -> (RingChannel<Shared>, Producer<Shared>) {
    let config = ChannelConfig::with_capacity(size);
    let region = Arc::new(HeapRegion::for_config(&config));
    let channel = RingChannel::establish(Arc::clone(&region), config).unwrap();
    let producer = Producer::attach(region).unwrap();
    (channel, producer)
}

/// Moves both positions to `pos` by publishing and consuming filler bytes.
fn advance_to(channel: &mut RingChannel<Shared>, producer: &mut Producer<Shared>, pos: u32) {
    for _ in 0..pos {
        producer.publish_byte(0).unwrap();
        channel.consume_one().unwrap().unwrap();
    }
    assert_eq!(channel.consumer_position(), pos);
    assert_eq!(channel.producer_position(), pos);
}

#[test]
fn test_two_byte_handshake() {
    let (mut channel, mut producer) = pair(4);
    assert_eq!(channel.consumer_position(), 0);
    assert_eq!(channel.producer_position(), 0);
    assert_eq!(channel.ack(), 0);

    producer.publish_byte(b'A').unwrap();
    producer.publish_byte(b'B').unwrap();
    assert_eq!(channel.producer_position(), 2);
    assert_eq!(channel.ack(), 1);

    assert_eq!(channel.consume_one().unwrap(), Some(b'A'));
    assert_eq!(channel.consumer_position(), 1);
    assert_eq!(channel.ack(), 1);

    assert_eq!(channel.consume_one().unwrap(), Some(b'B'));
    assert_eq!(channel.consumer_position(), 2);
    assert_eq!(channel.ack(), 0);
    assert!(channel.status().is_idle());

    assert_eq!(channel.consume_one().unwrap(), None);
}

#[test]
fn test_fifo_round_trip() {
    let (mut channel, mut producer) = pair(64);
    let message = b"hello over shared memory";
    assert_eq!(producer.publish(message).unwrap(), message.len());

    let mut out = Vec::new();
    while let Some(byte) = channel.consume_one().unwrap() {
        out.push(byte);
    }
    assert_eq!(out, message);
}

#[test]
fn test_wraparound_from_position_six() {
    let (mut channel, mut producer) = pair(8);
    advance_to(&mut channel, &mut producer, 6);

    assert_eq!(producer.publish(b"wxyz").unwrap(), 4);
    assert_eq!(channel.producer_position(), 2);
    assert!(channel.is_ack_pending());

    let mut out = [0u8; 4];
    assert_eq!(channel.drain_into(&mut out).unwrap(), 4);
    assert_eq!(&out, b"wxyz");
    assert_eq!(channel.consumer_position(), 2);
    assert!(!channel.is_ack_pending());
}

#[test]
fn test_has_pending_data_tracks_positions() {
    let (mut channel, mut producer) = pair(8);
    assert!(!channel.has_pending_data());

    producer.publish_byte(1).unwrap();
    assert!(channel.has_pending_data());
    // Side-effect free: asking twice changes nothing.
    assert!(channel.has_pending_data());
    assert_eq!(channel.consumer_position(), 0);

    channel.consume_one().unwrap();
    assert!(!channel.has_pending_data());
}

#[test]
fn test_ack_stays_set_until_caught_up() {
    let (mut channel, mut producer) = pair(8);
    producer.publish(b"abc").unwrap();

    for _ in 0..2 {
        channel.consume_one().unwrap();
        assert!(channel.is_ack_pending());
    }
    channel.consume_one().unwrap();
    assert!(!channel.is_ack_pending());
}

#[test]
fn test_bytes_published_mid_drain_join_the_same_drain() {
    let (mut channel, mut producer) = pair(8);
    producer.publish(b"ab").unwrap();
    assert_eq!(channel.consume_one().unwrap(), Some(b'a'));

    producer.publish(b"c").unwrap();
    assert_eq!(channel.consume_one().unwrap(), Some(b'b'));
    assert!(channel.is_ack_pending(), "ack must survive while 'c' is unread");
    assert_eq!(channel.consume_one().unwrap(), Some(b'c'));
    assert!(!channel.is_ack_pending());
}

#[test]
fn test_ack_clear_preserves_other_bits() {
    let (mut channel, mut producer) = pair(8);
    channel.registers().set(Field::Ack, 0b1000);
    producer.publish_byte(7).unwrap();
    assert_eq!(channel.ack(), 0b1000 | ACK_NEW_DATA);

    channel.consume_one().unwrap();
    assert_eq!(channel.ack(), 0b1000);
}

#[test]
fn test_full_buffer_rejects_publish() {
    let (mut channel, mut producer) = pair(4);
    assert_eq!(producer.publish(b"abcd").unwrap(), 3);
    assert_eq!(producer.publish_byte(b'd'), Err(ChannelError::Full));
    assert_eq!(channel.len(), 3);

    channel.consume_one().unwrap();
    producer.publish_byte(b'd').unwrap();

    let mut out = [0u8; 3];
    channel.drain_into(&mut out).unwrap();
    assert_eq!(&out, b"bcd");
}

#[test]
fn test_reconfigure_rejected_while_pending() {
    let (mut channel, mut producer) = pair(16);
    advance_to(&mut channel, &mut producer, 3);
    producer.publish_byte(1).unwrap();

    assert_eq!(
        channel.reconfigure(8),
        Err(ChannelError::ReconfigureRejected { consumer: 3, producer: 4 })
    );
    assert_eq!(channel.configured_size(), 16);
}

#[test]
fn test_reconfigure_after_drain_resets_positions() {
    let (mut channel, mut producer) = pair(16);
    producer.publish(b"abc").unwrap();
    channel.drain_into(&mut [0; 3]).unwrap();

    channel.reconfigure(8).unwrap();
    assert_eq!(channel.configured_size(), 8);
    assert_eq!(channel.consumer_position(), 0);
    assert_eq!(channel.producer_position(), 0);
    assert_eq!(channel.ack(), 0);

    // The producer picks the new modulus up on its next publish.
    assert_eq!(producer.publish(&[9; 10]).unwrap(), 7);
}

#[test]
fn test_reconfigure_rejects_stale_ack_away_from_origin() {
    let (mut channel, mut producer) = pair(16);
    advance_to(&mut channel, &mut producer, 2);
    channel.registers().set_bits(Field::Ack, ACK_NEW_DATA);

    assert!(matches!(
        channel.reconfigure(4),
        Err(ChannelError::ReconfigureRejected { .. })
    ));

    // At the origin the stale bit does not block.
    channel.force_reset(16).unwrap();
    channel.registers().set_bits(Field::Ack, ACK_NEW_DATA);
    channel.reconfigure(4).unwrap();
    assert_eq!(channel.ack(), 0);
}

#[test]
fn test_drained_poll_recovers_from_late_ack() {
    let (mut channel, mut producer) = pair(16);
    advance_to(&mut channel, &mut producer, 3);
    // Ack store of the last publish arrives after the consumer caught up.
    channel.registers().set_bits(Field::Ack, ACK_NEW_DATA);
    assert!(!channel.has_pending_data());

    assert_eq!(channel.consume_one().unwrap(), None);
    assert!(!channel.is_ack_pending());
    assert!(!channel.status().new_data());

    channel.reconfigure(4).unwrap();
    assert_eq!(channel.consumer_position(), 0);
    assert_eq!(channel.producer_position(), 0);
}

#[test]
fn test_reconfigure_validates_size() {
    let (mut channel, _producer) = pair(16);
    assert_eq!(
        channel.reconfigure(0),
        Err(ChannelError::InvalidSize { size: 0, capacity: 16 })
    );
    assert_eq!(
        channel.reconfigure(17),
        Err(ChannelError::InvalidSize { size: 17, capacity: 16 })
    );
}

#[test]
fn test_force_reset_discards_pending() {
    let (mut channel, mut producer) = pair(16);
    producer.publish(b"abc").unwrap();

    channel.force_reset(4).unwrap();
    assert!(channel.status().is_idle());
    assert_eq!(channel.configured_size(), 4);
    assert_eq!(channel.consume_one().unwrap(), None);

    producer.publish(b"z").unwrap();
    assert_eq!(channel.consume_one().unwrap(), Some(b'z'));
}

#[test]
fn test_attach_resumes_existing_state() {
    let config = ChannelConfig::with_capacity(8);
    let region = Arc::new(HeapRegion::for_config(&config));
    let first = RingChannel::establish(Arc::clone(&region), config).unwrap();
    let mut producer = Producer::attach(Arc::clone(&region)).unwrap();
    producer.publish(b"hi").unwrap();
    drop(first);

    let mut second = RingChannel::attach(region).unwrap();
    assert_eq!(second.last_producer_position(), 2);
    assert_eq!(second.consume_one().unwrap(), Some(b'h'));
    assert_eq!(second.consume_one().unwrap(), Some(b'i'));
}

#[test]
fn test_establish_rejects_small_region() {
    let config = ChannelConfig::with_capacity(64);
    let region = HeapRegion::new(config.region_len() - 1);
    assert!(matches!(
        RingChannel::establish(&region, config),
        Err(ChannelError::MappingUnavailable { .. })
    ));
}

#[test]
fn test_status_snapshot() {
    let (mut channel, mut producer) = pair(8);
    producer.publish(b"ab").unwrap();
    channel.consume_one().unwrap();

    let status = channel.status();
    assert_eq!(status.producer_position, 2);
    assert_eq!(status.consumer_position, 1);
    assert_eq!(status.capacity, 8);
    assert_eq!(status.configured_size, 8);
    assert!(status.new_data());
    assert_eq!(
        status.to_string(),
        "ack: 0x00000001\nnew_data: yes\nbuffer_pos: 2\nread_pos: 1\nmax_size: 8\n"
    );
}

#[test]
fn test_metrics_when_enabled() {
    let config = ChannelConfig::with_capacity(4).with_metrics(true);
    let region = Arc::new(HeapRegion::for_config(&config));
    let mut channel = RingChannel::establish(Arc::clone(&region), config).unwrap();
    let mut producer = Producer::attach(region).unwrap();

    producer.publish(b"ab").unwrap();
    channel.drain_into(&mut [0; 4]).unwrap();
    channel.force_reset(4).unwrap();

    let m = channel.metrics();
    assert_eq!(m.bytes_consumed, 2);
    assert_eq!(m.drains, 1);
    assert_eq!(m.empty_polls, 1);
    assert_eq!(m.resets, 1);
}
