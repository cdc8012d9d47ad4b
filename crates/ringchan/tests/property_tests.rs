//! Property-based tests for the channel protocol.
//!
//! Each property drives a producer and consumer sharing one heap region with
//! an arbitrary operation sequence and checks the protocol invariants after
//! every step against a `VecDeque` model.

use proptest::prelude::*;
use ringchan::{ChannelConfig, ChannelError, HeapRegion, Producer, RingChannel};
use std::collections::VecDeque;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Publish(u8),
    Consume,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![any::<u8>().prop_map(Op::Publish), Just(Op::Consume)]
}

fn pair(size: u32) -> (RingChannel<Arc<HeapRegion>>, Producer<Arc<HeapRegion>>) {
    let config = ChannelConfig::with_capacity(size);
    let region = Arc::new(HeapRegion::for_config(&config));
    let channel = RingChannel::establish(Arc::clone(&region), config).unwrap();
    let producer = Producer::attach(region).unwrap();
    (channel, producer)
}

proptest! {
    /// Round-trip: N < size published bytes come back in order.
    #[test]
    fn prop_round_trip(size in 2u32..64, data in prop::collection::vec(any::<u8>(), 0..64)) {
        let (mut channel, mut producer) = pair(size);
        let n = data.len().min(size as usize - 1);

        prop_assert_eq!(producer.publish(&data[..n]).unwrap(), n);

        let mut out = Vec::with_capacity(n);
        while let Some(byte) = channel.consume_one().unwrap() {
            out.push(byte);
        }
        prop_assert_eq!(&out[..], &data[..n]);
        prop_assert!(!channel.is_ack_pending());
    }

    /// Arbitrary interleavings match a FIFO model; positions stay in range;
    /// idle detection and ack state follow the positions.
    #[test]
    fn prop_interleaving_matches_model(
        size in 1u32..16,
        ops in prop::collection::vec(op_strategy(), 1..200),
    ) {
        let (mut channel, mut producer) = pair(size);
        let mut model: VecDeque<u8> = VecDeque::new();

        for op in ops {
            match op {
                Op::Publish(byte) => {
                    let result = producer.publish_byte(byte);
                    if model.len() < size as usize - 1 {
                        prop_assert_eq!(result, Ok(()));
                        model.push_back(byte);
                        prop_assert!(channel.is_ack_pending());
                    } else {
                        prop_assert_eq!(result, Err(ChannelError::Full));
                    }
                }
                Op::Consume => {
                    let got = channel.consume_one().unwrap();
                    prop_assert_eq!(got, model.pop_front());
                }
            }

            let consumer = channel.consumer_position();
            let producer_pos = channel.producer_position();
            prop_assert!(consumer < size);
            prop_assert!(producer_pos < size);
            prop_assert_eq!(channel.len() as usize, model.len());
            prop_assert_eq!(channel.has_pending_data(), !model.is_empty());
            prop_assert_eq!(channel.is_ack_pending(), !model.is_empty());
            prop_assert_eq!(producer.free_space() as usize, size as usize - 1 - model.len());
        }
    }

    /// Starting anywhere in the ring, a burst that crosses the modulus
    /// boundary is read back intact and positions wrap.
    #[test]
    fn prop_wraparound(size in 2u32..32, start in 0u32..32, burst in 1usize..32) {
        let start = start % size;
        let burst = burst.min(size as usize - 1);
        let (mut channel, mut producer) = pair(size);

        for _ in 0..start {
            producer.publish_byte(0).unwrap();
            channel.consume_one().unwrap();
        }

        let data: Vec<u8> = (0..burst as u8).collect();
        prop_assert_eq!(producer.publish(&data).unwrap(), burst);
        prop_assert_eq!(channel.producer_position(), (start + burst as u32) % size);

        let mut out = vec![0u8; burst];
        prop_assert_eq!(channel.drain_into(&mut out).unwrap(), burst);
        prop_assert_eq!(out, data);
        prop_assert_eq!(channel.consumer_position(), channel.producer_position());
    }

    /// Reconfigure is accepted exactly when the buffer is drained.
    #[test]
    fn prop_reconfigure_safety(pending in 0usize..8, new_size in 1u32..16) {
        let (mut channel, mut producer) = pair(16);
        producer.publish(&vec![1; pending]).unwrap();

        let result = channel.reconfigure(new_size);
        if pending == 0 {
            prop_assert_eq!(result, Ok(()));
            prop_assert_eq!(channel.configured_size(), new_size);
        } else {
            let rejected = matches!(result, Err(ChannelError::ReconfigureRejected { .. }));
            prop_assert!(rejected);
            prop_assert_eq!(channel.len() as usize, pending);
        }
    }
}
