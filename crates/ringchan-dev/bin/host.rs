//! Host-side producer: attaches to a region established by `reader` and
//! publishes bytes from the command line, or from stdin when none are given.
//!
//! Run with: `cargo run -p ringchan-dev --bin host -- /dev/shm/ringchan hello world`

use ringchan::{ChannelError, MmapRegion, Producer};
use std::io::Read;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().ok_or("usage: host <region-path> [message...]")?;
    let words: Vec<String> = args.collect();

    let payload = if words.is_empty() {
        let mut input = Vec::new();
        std::io::stdin().read_to_end(&mut input)?;
        input
    } else {
        words.join(" ").into_bytes()
    };

    let mut producer = Producer::attach(MmapRegion::open(&path)?)?.with_metrics(true);

    for &byte in &payload {
        // Backpressure: keep retrying while the reader drains.
        loop {
            match producer.publish_with_backoff(byte) {
                Ok(()) => break,
                Err(ChannelError::Full) => log::warn!("buffer full, waiting for reader"),
                Err(e) => return Err(e.into()),
            }
        }
    }

    let m = producer.metrics();
    println!(
        "published {} bytes to {} ({} full rejections)",
        m.bytes_published, path, m.full_rejections
    );
    Ok(())
}
