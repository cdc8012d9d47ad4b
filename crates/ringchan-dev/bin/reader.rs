//! Device-side reader: establishes a channel in a file-backed region and
//! prints bytes as the host publishes them.
//!
//! Run with: `cargo run -p ringchan-dev --bin reader -- /dev/shm/ringchan`
//!
//! Options: `--capacity N`, `--attach`, `--idle-ms N`.
//!
//! Set `RUST_LOG=debug` to trace every byte.

use ringchan::{ChannelConfig, MmapRegion};
use ringchan_dev::{Attribute, Device};
use std::io::Write;
use std::time::Duration;

struct Options {
    path: String,
    capacity: u32,
    attach: bool,
    idle: Option<Duration>,
}

fn parse_args() -> Result<Options, Box<dyn std::error::Error>> {
    let mut args = std::env::args().skip(1);
    let mut path = None;
    let mut capacity = ChannelConfig::DEFAULT_CAPACITY;
    let mut attach = false;
    let mut idle = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--capacity" => {
                let value = args.next().ok_or("--capacity needs a value")?;
                capacity = ringchan_dev::parse_u32(&value)?;
            }
            "--attach" => attach = true,
            "--idle-ms" => {
                let value = args.next().ok_or("--idle-ms needs a value")?;
                idle = Some(Duration::from_millis(value.parse()?));
            }
            other if path.is_none() => path = Some(other.to_string()),
            other => return Err(format!("unexpected argument {other:?}").into()),
        }
    }

    Ok(Options {
        path: path.ok_or("usage: reader <region-path> [--capacity N] [--attach] [--idle-ms N]")?,
        capacity,
        attach,
        idle,
    })
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let opts = parse_args()?;

    let device = if opts.attach {
        Device::attach(MmapRegion::open(&opts.path)?)?
    } else {
        let config = ChannelConfig::with_capacity(opts.capacity);
        Device::probe(MmapRegion::create(&opts.path, config.region_len())?, config)?
    };

    eprintln!(
        "reading from {} (max_buffer_size {})",
        opts.path,
        device.show(Attribute::MaxBufferSize).trim_end()
    );

    let handle = device.open();
    let mut buf = [0u8; 256];
    let mut stdout = std::io::stdout().lock();
    let poll = opts.idle.unwrap_or(Duration::from_millis(500));

    loop {
        let n = handle.read_timeout(&mut buf, poll)?;
        if n == 0 {
            if opts.idle.is_some() {
                break;
            }
            continue;
        }
        stdout.write_all(&buf[..n])?;
        stdout.flush()?;
    }

    drop(handle);
    eprint!("{}", device.show(Attribute::Status));
    Ok(())
}
