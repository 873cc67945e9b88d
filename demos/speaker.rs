//! Speaker example.
//!
//! Plays a two-second tone on the default output device.
//!
//! Run with: cargo run --example speaker --features cpal

use std::time::Duration;

use speaker_sink::device::CpalDevice;
use speaker_sink::{FrameSink, MonoSink, SignalGenerator};

const SAMPLE_RATE: u32 = 44_100;
const BLOCK: usize = speaker_sink::DEFAULT_BUFFER_CAPACITY;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let device = CpalDevice::open_default(SAMPLE_RATE, BLOCK)?;
    println!("Playing on: {}", speaker_sink::PlaybackDevice::name(&device));

    let mut sink = MonoSink::builder(device)
        .sample_rate(SAMPLE_RATE)
        .buffer_capacity(BLOCK)
        // Real-time output: give the device a few chances to drain
        .submit_retries(3)
        .build()?;

    let mut signal = SignalGenerator::new(SAMPLE_RATE);
    signal.sine(440.0, 0.2, 2000);

    sink.begin();
    for frame in signal.frames() {
        sink.consume_frame(frame);
        // Pace the producer so the output ring never overflows
        while sink.device().queued() > BLOCK * 2 {
            std::thread::sleep(Duration::from_millis(5));
        }
    }
    sink.stop();

    // Let the tail play out before the stream is dropped
    std::thread::sleep(Duration::from_millis(200));
    println!("{:?}", sink.stats());

    Ok(())
}
