//! Tone example.
//!
//! Plays a short tone through the sink into a WAV file, then prints what
//! the sink did.
//!
//! Run with: cargo run --example tone

use speaker_sink::{MonoSink, SignalGenerator, WavDevice};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt::init();

    let device = WavDevice::create("tone.wav");
    let mut sink = MonoSink::builder(device)
        .sample_rate(22_050)
        .on_event(|e| eprintln!("event: {e:?}"))
        .build()?;

    let mut signal = SignalGenerator::new(22_050);
    signal.sine(440.0, 0.5, 500).silence(100).sine(660.0, 0.5, 500);
    signal.play_into(&mut sink);

    let stats = sink.stats();
    println!("Frames consumed:  {}", stats.frames_consumed);
    println!("Blocks submitted: {}", stats.blocks_submitted);
    println!("Blocks dropped:   {}", stats.blocks_dropped);
    println!(
        "Wrote {} samples to {}",
        sink.device().samples_written(),
        sink.device().path().display()
    );

    Ok(())
}
