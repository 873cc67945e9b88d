//! WAV file playback device.
//!
//! Captures exactly what a speaker would have been handed, which makes it
//! the easiest way to listen for clicks at block boundaries.

use std::fs::File;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::{Block, PlaybackDevice};
use crate::DeviceError;

/// Bytes before the first sample: RIFF, `fmt ` and `data` chunk headers.
const HEADER_LEN: usize = 44;

/// Offsets of the two length fields patched by `finalize`.
const RIFF_LEN_AT: u64 = 4;
const DATA_LEN_AT: u64 = 40;

/// Length of everything after the RIFF length field except the samples.
const RIFF_OVERHEAD: u32 = HEADER_LEN as u32 - 8;

/// Builds a 16-bit PCM header whose length fields claim `data_len` bytes.
fn pcm16_header(sample_rate: u32, channels: u16, data_len: u32) -> [u8; HEADER_LEN] {
    let frame_bytes = channels.saturating_mul(2);
    let byte_rate = sample_rate.saturating_mul(u32::from(frame_bytes));
    let fields: [&[u8]; 13] = [
        b"RIFF",
        &data_len.saturating_add(RIFF_OVERHEAD).to_le_bytes(),
        b"WAVE",
        b"fmt ",
        &16u32.to_le_bytes(), // fmt chunk length
        &1u16.to_le_bytes(),  // integer PCM
        &channels.to_le_bytes(),
        &sample_rate.to_le_bytes(),
        &byte_rate.to_le_bytes(),
        &frame_bytes.to_le_bytes(),
        &16u16.to_le_bytes(), // bits per sample
        b"data",
        &data_len.to_le_bytes(),
    ];

    let mut header = [0u8; HEADER_LEN];
    let mut at = 0;
    for field in fields {
        header[at..at + field.len()].copy_from_slice(field);
        at += field.len();
    }
    header
}

/// A device that appends every block to a 16-bit WAV file.
///
/// The file is created on the first submission, at that block's sample rate
/// and channel layout, and finalized (header sizes patched) by
/// [`finalize()`](Self::finalize) or on drop. Writes are synchronous.
///
/// # Example
///
/// ```no_run
/// use speaker_sink::{FrameSink, MonoSink, WavDevice};
///
/// let mut device = WavDevice::create("capture.wav");
/// {
///     let mut sink = MonoSink::builder(&mut device).build()?;
///     sink.consume(1000, -1000);
/// }
/// device.finalize()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub struct WavDevice {
    name: String,
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    samples_written: u64,
    sample_rate: u32,
    channels: u16,
}

impl WavDevice {
    /// Creates a device that will write to `path`.
    ///
    /// Nothing touches the filesystem until the first block arrives.
    pub fn create(path: impl AsRef<Path>) -> Self {
        Self {
            name: format!("wav:{}", path.as_ref().display()),
            path: path.as_ref().to_path_buf(),
            writer: None,
            samples_written: 0,
            sample_rate: 0,
            channels: 0,
        }
    }

    /// Path of the output file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of samples written so far.
    pub fn samples_written(&self) -> u64 {
        self.samples_written
    }

    fn open(&mut self, sample_rate: u32, channels: u16) -> Result<(), DeviceError> {
        let file = File::create(&self.path).map_err(|e| DeviceError::io(&self.path, e))?;
        let mut writer = BufWriter::new(file);

        // Zero lengths until finalize() knows the real ones
        writer
            .write_all(&pcm16_header(sample_rate, channels, 0))
            .map_err(|e| DeviceError::io(&self.path, e))?;

        tracing::debug!(
            "WavDevice {}: opened at {}Hz, {} channel(s)",
            self.name,
            sample_rate,
            channels
        );

        self.writer = Some(writer);
        self.sample_rate = sample_rate;
        self.channels = channels;
        Ok(())
    }

    /// Updates the WAV header with the final sizes and flushes the file.
    ///
    /// Further blocks start a fresh file at the same path. Calling this
    /// before any block was written does nothing.
    pub fn finalize(&mut self) -> Result<(), DeviceError> {
        let Some(mut writer) = self.writer.take() else {
            return Ok(());
        };

        // Lengths past 4 GiB cannot be expressed; the header saturates
        let data_len = u32::try_from(self.samples_written.saturating_mul(2)).unwrap_or(u32::MAX);
        let patch = |writer: &mut BufWriter<File>| -> std::io::Result<()> {
            writer.seek(SeekFrom::Start(RIFF_LEN_AT))?;
            writer.write_all(&data_len.saturating_add(RIFF_OVERHEAD).to_le_bytes())?;
            writer.seek(SeekFrom::Start(DATA_LEN_AT))?;
            writer.write_all(&data_len.to_le_bytes())?;
            writer.flush()
        };
        patch(&mut writer).map_err(|e| DeviceError::io(&self.path, e))?;

        tracing::debug!(
            "WavDevice {}: finalized with {} samples",
            self.name,
            self.samples_written
        );
        self.samples_written = 0;
        Ok(())
    }
}

impl PlaybackDevice for WavDevice {
    fn name(&self) -> &str {
        &self.name
    }

    fn submit(&mut self, block: &Block<'_>) -> Result<(), DeviceError> {
        let channels = if block.stereo { 2 } else { 1 };

        if self.writer.is_none() {
            self.open(block.sample_rate, channels)?;
        } else if block.sample_rate != self.sample_rate {
            return Err(DeviceError::UnsupportedRate {
                requested: block.sample_rate,
                supported: self.sample_rate,
            });
        } else if channels != self.channels {
            return Err(DeviceError::custom(format!(
                "{}: file has {} channel(s), block has {}",
                self.name, self.channels, channels
            )));
        }

        tracing::trace!(
            "WavDevice {}: writing {} samples on {}",
            self.name,
            block.len(),
            block.channel
        );

        if let Some(ref mut writer) = self.writer {
            for _ in 0..block.repeat {
                for sample in block.samples {
                    writer
                        .write_all(&sample.to_le_bytes())
                        .map_err(|e| DeviceError::io(&self.path, e))?;
                }
                self.samples_written += block.samples.len() as u64;
            }
        }

        Ok(())
    }
}

impl Drop for WavDevice {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            tracing::warn!("WavDevice {}: finalize on drop failed: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::OutputChannel;
    use tempfile::tempdir;

    fn block(samples: &[i16], sample_rate: u32) -> Block<'_> {
        Block::mono(samples, sample_rate, OutputChannel(0))
    }

    #[test]
    fn test_wav_device_creates_wav() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let mut device = WavDevice::create(&path);
        device.submit(&block(&[100, 200, 300, 400], 16000)).unwrap();
        device.finalize().unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(&data[0..4], b"RIFF");
        assert_eq!(&data[8..12], b"WAVE");
        assert_eq!(&data[12..16], b"fmt ");

        let channels = u16::from_le_bytes([data[22], data[23]]);
        assert_eq!(channels, 1);
    }

    #[test]
    fn test_pcm16_header_layout() {
        let header = pcm16_header(22_050, 2, 400);
        assert_eq!(&header[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes([header[4], header[5], header[6], header[7]]), 436);
        assert_eq!(&header[36..40], b"data");
        assert_eq!(u16::from_le_bytes([header[22], header[23]]), 2);
        assert_eq!(
            u32::from_le_bytes([header[28], header[29], header[30], header[31]]),
            22_050 * 4
        );
        assert_eq!(u16::from_le_bytes([header[32], header[33]]), 4);
        assert_eq!(u32::from_le_bytes([header[40], header[41], header[42], header[43]]), 400);
    }

    #[test]
    fn test_wav_device_writes_samples() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let mut device = WavDevice::create(&path);
        device.submit(&block(&[0x1234, 0x5678], 16000)).unwrap();
        device.finalize().unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data[HEADER_LEN], 0x34);
        assert_eq!(data[HEADER_LEN + 1], 0x12);
        assert_eq!(data[HEADER_LEN + 2], 0x78);
        assert_eq!(data[HEADER_LEN + 3], 0x56);
    }

    #[test]
    fn test_wav_device_multiple_blocks_correct_header() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let mut device = WavDevice::create(&path);
        device.submit(&block(&[100, 200], 44_100)).unwrap();
        device.submit(&block(&[300, 400], 44_100)).unwrap();
        device.submit(&block(&[500, 600], 44_100)).unwrap();
        assert_eq!(device.samples_written(), 6);
        device.finalize().unwrap();

        let data = std::fs::read(&path).unwrap();
        let data_size = u32::from_le_bytes([data[40], data[41], data[42], data[43]]);
        assert_eq!(data_size, 12);

        let file_size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        assert_eq!(file_size, RIFF_OVERHEAD + 12);

        let sample_rate = u32::from_le_bytes([data[24], data[25], data[26], data[27]]);
        assert_eq!(sample_rate, 44_100);

        let byte_rate = u32::from_le_bytes([data[28], data[29], data[30], data[31]]);
        assert_eq!(byte_rate, 44_100 * 2);
    }

    #[test]
    fn test_wav_device_rejects_rate_change() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let mut device = WavDevice::create(&path);
        device.submit(&block(&[1, 2], 44_100)).unwrap();
        let result = device.submit(&block(&[3, 4], 22_050));

        assert!(matches!(
            result,
            Err(DeviceError::UnsupportedRate {
                requested: 22_050,
                supported: 44_100
            })
        ));
        assert_eq!(device.samples_written(), 2);
    }

    #[test]
    fn test_wav_device_repeat() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let mut device = WavDevice::create(&path);
        let mut looped = block(&[9, 9, 9], 8000);
        looped.repeat = 3;
        device.submit(&looped).unwrap();
        assert_eq!(device.samples_written(), 9);
    }

    #[test]
    fn test_wav_device_invalid_path_error() {
        let mut device = WavDevice::create("/nonexistent/directory/test.wav");
        let result = device.submit(&block(&[100, 200], 16000));

        let err = result.unwrap_err();
        assert!(err.to_string().contains("nonexistent"));
    }

    #[test]
    fn test_wav_device_finalize_before_write() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let mut device = WavDevice::create(&path);
        assert!(device.finalize().is_ok());
        assert!(!path.exists());
    }

    #[test]
    fn test_wav_device_finalizes_on_drop() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        {
            let mut device = WavDevice::create(&path);
            device.submit(&block(&[1, 2, 3], 16000)).unwrap();
        }

        let data = std::fs::read(&path).unwrap();
        let data_size = u32::from_le_bytes([data[40], data[41], data[42], data[43]]);
        assert_eq!(data_size, 6);
    }

    #[test]
    fn test_wav_device_reopens_with_new_format_after_finalize() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.wav");

        let mut device = WavDevice::create(&path);
        device.submit(&block(&[1, 2, 3, 4, 5], 44_100)).unwrap();
        device.finalize().unwrap();

        let mut stereo = block(&[7, -7], 8000);
        stereo.stereo = true;
        device.submit(&stereo).unwrap();
        device.finalize().unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), HEADER_LEN + 4);
        assert_eq!(&data[..HEADER_LEN], &pcm16_header(8000, 2, 4)[..]);
        assert_eq!(&data[HEADER_LEN..], &[7u8, 0, 0xf9, 0xff][..]);
    }

    #[test]
    fn test_wav_device_name() {
        let device = WavDevice::create("/path/to/audio.wav");
        assert_eq!(device.name(), "wav:/path/to/audio.wav");
        assert_eq!(device.path(), Path::new("/path/to/audio.wav"));
    }
}
