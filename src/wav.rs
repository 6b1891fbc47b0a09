//! WAVファイルへの音声出力
//!
//! 端末には再生デバイスを仮定しないので、合成音声はWAVファイルとして書き出す。
//! 書き出しが終わった時点で再生完了として扱う。

use lesson_lens_common::audio::{AudioBackend, AudioContext, AudioStream, PcmBuffer};
use lesson_lens_common::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::info;

const BITS_PER_SAMPLE: u16 = 16;

/// 正規化サンプルを16bit PCMのWAVにエンコード
pub fn encode_wav(samples: &[f32], sample_rate: u32, channels: u16) -> Vec<u8> {
    let byte_rate = sample_rate * u32::from(channels) * u32::from(BITS_PER_SAMPLE) / 8;
    let block_align = channels * BITS_PER_SAMPLE / 8;
    let data_size = (samples.len() * 2) as u32;
    // RIFF(12) + fmt(24) + dataヘッダ(8) = 44バイト
    let file_size = 36 + data_size;

    let mut wav = Vec::with_capacity(44 + samples.len() * 2);

    wav.extend_from_slice(b"RIFF");
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes());
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM
    wav.extend_from_slice(&channels.to_le_bytes());
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&byte_rate.to_le_bytes());
    wav.extend_from_slice(&block_align.to_le_bytes());
    wav.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        let value = (sample * 32768.0).round().clamp(i16::MIN as f32, i16::MAX as f32) as i16;
        wav.extend_from_slice(&value.to_le_bytes());
    }

    wav
}

/// 指定パスにWAVを書き出す出力先
#[derive(Debug, Clone)]
pub struct WavFileBackend {
    output: PathBuf,
}

impl WavFileBackend {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self { output: output.into() }
    }

    pub fn output(&self) -> &Path {
        &self.output
    }
}

pub struct WavContext {
    output: PathBuf,
}

pub struct WavStream {
    path: PathBuf,
}

impl AudioBackend for WavFileBackend {
    type Context = WavContext;

    fn open(&self, _sample_rate: u32) -> Result<WavContext> {
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Playback(format!("{}: {}", parent.display(), e)))?;
        }
        Ok(WavContext {
            output: self.output.clone(),
        })
    }
}

impl AudioContext for WavContext {
    type Stream = WavStream;

    fn start(&self, buffer: &PcmBuffer, on_ended: Box<dyn FnOnce()>) -> Result<WavStream> {
        let wav = encode_wav(&buffer.samples, buffer.sample_rate, buffer.channels);
        std::fs::write(&self.output, wav)
            .map_err(|e| Error::Playback(format!("{}: {}", self.output.display(), e)))?;
        info!(path = %self.output.display(), seconds = buffer.duration_secs(), "音声を書き出し");
        on_ended();
        Ok(WavStream {
            path: self.output.clone(),
        })
    }
}

impl AudioStream for WavStream {
    fn stop(&mut self) {
        // 書き出し済みのファイルは残す
        tracing::debug!(path = %self.path.display(), "停止要求（書き出し済み）");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wav_header() {
        let wav = encode_wav(&[0.0, 0.5], 24_000, 1);
        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 24_000);
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 4);
        assert_eq!(wav.len(), 48);
    }

    #[test]
    fn test_wav_samples_clamped() {
        let wav = encode_wav(&[-1.0, 0.5, 1.5], 24_000, 1);
        let samples: Vec<i16> = wav[44..]
            .chunks_exact(2)
            .map(|p| i16::from_le_bytes([p[0], p[1]]))
            .collect();
        assert_eq!(samples, vec![i16::MIN, 16384, i16::MAX]);
    }

    #[test]
    fn test_start_writes_file_and_ends() {
        let dir = tempfile::tempdir().expect("一時ディレクトリ作成失敗");
        let path = dir.path().join("out").join("speech.wav");
        let backend = WavFileBackend::new(&path);
        let context = backend.open(24_000).expect("オープン失敗");

        let ended = std::rc::Rc::new(std::cell::Cell::new(false));
        let flag = ended.clone();
        let buffer = PcmBuffer {
            sample_rate: 24_000,
            channels: 1,
            samples: vec![0.25; 10],
        };
        context
            .start(&buffer, Box::new(move || flag.set(true)))
            .expect("書き出し失敗");

        assert!(ended.get());
        assert_eq!(std::fs::read(&path).unwrap().len(), 44 + 20);
    }
}
