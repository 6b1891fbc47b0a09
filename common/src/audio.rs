//! 音声再生パイプライン
//!
//! 合成音声（Base64の16bit LE PCM, 24kHz mono）を浮動小数点サンプルに変換し、
//! 同時に1ストリームだけ再生する。出力コンテキストは初回再生時に開いて使い回す。
//!
//! 実際の出力先は AudioBackend で抽象化する（Web Audio / WAVファイル / テスト用）。

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use base64::Engine as _;
use tracing::{debug, error};

use crate::error::{Error, Result};
use crate::language::LanguageTarget;
use crate::service::LessonService;
use crate::types::AudioClipId;

/// 合成音声のサンプルレート
pub const SAMPLE_RATE: u32 = 24_000;

/// 合成音声のチャンネル数
pub const CHANNELS: u16 = 1;

/// i16 → [-1.0, 1.0) の正規化係数
const PCM_SCALE: f32 = 32768.0;

/// 再生可能なPCMバッファ
#[derive(Debug, Clone, PartialEq)]
pub struct PcmBuffer {
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<f32>,
}

impl PcmBuffer {
    /// 再生時間（秒）
    pub fn duration_secs(&self) -> f64 {
        let frames = self.samples.len() / self.channels.max(1) as usize;
        frames as f64 / self.sample_rate as f64
    }
}

/// Base64を16bit LEのサンプル列にデコード
pub fn decode_base64_pcm(base64_audio: &str) -> Result<Vec<i16>> {
    let bytes = base64::engine::general_purpose::STANDARD
        .decode(base64_audio.trim())
        .map_err(|e| Error::Decode(format!("invalid base64 audio: {}", e)))?;

    if bytes.len() % 2 != 0 {
        return Err(Error::Decode(format!(
            "PCM byte length {} is not a multiple of 2",
            bytes.len()
        )));
    }

    Ok(bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect())
}

/// サンプルを 32768 で割って正規化
pub fn normalize_samples(samples: &[i16]) -> Vec<f32> {
    samples.iter().map(|&s| s as f32 / PCM_SCALE).collect()
}

/// 合成音声をデコードして再生用バッファを作る
pub fn decode_speech(base64_audio: &str) -> Result<PcmBuffer> {
    let samples = decode_base64_pcm(base64_audio)?;
    Ok(PcmBuffer {
        sample_rate: SAMPLE_RATE,
        channels: CHANNELS,
        samples: normalize_samples(&samples),
    })
}

/// 音声出力の生成元
pub trait AudioBackend {
    type Context: AudioContext;

    /// 出力コンテキストを開く（セッションで1回）
    fn open(&self, sample_rate: u32) -> Result<Self::Context>;
}

/// 開いた出力コンテキスト
pub trait AudioContext {
    type Stream: AudioStream + 'static;

    /// 再生を開始する
    ///
    /// 自然終了時に `on_ended` を1回呼ぶ（開始中に同期的に呼んでもよい）
    fn start(&self, buffer: &PcmBuffer, on_ended: Box<dyn FnOnce()>) -> Result<Self::Stream>;
}

/// 再生中のストリーム
pub trait AudioStream {
    fn stop(&mut self);
}

/// speak の結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakOutcome {
    /// 新しいストリームを開始した
    Started(AudioClipId),
    /// 再生中だったので停止した（新規リクエストなし）
    Stopped,
    /// 音声合成の待機中
    Busy,
    /// 読み上げるテキストがない
    Skipped,
}

struct ActiveStream<S> {
    clip: AudioClipId,
    /// 開始処理中は None
    stream: Option<S>,
}

type StreamOf<B> = <<B as AudioBackend>::Context as AudioContext>::Stream;

/// 単一ストリームの音声プレイヤー
pub struct SpeechPlayer<B: AudioBackend> {
    backend: B,
    context: RefCell<Option<B::Context>>,
    active: Rc<RefCell<Option<ActiveStream<StreamOf<B>>>>>,
    loading: Cell<bool>,
    next_clip: Cell<u64>,
    listener: RefCell<Option<Rc<dyn Fn()>>>,
}

impl<B: AudioBackend> SpeechPlayer<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            context: RefCell::new(None),
            active: Rc::new(RefCell::new(None)),
            loading: Cell::new(false),
            next_clip: Cell::new(0),
            listener: RefCell::new(None),
        }
    }

    /// 状態変化（開始・停止・自然終了）の通知先
    pub fn set_listener(&self, listener: Rc<dyn Fn()>) {
        *self.listener.borrow_mut() = Some(listener);
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn is_playing(&self) -> bool {
        self.active.borrow().is_some()
    }

    pub fn is_loading(&self) -> bool {
        self.loading.get()
    }

    pub fn has_context(&self) -> bool {
        self.context.borrow().is_some()
    }

    /// テキストを読み上げる
    ///
    /// 再生中なら停止して戻る（トグル）。失敗時は再生状態をアイドルに戻してエラーを返す。
    pub async fn speak<S: LessonService + ?Sized>(
        &self,
        service: &S,
        text: &str,
        language: &LanguageTarget,
    ) -> Result<SpeakOutcome> {
        if self.is_playing() {
            self.stop();
            return Ok(SpeakOutcome::Stopped);
        }
        if self.loading.get() {
            return Ok(SpeakOutcome::Busy);
        }
        if text.trim().is_empty() {
            return Ok(SpeakOutcome::Skipped);
        }

        self.loading.set(true);
        self.notify();

        let result = async {
            let base64_audio = service.synthesize_speech(text, language.display_name).await?;
            let buffer = decode_speech(&base64_audio)?;
            debug!(
                samples = buffer.samples.len(),
                seconds = buffer.duration_secs(),
                "合成音声をデコード"
            );
            self.start(&buffer)
        }
        .await;

        self.loading.set(false);
        self.notify();

        match result {
            Ok(clip) => Ok(SpeakOutcome::Started(clip)),
            Err(e) => {
                error!(error = %e, "音声の生成・再生に失敗");
                Err(e)
            }
        }
    }

    /// 再生を強制停止（アイドル時は何もしない）
    pub fn stop(&self) {
        let active = self.active.borrow_mut().take();
        if let Some(mut active) = active {
            if let Some(stream) = active.stream.as_mut() {
                stream.stop();
            }
            debug!(clip = active.clip.0, "再生を停止");
            self.notify();
        }
    }

    /// 出力コンテキストを解放（次回再生時に開き直す）
    pub fn release(&self) {
        self.stop();
        self.context.borrow_mut().take();
    }

    fn start(&self, buffer: &PcmBuffer) -> Result<AudioClipId> {
        {
            let mut context = self.context.borrow_mut();
            if context.is_none() {
                *context = Some(self.backend.open(buffer.sample_rate)?);
            }
        }

        let clip = AudioClipId(self.next_clip.get() + 1);
        self.next_clip.set(clip.0);
        *self.active.borrow_mut() = Some(ActiveStream { clip, stream: None });

        let started = {
            let context = self.context.borrow();
            let ctx = context
                .as_ref()
                .ok_or_else(|| Error::Playback("audio context is not open".into()))?;
            ctx.start(buffer, self.ended_callback(clip))
        };

        let mut active = self.active.borrow_mut();
        match started {
            Ok(stream) => {
                // 開始中に終了通知が来ていれば active は既に空
                if let Some(current) = active.as_mut().filter(|a| a.clip == clip) {
                    current.stream = Some(stream);
                }
                Ok(clip)
            }
            Err(e) => {
                if active.as_ref().is_some_and(|a| a.clip == clip) {
                    *active = None;
                }
                Err(e)
            }
        }
    }

    fn ended_callback(&self, clip: AudioClipId) -> Box<dyn FnOnce()> {
        let active = Rc::downgrade(&self.active);
        let listener = self.listener.borrow().clone();
        Box::new(move || {
            let Some(active) = active.upgrade() else {
                return;
            };
            let finished = {
                let mut active = active.borrow_mut();
                if active.as_ref().is_some_and(|a| a.clip == clip) {
                    *active = None;
                    true
                } else {
                    false
                }
            };
            if finished {
                debug!(clip = clip.0, "再生が終了");
                if let Some(listener) = listener {
                    listener();
                }
            }
        })
    }

    fn notify(&self) {
        let listener = self.listener.borrow().clone();
        if let Some(listener) = listener {
            listener();
        }
    }
}


#[cfg(test)]
mod tests {
    use super::fake::FakeBackend;
    use super::*;
    use crate::language::default_language;
    use crate::types::{BinaryAsset, QuizQuestion};
    use async_trait::async_trait;
    use futures::executor::block_on;

    fn encode_samples(samples: &[i16]) -> String {
        let bytes: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        base64::engine::general_purpose::STANDARD.encode(bytes)
    }

    /// 音声合成だけを返すサービス
    struct SpeechOnly {
        audio: std::result::Result<String, &'static str>,
        calls: Cell<usize>,
    }

    impl SpeechOnly {
        fn ok(samples: &[i16]) -> Self {
            Self {
                audio: Ok(encode_samples(samples)),
                calls: Cell::new(0),
            }
        }
    }

    #[async_trait(?Send)]
    impl LessonService for SpeechOnly {
        async fn simplify(&self, _: &str, _: &[BinaryAsset], _: &str) -> Result<String> {
            unimplemented!()
        }

        async fn summarize(&self, _: &str, _: &[BinaryAsset], _: &str) -> Result<String> {
            unimplemented!()
        }

        async fn generate_quiz(&self, _: &str, _: &[BinaryAsset], _: &str) -> Result<Vec<QuizQuestion>> {
            unimplemented!()
        }

        async fn generate_image(&self, _: &str) -> Result<String> {
            unimplemented!()
        }

        async fn synthesize_speech(&self, _: &str, _: &str) -> Result<String> {
            self.calls.set(self.calls.get() + 1);
            self.audio
                .clone()
                .map_err(|e| Error::EmptyResponse(e.to_string()))
        }
    }

    // =============================================
    // PCMデコードテスト
    // =============================================

    #[test]
    fn test_pcm_roundtrip_normalization() {
        let samples: Vec<i16> = vec![0, 1, -1, 16384, -16384, i16::MAX, i16::MIN, 1234, -4321];
        let buffer = decode_speech(&encode_samples(&samples)).unwrap();

        assert_eq!(buffer.samples.len(), samples.len());
        for (decoded, original) in buffer.samples.iter().zip(&samples) {
            let expected = *original as f32 / 32768.0;
            assert!((decoded - expected).abs() < 1e-6, "{} != {}", decoded, expected);
        }
        assert_eq!(buffer.samples[6], -1.0);
    }

    #[test]
    fn test_pcm_little_endian() {
        // 0x0100 = 256
        let samples = decode_base64_pcm("AAE=").unwrap();
        assert_eq!(samples, vec![256]);
    }

    #[test]
    fn test_pcm_odd_length_is_decode_error() {
        let encoded = base64::engine::general_purpose::STANDARD.encode([1u8, 2, 3]);
        assert!(matches!(decode_base64_pcm(&encoded), Err(Error::Decode(_))));
    }

    #[test]
    fn test_pcm_invalid_base64() {
        assert!(matches!(decode_base64_pcm("***"), Err(Error::Decode(_))));
    }

    #[test]
    fn test_buffer_duration() {
        let buffer = PcmBuffer {
            sample_rate: SAMPLE_RATE,
            channels: CHANNELS,
            samples: vec![0.0; 48_000],
        };
        assert!((buffer.duration_secs() - 2.0).abs() < f64::EPSILON);
    }

    // =============================================
    // プレイヤーテスト
    // =============================================

    #[test]
    fn test_speak_starts_playback() {
        let backend = FakeBackend::default();
        let player = SpeechPlayer::new(backend.clone());
        let service = SpeechOnly::ok(&[100, -100]);

        let outcome = block_on(player.speak(&service, "hello", default_language())).unwrap();
        assert!(matches!(outcome, SpeakOutcome::Started(_)));
        assert!(player.is_playing());
        assert!(!player.is_loading());
        assert_eq!(backend.log.borrow().started[0].sample_rate, SAMPLE_RATE);
    }

    #[test]
    fn test_speak_while_playing_stops_without_request() {
        let backend = FakeBackend::default();
        let player = SpeechPlayer::new(backend.clone());
        let service = SpeechOnly::ok(&[1, 2, 3]);

        block_on(player.speak(&service, "hello", default_language())).unwrap();
        let outcome = block_on(player.speak(&service, "hello", default_language())).unwrap();

        assert_eq!(outcome, SpeakOutcome::Stopped);
        assert!(!player.is_playing());
        assert_eq!(service.calls.get(), 1);
        assert_eq!(backend.log.borrow().stopped, 1);

        // 次の呼び出しは新たに再生する
        let outcome = block_on(player.speak(&service, "hello", default_language())).unwrap();
        assert!(matches!(outcome, SpeakOutcome::Started(_)));
        assert_eq!(service.calls.get(), 2);
        assert_eq!(backend.log.borrow().started.len(), 2);
    }

    #[test]
    fn test_natural_end_clears_active_stream() {
        let backend = FakeBackend::default();
        let player = SpeechPlayer::new(backend.clone());
        let notified = Rc::new(Cell::new(0));
        let counter = notified.clone();
        player.set_listener(Rc::new(move || counter.set(counter.get() + 1)));

        block_on(player.speak(&SpeechOnly::ok(&[5]), "hi", default_language())).unwrap();
        let before = notified.get();
        backend.finish(0);

        assert!(!player.is_playing());
        assert_eq!(notified.get(), before + 1);
    }

    #[test]
    fn test_stale_end_does_not_clear_new_stream() {
        let backend = FakeBackend::default();
        let player = SpeechPlayer::new(backend.clone());
        let service = SpeechOnly::ok(&[5]);

        block_on(player.speak(&service, "one", default_language())).unwrap();
        player.stop();
        block_on(player.speak(&service, "two", default_language())).unwrap();

        // 停止済みの1本目の終了通知は無視される
        backend.finish(0);
        assert!(player.is_playing());
        backend.finish(1);
        assert!(!player.is_playing());
    }

    #[test]
    fn test_stop_when_idle_is_noop() {
        let backend = FakeBackend::default();
        let player = SpeechPlayer::new(backend.clone());
        player.stop();
        assert!(!player.is_playing());
        assert_eq!(backend.log.borrow().stopped, 0);
    }

    #[test]
    fn test_context_opened_once_and_released() {
        let backend = FakeBackend::default();
        let player = SpeechPlayer::new(backend.clone());
        let service = SpeechOnly::ok(&[5]);

        assert!(!player.has_context());
        block_on(player.speak(&service, "a", default_language())).unwrap();
        backend.finish(0);
        block_on(player.speak(&service, "b", default_language())).unwrap();
        assert_eq!(backend.log.borrow().opened, 1);

        player.release();
        assert!(!player.has_context());
        assert!(!player.is_playing());
        block_on(player.speak(&service, "c", default_language())).unwrap();
        assert_eq!(backend.log.borrow().opened, 2);
    }

    #[test]
    fn test_decode_failure_leaves_idle() {
        let player = SpeechPlayer::new(FakeBackend::default());
        let service = SpeechOnly {
            audio: Ok("AQID".to_string()), // 3バイト
            calls: Cell::new(0),
        };
        let result = block_on(player.speak(&service, "hi", default_language()));
        assert!(matches!(result, Err(Error::Decode(_))));
        assert!(!player.is_playing());
        assert!(!player.is_loading());
    }

    #[test]
    fn test_playback_start_failure_leaves_idle() {
        let backend = FakeBackend::default();
        backend.fail_start.set(true);
        let player = SpeechPlayer::new(backend);
        let result = block_on(player.speak(&SpeechOnly::ok(&[1]), "hi", default_language()));
        assert!(matches!(result, Err(Error::Playback(_))));
        assert!(!player.is_playing());
    }

    #[test]
    fn test_remote_failure_propagates() {
        let player = SpeechPlayer::new(FakeBackend::default());
        let service = SpeechOnly {
            audio: Err("no audio part"),
            calls: Cell::new(0),
        };
        assert!(block_on(player.speak(&service, "hi", default_language())).is_err());
        assert!(!player.is_playing());
    }

    #[test]
    fn test_blank_text_is_skipped() {
        let player = SpeechPlayer::new(FakeBackend::default());
        let service = SpeechOnly::ok(&[1]);
        let outcome = block_on(player.speak(&service, "   ", default_language())).unwrap();
        assert_eq!(outcome, SpeakOutcome::Skipped);
        assert_eq!(service.calls.get(), 0);
    }
}
