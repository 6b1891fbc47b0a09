//! Web Audio による音声出力

use lesson_lens_common::audio::{AudioBackend, AudioContext, AudioStream, PcmBuffer};
use lesson_lens_common::{Error, Result};
use wasm_bindgen::prelude::*;
use web_sys::{AudioBufferSourceNode, AudioContextOptions};

fn playback_error(context: &str, value: JsValue) -> Error {
    Error::Playback(format!("{}: {:?}", context, value))
}

/// ブラウザの AudioContext を開く出力先
#[derive(Debug, Clone, Copy, Default)]
pub struct WebAudioBackend;

pub struct WebAudioContext {
    ctx: web_sys::AudioContext,
}

pub struct WebAudioStream {
    source: AudioBufferSourceNode,
}

impl AudioBackend for WebAudioBackend {
    type Context = WebAudioContext;

    fn open(&self, sample_rate: u32) -> Result<WebAudioContext> {
        let options = AudioContextOptions::new();
        options.set_sample_rate(sample_rate as f32);
        let ctx = web_sys::AudioContext::new_with_context_options(&options)
            .map_err(|e| playback_error("AudioContext", e))?;
        Ok(WebAudioContext { ctx })
    }
}

impl Drop for WebAudioContext {
    fn drop(&mut self) {
        let _ = self.ctx.close();
    }
}

impl AudioContext for WebAudioContext {
    type Stream = WebAudioStream;

    fn start(&self, buffer: &PcmBuffer, on_ended: Box<dyn FnOnce()>) -> Result<WebAudioStream> {
        let frames = buffer.samples.len() / buffer.channels.max(1) as usize;
        let audio_buffer = self
            .ctx
            .create_buffer(buffer.channels as u32, frames.max(1) as u32, buffer.sample_rate as f32)
            .map_err(|e| playback_error("createBuffer", e))?;

        let mut samples = buffer.samples.clone();
        audio_buffer
            .copy_to_channel(&mut samples[..], 0)
            .map_err(|e| playback_error("copyToChannel", e))?;

        let source = self
            .ctx
            .create_buffer_source()
            .map_err(|e| playback_error("createBufferSource", e))?;
        source.set_buffer(Some(&audio_buffer));
        source
            .connect_with_audio_node(&self.ctx.destination())
            .map_err(|e| playback_error("connect", e))?;

        // 呼ばれた時点で解放されるクロージャ
        let callback = Closure::once_into_js(move || on_ended());
        source.set_onended(Some(callback.unchecked_ref()));

        #[allow(deprecated)]
        source.start().map_err(|e| playback_error("start", e))?;

        Ok(WebAudioStream { source })
    }
}

impl AudioStream for WebAudioStream {
    fn stop(&mut self) {
        // 強制停止時は終了通知を出さない
        self.source.set_onended(None);
        #[allow(deprecated)]
        let _ = self.source.stop();
    }
}
