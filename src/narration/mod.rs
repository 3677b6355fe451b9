//! Narration engine behind a provider trait.
//!
//! Narration is fire-and-forget: the session issues speak/cancel commands and
//! tracks progress with its own ticker. Engine completion is fed back to the
//! controller as a `NarrationFinished` event.

use crate::config::{VoiceGender, VoiceSettings};
use thiserror::Error;

/// Narration errors.
#[derive(Debug, Error)]
pub enum NarrationError {
    #[error("TTS initialization failed: {0}")]
    InitFailed(String),

    #[error("Speech failed: {0}")]
    SpeechFailed(String),
}

/// Trait for narration providers.
pub trait Narrator: Send {
    /// Begin speaking, interrupting any narration in flight.
    fn speak(&mut self, text: &str) -> Result<(), NarrationError>;

    /// Cancel current narration. Idempotent.
    fn cancel(&mut self);

    /// Whether narration is currently in flight.
    fn is_speaking(&self) -> bool;
}

/// Narrator backed by the platform speech synthesizer via the `tts` crate.
pub struct SystemNarrator {
    tts: tts::Tts,
    speaking: bool,
}

impl SystemNarrator {
    /// Initialize the platform synthesizer with the user's voice settings.
    ///
    /// Voice selection is best-effort: platforms that cannot enumerate voices
    /// keep their default voice.
    pub fn new(settings: &VoiceSettings) -> Result<Self, NarrationError> {
        let tts = tts::Tts::default().map_err(|e| NarrationError::InitFailed(e.to_string()))?;
        let mut narrator = Self {
            tts,
            speaking: false,
        };

        narrator.select_voice(settings.gender);
        narrator.set_rate_factor(settings.rate)?;
        Ok(narrator)
    }

    fn select_voice(&mut self, gender: VoiceGender) {
        let wanted = match gender {
            VoiceGender::Female => tts::Gender::Female,
            VoiceGender::Male => tts::Gender::Male,
        };
        let Ok(voices) = self.tts.voices() else {
            return;
        };
        if let Some(voice) = voices.iter().find(|v| v.gender() == Some(wanted)) {
            if let Err(e) = self.tts.set_voice(voice) {
                tracing::warn!("Could not select {gender} voice: {e}");
            }
        }
    }

    /// Scale the speaking rate relative to the voice's normal rate.
    ///
    /// The original guide narrates slightly slower than normal (factor 0.9).
    pub fn set_rate_factor(&mut self, factor: f32) -> Result<(), NarrationError> {
        let factor = factor.clamp(0.5, 2.0);
        let normal = self.tts.normal_rate();
        let rate = (normal * factor).clamp(self.tts.min_rate(), self.tts.max_rate());
        self.tts
            .set_rate(rate)
            .map(|_| ())
            .map_err(|e| NarrationError::SpeechFailed(e.to_string()))
    }
}

impl Narrator for SystemNarrator {
    fn speak(&mut self, text: &str) -> Result<(), NarrationError> {
        if text.is_empty() {
            return Ok(());
        }

        tracing::debug!("Narrating: {}", text);
        self.tts
            .speak(text, true)
            .map_err(|e| NarrationError::SpeechFailed(e.to_string()))?;
        self.speaking = true;
        Ok(())
    }

    fn cancel(&mut self) {
        if let Err(e) = self.tts.stop() {
            tracing::warn!("Failed to stop narration: {}", e);
        }
        self.speaking = false;
    }

    fn is_speaking(&self) -> bool {
        self.tts.is_speaking().unwrap_or(self.speaking)
    }
}

/// Narrator that records what it was asked to speak. Used in tests and in
/// headless runs with no audio device.
#[derive(Debug, Default)]
pub struct SilentNarrator {
    spoken: Vec<String>,
    cancels: usize,
    speaking: bool,
}

impl SilentNarrator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Texts spoken so far, in order.
    pub fn spoken(&self) -> &[String] {
        &self.spoken
    }

    /// Number of cancel calls.
    pub fn cancel_count(&self) -> usize {
        self.cancels
    }
}

impl Narrator for SilentNarrator {
    fn speak(&mut self, text: &str) -> Result<(), NarrationError> {
        self.spoken.push(text.to_string());
        self.speaking = true;
        Ok(())
    }

    fn cancel(&mut self) {
        self.cancels += 1;
        self.speaking = false;
    }

    fn is_speaking(&self) -> bool {
        self.speaking
    }
}
