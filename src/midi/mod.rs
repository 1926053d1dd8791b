/// MIDI output using midir
/// Pads are played as the nearest equal-tempered MIDI note
use midir::{MidiOutput, MidiOutputConnection};
use tracing::debug;

use crate::audio::Voice;
use crate::error::{Error, Result};

const CLIENT_NAME: &str = "Intervals MIDI Output";

pub struct MidiVoice {
    connection: Option<MidiOutputConnection>,
    channel: u8,
    note: u8,
    velocity: u8,
    sounding: Option<u8>,
}

impl MidiVoice {
    pub fn new() -> Self {
        Self {
            connection: None,
            channel: 0,
            note: 69,
            velocity: 64,
            sounding: None,
        }
    }

    pub fn with_channel(mut self, channel: u8) -> Self {
        self.channel = channel.min(15);
        self
    }

    pub fn available_ports() -> Vec<String> {
        if let Ok(midi_out) = MidiOutput::new(CLIENT_NAME) {
            midi_out
                .ports()
                .iter()
                .filter_map(|p| midi_out.port_name(p).ok())
                .collect()
        } else {
            vec![]
        }
    }

    pub fn connect(&mut self, port_index: usize) -> Result<()> {
        let midi_out = MidiOutput::new(CLIENT_NAME)
            .map_err(|e| Error::Midi(format!("Failed to create MIDI output: {}", e)))?;

        let ports = midi_out.ports();
        let port = ports
            .get(port_index)
            .ok_or_else(|| Error::Midi("Invalid port index".to_string()))?;

        let connection = midi_out
            .connect(port, "intervals")
            .map_err(|e| Error::Midi(format!("Failed to connect: {}", e)))?;

        self.connection = Some(connection);
        Ok(())
    }

    /// Note a `start` would play, after frequency rounding
    pub fn note(&self) -> u8 {
        self.note
    }

    pub fn velocity(&self) -> u8 {
        self.velocity
    }

    /// Messages `start` sends: note-off for a still sounding note, then note-on
    fn start_messages(&self) -> Vec<[u8; 3]> {
        let mut messages = Vec::with_capacity(2);
        if let Some(previous) = self.sounding {
            messages.push(note_off(self.channel, previous));
        }
        messages.push(note_on(self.channel, self.note, self.velocity));
        messages
    }

    fn send(&mut self, message: [u8; 3]) -> Result<()> {
        let conn = self
            .connection
            .as_mut()
            .ok_or_else(|| Error::VoiceUnavailable("no MIDI port connected".into()))?;
        conn.send(&message)
            .map_err(|e| Error::VoiceUnavailable(format!("Failed to send MIDI: {}", e)))
    }
}

impl Default for MidiVoice {
    fn default() -> Self {
        Self::new()
    }
}

impl Voice for MidiVoice {
    fn set_frequency(&mut self, hz: f64) {
        self.note = frequency_to_midi_note(hz);
    }

    fn set_amplitude(&mut self, amplitude: f64) {
        self.velocity = (amplitude.clamp(0.0, 1.0) * 127.0).round() as u8;
    }

    fn start(&mut self) -> Result<()> {
        for message in self.start_messages() {
            self.send(message)?;
            // Once the note-off is out the old note is no longer sounding
            self.sounding = None;
        }
        self.sounding = Some(self.note);
        debug!(note = self.note, velocity = self.velocity, "MIDI note on");
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        match self.sounding.take() {
            Some(note) => self.send(note_off(self.channel, note)),
            None => Ok(()),
        }
    }
}

/// Nearest MIDI note, A4 = 69 = 440 Hz
pub fn frequency_to_midi_note(hz: f64) -> u8 {
    if !hz.is_finite() || hz <= 0.0 {
        return 0;
    }
    let note = 69.0 + 12.0 * (hz / 440.0).log2();
    note.round().clamp(0.0, 127.0) as u8
}

fn note_on(channel: u8, note: u8, velocity: u8) -> [u8; 3] {
    [0x90 | channel, note, velocity]
}

fn note_off(channel: u8, note: u8) -> [u8; 3] {
    [0x80 | channel, note, 0]
}

pub fn midi_note_name(note: u8) -> String {
    let note_names = ["C", "C#", "D", "D#", "E", "F", "F#", "G", "G#", "A", "A#", "B"];
    let octave = (note / 12) as i32 - 1;
    let note_index = (note % 12) as usize;
    format!("{}{}", note_names[note_index], octave)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn midi_note_to_frequency(note: u8) -> f64 {
        440.0 * 2.0_f64.powf((note as f64 - 69.0) / 12.0)
    }

    #[test]
    fn test_frequency_to_note() {
        assert_eq!(frequency_to_midi_note(440.0), 69);
        assert_eq!(frequency_to_midi_note(261.6256), 60);
        assert_eq!(frequency_to_midi_note(452.0), 69);
        assert_eq!(frequency_to_midi_note(0.0), 0);
        assert_eq!(frequency_to_midi_note(f64::NAN), 0);
        assert_eq!(frequency_to_midi_note(1.0e9), 127);
    }

    #[test]
    fn test_note_round_trip() {
        for note in [0, 21, 60, 69, 108, 127] {
            assert_eq!(frequency_to_midi_note(midi_note_to_frequency(note)), note);
        }
    }

    #[test]
    fn test_note_names() {
        assert_eq!(midi_note_name(60), "C4");
        assert_eq!(midi_note_name(69), "A4");
        assert_eq!(midi_note_name(0), "C-1");
    }

    #[test]
    fn test_disconnected_voice_is_unavailable() {
        let mut voice = MidiVoice::new();
        voice.set_frequency(880.0);
        voice.set_amplitude(0.5);
        assert_eq!(voice.note(), 81);
        assert_eq!(voice.velocity(), 64);
        assert!(matches!(voice.start(), Err(Error::VoiceUnavailable(_))));
        assert!(voice.stop().is_ok());
    }

    #[test]
    fn test_start_messages_fresh_note() {
        let mut voice = MidiVoice::new();
        voice.set_frequency(440.0);
        voice.set_amplitude(1.0);
        assert_eq!(voice.start_messages(), vec![[0x90, 69, 127]]);
    }

    #[test]
    fn test_start_messages_retarget() {
        let mut voice = MidiVoice::new().with_channel(3);
        voice.sounding = Some(60);
        voice.set_frequency(midi_note_to_frequency(64));
        voice.set_amplitude(0.5);
        assert_eq!(
            voice.start_messages(),
            vec![[0x83, 60, 0], [0x93, 64, 64]]
        );
    }

    #[test]
    fn test_channel_clamped() {
        let mut voice = MidiVoice::new().with_channel(20);
        voice.set_frequency(440.0);
        assert_eq!(voice.start_messages()[0][0], 0x9F);
    }

    #[test]
    fn test_failed_start_keeps_sounding_note() {
        // Nothing was sent, so the old note is still owed a note-off
        let mut voice = MidiVoice::new();
        voice.sounding = Some(60);
        assert!(voice.start().is_err());
        assert_eq!(voice.sounding, Some(60));
        assert!(voice.stop().is_err());
        assert_eq!(voice.sounding, None);
    }
}
