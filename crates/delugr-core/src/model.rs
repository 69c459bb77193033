//! The uniform in-memory object model all firmware dialects decode into.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::fixed::FixedPoint;

/// The parse result of one asset document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Asset {
    Song(Song),
    Sound(Sound),
    Kit(Kit),
}

impl Asset {
    /// The asset's display name.
    pub fn preset_name(&self) -> &str {
        match self {
            Asset::Song(s) => &s.name,
            Asset::Sound(s) => &s.preset_name,
            Asset::Kit(k) => &k.preset_name,
        }
    }
}

/// One entry of a song's ordered instrument list. Audio tracks and MIDI
/// channels are recognized but never resolved by the usage engine.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Instrument {
    Sound(Sound),
    Kit(Kit),
    AudioTrack(AudioTrack),
    MidiChannel(MidiChannel),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Song {
    pub name: String,
    /// True when no name could be determined and no fallback was available.
    pub problem: bool,
    pub instruments: Vec<Instrument>,
}

/// A synth preset, or an instance of one embedded in a song or kit.
///
/// Sparse documents are legal: parsing seeds every field from the device's
/// built-in default patch and overwrites only what the document specifies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sound {
    pub preset_name: String,
    pub problem: bool,
    /// True when this sound was embedded in a song or kit rather than
    /// stored as its own preset file.
    pub is_instance: bool,

    pub polyphonic: String,
    pub voice_priority: i64,
    pub mode: String,
    pub lpf_mode: String,
    pub mod_fx_type: String,

    pub osc1: Oscillator,
    pub osc2: Oscillator,
    pub lfo1: Lfo,
    pub lfo2: Lfo,
    pub unison: Unison,
    pub delay: Delay,
    pub compressor: Compressor,
    pub arpeggiator: Arpeggiator,
    pub mod_knobs: Vec<ModKnob>,
    pub default_params: BTreeMap<String, FixedPoint>,

    pub env1: Option<Envelope>,
    pub env2: Option<Envelope>,
    pub patch_cables: Option<Vec<PatchCable>>,
    pub equalizer: Option<Equalizer>,
    pub clipping_amount: Option<i64>,
}

impl Sound {
    /// Every sample file name this sound references, in oscillator order:
    /// single-sample slots first, then keyboard-zone ranges.
    pub fn sample_file_names(&self) -> Vec<&str> {
        let mut names = Vec::new();
        for osc in [&self.osc1, &self.osc2] {
            if let Some(file_name) = &osc.file_name {
                names.push(file_name.as_str());
            }
        }
        for osc in [&self.osc1, &self.osc2] {
            if let Some(ranges) = &osc.sample_ranges {
                names.extend(ranges.iter().map(|r| r.file_name.as_str()));
            }
        }
        names
    }
}

/// A drum-kit preset. Kits have always been fully specified on disk, so
/// there is no default seeding; the four filter/effect fields are required.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kit {
    pub preset_name: String,
    pub problem: bool,
    pub is_instance: bool,

    pub lpf_mode: String,
    pub mod_fx_type: String,
    pub mod_fx_current_param: String,
    pub current_filter_type: String,

    pub delay: Option<Delay>,
    pub compressor: Option<Compressor>,
    pub default_params: Option<BTreeMap<String, FixedPoint>>,

    /// Embedded sound instances keyed by resolved preset name. Duplicate
    /// names overwrite (last write wins), matching device behavior.
    pub sound_sources: BTreeMap<String, Sound>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AudioTrack {
    pub name: String,
    pub echoing_input: Option<i64>,
    pub input_channel: String,
    pub is_armed_for_recording: i64,
    pub active_mod_function: i64,
    pub lpf_mode: String,
    pub mod_fx_type: String,
    pub mod_fx_current_param: String,
    pub current_filter_type: String,
    pub delay: Delay,
    pub compressor: Compressor,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MidiChannel {
    pub channel: i64,
    pub suffix: Option<String>,
    pub default_velocity: Option<i64>,
    pub is_armed_for_recording: Option<i64>,
    pub active_mod_function: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Oscillator {
    pub osc_type: Option<String>,
    pub transpose: Option<i64>,
    pub cents: Option<i64>,
    pub retrig_phase: Option<i64>,
    pub oscillator_sync: Option<i64>,
    pub loop_mode: Option<i64>,
    pub reversed: Option<i64>,
    pub time_stretch_amount: Option<i64>,
    pub time_stretch_enable: Option<i64>,
    /// Single-sample mode: one referenced sample file.
    pub file_name: Option<String>,
    pub zone: Option<Zone>,
    /// Multi-sample mode: keyboard-zone-mapped sample ranges.
    pub sample_ranges: Option<Vec<SampleRange>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleRange {
    pub file_name: String,
    pub range_top_note: Option<i64>,
    pub transpose: Option<i64>,
    pub cents: Option<i64>,
    pub zone: Zone,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Zone {
    pub start_sample_pos: u64,
    pub end_sample_pos: u64,
    pub start_loop_pos: Option<u64>,
    pub end_loop_pos: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lfo {
    pub lfo_type: String,
    pub sync_level: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Unison {
    pub num: i64,
    pub detune: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Delay {
    pub ping_pong: Option<i64>,
    pub analog: Option<i64>,
    pub sync_level: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Compressor {
    pub sync_level: i64,
    pub attack: i64,
    pub release: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Arpeggiator {
    pub mode: String,
    pub num_octaves: i64,
    pub sync_level: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope {
    pub attack: FixedPoint,
    pub decay: FixedPoint,
    pub sustain: FixedPoint,
    pub release: FixedPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Equalizer {
    pub bass: FixedPoint,
    pub treble: FixedPoint,
    pub bass_frequency: FixedPoint,
    pub treble_frequency: FixedPoint,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatchCable {
    pub source: String,
    pub destination: String,
    pub amount: FixedPoint,
    pub range_adjustable: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModKnob {
    pub controls_param: String,
    pub patch_amount_from_source: Option<String>,
}
