//! The device's built-in default synth patch.
//!
//! Preset documents are sparse: the firmware only writes values that differ
//! from this catalogue, so sound parsing starts from a clone of it and
//! overwrites whatever the document actually specifies.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;

use crate::fixed::FixedPoint;
use crate::model::{Arpeggiator, Compressor, Delay, Lfo, ModKnob, Oscillator, Sound, Unison};

pub static DEFAULT_SYNTH_PATCH: Lazy<Sound> = Lazy::new(|| Sound {
    // Always replaced during parsing.
    preset_name: String::new(),
    problem: false,
    is_instance: false,

    polyphonic: "poly".to_string(),
    voice_priority: 1,
    mode: "subtractive".to_string(),
    lpf_mode: "24dB".to_string(),
    mod_fx_type: "none".to_string(),

    osc1: default_oscillator(),
    osc2: default_oscillator(),
    lfo1: Lfo {
        lfo_type: "triangle".to_string(),
        sync_level: Some(0),
    },
    lfo2: Lfo {
        lfo_type: "triangle".to_string(),
        sync_level: None,
    },
    unison: Unison { num: 1, detune: 8 },
    delay: Delay {
        ping_pong: Some(1),
        analog: Some(0),
        sync_level: 7,
    },
    compressor: Compressor {
        sync_level: 6,
        attack: 327244,
        release: 936,
    },
    arpeggiator: Arpeggiator {
        mode: "off".to_string(),
        num_octaves: 2,
        sync_level: 7,
    },
    mod_knobs: default_mod_knobs(),
    default_params: default_params(),

    env1: None,
    env2: None,
    patch_cables: None,
    equalizer: None,
    clipping_amount: None,
});

fn default_oscillator() -> Oscillator {
    Oscillator {
        osc_type: Some("square".to_string()),
        transpose: Some(0),
        cents: Some(0),
        retrig_phase: Some(-1),
        ..Oscillator::default()
    }
}

fn default_mod_knobs() -> Vec<ModKnob> {
    let knob = |controls_param: &str, source: Option<&str>| ModKnob {
        controls_param: controls_param.to_string(),
        patch_amount_from_source: source.map(str::to_string),
    };
    vec![
        knob("pan", None),
        knob("volumePostFX", None),
        knob("lpfResonance", None),
        knob("lpfFrequency", None),
        knob("env1Release", None),
        knob("env1Attack", None),
        knob("delayFeedback", None),
        knob("delayRate", None),
        knob("reverbAmount", None),
        knob("volumePostReverbSend", Some("compressor")),
        knob("pitch", Some("lfo1")),
        knob("lfo1Rate", None),
        knob("portamento", None),
        knob("stutterRate", None),
        knob("bitcrushAmount", None),
        knob("sampleRateReduction", None),
    ]
}

fn default_params() -> BTreeMap<String, FixedPoint> {
    const PARAMS: &[(&str, &str)] = &[
        ("arpeggiatorGate", "0x00000000"),
        ("portamento", "0x80000000"),
        ("compressorShape", "0xDC28F5B2"),
        ("oscAVolume", "0x7FFFFFFF"),
        ("oscAPulseWidth", "0x00000000"),
        ("oscAWavetablePosition", "0x00000000"),
        ("oscBVolume", "0x80000000"),
        ("oscBPulseWidth", "0x00000000"),
        ("oscBWavetablePosition", "0x00000000"),
        ("noiseVolume", "0x80000000"),
        ("volume", "0x4CCCCCA8"),
        ("pan", "0x00000000"),
        ("lpfFrequency", "0x7FFFFFFF"),
        ("lpfResonance", "0x80000000"),
        ("hpfFrequency", "0x80000000"),
        ("hpfResonance", "0x80000000"),
        ("lfo1Rate", "0x1999997E"),
        ("lfo2Rate", "0x00000000"),
        ("modulator1Amount", "0x80000000"),
        ("modulator1Feedback", "0x80000000"),
        ("modulator2Amount", "0x80000000"),
        ("modulator2Feedback", "0x80000000"),
        ("carrier1Feedback", "0x80000000"),
        ("carrier2Feedback", "0x80000000"),
        ("modFXRate", "0x00000000"),
        ("modFXDepth", "0x00000000"),
        ("delayRate", "0x00000000"),
        ("delayFeedback", "0x80000000"),
        ("reverbAmount", "0x80000000"),
        ("arpeggiatorRate", "0x00000000"),
        ("stutterRate", "0x00000000"),
        ("sampleRateReduction", "0x80000000"),
        ("bitCrush", "0x80000000"),
        ("modFXOffset", "0x00000000"),
        ("modFXFeedback", "0x00000000"),
    ];

    PARAMS
        .iter()
        .map(|(name, hex)| {
            let value = FixedPoint::decode(hex).expect("default patch literal");
            (name.to_string(), value)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_patch_is_fully_populated() {
        let patch = &*DEFAULT_SYNTH_PATCH;
        assert_eq!(patch.mod_knobs.len(), 16);
        assert_eq!(patch.default_params.len(), 35);
        assert_eq!(patch.lpf_mode, "24dB");
        assert_eq!(patch.osc1.osc_type.as_deref(), Some("square"));
        assert_eq!(patch.default_params["volume"].decimal(), 40);
    }
}
