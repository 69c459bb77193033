//! Parsers for the V3/V4/community dialect family, where values are stored
//! as attributes. This family also writes songs, which reference presets by
//! name through an ordered instrument list.

use std::collections::BTreeMap;

use roxmltree::Node;

use crate::default_patch::DEFAULT_SYNTH_PATCH;
use crate::error::ParseError;
use crate::fixed::FixedPoint;
use crate::model::{
    Arpeggiator, AudioTrack, Compressor, Delay, Envelope, Equalizer, Instrument, Kit, Lfo,
    MidiChannel, ModKnob, Oscillator, PatchCable, SampleRange, Song, Sound, Unison, Zone,
};

use super::{attr, child_by_tag, excerpt, owner_label, parse_number, parse_position, resolve_name};

pub fn parse_song(node: Node, fallback_name: Option<&str>) -> Result<Song, ParseError> {
    let (name, problem) = resolve_name(node, fallback_name, "Unknown song")?;

    let instruments_node = child_by_tag(node, "instruments")
        .ok_or_else(|| ParseError::missing("instruments", excerpt(node)))?;

    let mut instruments = Vec::new();
    for child in instruments_node.children().filter(Node::is_element) {
        let instrument = match child.tag_name().name() {
            "sound" => Instrument::Sound(parse_sound(child, None, true, Some(&name))?),
            "kit" => Instrument::Kit(parse_kit(child, None, true, Some(&name))?),
            "audioTrack" => Instrument::AudioTrack(parse_audio_track(child, &name)?),
            "midiChannel" => Instrument::MidiChannel(parse_midi_channel(child)?),
            tag => {
                return Err(ParseError::UnknownInstrument {
                    tag: tag.to_string(),
                    song: name,
                })
            }
        };
        instruments.push(instrument);
    }

    Ok(Song {
        name,
        problem,
        instruments,
    })
}

/// Parses a sound preset or an embedded instance of one. Starts from the
/// device's default patch and overwrites only what the document carries.
/// `container` names the enclosing song or kit for diagnostics.
pub fn parse_sound(
    node: Node,
    fallback_name: Option<&str>,
    is_instance: bool,
    container: Option<&str>,
) -> Result<Sound, ParseError> {
    let mut sound = DEFAULT_SYNTH_PATCH.clone();

    let (name, problem) = resolve_name(node, fallback_name, "Unknown sound")?;
    sound.preset_name = name;
    sound.problem = problem;
    sound.is_instance = is_instance;

    let label = owner_label("sound", &sound.preset_name, container);
    apply_overrides(&mut sound, node).map_err(|e| e.within(&label))?;
    Ok(sound)
}

fn apply_overrides(sound: &mut Sound, node: Node) -> Result<(), ParseError> {
    if let Some(value) = attr(node, "polyphonic") {
        sound.polyphonic = value.to_string();
    }
    if let Some(value) = attr(node, "voicePriority") {
        sound.voice_priority = parse_number(value, "voicePriority", node)?;
    }
    if let Some(value) = attr(node, "mode") {
        sound.mode = value.to_string();
    }
    if let Some(value) = attr(node, "lpfMode") {
        sound.lpf_mode = value.to_string();
    }
    if let Some(value) = attr(node, "modFXType") {
        sound.mod_fx_type = value.to_string();
    }
    if let Some(value) = attr(node, "clippingAmount") {
        sound.clipping_amount = Some(parse_number(value, "clippingAmount", node)?);
    }

    if let Some(osc) = child_by_tag(node, "osc1") {
        sound.osc1 = parse_oscillator(osc)?;
    }
    if let Some(osc) = child_by_tag(node, "osc2") {
        sound.osc2 = parse_oscillator(osc)?;
    }
    if let Some(lfo) = child_by_tag(node, "lfo1") {
        sound.lfo1 = parse_lfo(lfo)?;
    }
    if let Some(lfo) = child_by_tag(node, "lfo2") {
        sound.lfo2 = parse_lfo(lfo)?;
    }
    if let Some(unison) = child_by_tag(node, "unison") {
        sound.unison = parse_unison(unison)?;
    }
    if let Some(delay) = child_by_tag(node, "delay") {
        sound.delay = parse_delay(delay)?;
    }
    if let Some(compressor) = child_by_tag(node, "compressor") {
        sound.compressor = parse_compressor(compressor)?;
    }
    if let Some(arpeggiator) = child_by_tag(node, "arpeggiator") {
        sound.arpeggiator = parse_arpeggiator(arpeggiator)?;
    }
    if let Some(knobs) = child_by_tag(node, "modKnobs") {
        sound.mod_knobs = parse_mod_knobs(knobs)?;
    }

    // The defaultParams element carries the parameter table as attributes
    // and the envelopes, equalizer, and patch cables as children.
    if let Some(params) = child_by_tag(node, "defaultParams") {
        sound.default_params = parse_all_attributes(params)?;

        if let Some(env) = child_by_tag(params, "envelope1") {
            sound.env1 = Some(parse_envelope(env)?);
        }
        if let Some(env) = child_by_tag(params, "envelope2") {
            sound.env2 = Some(parse_envelope(env)?);
        }
        if let Some(eq) = child_by_tag(params, "equalizer") {
            sound.equalizer = Some(parse_equalizer(eq)?);
        }
        if let Some(cables) = child_by_tag(params, "patchCables") {
            sound.patch_cables = Some(parse_patch_cables(cables)?);
        }
    }

    Ok(())
}

pub fn parse_kit(
    node: Node,
    fallback_name: Option<&str>,
    is_instance: bool,
    container: Option<&str>,
) -> Result<Kit, ParseError> {
    let (name, problem) = resolve_name(node, fallback_name, "Unknown kit")?;

    let context = owner_label("kit", &name, container);
    let lpf_mode = attr(node, "lpfMode")
        .ok_or_else(|| ParseError::missing("lpfMode", context.clone()))?
        .to_string();
    let mod_fx_type = attr(node, "modFXType")
        .ok_or_else(|| ParseError::missing("modFXType", context.clone()))?
        .to_string();
    let mod_fx_current_param = attr(node, "modFXCurrentParam")
        .ok_or_else(|| ParseError::missing("modFXCurrentParam", context.clone()))?
        .to_string();
    let current_filter_type = attr(node, "currentFilterType")
        .ok_or_else(|| ParseError::missing("currentFilterType", context.clone()))?
        .to_string();

    let delay = match child_by_tag(node, "delay") {
        Some(delay) => Some(parse_delay(delay).map_err(|e| e.within(&context))?),
        None => None,
    };
    let compressor = match child_by_tag(node, "compressor") {
        Some(compressor) => Some(parse_compressor(compressor).map_err(|e| e.within(&context))?),
        None => None,
    };
    let default_params = match child_by_tag(node, "defaultParams") {
        Some(params) => Some(parse_all_attributes(params)?),
        None => None,
    };

    // Every descendant sound element is an embedded instance. Duplicate
    // names overwrite, last write wins.
    let mut sound_sources = BTreeMap::new();
    for descendant in node.descendants() {
        if descendant.is_element() && descendant.tag_name().name() == "sound" {
            let sound = parse_sound(descendant, None, true, Some(&context))?;
            sound_sources.insert(sound.preset_name.clone(), sound);
        }
    }

    Ok(Kit {
        preset_name: name,
        problem,
        is_instance,
        lpf_mode,
        mod_fx_type,
        mod_fx_current_param,
        current_filter_type,
        delay,
        compressor,
        default_params,
        sound_sources,
    })
}

pub fn parse_audio_track(node: Node, song_name: &str) -> Result<AudioTrack, ParseError> {
    let context = || format!("audio track of song '{song_name}'");
    let required = |field: &'static str| -> Result<&str, ParseError> {
        attr(node, field).ok_or_else(|| ParseError::missing(field, context()))
    };

    let echoing_input = match attr(node, "echoingInput") {
        Some(value) => Some(parse_number(value, "echoingInput", node)?),
        None => None,
    };

    let delay = child_by_tag(node, "delay")
        .ok_or_else(|| ParseError::missing("delay", context()))?;
    let compressor = child_by_tag(node, "compressor")
        .ok_or_else(|| ParseError::missing("compressor", context()))?;

    Ok(AudioTrack {
        name: required("name")?.to_string(),
        echoing_input,
        input_channel: required("inputChannel")?.to_string(),
        is_armed_for_recording: parse_number(
            required("isArmedForRecording")?,
            "isArmedForRecording",
            node,
        )?,
        active_mod_function: parse_number(
            required("activeModFunction")?,
            "activeModFunction",
            node,
        )?,
        lpf_mode: required("lpfMode")?.to_string(),
        mod_fx_type: required("modFXType")?.to_string(),
        mod_fx_current_param: required("modFXCurrentParam")?.to_string(),
        current_filter_type: required("currentFilterType")?.to_string(),
        delay: parse_delay(delay)?,
        compressor: parse_compressor(compressor)?,
    })
}

pub fn parse_midi_channel(node: Node) -> Result<MidiChannel, ParseError> {
    let channel = attr(node, "channel")
        .ok_or_else(|| ParseError::missing("channel", excerpt(node)))?;

    let default_velocity = match attr(node, "defaultVelocity") {
        Some(value) => Some(parse_number(value, "defaultVelocity", node)?),
        None => None,
    };
    let is_armed_for_recording = match attr(node, "isArmedForRecording") {
        Some(value) => Some(parse_number(value, "isArmedForRecording", node)?),
        None => None,
    };
    let active_mod_function = match attr(node, "activeModFunction") {
        Some(value) => Some(parse_number(value, "activeModFunction", node)?),
        None => None,
    };

    Ok(MidiChannel {
        channel: parse_number(channel, "channel", node)?,
        suffix: attr(node, "suffix").map(str::to_string),
        default_velocity,
        is_armed_for_recording,
        active_mod_function,
    })
}

fn parse_oscillator(node: Node) -> Result<Oscillator, ParseError> {
    let mut osc = Oscillator {
        osc_type: attr(node, "type").map(str::to_string),
        file_name: attr(node, "fileName").map(str::to_string),
        ..Oscillator::default()
    };

    if let Some(value) = attr(node, "transpose") {
        osc.transpose = Some(parse_number(value, "transpose", node)?);
    }
    if let Some(value) = attr(node, "cents") {
        osc.cents = Some(parse_number(value, "cents", node)?);
    }
    if let Some(value) = attr(node, "retrigPhase") {
        osc.retrig_phase = Some(parse_number(value, "retrigPhase", node)?);
    }
    if let Some(value) = attr(node, "oscillatorSync") {
        osc.oscillator_sync = Some(parse_number(value, "oscillatorSync", node)?);
    }
    if let Some(value) = attr(node, "loopMode") {
        osc.loop_mode = Some(parse_number(value, "loopMode", node)?);
    }
    if let Some(value) = attr(node, "reversed") {
        osc.reversed = Some(parse_number(value, "reversed", node)?);
    }
    if let Some(value) = attr(node, "timeStretchAmount") {
        osc.time_stretch_amount = Some(parse_number(value, "timeStretchAmount", node)?);
    }
    if let Some(value) = attr(node, "timeStretchEnable") {
        osc.time_stretch_enable = Some(parse_number(value, "timeStretchEnable", node)?);
    }

    if child_by_tag(node, "zone").is_some() {
        osc.zone = Some(parse_zone(node)?);
    }

    if let Some(ranges) = child_by_tag(node, "sampleRanges") {
        let mut parsed = Vec::new();
        for range in ranges.children().filter(Node::is_element) {
            parsed.push(parse_sample_range(range)?);
        }
        osc.sample_ranges = Some(parsed);
    }

    Ok(osc)
}

fn parse_sample_range(node: Node) -> Result<SampleRange, ParseError> {
    let file_name = attr(node, "fileName")
        .ok_or_else(|| ParseError::missing("fileName", excerpt(node)))?
        .to_string();

    let range_top_note = match attr(node, "rangeTopNote") {
        Some(value) => Some(parse_number(value, "rangeTopNote", node)?),
        None => None,
    };
    let transpose = match attr(node, "transpose") {
        Some(value) => Some(parse_number(value, "transpose", node)?),
        None => None,
    };
    let cents = match attr(node, "cents") {
        Some(value) => Some(parse_number(value, "cents", node)?),
        None => None,
    };

    Ok(SampleRange {
        file_name,
        range_top_note,
        transpose,
        cents,
        zone: parse_zone(node)?,
    })
}

fn parse_zone(node: Node) -> Result<Zone, ParseError> {
    let zone = child_by_tag(node, "zone")
        .ok_or_else(|| ParseError::missing("zone", excerpt(node)))?;

    let start = attr(zone, "startSamplePos")
        .ok_or_else(|| ParseError::missing("startSamplePos", excerpt(zone)))?;
    let end = attr(zone, "endSamplePos")
        .ok_or_else(|| ParseError::missing("endSamplePos", excerpt(zone)))?;

    let start_loop_pos = match attr(zone, "startLoopPos") {
        Some(value) => Some(parse_position(value, "startLoopPos", zone)?),
        None => None,
    };
    let end_loop_pos = match attr(zone, "endLoopPos") {
        Some(value) => Some(parse_position(value, "endLoopPos", zone)?),
        None => None,
    };

    Ok(Zone {
        start_sample_pos: parse_position(start, "startSamplePos", zone)?,
        end_sample_pos: parse_position(end, "endSamplePos", zone)?,
        start_loop_pos,
        end_loop_pos,
    })
}

fn parse_lfo(node: Node) -> Result<Lfo, ParseError> {
    let lfo_type = attr(node, "type")
        .ok_or_else(|| ParseError::missing("type", excerpt(node)))?
        .to_string();

    let sync_level = match attr(node, "syncLevel") {
        Some(value) => Some(parse_number(value, "syncLevel", node)?),
        None => None,
    };

    Ok(Lfo {
        lfo_type,
        sync_level,
    })
}

fn parse_unison(node: Node) -> Result<Unison, ParseError> {
    let num = attr(node, "num").ok_or_else(|| ParseError::missing("num", excerpt(node)))?;
    let detune =
        attr(node, "detune").ok_or_else(|| ParseError::missing("detune", excerpt(node)))?;

    Ok(Unison {
        num: parse_number(num, "num", node)?,
        detune: parse_number(detune, "detune", node)?,
    })
}

fn parse_delay(node: Node) -> Result<Delay, ParseError> {
    let ping_pong =
        attr(node, "pingPong").ok_or_else(|| ParseError::missing("pingPong", excerpt(node)))?;
    let analog =
        attr(node, "analog").ok_or_else(|| ParseError::missing("analog", excerpt(node)))?;
    let sync_level =
        attr(node, "syncLevel").ok_or_else(|| ParseError::missing("syncLevel", excerpt(node)))?;

    Ok(Delay {
        ping_pong: Some(parse_number(ping_pong, "pingPong", node)?),
        analog: Some(parse_number(analog, "analog", node)?),
        sync_level: parse_number(sync_level, "syncLevel", node)?,
    })
}

fn parse_compressor(node: Node) -> Result<Compressor, ParseError> {
    let sync_level =
        attr(node, "syncLevel").ok_or_else(|| ParseError::missing("syncLevel", excerpt(node)))?;
    let attack =
        attr(node, "attack").ok_or_else(|| ParseError::missing("attack", excerpt(node)))?;
    let release =
        attr(node, "release").ok_or_else(|| ParseError::missing("release", excerpt(node)))?;

    Ok(Compressor {
        sync_level: parse_number(sync_level, "syncLevel", node)?,
        attack: parse_number(attack, "attack", node)?,
        release: parse_number(release, "release", node)?,
    })
}

fn parse_arpeggiator(node: Node) -> Result<Arpeggiator, ParseError> {
    let mode = attr(node, "mode").ok_or_else(|| ParseError::missing("mode", excerpt(node)))?;
    let num_octaves = attr(node, "numOctaves")
        .ok_or_else(|| ParseError::missing("numOctaves", excerpt(node)))?;
    let sync_level =
        attr(node, "syncLevel").ok_or_else(|| ParseError::missing("syncLevel", excerpt(node)))?;

    Ok(Arpeggiator {
        mode: mode.to_string(),
        num_octaves: parse_number(num_octaves, "numOctaves", node)?,
        sync_level: parse_number(sync_level, "syncLevel", node)?,
    })
}

fn parse_envelope(node: Node) -> Result<Envelope, ParseError> {
    let fixed = |field: &'static str| -> Result<FixedPoint, ParseError> {
        let value = attr(node, field).ok_or_else(|| ParseError::missing(field, excerpt(node)))?;
        FixedPoint::decode(value)
    };

    Ok(Envelope {
        attack: fixed("attack")?,
        decay: fixed("decay")?,
        sustain: fixed("sustain")?,
        release: fixed("release")?,
    })
}

// The firmware spells these attributes with a 'z'.
fn parse_equalizer(node: Node) -> Result<Equalizer, ParseError> {
    let fixed = |field: &'static str| -> Result<FixedPoint, ParseError> {
        let value = attr(node, field).ok_or_else(|| ParseError::missing(field, excerpt(node)))?;
        FixedPoint::decode(value)
    };

    Ok(Equalizer {
        bass: fixed("bass")?,
        treble: fixed("treble")?,
        bass_frequency: fixed("bassFrequenzy")?,
        treble_frequency: fixed("trebleFrequenzy")?,
    })
}

fn parse_patch_cables(node: Node) -> Result<Vec<PatchCable>, ParseError> {
    let mut cables = Vec::new();
    for cable in node.children().filter(Node::is_element) {
        let source = attr(cable, "source")
            .ok_or_else(|| ParseError::missing("source", excerpt(cable)))?;
        let destination = attr(cable, "destination")
            .ok_or_else(|| ParseError::missing("destination", excerpt(cable)))?;
        let amount = attr(cable, "amount")
            .ok_or_else(|| ParseError::missing("amount", excerpt(cable)))?;

        cables.push(PatchCable {
            source: source.to_string(),
            destination: destination.to_string(),
            amount: FixedPoint::decode(amount)?,
            range_adjustable: attr(cable, "rangeAdjustable").map(str::to_string),
        });
    }
    Ok(cables)
}

fn parse_mod_knobs(node: Node) -> Result<Vec<ModKnob>, ParseError> {
    let mut knobs = Vec::new();
    for knob in node.children().filter(Node::is_element) {
        let controls_param = attr(knob, "controlsParam")
            .ok_or_else(|| ParseError::missing("controlsParam", excerpt(knob)))?;

        knobs.push(ModKnob {
            controls_param: controls_param.to_string(),
            patch_amount_from_source: attr(knob, "patchAmountFromSource").map(str::to_string),
        });
    }
    Ok(knobs)
}

/// Every attribute of the element decoded as a fixed-point parameter.
fn parse_all_attributes(node: Node) -> Result<BTreeMap<String, FixedPoint>, ParseError> {
    node.attributes()
        .map(|a| Ok((a.name().to_string(), FixedPoint::decode(a.value())?)))
        .collect()
}
