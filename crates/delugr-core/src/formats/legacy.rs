//! Parsers for the V1/V2 dialect family, where every value is stored as a
//! child element's text content. Songs do not exist in this family; only
//! sound and kit presets were written this way.

use roxmltree::Node;

use crate::default_patch::DEFAULT_SYNTH_PATCH;
use crate::error::ParseError;
use crate::model::{Delay, Kit, Lfo, Oscillator, SampleRange, Sound, Unison, Zone};

use super::{
    child_by_tag, child_text, excerpt, owner_label, parse_number, parse_position, resolve_name,
};

/// Parses a legacy sound preset. Starts from the device's default patch
/// and overwrites only what the document carries. `container` names the
/// enclosing kit for diagnostics.
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
    if let Some(value) = child_text(node, "polyphonic") {
        sound.polyphonic = value.to_string();
    }
    if let Some(value) = child_text(node, "voicePriority") {
        sound.voice_priority = parse_number(value, "voicePriority", node)?;
    }
    if let Some(value) = child_text(node, "mode") {
        sound.mode = value.to_string();
    }
    if let Some(value) = child_text(node, "lpfMode") {
        sound.lpf_mode = value.to_string();
    }
    if let Some(value) = child_text(node, "modFXType") {
        sound.mod_fx_type = value.to_string();
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
    if let Some(value) = child_text(node, "clippingAmount") {
        sound.clipping_amount = Some(parse_number(value, "clippingAmount", node)?);
    }

    Ok(())
}

/// Parses a legacy kit preset. Kits are fully specified on disk, so the
/// four filter/effect fields are required.
pub fn parse_kit(
    node: Node,
    fallback_name: Option<&str>,
    is_instance: bool,
    container: Option<&str>,
) -> Result<Kit, ParseError> {
    let (name, problem) = resolve_name(node, fallback_name, "Unknown kit")?;

    let context = owner_label("kit", &name, container);
    let lpf_mode = child_text(node, "lpfMode")
        .ok_or_else(|| ParseError::missing("lpfMode", context.clone()))?
        .to_string();
    let mod_fx_type = child_text(node, "modFXType")
        .ok_or_else(|| ParseError::missing("modFXType", context.clone()))?
        .to_string();
    let mod_fx_current_param = child_text(node, "modFXCurrentParam")
        .ok_or_else(|| ParseError::missing("modFXCurrentParam", context.clone()))?
        .to_string();
    let current_filter_type = child_text(node, "currentFilterType")
        .ok_or_else(|| ParseError::missing("currentFilterType", context.clone()))?
        .to_string();

    let delay = match child_by_tag(node, "delay") {
        Some(delay) => Some(parse_delay(delay).map_err(|e| e.within(&context))?),
        None => None,
    };

    // Every descendant sound element is an embedded instance. Duplicate
    // names overwrite, last write wins.
    let mut sound_sources = std::collections::BTreeMap::new();
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
        compressor: None,
        default_params: None,
        sound_sources,
    })
}

fn parse_oscillator(node: Node) -> Result<Oscillator, ParseError> {
    let mut osc = Oscillator {
        osc_type: child_text(node, "type").map(str::to_string),
        file_name: child_text(node, "fileName").map(str::to_string),
        ..Oscillator::default()
    };

    if let Some(value) = child_text(node, "transpose") {
        osc.transpose = Some(parse_number(value, "transpose", node)?);
    }
    if let Some(value) = child_text(node, "cents") {
        osc.cents = Some(parse_number(value, "cents", node)?);
    }
    if let Some(value) = child_text(node, "retrigPhase") {
        osc.retrig_phase = Some(parse_number(value, "retrigPhase", node)?);
    }
    if let Some(value) = child_text(node, "oscillatorSync") {
        osc.oscillator_sync = Some(parse_number(value, "oscillatorSync", node)?);
    }
    if let Some(value) = child_text(node, "loopMode") {
        osc.loop_mode = Some(parse_number(value, "loopMode", node)?);
    }
    if let Some(value) = child_text(node, "reversed") {
        osc.reversed = Some(parse_number(value, "reversed", node)?);
    }
    if let Some(value) = child_text(node, "timeStretchAmount") {
        osc.time_stretch_amount = Some(parse_number(value, "timeStretchAmount", node)?);
    }
    // This family spells the flag "timeStretchEnabled".
    if let Some(value) = child_text(node, "timeStretchEnabled") {
        osc.time_stretch_enable = Some(parse_number(value, "timeStretchEnabled", node)?);
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
    let file_name = child_text(node, "fileName")
        .ok_or_else(|| ParseError::missing("fileName", excerpt(node)))?
        .to_string();

    let range_top_note = match child_text(node, "rangeTopNote") {
        Some(value) => Some(parse_number(value, "rangeTopNote", node)?),
        None => None,
    };
    let transpose = match child_text(node, "transpose") {
        Some(value) => Some(parse_number(value, "transpose", node)?),
        None => None,
    };
    let cents = match child_text(node, "cents") {
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

    let start = child_text(zone, "startSamplePos")
        .ok_or_else(|| ParseError::missing("startSamplePos", excerpt(zone)))?;
    let end = child_text(zone, "endSamplePos")
        .ok_or_else(|| ParseError::missing("endSamplePos", excerpt(zone)))?;

    let start_loop_pos = match child_text(zone, "startLoopPos") {
        Some(value) => Some(parse_position(value, "startLoopPos", zone)?),
        None => None,
    };
    let end_loop_pos = match child_text(zone, "endLoopPos") {
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
    let lfo_type = child_text(node, "type")
        .ok_or_else(|| ParseError::missing("type", excerpt(node)))?
        .to_string();

    let sync_level = match child_text(node, "syncLevel") {
        Some(value) => Some(parse_number(value, "syncLevel", node)?),
        None => None,
    };

    Ok(Lfo {
        lfo_type,
        sync_level,
    })
}

fn parse_unison(node: Node) -> Result<Unison, ParseError> {
    let num = child_text(node, "num")
        .ok_or_else(|| ParseError::missing("num", excerpt(node)))?;
    let detune = child_text(node, "detune")
        .ok_or_else(|| ParseError::missing("detune", excerpt(node)))?;

    Ok(Unison {
        num: parse_number(num, "num", node)?,
        detune: parse_number(detune, "detune", node)?,
    })
}

// Only syncLevel is guaranteed in this family; pingPong and analog first
// appeared in later firmware.
fn parse_delay(node: Node) -> Result<Delay, ParseError> {
    let sync_level = child_text(node, "syncLevel")
        .ok_or_else(|| ParseError::missing("syncLevel", excerpt(node)))?;

    let ping_pong = match child_text(node, "pingPong") {
        Some(value) => Some(parse_number(value, "pingPong", node)?),
        None => None,
    };
    let analog = match child_text(node, "analog") {
        Some(value) => Some(parse_number(value, "analog", node)?),
        None => None,
    };

    Ok(Delay {
        ping_pong,
        analog,
        sync_level: parse_number(sync_level, "syncLevel", node)?,
    })
}
