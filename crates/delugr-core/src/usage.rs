//! Cross-reference engine: who uses what.
//!
//! Runs once over the fully materialized collections. Resolution goes
//! through name-indexed maps built up front; the collections can hold
//! thousands of presets, so per-reference linear scans are out.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::model::{Instrument, Kit, Song, Sound};
use crate::scan::{AssetRecord, SampleFile};

/// How a sample reference reached a containing context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum InstrumentRole {
    Synth,
    Kit,
}

/// One attributed reference: the instrument that pulled the sample into a
/// container, and its role there.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageRef {
    pub instrument_name: String,
    pub role: InstrumentRole,
}

/// Usage record for a sound or kit preset: the songs (and, for sounds,
/// kits) that reference it by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetUsage {
    pub songs: BTreeSet<String>,
    pub kits: BTreeSet<String>,
}

impl AssetUsage {
    pub fn total(&self) -> usize {
        self.songs.len() + self.kits.len()
    }
}

/// Usage record for a sample: container-name → attributed reference, one
/// map per context kind. A single physical reference can legitimately
/// appear in all three maps at once.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SampleUsage {
    pub songs: BTreeMap<String, UsageRef>,
    pub sounds: BTreeMap<String, UsageRef>,
    pub kits: BTreeMap<String, UsageRef>,
}

impl SampleUsage {
    pub fn total(&self) -> usize {
        self.songs.len() + self.sounds.len() + self.kits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

/// The computed cross-reference result. Usage vectors run parallel to the
/// input collections, so the records they describe need no stable names.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UsageGraph {
    pub sounds: Vec<AssetUsage>,
    pub kits: Vec<AssetUsage>,
    pub samples: Vec<SampleUsage>,
    /// Referenced sample paths that resolved to nothing, deduplicated and
    /// sorted.
    pub missing_samples: Vec<String>,
}

/// Computes usage over already-parsed collections. Pure: inputs are not
/// mutated, and running it twice over the same inputs yields equal graphs.
pub fn compute_usage(
    songs: &[AssetRecord<Song>],
    sounds: &[AssetRecord<Sound>],
    kits: &[AssetRecord<Kit>],
    samples: &[SampleFile],
) -> UsageGraph {
    let mut graph = UsageGraph {
        sounds: vec![AssetUsage::default(); sounds.len()],
        kits: vec![AssetUsage::default(); kits.len()],
        samples: vec![SampleUsage::default(); samples.len()],
        missing_samples: Vec::new(),
    };

    // Duplicate names resolve to the first occurrence in collection order.
    let mut sound_index: HashMap<&str, usize> = HashMap::new();
    for (i, record) in sounds.iter().enumerate() {
        sound_index.entry(&record.data.preset_name).or_insert(i);
    }
    let mut kit_index: HashMap<&str, usize> = HashMap::new();
    for (i, record) in kits.iter().enumerate() {
        kit_index.entry(&record.data.preset_name).or_insert(i);
    }
    let mut sample_index: HashMap<String, usize> = HashMap::new();
    for (i, sample) in samples.iter().enumerate() {
        sample_index.entry(sample.path.to_lowercase()).or_insert(i);
    }

    let mut missing: BTreeSet<String> = BTreeSet::new();

    for song in songs {
        let song_name = song.name.as_str();

        for instrument in &song.data.instruments {
            match instrument {
                Instrument::Sound(sound) => {
                    let Some(&idx) = sound_index.get(sound.preset_name.as_str()) else {
                        debug!(
                            song = song_name,
                            sound = %sound.preset_name,
                            "song references a sound preset not in the library"
                        );
                        continue;
                    };
                    graph.sounds[idx].songs.insert(song_name.to_string());
                    attribute_samples(
                        &sounds[idx].data,
                        None,
                        Some(song_name),
                        &sample_index,
                        &mut graph.samples,
                        &mut missing,
                    );
                }
                Instrument::Kit(kit) => {
                    let Some(&idx) = kit_index.get(kit.preset_name.as_str()) else {
                        debug!(
                            song = song_name,
                            kit = %kit.preset_name,
                            "song references a kit preset not in the library"
                        );
                        continue;
                    };
                    graph.kits[idx].songs.insert(song_name.to_string());

                    let kit_record = &kits[idx].data;
                    for source in kit_record.sound_sources.values() {
                        // An embedded sound with the same name as a library
                        // preset is assumed to be that preset. Heuristic,
                        // not an identity.
                        if let Some(&sound_idx) = sound_index.get(source.preset_name.as_str()) {
                            debug!(
                                kit = %kit_record.preset_name,
                                sound = %source.preset_name,
                                "embedded kit sound assumed identical to the library preset"
                            );
                            graph.sounds[sound_idx]
                                .kits
                                .insert(kit_record.preset_name.clone());
                        }
                        attribute_samples(
                            source,
                            Some(&kit_record.preset_name),
                            Some(song_name),
                            &sample_index,
                            &mut graph.samples,
                            &mut missing,
                        );
                    }
                }
                Instrument::AudioTrack(track) => {
                    debug!(song = song_name, track = %track.name, "audio track usage not computed");
                }
                Instrument::MidiChannel(channel) => {
                    debug!(
                        song = song_name,
                        channel = channel.channel,
                        "midi channel usage not computed"
                    );
                }
            }
        }
    }

    graph.missing_samples = missing.into_iter().collect();
    graph
}

/// Records every sample reference a sound carries, once per surrounding
/// context. The same reference may attribute to the sound, the enclosing
/// kit, and the enclosing song at once.
fn attribute_samples(
    sound: &Sound,
    kit_name: Option<&str>,
    song_name: Option<&str>,
    sample_index: &HashMap<String, usize>,
    sample_usage: &mut [SampleUsage],
    missing: &mut BTreeSet<String>,
) {
    for file_name in sound.sample_file_names() {
        let Some(&idx) = sample_index.get(&lookup_key(file_name)) else {
            warn!(sample = file_name, "referenced sample not found");
            missing.insert(file_name.to_string());
            continue;
        };
        let usage = &mut sample_usage[idx];

        usage
            .sounds
            .entry(sound.preset_name.clone())
            .or_insert_with(|| UsageRef {
                instrument_name: sound.preset_name.clone(),
                role: InstrumentRole::Synth,
            });

        if let Some(kit) = kit_name {
            usage.kits.entry(kit.to_string()).or_insert_with(|| UsageRef {
                instrument_name: sound.preset_name.clone(),
                role: InstrumentRole::Synth,
            });
        }
        if let Some(song) = song_name {
            // Inside a kit the song-level attribution points at the kit,
            // not the individual sound.
            let reference = match kit_name {
                Some(kit) => UsageRef {
                    instrument_name: kit.to_string(),
                    role: InstrumentRole::Kit,
                },
                None => UsageRef {
                    instrument_name: sound.preset_name.clone(),
                    role: InstrumentRole::Synth,
                },
            };
            usage.songs.entry(song.to_string()).or_insert(reference);
        }
    }
}

/// Sample references are matched case-insensitively against scanned paths,
/// which always carry a leading slash.
fn lookup_key(file_name: &str) -> String {
    let lower = file_name.to_lowercase();
    if lower.starts_with('/') {
        lower
    } else {
        format!("/{lower}")
    }
}
