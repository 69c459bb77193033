//! End-to-end scan over an in-memory SD card layout.

use delugr_core::{
    find_relocated_sample, rewrite_sample_path, scan, Dialect, InstrumentRole, MemoryTree,
};

const LEAD_SYNTH: &str = r#"<sound firmwareVersion="4.0.1" name="Lead" mode="subtractive">
  <osc1 type="sample" fileName="SAMPLES/SYNTH/Lead.wav"/>
</sound>"#;

const V1_SYNTH: &str = "<sound><lpfMode>12dB</lpfMode></sound>";

const V2_SYNTH: &str = "<firmwareVersion>2.1.0</firmwareVersion>\n\
<earliestCompatibleFirmware>2.0.0</earliestCompatibleFirmware>\n\
<sound><mode>ringmod</mode></sound>";

const DRUM_KIT: &str = r#"<kit firmwareVersion="4.0.1" name="Drums" lpfMode="24dB"
     modFXType="none" modFXCurrentParam="0" currentFilterType="lpf">
  <soundSources>
    <sound name="Kick"><osc1 type="sample" fileName="SAMPLES/DRUMS/Kick.wav"/></sound>
    <sound name="Snare"><osc1 type="sample" fileName="SAMPLES/DRUMS/Gone.wav"/></sound>
  </soundSources>
</kit>"#;

const JAM_SONG: &str = r#"<song firmwareVersion="4.0.1">
  <instruments>
    <sound name="Lead"/>
    <kit name="Drums" lpfMode="24dB" modFXType="none"
         modFXCurrentParam="0" currentFilterType="lpf"/>
    <audioTrack name="Vox" inputChannel="left" isArmedForRecording="0"
         activeModFunction="0" lpfMode="24dB" modFXType="none"
         modFXCurrentParam="0" currentFilterType="lpf">
      <delay pingPong="1" analog="0" syncLevel="7"/>
      <compressor syncLevel="6" attack="327244" release="936"/>
    </audioTrack>
    <midiChannel channel="2"/>
  </instruments>
</song>"#;

fn sd_card() -> MemoryTree {
    let mut tree = MemoryTree::new();
    tree.insert("/SONGS/Jam.xml", JAM_SONG);
    tree.insert("/SYNTHS/Lead.xml", LEAD_SYNTH);
    tree.insert("/SYNTHS/SYNT000.xml", V1_SYNTH);
    tree.insert("/SYNTHS/Old.xml", V2_SYNTH);
    tree.insert("/KITS/Drums.xml", DRUM_KIT);
    tree.insert("/SAMPLES/SYNTH/Lead.wav", "RIFFxxxx");
    tree.insert("/SAMPLES/DRUMS/Kick.wav", "RIFFyyyy");
    tree.insert("/.Trashes", "junk");
    tree.insert("/KITS/.DS_Store", "junk");
    tree.insert("/README.txt", "not an asset");
    tree
}

#[test]
fn scans_a_full_card_into_a_sorted_snapshot() {
    let snapshot = scan(&sd_card()).unwrap();

    assert_eq!(snapshot.songs.len(), 1);
    assert_eq!(snapshot.sounds.len(), 3);
    assert_eq!(snapshot.kits.len(), 1);
    assert_eq!(snapshot.samples.len(), 2);

    // Dot files are invisible; only README.txt is skipped.
    assert_eq!(snapshot.files_scanned, 8);
    assert_eq!(snapshot.skipped.len(), 1);
    assert_eq!(snapshot.skipped[0].reason, "Not a supported file type.");

    let sound_names: Vec<&str> = snapshot.sounds.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sound_names, vec!["Lead", "Old", "SYNT000"]);

    let sample_names: Vec<&str> = snapshot.samples.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(sample_names, vec!["Kick.wav", "Lead.wav"]);
}

#[test]
fn detects_every_dialect_on_the_card() {
    let snapshot = scan(&sd_card()).unwrap();

    let by_name = |name: &str| snapshot.sounds.iter().find(|s| s.name == name).unwrap();

    assert_eq!(by_name("Lead").firmware.dialect, Dialect::V4);
    assert_eq!(by_name("SYNT000").firmware.dialect, Dialect::V1);

    let old = by_name("Old");
    assert_eq!(old.firmware.dialect, Dialect::V2);
    assert_eq!(old.firmware.version, "2.1.0");
    // The stored raw text is the repaired form.
    assert!(!old.xml.contains("firmwareVersion"));
    assert_eq!(old.data.mode, "ringmod");
}

#[test]
fn sparse_legacy_sound_falls_back_to_the_default_patch() {
    let snapshot = scan(&sd_card()).unwrap();
    let synth = snapshot
        .sounds
        .iter()
        .find(|s| s.name == "SYNT000")
        .unwrap();

    assert_eq!(synth.data.lpf_mode, "12dB");
    // Untouched fields come from the built-in default patch.
    assert_eq!(synth.data.polyphonic, "poly");
    assert_eq!(synth.data.unison.detune, 8);
    assert_eq!(synth.data.default_params["volume"].decimal(), 40);
}

#[test]
fn usage_is_attributed_across_all_contexts() {
    let snapshot = scan(&sd_card()).unwrap();

    let lead = snapshot.sounds.iter().find(|s| s.name == "Lead").unwrap();
    assert!(lead.usage.songs.contains("Jam"));
    assert!(lead.usage.kits.is_empty());

    let drums = snapshot.kits.iter().find(|k| k.name == "Drums").unwrap();
    assert!(drums.usage.songs.contains("Jam"));

    let lead_wav = snapshot
        .samples
        .iter()
        .find(|s| s.name == "Lead.wav")
        .unwrap();
    assert_eq!(lead_wav.usage.sounds["Lead"].role, InstrumentRole::Synth);
    assert_eq!(lead_wav.usage.songs["Jam"].instrument_name, "Lead");
    assert_eq!(lead_wav.usage.total(), 2);

    // One physical reference in a kit in a song attributes three ways.
    let kick_wav = snapshot
        .samples
        .iter()
        .find(|s| s.name == "Kick.wav")
        .unwrap();
    assert_eq!(kick_wav.usage.sounds["Kick"].role, InstrumentRole::Synth);
    assert_eq!(kick_wav.usage.kits["Drums"].instrument_name, "Kick");
    assert_eq!(kick_wav.usage.songs["Jam"].instrument_name, "Drums");
    assert_eq!(kick_wav.usage.songs["Jam"].role, InstrumentRole::Kit);
    assert_eq!(kick_wav.usage.total(), 3);

    assert_eq!(
        snapshot.missing_samples,
        vec!["SAMPLES/DRUMS/Gone.wav".to_string()]
    );
}

#[test]
fn rescanning_yields_identical_usage() {
    let tree = sd_card();
    let first = scan(&tree).unwrap();
    let second = scan(&tree).unwrap();

    assert_eq!(first.missing_samples, second.missing_samples);
    for (a, b) in first.samples.iter().zip(&second.samples) {
        assert_eq!(a.usage, b.usage);
    }
    for (a, b) in first.sounds.iter().zip(&second.sounds) {
        assert_eq!(a.usage, b.usage);
    }
}

#[test]
fn misplaced_sample_recovers_through_the_matcher() {
    let snapshot = scan(&sd_card()).unwrap();

    let found = find_relocated_sample("/OLD FOLDER/Kick.wav", &snapshot.samples).unwrap();
    assert_eq!(found.path, "/SAMPLES/DRUMS/Kick.wav");

    assert!(find_relocated_sample("/OLD FOLDER/Clap.wav", &snapshot.samples).is_none());
}

#[test]
fn relocation_rewrite_persists_and_survives_a_rescan() {
    let tree = sd_card();
    let mut snapshot = scan(&tree).unwrap();

    let lead = snapshot
        .sounds
        .iter_mut()
        .find(|s| s.name == "Lead")
        .unwrap();
    rewrite_sample_path(
        &tree,
        lead,
        "SAMPLES/SYNTH/Lead.wav",
        "SAMPLES\\MOVED\\Lead.wav",
    )
    .unwrap();
    assert!(lead.xml.contains("SAMPLES/MOVED/Lead.wav"));

    // The rewritten reference resolves against nothing until the sample
    // actually moves, so a re-scan reports it missing.
    let rescanned = scan(&tree).unwrap();
    let lead = rescanned.sounds.iter().find(|s| s.name == "Lead").unwrap();
    assert_eq!(
        lead.data.osc1.file_name.as_deref(),
        Some("SAMPLES/MOVED/Lead.wav")
    );
    assert!(rescanned
        .missing_samples
        .contains(&"SAMPLES/MOVED/Lead.wav".to_string()));
}
