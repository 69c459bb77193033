//! Folder scanning: walk a file tree, parse every asset, compute usage,
//! and hand back a sealed snapshot.

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{ParseError, ScanError};
use crate::firmware::Firmware;
use crate::formats::{self, file_stem};
use crate::model::{Asset, Kit, Song, Sound};
use crate::tree::{EntryKind, FileTree};
use crate::usage::{compute_usage, AssetUsage, SampleUsage};

/// One successfully parsed asset file.
#[derive(Debug, Clone, Serialize)]
pub struct AssetRecord<T> {
    /// Display name (file stem or the name the document declares).
    pub name: String,
    /// Slash-joined path relative to the scanned root, leading slash.
    pub path: String,
    pub firmware: Firmware,
    pub last_modified_ms: u64,
    /// Details-page slug, e.g. `/synths/Lead`.
    pub url: String,
    /// Raw (repaired) document text. Redundant next to `data`, but
    /// invaluable for debugging and required by the relocation rewrite.
    pub xml: String,
    pub data: T,
    pub usage: AssetUsage,
}

/// One discovered audio file.
#[derive(Debug, Clone, Serialize)]
pub struct SampleFile {
    /// Scan-order id, not stable across re-scans.
    pub id: u64,
    pub name: String,
    pub path: String,
    pub size: u64,
    pub last_modified_ms: u64,
    pub url: String,
    pub usage: SampleUsage,
}

/// A file the scanner saw but could not use, and why.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub name: String,
    pub path: String,
    pub reason: String,
}

/// The sealed result of one scan. Consumers treat it as immutable until
/// the next full re-scan replaces it wholesale.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Snapshot {
    pub songs: Vec<AssetRecord<Song>>,
    pub sounds: Vec<AssetRecord<Sound>>,
    pub kits: Vec<AssetRecord<Kit>>,
    pub samples: Vec<SampleFile>,
    pub skipped: Vec<SkippedFile>,
    pub missing_samples: Vec<String>,
    pub files_scanned: u64,
}

/// Coarse progress reporting for an observing caller.
pub trait ProgressSink {
    fn phase(&mut self, message: &str) {
        let _ = message;
    }
    fn files_scanned(&mut self, count: u64) {
        let _ = count;
    }
}

/// Discards all progress.
pub struct NoProgress;

impl ProgressSink for NoProgress {}

/// Scans a file tree without progress reporting.
pub fn scan<T: FileTree>(tree: &T) -> Result<Snapshot, ScanError> {
    scan_with_progress(tree, &mut NoProgress)
}

/// Scans a file tree: depth-first walk, per-file parsing with a
/// catch-and-skip boundary, then usage computation over the complete
/// collections, then name sorting. Usage must not run before the walk
/// finishes, because cross-references need every target collection fully
/// populated.
pub fn scan_with_progress<T: FileTree>(
    tree: &T,
    progress: &mut dyn ProgressSink,
) -> Result<Snapshot, ScanError> {
    if !tree.verify_permission() {
        return Err(ScanError::PermissionDenied);
    }

    progress.phase("Parsing the folder contents...");
    let mut acc = Accumulator::default();
    walk(tree, "", &mut acc, progress)?;
    info!(
        files = acc.files_scanned,
        songs = acc.songs.len(),
        sounds = acc.sounds.len(),
        kits = acc.kits.len(),
        samples = acc.samples.len(),
        skipped = acc.skipped.len(),
        "walk complete"
    );

    progress.phase("Computing usage stats...");
    let graph = compute_usage(&acc.songs, &acc.sounds, &acc.kits, &acc.samples);
    for (record, usage) in acc.sounds.iter_mut().zip(graph.sounds) {
        record.usage = usage;
    }
    for (record, usage) in acc.kits.iter_mut().zip(graph.kits) {
        record.usage = usage;
    }
    for (sample, usage) in acc.samples.iter_mut().zip(graph.samples) {
        sample.usage = usage;
    }

    let mut snapshot = Snapshot {
        songs: acc.songs,
        sounds: acc.sounds,
        kits: acc.kits,
        samples: acc.samples,
        skipped: acc.skipped,
        missing_samples: graph.missing_samples,
        files_scanned: acc.files_scanned,
    };
    snapshot.songs.sort_by(|a, b| a.name.cmp(&b.name));
    snapshot.sounds.sort_by(|a, b| a.name.cmp(&b.name));
    snapshot.kits.sort_by(|a, b| a.name.cmp(&b.name));
    snapshot.samples.sort_by(|a, b| a.name.cmp(&b.name));

    progress.phase("Done!");
    Ok(snapshot)
}

#[derive(Default)]
struct Accumulator {
    songs: Vec<AssetRecord<Song>>,
    sounds: Vec<AssetRecord<Sound>>,
    kits: Vec<AssetRecord<Kit>>,
    samples: Vec<SampleFile>,
    skipped: Vec<SkippedFile>,
    next_sample_id: u64,
    files_scanned: u64,
}

fn walk<T: FileTree>(
    tree: &T,
    path: &str,
    acc: &mut Accumulator,
    progress: &mut dyn ProgressSink,
) -> Result<(), ScanError> {
    let entries = tree
        .list(if path.is_empty() { "/" } else { path })
        .map_err(|source| ScanError::Folder {
            path: if path.is_empty() { "/".to_string() } else { path.to_string() },
            source,
        })?;

    for entry in entries {
        // Dot files and folders are invisible to the scan.
        if entry.name.starts_with('.') {
            continue;
        }
        let full_path = format!("{path}/{}", entry.name);

        match entry.kind {
            EntryKind::Folder => walk(tree, &full_path, acc, progress)?,
            EntryKind::File => {
                classify_file(tree, &entry.name, &full_path, acc);
                acc.files_scanned += 1;
                progress.files_scanned(acc.files_scanned);
            }
        }
    }
    Ok(())
}

fn classify_file<T: FileTree>(tree: &T, name: &str, path: &str, acc: &mut Accumulator) {
    let lower = name.to_lowercase();

    if lower.ends_with(".xml") {
        // Any per-file failure becomes a skip entry; the scan keeps going.
        if let Err(err) = parse_asset_file(tree, name, path, acc) {
            debug!(path, error = %err, "skipping unparseable file");
            acc.skipped.push(SkippedFile {
                name: name.to_string(),
                path: path.to_string(),
                reason: err.to_string(),
            });
        }
    } else if lower.ends_with(".wav") || lower.ends_with(".aiff") {
        match tree.stat(path) {
            Ok(stat) => {
                acc.samples.push(SampleFile {
                    id: acc.next_sample_id,
                    name: name.to_string(),
                    path: path.to_string(),
                    size: stat.size,
                    last_modified_ms: stat.modified_ms,
                    url: format!("/samples/{}", acc.next_sample_id),
                    usage: SampleUsage::default(),
                });
                acc.next_sample_id += 1;
            }
            Err(err) => acc.skipped.push(SkippedFile {
                name: name.to_string(),
                path: path.to_string(),
                reason: err.to_string(),
            }),
        }
    } else {
        acc.skipped.push(SkippedFile {
            name: name.to_string(),
            path: path.to_string(),
            reason: "Not a supported file type.".to_string(),
        });
    }
}

fn parse_asset_file<T: FileTree>(
    tree: &T,
    name: &str,
    path: &str,
    acc: &mut Accumulator,
) -> Result<(), ParseError> {
    let text = tree.read_text(path)?;
    let modified = tree.stat(path).map(|s| s.modified_ms).unwrap_or(0);
    let stem = file_stem(name);
    let parsed = formats::parse_asset(&text, Some(stem))?;

    match parsed.asset {
        Asset::Song(song) => acc.songs.push(AssetRecord {
            name: song.name.clone(),
            path: path.to_string(),
            firmware: parsed.firmware,
            last_modified_ms: modified,
            url: format!("/songs/{stem}"),
            xml: parsed.xml,
            data: song,
            usage: AssetUsage::default(),
        }),
        Asset::Sound(sound) => acc.sounds.push(AssetRecord {
            name: sound.preset_name.clone(),
            path: path.to_string(),
            firmware: parsed.firmware,
            last_modified_ms: modified,
            url: format!("/synths/{stem}"),
            xml: parsed.xml,
            data: sound,
            usage: AssetUsage::default(),
        }),
        Asset::Kit(kit) => acc.kits.push(AssetRecord {
            name: kit.preset_name.clone(),
            path: path.to_string(),
            firmware: parsed.firmware,
            last_modified_ms: modified,
            url: format!("/kits/{stem}"),
            xml: parsed.xml,
            data: kit,
            usage: AssetUsage::default(),
        }),
    }
    Ok(())
}
