//! Core engine for scanning a Synthstrom Deluge SD card: parses song,
//! synth, and kit XML across every firmware generation, indexes the
//! discovered samples, and cross-references who uses what.

pub mod default_patch;
pub mod error;
pub mod firmware;
pub mod fixed;
pub mod formats;
pub mod matcher;
pub mod model;
pub mod rewrite;
pub mod scan;
pub mod tree;
pub mod usage;

pub use error::{ParseError, ScanError};
pub use firmware::{Dialect, Firmware};
pub use fixed::FixedPoint;
pub use formats::{parse_asset, ParsedAsset};
pub use matcher::find_relocated_sample;
pub use model::{Asset, Instrument, Kit, Song, Sound};
pub use rewrite::rewrite_sample_path;
pub use scan::{
    scan, scan_with_progress, AssetRecord, NoProgress, ProgressSink, SampleFile, SkippedFile,
    Snapshot,
};
pub use tree::{DiskTree, EntryKind, FileStat, FileTree, MemoryTree, TreeEntry};
pub use usage::{compute_usage, AssetUsage, InstrumentRole, SampleUsage, UsageGraph, UsageRef};
