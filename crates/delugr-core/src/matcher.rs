//! Heuristic recovery for moved or renamed samples.
//!
//! A preset pointing at a path that no longer exists usually means the
//! sample was reorganized, not deleted. Candidates keep the exact file
//! name; the most similar containing folder wins.

use crate::scan::SampleFile;

/// Finds the likeliest current location of a sample last seen at
/// `moved_path`. Candidates must share the final path segment exactly;
/// among them, folder similarity decides, ties going to the first
/// candidate in collection order. Returns `None` when nothing shares the
/// file name. A heuristic aid, not a guarantee.
pub fn find_relocated_sample<'a>(
    moved_path: &str,
    samples: &'a [SampleFile],
) -> Option<&'a SampleFile> {
    let (moved_folder, moved_name) = split_folder(moved_path);

    let mut best: Option<(&SampleFile, f64)> = None;
    for sample in samples {
        let (folder, name) = split_folder(&sample.path);
        if name != moved_name {
            continue;
        }
        let score = similarity(folder, moved_folder);
        if best.map_or(true, |(_, best_score)| score > best_score) {
            best = Some((sample, score));
        }
    }
    best.map(|(sample, _)| sample)
}

fn split_folder(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}

/// Normalized similarity over `[0, 1]`: `1 - distance / max(len)`,
/// case-insensitive. Empty strings score 0.
fn similarity(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.to_lowercase().chars().collect();
    let b: Vec<char> = b.to_lowercase().chars().collect();

    if a.is_empty() || b.is_empty() {
        return 0.0;
    }

    let distance = levenshtein(&a, &b);
    1.0 - distance as f64 / a.len().max(b.len()) as f64
}

fn levenshtein(a: &[char], b: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=b.len()).collect();
    let mut current = vec![0; b.len() + 1];

    for (i, &ca) in a.iter().enumerate() {
        current[0] = i + 1;
        for (j, &cb) in b.iter().enumerate() {
            let substitution = previous[j] + usize::from(ca != cb);
            current[j + 1] = substitution
                .min(previous[j + 1] + 1)
                .min(current[j] + 1);
        }
        std::mem::swap(&mut previous, &mut current);
    }
    previous[b.len()]
}
