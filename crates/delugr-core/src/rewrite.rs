//! Sample-relocation write-back.
//!
//! The only mutating operation in the crate. When a referenced sample has
//! moved, the referencing asset's raw text gets a literal path
//! substitution and is written back through the tree.

use std::io;

use tracing::info;

use crate::scan::AssetRecord;
use crate::tree::FileTree;

/// Replaces every occurrence of `old_path` in the record's raw text with
/// the normalized `new_path` (backslashes become forward slashes),
/// persists the result, and updates the in-memory text. The record's
/// parsed `data` is NOT re-derived; a re-scan reconciles the structured
/// model with the rewritten file.
pub fn rewrite_sample_path<T, D>(
    tree: &T,
    record: &mut AssetRecord<D>,
    old_path: &str,
    new_path: &str,
) -> io::Result<()>
where
    T: FileTree,
{
    let normalized = new_path.replace('\\', "/");
    let updated = record.xml.replace(old_path, &normalized);

    tree.write_text(&record.path, &updated)?;
    record.xml = updated;

    info!(
        asset = %record.name,
        from = old_path,
        to = %normalized,
        "rewrote sample path"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::firmware::{Dialect, Firmware};
    use crate::tree::MemoryTree;
    use crate::usage::AssetUsage;

    fn record_for(path: &str, xml: &str) -> AssetRecord<()> {
        AssetRecord {
            name: "Lead".to_string(),
            path: path.to_string(),
            firmware: Firmware {
                dialect: Dialect::V4,
                version: "4.0.1".to_string(),
            },
            last_modified_ms: 0,
            url: "/synths/Lead".to_string(),
            xml: xml.to_string(),
            data: (),
            usage: AssetUsage::default(),
        }
    }

    #[test]
    fn test_rewrite_substitutes_globally_and_persists() {
        let xml = r#"<sound name="Lead">
            <osc1 fileName="SAMPLES/OLD/LEAD.WAV"/>
            <osc2 fileName="SAMPLES/OLD/LEAD.WAV"/>
        </sound>"#;
        let mut tree = MemoryTree::new();
        tree.insert("/SYNTHS/Lead.xml", xml);
        let mut record = record_for("/SYNTHS/Lead.xml", xml);

        rewrite_sample_path(
            &tree,
            &mut record,
            "SAMPLES/OLD/LEAD.WAV",
            "SAMPLES\\NEW\\LEAD.WAV",
        )
        .unwrap();

        let written = tree.contents("/SYNTHS/Lead.xml").unwrap();
        assert_eq!(written.matches("SAMPLES/NEW/LEAD.WAV").count(), 2);
        assert!(!written.contains("OLD"));
        assert_eq!(record.xml, written);
    }

    #[test]
    fn test_rewrite_fails_when_the_file_is_gone() {
        let tree = MemoryTree::new();
        let mut record = record_for("/SYNTHS/Gone.xml", "<sound/>");

        assert!(rewrite_sample_path(&tree, &mut record, "a", "b").is_err());
    }
}
