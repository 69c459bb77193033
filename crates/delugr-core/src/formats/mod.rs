//! Per-dialect asset parsers and the shared dispatch entry point.
//!
//! Two parser families cover the five firmware generations: `legacy`
//! (V1/V2, values as child-element text) and `modern` (V3/V4/community,
//! attribute-based). Both decode into the same object model.

pub mod legacy;
pub mod modern;

use roxmltree::Node;

use crate::error::ParseError;
use crate::firmware::Firmware;
use crate::model::Asset;

/// The outcome of parsing one asset document.
#[derive(Debug, Clone)]
pub struct ParsedAsset {
    pub asset: Asset,
    pub firmware: Firmware,
    /// The raw document text after dialect repair. Kept for debugging and
    /// for the sample-relocation rewrite path.
    pub xml: String,
}

/// Parses any asset document: detects the firmware dialect, repairs
/// version-2 text, and dispatches the root element to the matching parser
/// family. `fallback_name` is the file stem, used when the document itself
/// carries no name.
pub fn parse_asset(text: &str, fallback_name: Option<&str>) -> Result<ParsedAsset, ParseError> {
    let (firmware, repaired) = Firmware::detect(text)?;
    let doc = roxmltree::Document::parse(&repaired)?;
    let root = doc.root_element();

    let asset = match root.tag_name().name() {
        "song" => {
            if firmware.is_legacy() {
                return Err(ParseError::UnsupportedFirmware {
                    version: firmware.version.clone(),
                    kind: "song",
                });
            }
            Asset::Song(modern::parse_song(root, fallback_name)?)
        }
        "sound" => {
            if firmware.is_legacy() {
                Asset::Sound(legacy::parse_sound(root, fallback_name, false, None)?)
            } else {
                Asset::Sound(modern::parse_sound(root, fallback_name, false, None)?)
            }
        }
        "kit" => {
            if firmware.is_legacy() {
                Asset::Kit(legacy::parse_kit(root, fallback_name, false, None)?)
            } else {
                Asset::Kit(modern::parse_kit(root, fallback_name, false, None)?)
            }
        }
        other => {
            return Err(ParseError::UnknownRoot {
                root: other.to_string(),
            })
        }
    };

    Ok(ParsedAsset {
        asset,
        firmware,
        xml: repaired.into_owned(),
    })
}

/// A file name with its final extension stripped, applied uniformly
/// wherever a display name or URL slug derives from a file name.
pub fn file_stem(file_name: &str) -> &str {
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(i) => &file_name[..i],
    }
}

// Shared element helpers ----------------------------------------------------

/// First direct child element with the given tag name.
pub(crate) fn child_by_tag<'a, 'input>(
    node: Node<'a, 'input>,
    tag: &str,
) -> Option<Node<'a, 'input>> {
    node.children()
        .find(|c| c.is_element() && c.tag_name().name() == tag)
}

/// Non-empty text content of a direct child element.
pub(crate) fn child_text<'a>(node: Node<'a, '_>, tag: &str) -> Option<&'a str> {
    child_by_tag(node, tag)
        .and_then(|c| c.text())
        .filter(|t| !t.is_empty())
}

/// Non-empty attribute value.
pub(crate) fn attr<'a>(node: Node<'a, '_>, name: &str) -> Option<&'a str> {
    node.attribute(name).filter(|v| !v.is_empty())
}

/// The element's serialized form from the source text, truncated. Used in
/// structural error messages.
pub(crate) fn excerpt(node: Node) -> String {
    let text = &node.document().input_text()[node.range()];
    let mut out: String = text.chars().take(80).collect();
    if text.chars().nth(80).is_some() {
        out.push_str("...");
    }
    out
}

pub(crate) fn parse_number(
    value: &str,
    field: &'static str,
    node: Node,
) -> Result<i64, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
        context: excerpt(node),
    })
}

pub(crate) fn parse_position(
    value: &str,
    field: &'static str,
    node: Node,
) -> Result<u64, ParseError> {
    value.trim().parse().map_err(|_| ParseError::InvalidNumber {
        field,
        value: value.to_string(),
        context: excerpt(node),
    })
}

/// Resolves an instrument's display name from document content, applying
/// every dialect's convention at once (later rules override when present):
/// `presetName` attribute, then a `name` child element's text, then a
/// `name` attribute, then a legacy slot number mapped to a fixed-width
/// `SYNT`/`KIT` label with an optional sub-slot suffix.
pub(crate) fn instrument_name(node: Node) -> Result<Option<String>, ParseError> {
    let mut name = node.attribute("presetName").map(str::to_string);

    // Sounds inside kits carry a name element in V1/V2 files.
    if let Some(child) = child_by_tag(node, "name") {
        name = Some(child.text().unwrap_or_default().to_string());
    }

    // ...and a name attribute in V3/V4 files.
    if let Some(value) = node.attribute("name") {
        name = Some(value.to_string());
    }

    if let Some(slot_value) = node.attribute("presetSlot") {
        let prefix = if node.tag_name().name() == "sound" {
            "SYNT"
        } else {
            "KIT"
        };
        let slot = parse_number(slot_value, "presetSlot", node)?;
        let mut label = if slot < 10 {
            format!("{prefix}00{slot}")
        } else if slot < 99 {
            format!("{prefix}0{slot}")
        } else {
            format!("{prefix}{slot}")
        };

        if let Some(sub_value) = node.attribute("presetSubSlot") {
            let sub = parse_number(sub_value, "presetSubSlot", node)?;
            if sub >= 0 {
                label.push_str(&format!(" {sub}"));
            }
        }
        name = Some(label);
    }

    Ok(name.filter(|n| !n.is_empty()))
}

/// Diagnostic label for an instrument, naming its enclosing song or kit
/// when it is embedded rather than stored as its own file.
pub(crate) fn owner_label(kind: &str, name: &str, container: Option<&str>) -> String {
    match container {
        Some(c) => format!("{kind} '{name}' of {c}"),
        None => format!("{kind} '{name}'"),
    }
}

/// Name resolution with fallback: document content first, then the file
/// stem, then a sentinel with the problem flag raised.
pub(crate) fn resolve_name(
    node: Node,
    fallback: Option<&str>,
    sentinel: &str,
) -> Result<(String, bool), ParseError> {
    match instrument_name(node)? {
        Some(name) => Ok((name, false)),
        None => match fallback {
            Some(stem) => Ok((stem.to_string(), false)),
            None => Ok((sentinel.to_string(), true)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Asset;

    #[test]
    fn test_file_stem_strips_only_the_final_extension() {
        assert_eq!(file_stem("KIT001.xml"), "KIT001");
        assert_eq!(file_stem("My.Song.xml"), "My.Song");
        assert_eq!(file_stem("noext"), "noext");
        assert_eq!(file_stem(".hidden"), ".hidden");
    }

    fn name_of(xml: &str) -> Option<String> {
        let doc = roxmltree::Document::parse(xml).unwrap();
        instrument_name(doc.root_element()).unwrap()
    }

    #[test]
    fn test_slot_names_use_fixed_width_labels() {
        assert_eq!(name_of(r#"<sound presetSlot="5"/>"#).unwrap(), "SYNT005");
        assert_eq!(name_of(r#"<sound presetSlot="42"/>"#).unwrap(), "SYNT042");
        assert_eq!(name_of(r#"<sound presetSlot="105"/>"#).unwrap(), "SYNT105");
        assert_eq!(name_of(r#"<kit presetSlot="7"/>"#).unwrap(), "KIT007");
    }

    #[test]
    fn test_sub_slot_appends_a_suffix() {
        assert_eq!(
            name_of(r#"<sound presetSlot="5" presetSubSlot="2"/>"#).unwrap(),
            "SYNT005 2"
        );
        assert_eq!(
            name_of(r#"<sound presetSlot="5" presetSubSlot="-1"/>"#).unwrap(),
            "SYNT005"
        );
    }

    #[test]
    fn test_slot_overrides_preset_name() {
        assert_eq!(
            name_of(r#"<sound presetName="Lead" presetSlot="3"/>"#).unwrap(),
            "SYNT003"
        );
    }

    #[test]
    fn test_name_attribute_overrides_name_element() {
        let xml = r#"<sound name="Attr"><name>Element</name></sound>"#;
        assert_eq!(name_of(xml).unwrap(), "Attr");
    }

    #[test]
    fn test_unnamed_instrument_resolves_to_none() {
        assert_eq!(name_of("<sound/>"), None);
        assert_eq!(name_of("<sound><name></name></sound>"), None);
    }

    #[test]
    fn test_parse_asset_rejects_unknown_roots() {
        let err = parse_asset("<settings/>", None).unwrap_err();
        assert!(matches!(err, ParseError::UnknownRoot { root } if root == "settings"));
    }

    #[test]
    fn test_parse_asset_rejects_legacy_songs() {
        let err = parse_asset("<song><instruments/></song>", Some("Old Song")).unwrap_err();
        assert!(matches!(
            err,
            ParseError::UnsupportedFirmware { kind: "song", .. }
        ));
    }

    #[test]
    fn test_parse_asset_dispatches_on_root_and_dialect() {
        let sound = parse_asset("<sound/>", Some("Init")).unwrap();
        assert!(matches!(sound.asset, Asset::Sound(_)));
        assert_eq!(sound.firmware.version, "1");

        let sound = parse_asset(r#"<sound firmwareVersion="4.1.4"/>"#, Some("Init")).unwrap();
        assert!(matches!(sound.asset, Asset::Sound(_)));
        assert_eq!(sound.firmware.version, "4.1.4");
    }
}
