//! Firmware dialect detection over raw document text.
//!
//! Five generations of firmware write the same assets in incompatible
//! shapes. The earliest files carry no version marker at all; version-2
//! files declare it as a child element and are not even well-formed XML
//! (the version and compatibility elements sit next to the real root), so
//! detection also repairs the text before structural parsing.

use std::borrow::Cow;

use serde::Serialize;

use crate::error::ParseError;

const VERSION_OPEN: &str = "<firmwareVersion>";
const VERSION_CLOSE: &str = "</firmwareVersion>";
const COMPAT_CLOSE: &str = "</earliestCompatibleFirmware>";
const VERSION_ATTR: &str = "firmwareVersion=\"";

/// The firmware generations this crate understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dialect {
    /// Earliest firmware. No version marker, every value is a child
    /// element's text content.
    V1,
    /// Declares the version as a child element and produces two sibling
    /// root elements; element-based values like V1.
    V2,
    /// Attribute-based values, version declared as a root attribute.
    V3,
    V4,
    /// The community fork. Attribute-based like V3/V4, version prefixed
    /// with `c`.
    Community,
}

/// Detected firmware generation plus the exact declared version string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Firmware {
    pub dialect: Dialect,
    pub version: String,
}

impl Firmware {
    /// Classifies raw document text and, for version-2 files, excises the
    /// stray version/compatibility elements so the remainder is
    /// well-formed. Returns the firmware tag and the (possibly repaired)
    /// text. Errs only when the text matches no known dialect shape, or a
    /// version-2 block cannot be repaired.
    pub fn detect(text: &str) -> Result<(Firmware, Cow<'_, str>), ParseError> {
        if !text.contains("firmwareVersion") {
            let fw = Firmware {
                dialect: Dialect::V1,
                version: "1".to_string(),
            };
            return Ok((fw, Cow::Borrowed(text)));
        }

        if let Some(open) = text.find(VERSION_OPEN) {
            let value_start = open + VERSION_OPEN.len();
            let close = text[value_start..]
                .find(VERSION_CLOSE)
                .map(|i| value_start + i)
                .ok_or(ParseError::MalformedVersionBlock)?;
            let version = text[value_start..close].to_string();

            let compat_end = text
                .find(COMPAT_CLOSE)
                .map(|i| i + COMPAT_CLOSE.len())
                .ok_or(ParseError::MalformedVersionBlock)?;
            if compat_end < open {
                return Err(ParseError::MalformedVersionBlock);
            }

            let repaired = format!("{}{}", &text[..open], &text[compat_end..]);
            let fw = Firmware {
                dialect: Dialect::V2,
                version,
            };
            return Ok((fw, Cow::Owned(repaired)));
        }

        if let Some(at) = text.find(VERSION_ATTR) {
            let value_start = at + VERSION_ATTR.len();
            let value_end = text[value_start..]
                .find('"')
                .map(|i| value_start + i)
                .ok_or(ParseError::UnknownDialect)?;
            let version = text[value_start..value_end].to_string();

            let dialect = match version.as_bytes().first() {
                Some(b'c') | Some(b'C') => Dialect::Community,
                Some(b'3') => Dialect::V3,
                Some(b'4') => Dialect::V4,
                _ => return Err(ParseError::UnsupportedVersion { version }),
            };
            let fw = Firmware { dialect, version };
            return Ok((fw, Cow::Borrowed(text)));
        }

        Err(ParseError::UnknownDialect)
    }

    /// Whether this generation stores values as child-element text
    /// (legacy) rather than attributes.
    pub fn is_legacy(&self) -> bool {
        matches!(self.dialect, Dialect::V1 | Dialect::V2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_marker_is_dialect_one() {
        let (fw, repaired) = Firmware::detect("<sound><mode>ringmod</mode></sound>").unwrap();
        assert_eq!(fw.dialect, Dialect::V1);
        assert_eq!(fw.version, "1");
        assert!(matches!(repaired, Cow::Borrowed(_)));
    }

    #[test]
    fn test_version_element_is_repaired() {
        let text = "<firmwareVersion>2.1.0</firmwareVersion>\n\
                    <earliestCompatibleFirmware>2.0.0</earliestCompatibleFirmware>\n\
                    <sound><mode>subtractive</mode></sound>";
        let (fw, repaired) = Firmware::detect(text).unwrap();
        assert_eq!(fw.dialect, Dialect::V2);
        assert_eq!(fw.version, "2.1.0");
        assert!(roxmltree::Document::parse(&repaired).is_ok());
        assert!(!repaired.contains("firmwareVersion"));
    }

    #[test]
    fn test_version_element_without_compat_close_is_an_error() {
        let text = "<firmwareVersion>2.1.0</firmwareVersion><sound/>";
        assert!(matches!(
            Firmware::detect(text),
            Err(ParseError::MalformedVersionBlock)
        ));
    }

    #[test]
    fn test_version_attribute_dialects() {
        let (fw, _) = Firmware::detect(r#"<sound firmwareVersion="3.1.5"/>"#).unwrap();
        assert_eq!(fw.dialect, Dialect::V3);
        assert_eq!(fw.version, "3.1.5");

        let (fw, _) = Firmware::detect(r#"<kit firmwareVersion="4.0.1"/>"#).unwrap();
        assert_eq!(fw.dialect, Dialect::V4);

        let (fw, _) = Firmware::detect(r#"<song firmwareVersion="c1.0.1"/>"#).unwrap();
        assert_eq!(fw.dialect, Dialect::Community);
        assert_eq!(fw.version, "c1.0.1");
    }

    #[test]
    fn test_unrecognized_attribute_version_is_rejected() {
        assert!(matches!(
            Firmware::detect(r#"<sound firmwareVersion="9.0.0"/>"#),
            Err(ParseError::UnsupportedVersion { .. })
        ));
    }

    #[test]
    fn test_marker_with_no_recognizable_shape_is_rejected() {
        // Mentions the marker but in neither element nor attribute form.
        let text = "<sound note='firmwareVersion unknown'/>";
        assert!(matches!(
            Firmware::detect(text),
            Err(ParseError::UnknownDialect)
        ));
    }
}
