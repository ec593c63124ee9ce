//! Concept code generation
//!
//! Derives the stable identifier of a definition node from its ancestor OID
//! chain. Identical inputs always produce the identical code, which is what
//! joins observation facts to their concepts and makes re-exports
//! reproducible.

use crate::domain::ids::{ConceptCode, CONCEPT_CODE_MAX_LEN};
use md5::{Digest, Md5};
use std::borrow::Cow;

/// Scope tag every concept code starts with
pub const SCOPE_TAG: &str = "STUDY|";

/// Hex characters of the MD5 digest
const DIGEST_HEX_LEN: usize = 32;

const SEPARATOR: u8 = b'|';

/// Widest study segment that keeps a code within the warehouse column
pub const STUDY_SEGMENT_MAX_LEN: usize =
    CONCEPT_CODE_MAX_LEN - SCOPE_TAG.len() - 1 - DIGEST_HEX_LEN;

/// Leading characters of a long study OID kept readable in its segment
const STUDY_SEGMENT_HEAD_LEN: usize = 4;

/// OID chain of an item-level concept
#[derive(Debug, Clone, Copy)]
pub struct ItemPath<'a> {
    pub source_system: &'a str,
    pub study_oid: &'a str,
    pub study_event_oid: &'a str,
    pub form_oid: &'a str,
    pub item_oid: &'a str,
}

/// Generates the concept code for an item, or for one coded value of it
///
/// The code is `STUDY|{study segment}|` followed by the hex rendering of the
/// MD5 digest over `sourceSystem|eventOID|formOID|itemOID[|codedValue]`.
/// The coded value only enters the digest when present, so a code list
/// item never shares its parent item's code. The code never exceeds
/// [`CONCEPT_CODE_MAX_LEN`]; see [`study_segment`].
///
/// # Examples
///
/// ```
/// use odm_i2b2::core::concept_code::{generate_concept_code, ItemPath};
///
/// let path = ItemPath {
///     source_system: "OC",
///     study_oid: "S1",
///     study_event_oid: "SE1",
///     form_oid: "F1",
///     item_oid: "I1",
/// };
/// let item = generate_concept_code(&path, None);
/// let coded = generate_concept_code(&path, Some("M"));
///
/// assert!(item.as_str().starts_with("STUDY|S1|"));
/// assert_ne!(item, coded);
/// ```
pub fn generate_concept_code(path: &ItemPath<'_>, coded_value: Option<&str>) -> ConceptCode {
    let mut hasher = Md5::new();
    hasher.update(path.source_system.as_bytes());
    hasher.update([SEPARATOR]);
    hasher.update(path.study_event_oid.as_bytes());
    hasher.update([SEPARATOR]);
    hasher.update(path.form_oid.as_bytes());
    hasher.update([SEPARATOR]);
    hasher.update(path.item_oid.as_bytes());

    if let Some(value) = coded_value {
        hasher.update([SEPARATOR]);
        hasher.update(value.as_bytes());
    }

    let code = format!(
        "{}{}",
        study_code_prefix(path.study_oid),
        hex::encode(hasher.finalize())
    );

    tracing::trace!(
        concept_code = %code,
        study_oid = path.study_oid,
        study_event_oid = path.study_event_oid,
        form_oid = path.form_oid,
        item_oid = path.item_oid,
        coded_value = ?coded_value,
        "Generated concept code"
    );

    ConceptCode::from_generated(code)
}

/// Prefix shared by every concept code of a study
pub fn study_code_prefix(study_oid: &str) -> String {
    format!("{SCOPE_TAG}{}|", study_segment(study_oid))
}

/// Study part of a concept code
///
/// An OID of at most [`STUDY_SEGMENT_MAX_LEN`] bytes is used as is. A longer
/// one keeps its first characters and fills the rest of the segment with
/// hex of the MD5 digest of the full OID, so studies sharing a long common
/// prefix still get distinct segments.
pub fn study_segment(study_oid: &str) -> Cow<'_, str> {
    if study_oid.len() <= STUDY_SEGMENT_MAX_LEN {
        return Cow::Borrowed(study_oid);
    }

    let mut head_end = 0;
    for (index, ch) in study_oid.char_indices() {
        if index + ch.len_utf8() > STUDY_SEGMENT_HEAD_LEN {
            break;
        }
        head_end = index + ch.len_utf8();
    }
    let head = &study_oid[..head_end];

    let digest = hex::encode(Md5::digest(study_oid.as_bytes()));
    let fill = STUDY_SEGMENT_MAX_LEN - head.len() - 1;
    Cow::Owned(format!("{head}~{}", &digest[..fill]))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path<'a>(item_oid: &'a str) -> ItemPath<'a> {
        ItemPath {
            source_system: "OpenClinica",
            study_oid: "S_DEMO",
            study_event_oid: "SE_BASELINE",
            form_oid: "F_DEMOG",
            item_oid,
        }
    }

    #[test]
    fn test_code_is_deterministic() {
        let first = generate_concept_code(&path("I_AGE"), None);
        let second = generate_concept_code(&path("I_AGE"), None);
        assert_eq!(first, second);
    }

    #[test]
    fn test_code_layout() {
        let code = generate_concept_code(&path("I_AGE"), None);
        let hash = code.as_str().strip_prefix("STUDY|S_DEMO|").unwrap();
        assert_eq!(hash.len(), 32);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(code.fits_column());
    }

    #[test]
    fn test_coded_value_never_matches_parent() {
        let item = generate_concept_code(&path("I_SEX"), None);
        let male = generate_concept_code(&path("I_SEX"), Some("M"));
        let female = generate_concept_code(&path("I_SEX"), Some("F"));
        assert_ne!(item, male);
        assert_ne!(item, female);
        assert_ne!(male, female);
    }

    #[test]
    fn test_empty_coded_value_differs_from_none() {
        let item = generate_concept_code(&path("I_SEX"), None);
        let empty = generate_concept_code(&path("I_SEX"), Some(""));
        assert_ne!(item, empty);
    }

    #[test]
    fn test_source_system_changes_code() {
        let a = generate_concept_code(&path("I_AGE"), None);
        let b = generate_concept_code(
            &ItemPath {
                source_system: "Other",
                ..path("I_AGE")
            },
            None,
        );
        assert_ne!(a, b);
    }

    #[test]
    fn test_long_study_oid_fits_column() {
        let code = generate_concept_code(
            &ItemPath {
                study_oid: "S_DEFAULTSTUDY",
                ..path("I_AGE")
            },
            None,
        );
        assert!(code.fits_column(), "{} is too long", code.as_str());
        assert_eq!(code.as_str().len(), CONCEPT_CODE_MAX_LEN);
        assert!(code.as_str().starts_with("STUDY|S_DE~"));
        assert!(code.as_str().starts_with(&study_code_prefix("S_DEFAULTSTUDY")));
    }

    #[test]
    fn test_long_study_oids_with_shared_prefix_differ() {
        assert_ne!(
            study_segment("S_DEFAULTSTUDY_A"),
            study_segment("S_DEFAULTSTUDY_B")
        );
    }

    #[test]
    fn test_short_study_oid_is_kept() {
        assert_eq!(study_segment("S_DEMO"), "S_DEMO");
        assert_eq!(study_segment("ELEVENCHARS"), "ELEVENCHARS");
    }

    #[test]
    fn test_multibyte_study_oid_segment_width() {
        let segment = study_segment("ÄÖÜ_STUDY_LONG");
        assert_eq!(segment.len(), STUDY_SEGMENT_MAX_LEN);
        assert!(segment.starts_with("ÄÖ~"));
    }

    #[test]
    fn test_digest_is_md5_of_path() {
        let expected = hex::encode(Md5::digest(b"OpenClinica|SE_BASELINE|F_DEMOG|I_AGE"));
        let code = generate_concept_code(&path("I_AGE"), None);
        assert_eq!(code.as_str(), format!("STUDY|S_DEMO|{expected}"));
    }

    #[test]
    fn test_study_code_prefix() {
        let code = generate_concept_code(&path("I_AGE"), None);
        assert!(code.as_str().starts_with(&study_code_prefix("S_DEMO")));
    }
}
