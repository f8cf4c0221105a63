mod common;

use proptest::prelude::*;
use rstest::rstest;
use tml::binary::{Header, Section, CHECKSUM_OFFSET, HEADER_LEN};
use tml::{BinaryDocument, Cursor, EncodeOptions, ErrorKind, Tree};

use common::{assert_same_tree, body, render};

const TUTORIAL: &str = include_str!("fixtures/tutorial.tml");

fn tutorial_blob(options: &EncodeOptions) -> Vec<u8> {
    let doc = tml::parse(TUTORIAL).unwrap();
    tml::to_binary_with_options(&doc, options).unwrap()
}

fn pool_range(blob: &[u8], section: Section) -> std::ops::Range<usize> {
    Header::read(blob).unwrap().section(section).unwrap()
}

#[rstest]
fn round_trip_preserves_tree() {
    let doc = tml::parse(TUTORIAL).unwrap();
    let blob = tml::to_binary(&doc).unwrap();
    let loaded = tml::from_binary(&blob).unwrap();
    assert_same_tree(&doc, &loaded);

    let first = loaded.resolve("level.tutorial.objects.0").unwrap();
    let weights = loaded.get_int_array(first, "weights").unwrap();
    assert_eq!((weights.len(), weights[0], weights[3], weights[7]), (12, 10, 103, -1));
    let second = loaded.resolve("level.tutorial.objects.1").unwrap();
    let weights = loaded.get_int_array(second, "weights").unwrap();
    assert_eq!((weights.len(), weights[0], weights[7]), (8, 10, -91));
    assert_eq!(loaded.indent_unit(), Some(2));
}

#[rstest]
fn header_describes_sections() {
    let doc = tml::parse(TUTORIAL).unwrap();
    let blob = tml::to_binary(&doc).unwrap();
    let header = Header::read(&blob).unwrap();
    assert_eq!(&blob[0..4], b"BTML");
    assert_eq!(header.version, 1);
    assert_eq!(header.indent_unit, 2);
    assert_eq!(header.count(Section::Nodes), doc.node_count());
    assert_eq!(header.count(Section::Entries), doc.entry_count());
    assert_eq!(header.count(Section::Text), TUTORIAL.len());
    assert_eq!(header.offset(Section::Nodes), HEADER_LEN);
    assert_eq!(
        header.section(Section::Text).map(|range| range.end),
        Some(blob.len())
    );
    assert_ne!(header.checksum, 0);
}

#[rstest]
fn encoding_is_stable() {
    let blob = tutorial_blob(&EncodeOptions::default());
    let again = tml::to_binary(&tml::from_binary(&blob).unwrap()).unwrap();
    assert_eq!(blob, again);
}

#[rstest]
#[case(Section::Floats)]
#[case(Section::Ints)]
fn flipped_pool_byte_fails_checksum(#[case] section: Section) {
    let blob = tutorial_blob(&EncodeOptions::default());
    for at in pool_range(&blob, section) {
        let mut corrupt = blob.clone();
        corrupt[at] ^= 0x40;
        let err = BinaryDocument::from_bytes(&corrupt).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Checksum, "byte {at}");
    }
}

#[rstest]
fn zeroed_checksum_skips_verification() {
    let mut blob = tutorial_blob(&EncodeOptions::default());
    blob[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].fill(0);
    let ints = pool_range(&blob, Section::Ints);
    blob[ints.start] ^= 0x01;
    let loaded = BinaryDocument::from_vec(blob).unwrap();
    let first = loaded.resolve("level.tutorial.objects.0").unwrap();
    assert_eq!(loaded.get_int_array(first, "weights").unwrap()[0], 11);
}

#[rstest]
fn zeroed_checksum_tolerates_text_and_tag_flips() {
    let mut clean = tutorial_blob(&EncodeOptions::default());
    clean[CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4].fill(0);

    for at in pool_range(&clean, Section::Text) {
        let mut blob = clean.clone();
        blob[at] = 0xff;
        let loaded = BinaryDocument::from_vec(blob).unwrap();
        assert!(tml::to_value(&loaded).is_ok(), "text byte {at}");
    }

    let entries = pool_range(&clean, Section::Entries);
    for tag in entries.step_by(32).map(|record| record + 8) {
        let mut blob = clean.clone();
        blob[tag] ^= 0x80;
        let loaded = BinaryDocument::from_vec(blob).unwrap();
        assert!(tml::to_value(&loaded).is_ok(), "tag byte {tag}");
    }
}

#[rstest]
fn unreadable_text_reads_as_empty() {
    let doc = tml::parse("name: caf\u{e9}\n").unwrap();
    let mut blob = tml::to_binary_with_options(&doc, &EncodeOptions::new().with_checksum(false)).unwrap();
    let text = pool_range(&blob, Section::Text);
    // first byte of the two-byte `é`
    blob[text.start + 9] = 0xff;
    let loaded = BinaryDocument::from_vec(blob).unwrap();
    assert_eq!(loaded.get_str(Cursor::ROOT, "name"), Ok(""));
}

#[rstest]
fn unknown_tag_reads_as_none() {
    let doc = tml::parse("seed: 7\n").unwrap();
    let mut blob = tml::to_binary_with_options(&doc, &EncodeOptions::new().with_checksum(false)).unwrap();
    let entries = pool_range(&blob, Section::Entries);
    blob[entries.start + 8] = 0x82;
    let loaded = BinaryDocument::from_vec(blob).unwrap();
    assert_eq!(loaded.value(Cursor::ROOT, "seed"), Ok(tml::arena::Value::None));
}

#[rstest]
fn dedented_blocks_are_stored_after_the_source() {
    let text = "a:\n  desc: \"\"\"\n    line one\n    line two\n    \"\"\"\n  n: 1\n";
    let doc = tml::parse(text).unwrap();
    let a = doc.resolve("a").unwrap();
    assert_eq!(doc.get_str(a, "desc"), Ok("line one\nline two"));

    let blob = tml::to_binary(&doc).unwrap();
    let header = Header::read(&blob).unwrap();
    assert_eq!(header.count(Section::Text), text.len() + "line one\nline two".len());
    let loaded = tml::from_binary(&blob).unwrap();
    assert_same_tree(&doc, &loaded);
    assert_eq!(tml::to_binary(&loaded).unwrap(), blob);
}

#[rstest]
fn checksum_can_be_disabled() {
    let blob = tutorial_blob(&EncodeOptions::new().with_checksum(false));
    assert_eq!(Header::read(&blob).unwrap().checksum, 0);
    let loaded = tml::from_binary(&blob).unwrap();
    assert_same_tree(&tml::parse(TUTORIAL).unwrap(), &loaded);
}

#[rstest]
#[case::magic(0)]
#[case::version(4)]
#[case::endian(9)]
fn header_corruption_is_a_format_error(#[case] at: usize) {
    let mut blob = tutorial_blob(&EncodeOptions::default());
    blob[at] ^= 0xff;
    let err = tml::from_binary(&blob).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Format);
}

#[rstest]
fn truncated_blobs_are_rejected() {
    let blob = tutorial_blob(&EncodeOptions::new().with_checksum(false));
    for len in [0, 10, HEADER_LEN - 1, HEADER_LEN, blob.len() - 1] {
        let err = tml::from_binary(&blob[..len]).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Format, "length {len}");
    }
}

#[rstest]
fn out_of_range_records_are_rejected() {
    let clean = tutorial_blob(&EncodeOptions::new().with_checksum(false));
    let entries = pool_range(&clean, Section::Entries);
    let nodes = pool_range(&clean, Section::Nodes);

    // string payload past the text
    let mut blob = clean.clone();
    blob[entries.start + 8] = 4;
    blob[entries.start + 16..entries.start + 24].copy_from_slice(&u64::from(u32::MAX).to_le_bytes());
    blob[entries.start + 24..entries.start + 32].copy_from_slice(&8u64.to_le_bytes());
    assert_eq!(tml::from_binary(&blob).unwrap_err().kind, ErrorKind::Format);

    // key span past the text
    let mut blob = clean.clone();
    blob[entries.start + 4..entries.start + 8].copy_from_slice(&u32::MAX.to_le_bytes());
    assert_eq!(tml::from_binary(&blob).unwrap_err().kind, ErrorKind::Format);

    // sibling link pointing backwards
    let mut blob = clean.clone();
    blob[nodes.start + 32 + 20..nodes.start + 32 + 24].copy_from_slice(&0i32.to_le_bytes());
    assert_eq!(tml::from_binary(&blob).unwrap_err().kind, ErrorKind::Format);

    // node entry run beyond the entry table
    let mut blob = clean;
    blob[nodes.start + 28..nodes.start + 32].copy_from_slice(&1000u32.to_le_bytes());
    assert_eq!(tml::from_binary(&blob).unwrap_err().kind, ErrorKind::Format);
}

#[rstest]
fn empty_document() {
    let doc = tml::parse("").unwrap();
    let loaded = tml::from_binary(&tml::to_binary(&doc).unwrap()).unwrap();
    assert_eq!(loaded.child_count(Cursor::ROOT), 0);
    assert_eq!(loaded.child(Cursor::ROOT, 0), None);
    assert_eq!(loaded.entries(Cursor::ROOT).len(), 0);
    assert_eq!(loaded.indent_unit(), None);
}

#[rstest]
fn file_wrappers() {
    let doc = tml::parse(TUTORIAL).unwrap();
    let path = std::env::temp_dir().join(format!("tml-file-wrappers-{}.btml", std::process::id()));
    tml::write_binary_file(&path, &doc, &EncodeOptions::default()).unwrap();
    let loaded = tml::load_binary_file(&path).unwrap();
    std::fs::remove_file(&path).unwrap();
    assert_same_tree(&doc, &loaded);

    let err = tml::load_binary_file(&path).unwrap_err();
    assert_eq!(err.kind, ErrorKind::Io);
}

proptest! {
    #[test]
    fn generated_documents_round_trip(body in body()) {
        let text = render(&body);
        let doc = tml::parse(&text).unwrap();
        let blob = tml::to_binary(&doc).unwrap();
        let loaded = tml::from_binary(&blob).unwrap();
        assert_same_tree(&doc, &loaded);
        prop_assert_eq!(tml::to_binary(&loaded).unwrap(), blob);
    }
}
