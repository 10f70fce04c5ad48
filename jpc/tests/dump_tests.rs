mod common;

use std::io::{Seek, SeekFrom};

use common::Codestream;
use jpc::{dump, BlockReader, CodestreamLayout};
use test_log::test;

fn dump_to_string(bytes: &[u8], data_offset: u64, rows: u32, columns: u32) -> String {
    let mut reader = std::io::Cursor::new(bytes.to_vec());
    let mut out = vec![];
    dump(&mut reader, data_offset, rows, columns, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn test_dump_lists_markers_and_tile_parts() {
    let built = Codestream::grid(1, 2, 20).with_prefix(7).build();
    let text = dump_to_string(&built.bytes, 7, 1, 2);

    assert!(text.starts_with("offset to codestream: 7\n"));
    assert!(text.contains("marker: 0xff4f SOC (Delimiting) at byte offset 7"));
    assert!(text.contains("marker: 0xff51 SIZ (FixedInformation) at byte offset 9"));
    assert!(text.contains("SIZ at byte offset 9"));
    assert!(text.contains("  tiles:  2x1"));
    assert!(text.contains("COD at byte offset 52"));
    assert!(text.contains("marker: 0xff5c QCD (Functional) at byte offset 66"));
    for offset in &built.offsets {
        assert!(text.contains(&format!("sot pos: {}\n", offset)));
    }
    assert!(text.contains("Isot 1 Psot"));
    let eoc = built.bytes.len() - 2;
    assert!(text.ends_with(&format!("eoc pos: {}\n", eoc)));
    assert!(!text.contains("mismatch"));
}

#[test]
fn test_dump_shows_tile_part_lengths() {
    let built = Codestream::grid(1, 2, 20).with_tlm().build();
    let text = dump_to_string(&built.bytes, 0, 1, 2);
    assert!(text.contains("TLM at byte offset 65"));
    assert!(text.contains(&format!("tile-part 1: Ttlm 1 Ptlm {}", built.lengths[1])));
}

#[test]
fn test_dump_reports_count_mismatch() {
    let built = Codestream::grid(1, 3, 20).build();
    let text = dump_to_string(&built.bytes, 0, 2, 2);
    assert!(text.contains("expected 4 blocks, found 3 offsets and 3 sizes"));
    assert!(text.contains("eoc pos:"));
}

#[test]
fn test_dump_reports_surplus_tile_parts() {
    let built = Codestream::grid(1, 3, 20).build();
    let text = dump_to_string(&built.bytes, 0, 1, 2);
    for offset in &built.offsets {
        assert!(text.contains(&format!("sot pos: {}\n", offset)));
    }
    assert!(text.contains("expected 2 blocks, found 3 offsets and 3 sizes"));
    assert!(text.ends_with(&format!("eoc pos: {}\n", built.bytes.len() - 2)));
}

#[test]
fn test_dump_rejects_oversized_code_blocks() {
    let built = Codestream::grid(1, 1, 20).build();
    let mut bytes = built.bytes.clone();
    // xcb of the COD at byte offset 45
    assert_eq!(bytes[55], 0x04);
    bytes[55] = 0x0F;
    let text = dump_to_string(&bytes, 0, 1, 1);
    assert!(text.contains("walk stopped: marker 0xFF52 (COD) at byte offset 45 malformed"));
    assert!(text.contains("xcb 15"));
    assert!(!text.contains("sot pos"));
}

#[test]
fn test_dump_without_eoc() {
    let mut codestream = Codestream::grid(1, 1, 20);
    codestream.eoc = false;
    let built = codestream.build();
    let text = dump_to_string(&built.bytes, 0, 1, 1);
    assert!(text.ends_with("no EOC found\n"));
}

#[test]
fn test_dump_not_a_codestream() {
    let built = Codestream::grid(1, 1, 20).with_prefix(4).build();
    let text = dump_to_string(&built.bytes, 0, 1, 1);
    assert_eq!(text, "offset to codestream: 0\nno SOC at byte offset 0\n");
}

#[test]
fn test_dump_stops_on_lost_sync() {
    let mut codestream = Codestream::grid(1, 2, 20);
    codestream.tile_parts[0].declared_length = Some(15);
    let built = codestream.build();
    let text = dump_to_string(&built.bytes, 0, 1, 2);
    assert!(text.contains(&format!("sot pos: {}", built.offsets[0])));
    assert!(text.contains("walk stopped: declared length walk lost sync"));
    assert!(!text.contains("eoc pos"));
}

#[test]
fn test_dump_keeps_position() {
    let built = Codestream::grid(2, 1, 20).build();
    let mut stream = built.reader();
    stream.seek(SeekFrom::Start(31)).unwrap();

    let layout = CodestreamLayout {
        data_offset: 0,
        rows: 2,
        columns: 1,
    };
    let mut reader = BlockReader::new(stream, layout, 64, 64);
    let mut out = vec![];
    reader.dump(&mut out).unwrap();
    assert!(!out.is_empty());

    let mut stream = reader.into_inner();
    assert_eq!(stream.stream_position().unwrap(), 31);
}
