use super::*;

#[test]
fn splits_exact_multiple_with_more_then_terminal_flags() {
    let chunker = Chunker::new(&[1, 2, 3, 4, 5, 6], 3).unwrap();
    assert_eq!(
        chunker.chunks(),
        vec![vec![1, 1, 2], vec![1, 3, 4], vec![0, 5, 6]]
    );
}

#[test]
fn splits_remainder_into_shorter_final_chunk() {
    let chunker = Chunker::new(&[1, 2, 3, 4, 5], 3).unwrap();
    assert_eq!(
        chunker.chunks(),
        vec![vec![1, 1, 2], vec![1, 3, 4], vec![0, 5]]
    );
}

#[test]
fn single_chunk_when_payload_fits() {
    let chunker = Chunker::new(&[1, 2], 3).unwrap();
    assert_eq!(chunker.chunks(), vec![vec![0, 1, 2]]);
}

#[test]
fn rejects_empty_input() {
    assert!(Chunker::new(&[], 3).is_err());
}

#[test]
fn rejects_chunk_size_below_two() {
    assert!(Chunker::new(&[1, 2, 3], 1).is_err());
}

#[test]
fn dechunker_reassembles_in_order() {
    let chunker = Chunker::new(&[1, 2, 3, 4, 5, 6], 3).unwrap();
    let mut dechunker = Dechunker::new();
    let chunks = chunker.chunks();
    assert_eq!(dechunker.add(&chunks[0]).unwrap(), false);
    assert_eq!(dechunker.add(&chunks[1]).unwrap(), false);
    assert_eq!(dechunker.add(&chunks[2]).unwrap(), true);
    assert_eq!(dechunker.merge().unwrap(), vec![1, 2, 3, 4, 5, 6]);
}

#[test]
fn dechunker_ignores_empty_chunks_without_completing() {
    let mut dechunker = Dechunker::new();
    assert_eq!(dechunker.add(&[]).unwrap(), false);
    assert!(dechunker.merge().is_err());
}

#[test]
fn dechunker_rejects_chunks_after_terminal() {
    let mut dechunker = Dechunker::new();
    dechunker.add(&[0, 1, 2]).unwrap();
    assert_eq!(dechunker.add(&[1, 3, 4]), Err(Error::AlreadyComplete));
}

#[test]
fn dechunker_rejects_invalid_flag_byte() {
    let mut dechunker = Dechunker::new();
    assert_eq!(dechunker.add(&[7, 1, 2]), Err(Error::InvalidChunk(7)));
}

#[test]
fn merge_is_idempotent() {
    let mut dechunker = Dechunker::new();
    dechunker.add(&[0, 9, 9]).unwrap();
    assert_eq!(dechunker.merge().unwrap(), vec![9, 9]);
    assert_eq!(dechunker.merge().unwrap(), vec![9, 9]);
}
