use reel_core::{Error, FlatIndex, Vocabulary};

fn unit(v: &[f32]) -> Vec<f32> {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    v.iter().map(|x| x / norm).collect()
}

fn tiny_index() -> FlatIndex {
    // A: space+war, B: space+love, C: desert+love over {space, war, love, desert}.
    let rows = vec![
        unit(&[1.0, 1.0, 0.0, 0.0]),
        unit(&[1.0, 0.0, 1.0, 0.0]),
        unit(&[0.0, 0.0, 1.0, 1.0]),
    ];
    FlatIndex::build(rows, 4).unwrap()
}

#[test]
fn self_match_scores_one() {
    let index = tiny_index();
    let query = index.reconstruct(0).unwrap().to_vec();
    let hits = index.search(&query, 3).unwrap();
    assert_eq!(hits[0].row, 0);
    assert!((hits[0].score - 1.0).abs() < 1e-6);
}

#[test]
fn scores_descend_with_row_tiebreak() {
    let index = tiny_index();
    let query = index.reconstruct(0).unwrap().to_vec();
    let hits = index.search(&query, 3).unwrap();
    for pair in hits.windows(2) {
        assert!(
            pair[0].score > pair[1].score
                || (pair[0].score == pair[1].score && pair[0].row < pair[1].row)
        );
    }
}

#[test]
fn identical_vectors_order_by_ascending_row() {
    let rows = vec![unit(&[1.0, 1.0]), unit(&[1.0, 1.0]), unit(&[1.0, 1.0])];
    let index = FlatIndex::build(rows, 2).unwrap();
    let query = index.reconstruct(1).unwrap().to_vec();
    let hits = index.search(&query, 3).unwrap();
    let order: Vec<u32> = hits.iter().map(|h| h.row).collect();
    assert_eq!(order, [0, 1, 2]);
}

#[test]
fn k_larger_than_corpus_caps_without_error() {
    let index = tiny_index();
    let query = index.reconstruct(0).unwrap().to_vec();
    let hits = index.search(&query, 10).unwrap();
    assert_eq!(hits.len(), 3);
}

#[test]
fn dimension_mismatch_is_an_error() {
    let index = tiny_index();
    assert!(matches!(
        index.search(&[1.0, 0.0], 1),
        Err(Error::DimensionMismatch {
            expected: 4,
            got: 2
        })
    ));
}

#[test]
fn build_rejects_ragged_rows() {
    let result = FlatIndex::build(vec![vec![1.0, 0.0], vec![1.0]], 2);
    assert!(matches!(
        result,
        Err(Error::DimensionMismatch {
            expected: 2,
            got: 1
        })
    ));
}

#[test]
fn empty_index_searches_empty() {
    let index = FlatIndex::build(Vec::new(), 4).unwrap();
    assert_eq!(index.ntotal(), 0);
    let hits = index.search(&[0.0, 0.0, 0.0, 0.0], 5).unwrap();
    assert!(hits.is_empty());
}

#[test]
fn search_matches_vectorized_corpus() {
    // End-to-end through the vectorizer: the concrete 3-movie scenario.
    let tags = vec![
        "space war".to_string(),
        "space love".to_string(),
        "desert love".to_string(),
    ];
    let vocab = Vocabulary::fit(&tags, 10);
    let matrix = vocab.transform(&tags);
    let index = FlatIndex::build(matrix, vocab.len()).unwrap();

    let query = index.reconstruct(0).unwrap().to_vec();
    let hits = index.search(&query, 3).unwrap();
    // A first (self), then B (shares "space"), then C (nothing shared).
    assert_eq!(hits[0].row, 0);
    assert_eq!(hits[1].row, 1);
    assert!((hits[1].score - 0.5).abs() < 1e-6);
    assert_eq!(hits[2].row, 2);
    assert!(hits[2].score.abs() < 1e-6);
}
