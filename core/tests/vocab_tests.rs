use reel_core::Vocabulary;

fn corpus() -> Vec<String> {
    vec![
        "space war".to_string(),
        "space love".to_string(),
        "desert love".to_string(),
    ]
}

#[test]
fn fit_orders_by_document_frequency_then_term() {
    let vocab = Vocabulary::fit(&corpus(), 10);
    assert_eq!(vocab.terms(), ["love", "space", "desert", "war"]);
}

#[test]
fn fit_caps_at_max_features() {
    let vocab = Vocabulary::fit(&corpus(), 2);
    assert_eq!(vocab.terms(), ["love", "space"]);
    // Dropped terms vanish from the mapping entirely.
    assert_eq!(vocab.column("war"), None);
}

#[test]
fn fit_is_reproducible() {
    let a = Vocabulary::fit(&corpus(), 10);
    let b = Vocabulary::fit(&corpus(), 10);
    assert_eq!(a.terms(), b.terms());
    assert_eq!(a.transform(&corpus()), b.transform(&corpus()));
}

#[test]
fn rows_are_unit_norm_or_zero() {
    let vocab = Vocabulary::fit(&corpus(), 10);
    let mut tags = corpus();
    tags.push("entirely unknown tokens".to_string());
    for row in vocab.transform(&tags) {
        let norm = row.iter().map(|v| v * v).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-6 || norm == 0.0);
    }
}

#[test]
fn out_of_vocabulary_terms_contribute_zero() {
    let vocab = Vocabulary::fit(&corpus(), 10);
    let row = vocab.vectorize("space wormhole");
    // Only the "space" column is set; the unknown term is ignored.
    let nonzero = row.iter().filter(|v| **v != 0.0).count();
    assert_eq!(nonzero, 1);
    assert_eq!(row[vocab.column("space").unwrap()], 1.0);
}

#[test]
fn counts_repeat_terms() {
    let vocab = Vocabulary::fit(&["space space war".to_string()], 10);
    let row = vocab.vectorize("space space war");
    let space = row[vocab.column("space").unwrap()];
    let war = row[vocab.column("war").unwrap()];
    // Counts 2 and 1, L2-normalized.
    assert!((space - 2.0 / 5.0f32.sqrt()).abs() < 1e-6);
    assert!((war - 1.0 / 5.0f32.sqrt()).abs() < 1e-6);
}
