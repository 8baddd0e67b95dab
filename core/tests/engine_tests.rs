use reel_core::{Error, FlatIndex, MovieMeta, Recommender, Vocabulary};

fn meta(movie_id: u32, title: &str) -> MovieMeta {
    MovieMeta {
        movie_id,
        title: title.to_string(),
    }
}

fn build_recommender(tagged: &[(&str, &str)]) -> Recommender {
    let tags: Vec<String> = tagged.iter().map(|(_, t)| t.to_string()).collect();
    let vocab = Vocabulary::fit(&tags, 100);
    let matrix = vocab.transform(&tags);
    let index = FlatIndex::build(matrix, vocab.len()).unwrap();
    let movies = tagged
        .iter()
        .enumerate()
        .map(|(i, (title, _))| meta(i as u32 + 100, title))
        .collect();
    Recommender::new(movies, index).unwrap()
}

#[test]
fn recommends_closest_movie_first() {
    let rec = build_recommender(&[("A", "space war"), ("B", "space love"), ("C", "desert love")]);
    let out = rec.recommend("A", 1).unwrap();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].title, "B");
}

#[test]
fn never_recommends_the_query_itself() {
    let rec = build_recommender(&[("A", "space war"), ("B", "space love"), ("C", "desert love")]);
    for title in ["A", "B", "C"] {
        for k in 1..=4 {
            let out = rec.recommend(title, k).unwrap();
            assert!(out.iter().all(|m| m.title != title), "self leaked for {title}");
        }
    }
}

#[test]
fn unknown_title_yields_empty_not_error() {
    let rec = build_recommender(&[("A", "space war"), ("B", "space love")]);
    let out = rec.recommend("Does Not Exist", 5).unwrap();
    assert!(out.is_empty());
}

#[test]
fn k_past_corpus_size_caps_result_length() {
    let rec = build_recommender(&[("A", "space war"), ("B", "space love"), ("C", "desert love")]);
    let out = rec.recommend("A", 10).unwrap();
    assert_eq!(out.len(), 2);
}

#[test]
fn duplicate_titles_resolve_to_first_row() {
    // Two movies share a title; lookup must use the first in build order,
    // whose neighborhood is B, not D.
    let rec = build_recommender(&[
        ("A", "space war"),
        ("B", "space love"),
        ("A", "desert heat"),
        ("D", "desert storm"),
    ]);
    let out = rec.recommend("A", 1).unwrap();
    assert_eq!(out[0].title, "B");
}

#[test]
fn exact_duplicates_may_recommend_each_other() {
    // Identical tag strings tie at score 1.0; exclusion is by row position,
    // so the twin remains a valid result.
    let rec = build_recommender(&[("Twin One", "space war"), ("Twin Two", "space war")]);
    let out = rec.recommend("Twin Two", 1).unwrap();
    assert_eq!(out[0].title, "Twin One");
}

#[test]
fn zero_overlap_movie_never_surfaces() {
    let rec = build_recommender(&[
        ("A", "space war"),
        ("B", "space love"),
        ("C", "desert love"),
        ("Island", "qqqfilm zzztoken"),
    ]);
    // "Island" shares no vocabulary term used by anyone else, so for small k
    // it loses every ranking to positive-score rows.
    for title in ["A", "B", "C"] {
        let out = rec.recommend(title, 2).unwrap();
        assert!(out.iter().all(|m| m.title != "Island"));
    }
}

#[test]
fn corpus_index_mismatch_is_rejected() {
    let tags = vec!["space war".to_string()];
    let vocab = Vocabulary::fit(&tags, 10);
    let index = FlatIndex::build(vocab.transform(&tags), vocab.len()).unwrap();
    let movies = vec![meta(1, "A"), meta(2, "B")];
    assert!(matches!(
        Recommender::new(movies, index),
        Err(Error::CorpusMismatch {
            movies: 2,
            vectors: 1
        })
    ));
}
