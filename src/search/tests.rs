use super::*;

#[test]
fn cosine_similarity_is_symmetric() {
    let a = [0.3f32, -0.7, 0.2, 1.5];
    let b = [1.1f32, 0.4, -0.9, 0.0];

    let ab = cosine_similarity(&a, &b).expect("defined");
    let ba = cosine_similarity(&b, &a).expect("defined");
    assert_eq!(ab, ba);
}

#[test]
fn self_similarity_is_one() {
    let v = [0.5f32, 1.25, -2.0];
    let score = cosine_similarity(&v, &v).expect("defined");
    assert!((score - 1.0).abs() < 1e-6);
}

#[test]
fn orthogonal_vectors_score_zero() {
    let score = cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).expect("defined");
    assert!(score.abs() < 1e-6);
}

#[test]
fn zero_norm_vectors_are_undefined() {
    assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), None);
    assert_eq!(cosine_similarity(&[1.0, 2.0], &[0.0, 0.0]), None);
    assert_eq!(cosine_similarity(&[], &[]), None);
}

#[test]
fn similarity_is_magnitude_independent() {
    let a = [1.0f32, 2.0, 3.0];
    let scaled = [10.0f32, 20.0, 30.0];
    let score = cosine_similarity(&a, &scaled).expect("defined");
    assert!((score - 1.0).abs() < 1e-6);
}

#[test]
fn search_ranks_by_similarity_descending() {
    let index = VectorIndex::new(vec![
        (1, vec![1.0, 0.0]),
        (2, vec![0.0, 1.0]),
        (3, vec![0.7, 0.7]),
    ]);

    let hits = index.search(&[1.0, 0.0], 3);
    assert_eq!(hits.len(), 3);
    assert_eq!(hits[0].note_id, 1);
    assert_eq!(hits[1].note_id, 3);
    assert_eq!(hits[2].note_id, 2);
    assert!(hits[0].score >= hits[1].score);
    assert!(hits[1].score >= hits[2].score);
}

#[test]
fn search_caps_results_at_k() {
    let index = VectorIndex::new(vec![
        (1, vec![1.0, 0.0]),
        (2, vec![0.9, 0.1]),
        (3, vec![0.8, 0.2]),
    ]);

    assert_eq!(index.search(&[1.0, 0.0], 1).len(), 1);
    assert_eq!(index.search(&[1.0, 0.0], 2).len(), 2);
    // Fewer indexed notes than k: return all of them.
    assert_eq!(index.search(&[1.0, 0.0], 10).len(), 3);
}

#[test]
fn ties_break_toward_lower_note_id() {
    let index = VectorIndex::new(vec![
        (42, vec![2.0, 0.0]),
        (7, vec![1.0, 0.0]),
        (19, vec![3.0, 0.0]),
    ]);

    // All three are colinear with the query, so all scores tie at 1.0.
    let hits = index.search(&[1.0, 0.0], 3);
    let ids: Vec<i64> = hits.iter().map(|h| h.note_id).collect();
    assert_eq!(ids, vec![7, 19, 42]);
}

#[test]
fn search_is_deterministic() {
    let index = VectorIndex::new(vec![
        (1, vec![0.2, 0.8]),
        (2, vec![0.5, 0.5]),
        (3, vec![0.9, 0.1]),
    ]);

    let first = index.search(&[0.6, 0.4], 2);
    let second = index.search(&[0.6, 0.4], 2);
    assert_eq!(first, second);
}

#[test]
fn zero_norm_candidates_are_excluded() {
    let index = VectorIndex::new(vec![(1, vec![0.0, 0.0]), (2, vec![1.0, 1.0])]);

    let hits = index.search(&[1.0, 0.0], 5);
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].note_id, 2);
    assert!(!hits[0].score.is_nan());
}

#[test]
fn zero_norm_query_returns_nothing() {
    let index = VectorIndex::new(vec![(1, vec![1.0, 0.0]), (2, vec![0.0, 1.0])]);
    assert!(index.search(&[0.0, 0.0], 5).is_empty());
}

#[test]
fn empty_index_returns_nothing() {
    let index = VectorIndex::default();
    assert!(index.is_empty());
    assert!(index.search(&[1.0, 0.0], 5).is_empty());
}
