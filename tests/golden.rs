//! Golden tests for the slice rank kernel.
//!
//! These tests verify determinism and end-to-end behavior of sampling,
//! adaptive sorting and ranking.

use std::collections::BTreeMap;

use rand::rngs::StdRng;
use rand::SeedableRng;
use slice_rank_kernel::{
    advance, all_pairs, export_elements, import_pairs, rank_session, sample_slices, ComparisonList, ComparisonPair,
    ExtentCache, InMemoryDataset, Judgment, Orientation, Outcome, SamplingPolicy, Session, SessionInfo, Slice,
    SortDecision, VolumeHeader,
};

// ─────────────────────────────────────────────────────────────────────────────
// Test Helpers
// ─────────────────────────────────────────────────────────────────────────────

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn make_dataset(n: usize) -> InMemoryDataset {
    let mut dataset = InMemoryDataset::new();
    for i in 0..n {
        dataset.add_item(format!("img{:02}.nii.gz", i), VolumeHeader::canonical([160, 192, 128 + i as u32]));
    }
    dataset
}

fn make_info(name: &str) -> SessionInfo {
    SessionInfo::new(
        name,
        "dataset1",
        "Which slice shows more contrast?",
        vec!["First".into(), "Second".into(), "No Difference".into()],
    )
}

fn make_pool(n: u32) -> Vec<Slice> {
    (0..n).map(|i| Slice::new(format!("img{:02}", i % 5), i, Orientation::Axial)).collect()
}

/// Answer comparisons from a hidden score; higher score wins.
fn oracle(scores: &BTreeMap<Slice, i64>, pair: &ComparisonPair) -> Outcome {
    match scores[&pair.left].cmp(&scores[&pair.right]) {
        std::cmp::Ordering::Greater => Outcome::First,
        std::cmp::Ordering::Less => Outcome::Second,
        std::cmp::Ordering::Equal => Outcome::NoDifference,
    }
}

/// Run the adaptive sort to completion, returning the final decision and
/// the number of judgments asked.
fn run_sort(session: &mut Session, answer: impl Fn(&ComparisonPair) -> Outcome) -> (SortDecision, usize) {
    let mut asked = 0;
    loop {
        match advance(session).unwrap() {
            complete @ SortDecision::Complete { .. } => return (complete, asked),
            SortDecision::NeedsNext(element) => {
                let stored = session.push_comparison(element.subject.clone()).unwrap().index;
                assert_eq!(stored, element.index);
                let outcome = answer(&element.subject);
                session.label_comparison(stored, Judgment::now(outcome, 1200)).unwrap();
                asked += 1;
            }
            SortDecision::Pending(element) => {
                panic!("unexpected pending element {}", element.subject);
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Sampling
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_sampling_deterministic_with_seed() {
    init_logging();
    let policy = SamplingPolicy::new(4, 12, Orientation::Coronal, 20, 80);

    let a = sample_slices(make_dataset(8), policy.clone(), &mut StdRng::seed_from_u64(2024)).unwrap();
    let b = sample_slices(make_dataset(8), policy, &mut StdRng::seed_from_u64(2024)).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_sampling_respects_window_and_bounds() {
    let policy = SamplingPolicy::new(3, 30, Orientation::Axial, 25, 75);
    let dataset = make_dataset(6);
    let pool = sample_slices(&dataset, policy.clone(), &mut StdRng::seed_from_u64(7)).unwrap();

    assert!(!pool.is_empty());
    assert!(pool.len() <= 30);
    let items: std::collections::BTreeSet<_> = pool.iter().map(|s| s.item_id.clone()).collect();
    assert!(items.len() <= 3);

    for slice in &pool {
        assert_eq!(slice.orientation, Orientation::Axial);
        let extent = slice_rank_kernel::ExtentProvider::extent(&dataset, &slice.item_id, Orientation::Axial).unwrap();
        let (lo, hi) = policy.index_window(extent);
        assert!(slice.axis_index >= lo && slice.axis_index < hi);
    }
}

#[test]
fn test_sampling_through_cache() {
    let policy = SamplingPolicy::new(2, 10, Orientation::Sagittal, 10, 90);
    let cached = ExtentCache::new(make_dataset(4));

    let direct = sample_slices(make_dataset(4), policy.clone(), &mut StdRng::seed_from_u64(99)).unwrap();
    let through_cache = sample_slices(&cached, policy, &mut StdRng::seed_from_u64(99)).unwrap();
    assert_eq!(direct, through_cache);

    let stats = cached.cache_stats().unwrap();
    assert!(stats.len <= 2);
}

// ─────────────────────────────────────────────────────────────────────────────
// Adaptive sort
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_adaptive_sort_recovers_true_order() {
    init_logging();
    let pool = make_pool(16);
    // Hidden order unrelated to structural order
    let scores: BTreeMap<Slice, i64> = pool.iter().map(|s| (s.clone(), (s.axis_index as i64 * 7) % 16)).collect();

    let mut session = Session::sort(make_info("sort16"), pool.clone()).unwrap();
    let (decision, asked) = run_sort(&mut session, |pair| oracle(&scores, pair));

    let mut expected = pool.clone();
    expected.sort_by_key(|s| scores[s]);
    assert_eq!(
        decision,
        SortDecision::Complete {
            order: expected,
            order_violations: 0
        }
    );
    // Merge sort on 16 items needs at most 16 * 4 comparisons
    assert!(asked <= 64, "asked {} comparisons", asked);
}

#[test]
fn test_adaptive_sort_never_repeats_a_pair() {
    let pool = make_pool(10);
    let scores: BTreeMap<Slice, i64> = pool.iter().map(|s| (s.clone(), -(s.axis_index as i64))).collect();
    let mut session = Session::sort(make_info("norepeat"), pool).unwrap();
    run_sort(&mut session, |pair| oracle(&scores, pair));

    let keys: std::collections::BTreeSet<_> = session.comparisons().unwrap().iter().map(|e| e.subject.key()).collect();
    assert_eq!(keys.len(), session.comparisons().unwrap().len());
}

#[test]
fn test_adaptive_sort_resumes_after_reload() {
    let pool = make_pool(8);
    let scores: BTreeMap<Slice, i64> = pool.iter().map(|s| (s.clone(), (s.axis_index as i64 * 3) % 8)).collect();
    let mut session = Session::sort(make_info("resume"), pool).unwrap();

    // Answer a few, then persist and reload
    for _ in 0..5 {
        let SortDecision::NeedsNext(element) = advance(&session).unwrap() else {
            panic!("sort finished too early");
        };
        session.push_comparison(element.subject.clone()).unwrap();
        session
            .label_comparison(element.index, Judgment::now(oracle(&scores, &element.subject), 900))
            .unwrap();
    }
    let before = advance(&session).unwrap();

    let json = serde_json::to_string(&session).unwrap();
    let mut reloaded: Session = serde_json::from_str(&json).unwrap();
    assert_eq!(advance(&reloaded).unwrap(), before);

    let (decision, _) = run_sort(&mut reloaded, |pair| oracle(&scores, pair));
    assert!(decision.is_complete());
}

#[test]
fn test_pending_is_idempotent() {
    let mut session = Session::sort(make_info("pending"), make_pool(4)).unwrap();
    let SortDecision::NeedsNext(element) = advance(&session).unwrap() else {
        panic!("expected a first comparison");
    };
    session.push_comparison(element.subject.clone()).unwrap();

    let first = advance(&session).unwrap();
    let second = advance(&session).unwrap();
    assert_eq!(first, SortDecision::Pending(element));
    assert_eq!(first, second);
}

#[test]
fn test_adaptive_sort_with_cycle_reports_violations() {
    let a = Slice::new("a", 0, Orientation::Axial);
    let b = Slice::new("b", 0, Orientation::Axial);
    let c = Slice::new("c", 0, Orientation::Axial);

    // a > b > c > a, all recorded before the sort runs
    let mut session = Session::sort(make_info("cycle"), vec![a.clone(), b.clone(), c.clone()]).unwrap();
    for (left, right) in [(&a, &b), (&b, &c), (&c, &a)] {
        let index = session
            .push_comparison(ComparisonPair::new(left.clone(), right.clone()))
            .unwrap()
            .index;
        session.label_comparison(index, Judgment::now(Outcome::First, 700)).unwrap();
    }

    match advance(&session).unwrap() {
        SortDecision::Complete { order, order_violations } => {
            assert_eq!(order.len(), 3);
            // No linear order satisfies a three-cycle
            assert!(order_violations >= 1);
        }
        other => panic!("unexpected {:?}", other),
    }

    let index = slice_rank_kernel::JudgmentIndex::from_elements(session.comparisons().unwrap());
    let cycles = slice_rank_kernel::find_cycles(&index);
    assert_eq!(cycles.len(), 1);
    assert_eq!(cycles[0].slices, vec![a, b, c]);
}

// ─────────────────────────────────────────────────────────────────────────────
// End to end: sample → pairs → judge → rank → share
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_end_to_end_comparison_session() {
    init_logging();
    let mut rng = StdRng::seed_from_u64(11);
    let policy = SamplingPolicy::new(3, 6, Orientation::Axial, 10, 90);
    let pool = sample_slices(make_dataset(5), policy, &mut rng).unwrap();
    let pairs = all_pairs(&pool, &mut rng);
    assert_eq!(pairs.len(), pool.len() * (pool.len() - 1) / 2);

    let mut session = Session::comparison(make_info("e2e"), pairs.clone()).unwrap();
    // Higher axis index wins; equal indexes are a draw
    for (index, pair) in pairs.iter().enumerate() {
        let outcome = match pair.left.axis_index.cmp(&pair.right.axis_index) {
            std::cmp::Ordering::Greater => Outcome::First,
            std::cmp::Ordering::Less => Outcome::Second,
            std::cmp::Ordering::Equal => Outcome::NoDifference,
        };
        session.label_comparison(index, Judgment::now(outcome, 500)).unwrap();
    }

    let ranked = rank_session(&session).unwrap();
    assert_eq!(ranked.len(), pool.len());
    assert_eq!(ranked.iter().map(|r| r.record.score).sum::<i64>(), 0);
    for window in ranked.windows(2) {
        assert!(window[0].record.score >= window[1].record.score);
    }

    // Share the list and rebuild an identical session from the export
    let list = ComparisonList::from_session(&session).unwrap();
    let text = export_elements(&session).unwrap();
    let imported = import_pairs(&text).unwrap();
    let copy = Session::comparison(make_info("e2e-copy"), imported.clone()).unwrap();
    assert_eq!(ComparisonList::from_session(&copy).unwrap().fingerprint, list.fingerprint);
    assert_eq!(imported, pairs);
}

#[test]
fn test_policy_hash_golden_stability() {
    let policy = SamplingPolicy::default();
    assert_eq!(policy.params_hash(), SamplingPolicy::default().params_hash());
    assert_ne!(
        policy.params_hash(),
        SamplingPolicy::new(10, 20, Orientation::Coronal, 10, 90).params_hash()
    );
}
