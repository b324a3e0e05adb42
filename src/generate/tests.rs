use super::core::*;
use crate::hexfmt::decode;

use proptest::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn is_sorted(v: &[Element]) -> bool {
    v.windows(2).all(|w| w[0] <= w[1])
}

#[test]
fn test_layout_counts() {
    let layout = Layout::new(4, 1).unwrap();
    assert_eq!(layout.way_count(), 2);
    assert_eq!(layout.total(), 8);
    assert_eq!(layout.run_range(0), 0..4);
    assert_eq!(layout.run_range(1), 4..8);
}

#[test]
fn test_layout_way_log_zero() {
    let layout = Layout::new(10, 0).unwrap();
    assert_eq!(layout.way_count(), 1);
    assert_eq!(layout.total(), 10);
}

#[test]
fn test_layout_zero_per_way() {
    let layout = Layout::new(0, 5).unwrap();
    assert_eq!(layout.way_count(), 32);
    assert_eq!(layout.total(), 0);
}

#[test]
fn test_layout_rejects_large_shift() {
    let err = Layout::new(1, 32).unwrap_err();
    assert!(matches!(err, GenError::WayLogTooLarge(32)));
    assert!(err.is_layout());
    assert!(Layout::new(1, 200).is_err());
    assert!(Layout::new(1, 31).is_ok());
}

#[test]
fn test_layout_rejects_overflow() {
    let err = Layout::new(usize::MAX, 1).unwrap_err();
    assert!(matches!(err, GenError::TooManyElements { .. }));
    assert!(err.is_layout());
}

#[test]
fn test_layout_rejects_unencodable_total() {
    // Fits in usize, but the hex file would not fit in isize::MAX bytes
    let err = Layout::new(1 << 62, 1).unwrap_err();
    assert!(matches!(err, GenError::TooManyElements { .. }));
    assert!(err.is_layout());

    assert!(Layout::new(MAX_TOTAL + 1, 0).is_err());
    assert_eq!(Layout::new(MAX_TOTAL, 0).unwrap().total(), MAX_TOTAL);
}

#[test]
fn test_fill_random_allocation_failure() {
    let mut rng = StdRng::seed_from_u64(1);
    let err = fill_random(&mut rng, usize::MAX / 2).unwrap_err();
    assert!(matches!(err, GenError::OutOfMemory { .. }));
    assert!(!err.is_layout());
    assert!(err.to_string().contains("cannot allocate"), "got {}", err);
}

#[test]
fn test_fill_random_range_and_len() {
    let mut rng = StdRng::seed_from_u64(7);
    let data = fill_random(&mut rng, 5000).unwrap();
    assert_eq!(data.len(), 5000);
    assert!(data.iter().all(|&v| (0..=ELEMENT_MAX).contains(&v)));
}

#[test]
fn test_fill_random_seeded_is_deterministic() {
    let a = fill_random(&mut StdRng::seed_from_u64(99), 100).unwrap();
    let b = fill_random(&mut StdRng::seed_from_u64(99), 100).unwrap();
    let c = fill_random(&mut StdRng::seed_from_u64(100), 100).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_sort_runs_keeps_run_positions() {
    let mut data = vec![4, 3, 2, 1, 8, 7, 6, 5];
    sort_runs(&mut data, 4);
    assert_eq!(data, vec![1, 2, 3, 4, 5, 6, 7, 8]);

    let mut data = vec![9, 8, 7, 3, 2, 1];
    sort_runs(&mut data, 3);
    assert_eq!(data, vec![7, 8, 9, 1, 2, 3]);
}

#[test]
fn test_sort_runs_zero_width() {
    let mut data: Vec<Element> = Vec::new();
    sort_runs(&mut data, 0);
    assert!(data.is_empty());
}

#[test]
fn test_sort_runs_parallel_path() {
    let layout = Layout::new(5000, 4).unwrap();
    let mut data = fill_random(&mut StdRng::seed_from_u64(1), layout.total()).unwrap();
    sort_runs(&mut data, layout.per_way());
    for i in 0..layout.way_count() {
        assert!(is_sorted(&data[layout.run_range(i)]), "run {} unsorted", i);
    }
}

#[test]
fn test_sort_all() {
    let mut data = vec![5, 1, 4, 1, 3];
    sort_all(&mut data);
    assert_eq!(data, vec![1, 1, 3, 4, 5]);
}

#[test]
fn test_in_memory_four_by_two() {
    let layout = Layout::new(4, 1).unwrap();
    let (runs, answer) = generate_in_memory(&layout, 2024).unwrap();
    assert_eq!(runs.len(), 8);
    assert_eq!(answer.len(), 8);
    assert!(is_sorted(&runs[0..4]));
    assert!(is_sorted(&runs[4..8]));
    assert!(is_sorted(&answer));
}

#[test]
fn test_in_memory_single_run_equals_answer() {
    let layout = Layout::new(257, 0).unwrap();
    let (runs, answer) = generate_in_memory(&layout, 3).unwrap();
    assert_eq!(runs, answer);
}

#[test]
fn test_generate_writes_both_files() {
    let dir = tempfile::tempdir().unwrap();
    let layout = Layout::new(16, 3).unwrap();
    let mut config = GenConfig::new(layout, dir.path());
    config.seed = Some(42);

    let summary = generate(&config).unwrap();
    assert_eq!(summary.seed, 42);
    assert_eq!(summary.total, 128);
    assert_eq!(summary.way_count, 8);

    let init = decode(&std::fs::read(&config.initdata_path).unwrap()).unwrap();
    let answer = decode(&std::fs::read(&config.answer_path).unwrap()).unwrap();
    assert_eq!(init.len(), 128);
    assert_eq!(answer.len(), 128);

    let (runs, sorted) = generate_in_memory(&layout, 42).unwrap();
    let as_u32 = |v: &[Element]| v.iter().map(|&e| e as u32).collect::<Vec<u32>>();
    assert_eq!(init, as_u32(&runs));
    assert_eq!(answer, as_u32(&sorted));
}

#[test]
fn test_generate_default_names() {
    let dir = tempfile::tempdir().unwrap();
    let config = GenConfig::new(Layout::new(1, 0).unwrap(), dir.path());
    generate(&config).unwrap();
    assert!(dir.path().join("initdata.hex").exists());
    assert!(dir.path().join("answer.txt").exists());
}

#[test]
fn test_generate_zero_per_way_writes_empty_files() {
    let dir = tempfile::tempdir().unwrap();
    let config = GenConfig::new(Layout::new(0, 3).unwrap(), dir.path());
    generate(&config).unwrap();
    assert_eq!(std::fs::read(&config.initdata_path).unwrap(), b"");
    assert_eq!(std::fs::read(&config.answer_path).unwrap(), b"");
}

#[test]
fn test_generate_unwritable_path() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = GenConfig::new(Layout::new(2, 1).unwrap(), dir.path());
    config.initdata_path = dir.path().join("missing").join("initdata.hex");
    let err = generate(&config).unwrap_err();
    assert!(!err.is_layout());
    let msg = err.to_string();
    assert!(msg.contains("initdata.hex"), "got {:?}", msg);
    assert!(!msg.contains("os error"), "got {:?}", msg);
    assert!(!config.answer_path.exists());
}

#[test]
fn test_resolve_seed() {
    assert_eq!(resolve_seed(Some(5)), 5);
    // Entropy seeds differ with overwhelming probability
    let a = resolve_seed(None);
    let b = resolve_seed(None);
    let c = resolve_seed(None);
    assert!(a != b || b != c);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_runs_and_answer_are_consistent(
        per_way in 0usize..64,
        way_log in 0u32..6,
        seed in any::<u64>(),
    ) {
        let layout = Layout::new(per_way, way_log).unwrap();
        let (runs, answer) = generate_in_memory(&layout, seed).unwrap();

        prop_assert_eq!(runs.len(), per_way << way_log);
        prop_assert_eq!(answer.len(), runs.len());
        prop_assert!(is_sorted(&answer));
        prop_assert!(answer.iter().all(|&v| v >= 0));
        for i in 0..layout.way_count() {
            prop_assert!(is_sorted(&runs[layout.run_range(i)]));
        }

        let mut multiset = runs.clone();
        multiset.sort_unstable();
        prop_assert_eq!(multiset, answer);
    }
}
