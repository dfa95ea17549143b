//! Proving-parameter selection over catalogs built in memory and on disk.

use std::path::PathBuf;
use unique_rows::{
    params::{PtauCatalog, PtauEntry},
    UniqueRowsError,
};

fn catalog(exponents: &[u32]) -> PtauCatalog {
    PtauCatalog::from_entries(
        exponents
            .iter()
            .map(|&exp| {
                PtauEntry::new(PathBuf::from(format!("powersOfTau28_hez_final_{}.ptau", exp)), exp)
                    .unwrap()
            })
            .collect(),
    )
}

#[test]
fn test_example_c_selection() {
    let catalog = catalog(&[21, 20]);
    assert_eq!(catalog.select(1_571_839).unwrap().exponent, 21);
    assert_eq!(catalog.select(1 << 20).unwrap().exponent, 20);

    match catalog.select(3_000_000) {
        Err(UniqueRowsError::CapacityExceeded {
            required,
            max_available,
        }) => {
            assert_eq!(required, 3_000_000);
            assert_eq!(max_available, 1 << 21);
        }
        other => panic!("expected CapacityExceeded, got {:?}", other),
    }
}

#[test]
fn test_selection_is_monotonic() {
    let catalog = catalog(&[8, 10, 12, 14, 16]);
    let mut previous = 0;
    for required in (0..=(1u64 << 16)).step_by(997) {
        let capacity = catalog.select(required).unwrap().capacity;
        assert!(capacity >= required);
        assert!(capacity >= previous, "larger requirements never select smaller files");
        previous = capacity;
    }
}

#[test]
fn test_scan_ignores_unrelated_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in [
        "powersOfTau28_hez_final_10.ptau",
        "powersOfTau28_hez_final_14.ptau",
        "README.md",
        "powersOfTau28_hez_final_xx.ptau",
        "powersOfTau28_hez_final_12.ptau.partial",
    ] {
        std::fs::write(dir.path().join(name), b"").unwrap();
    }

    let catalog = PtauCatalog::scan(dir.path()).unwrap();
    let exponents: Vec<u32> = catalog.entries().iter().map(|e| e.exponent).collect();
    assert_eq!(exponents, vec![10, 14]);
    assert_eq!(catalog.select(2_000).unwrap().exponent, 14);
}

#[test]
fn test_scan_missing_directory_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(PtauCatalog::scan(&dir.path().join("missing")).is_err());
}
