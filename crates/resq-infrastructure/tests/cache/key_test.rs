//! Cache Key Tests

use resq_infrastructure::cache::{CacheKey, estimate_size};
use serde::Serialize;

#[derive(Serialize)]
struct Filters {
    city: &'static str,
    max_price: u32,
}

#[test]
fn test_namespaced_key() {
    assert_eq!(CacheKey::namespaced("ns", "key"), "ns:key");
}

#[test]
fn test_key_for_equal_args_is_stable() {
    let a = CacheKey::for_args(
        "properties",
        "list",
        &Filters {
            city: "Lisbon",
            max_price: 900,
        },
    )
    .unwrap();
    let b = CacheKey::for_args(
        "properties",
        "list",
        &Filters {
            city: "Lisbon",
            max_price: 900,
        },
    )
    .unwrap();
    let other = CacheKey::for_args(
        "properties",
        "list",
        &Filters {
            city: "Porto",
            max_price: 900,
        },
    )
    .unwrap();

    assert_eq!(a, b);
    assert_ne!(a, other);
    assert!(a.starts_with("properties:list:"));
}

#[test]
fn test_estimate_size_uses_json_length() {
    assert_eq!(estimate_size("abc").unwrap(), 5);
    assert_eq!(estimate_size(&vec![1, 2, 3]).unwrap(), 7);
}
