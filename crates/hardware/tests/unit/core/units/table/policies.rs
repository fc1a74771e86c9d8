//! Replacement Policy Tests.
//!
//! Drives each policy directly through the `ReplacementPolicy` trait with a
//! single 4-way set and checks which way it names as victim.

use rstest::rstest;
use smsim_core::config::ReplacementPolicy as PolicyType;
use smsim_core::core::units::table::policies::{
    self, FifoPolicy, LruPolicy, MruPolicy, PlruPolicy, RandomPolicy, ReplacementPolicy,
};

/// Fills ways 0..4 in order.
fn filled<P: ReplacementPolicy>(mut p: P) -> P {
    for way in 0..4 {
        p.reset(0, way);
    }
    p
}

// ══════════════════════════════════════════════════════════
// 1. LRU
// ══════════════════════════════════════════════════════════

/// The oldest insertion is the LRU victim.
#[test]
fn lru_evicts_oldest() {
    let mut p = filled(LruPolicy::new(1, 4));
    assert_eq!(p.victim(0), 0);
}

/// Touching a way protects it.
#[test]
fn lru_touch_protects() {
    let mut p = filled(LruPolicy::new(1, 4));
    p.touch(0, 0);
    assert_eq!(p.victim(0), 1);
}

/// An invalidated way becomes the next victim.
#[test]
fn lru_invalidated_way_first() {
    let mut p = filled(LruPolicy::new(1, 4));
    p.invalidate(0, 2);
    assert_eq!(p.victim(0), 2);
}

// ══════════════════════════════════════════════════════════
// 2. FIFO
// ══════════════════════════════════════════════════════════

/// Accesses do not change FIFO order.
#[test]
fn fifo_ignores_touch() {
    let mut p = filled(FifoPolicy::new(1, 4));
    p.touch(0, 0);
    p.touch(0, 0);
    assert_eq!(p.victim(0), 0);
    p.reset(0, 0);
    assert_eq!(p.victim(0), 1);
}

// ══════════════════════════════════════════════════════════
// 3. MRU
// ══════════════════════════════════════════════════════════

/// The most recently used way is evicted.
#[test]
fn mru_evicts_newest() {
    let mut p = filled(MruPolicy::new(1, 4));
    assert_eq!(p.victim(0), 3);
    p.touch(0, 1);
    assert_eq!(p.victim(0), 1);
}

/// Freed ways are refilled before anything is evicted.
#[test]
fn mru_prefers_freed_way() {
    let mut p = filled(MruPolicy::new(1, 4));
    p.invalidate(0, 2);
    assert_eq!(p.victim(0), 2);
    p.reset(0, 2);
    assert_eq!(p.victim(0), 2, "refilled way is now the most recent");
}

// ══════════════════════════════════════════════════════════
// 4. PLRU
// ══════════════════════════════════════════════════════════

/// The first way without a recently-used bit is evicted.
#[test]
fn plru_first_clear_bit() {
    let mut p = PlruPolicy::new(1, 4);
    p.touch(0, 0);
    p.touch(0, 1);
    assert_eq!(p.victim(0), 2);
}

/// Setting the last clear bit resets the set to the touched way.
#[test]
fn plru_saturation_resets() {
    let mut p = filled(PlruPolicy::new(1, 4));
    assert_eq!(p.victim(0), 0);
}

// ══════════════════════════════════════════════════════════
// 5. Random and factory
// ══════════════════════════════════════════════════════════

/// Random victims are in range and reproducible.
#[test]
fn random_deterministic() {
    let mut a = RandomPolicy::new(1, 4);
    let mut b = RandomPolicy::new(1, 4);
    for _ in 0..32 {
        let v = a.victim(0);
        assert!(v < 4);
        assert_eq!(v, b.victim(0));
    }
}

/// The factory builds a working policy for every variant.
#[rstest]
#[case(PolicyType::Lru)]
#[case(PolicyType::Plru)]
#[case(PolicyType::Fifo)]
#[case(PolicyType::Random)]
#[case(PolicyType::Mru)]
fn factory_builds_every_policy(#[case] kind: PolicyType) {
    let mut p = policies::build(kind, 2, 4);
    for way in 0..4 {
        p.reset(1, way);
    }
    assert!(p.victim(1) < 4);
}
