//! Spatial Pattern Engine Tests.
//!
//! Walks regions through the filter, active generation and pattern sequence
//! tables with a scripted residency oracle. All scenarios use 64-byte regions
//! of four 16-byte lines, so region `0x40` spans `0x1000..0x1040`.

use mockall::predicate::eq;
use pretty_assertions::assert_eq;
use smsim_core::common::error::ConfigError;
use smsim_core::core::units::prefetch::spatial::{GenerationEntry, SpatialCounters};
use smsim_core::core::units::prefetch::{AddrPriority, Prefetcher, SpatialPrefetcher};

use crate::common::builder::{access, access_no_pc, small_spatial};
use crate::common::init_tracing;
use crate::common::mocks::probe::MockProbe;
use crate::common::probe::ScriptedProbe;

const LINE: usize = 16;
const REGION: usize = 64;
const PC: u64 = 0x400;
const A: u64 = 0x40;
const B: u64 = 0x41;

fn engine() -> SpatialPrefetcher {
    SpatialPrefetcher::new(&small_spatial(REGION), LINE).unwrap()
}

fn active(pf: &SpatialPrefetcher, region: u64) -> Option<&GenerationEntry> {
    let table = pf.active_generation_table();
    table.find(region, false).map(|id| table.get(id))
}

fn pattern(pf: &SpatialPrefetcher, pc: u64) -> Option<&GenerationEntry> {
    let table = pf.pattern_sequence_table();
    table.find(pc, false).map(|id| table.get(id))
}

/// Feeds `addrs` with instruction `pc`, returning the last access's candidates.
fn feed(
    pf: &mut SpatialPrefetcher,
    probe: &ScriptedProbe,
    pc: u64,
    addrs: &[u64],
) -> Vec<AddrPriority> {
    let mut last = Vec::new();
    for &a in addrs {
        last = pf.observe(pc, &access(pc, a), probe).unwrap();
    }
    last
}

// ══════════════════════════════════════════════════════════
// 1. Construction
// ══════════════════════════════════════════════════════════

#[test]
fn region_size_must_be_power_of_two() {
    let mut config = small_spatial(REGION);
    config.region_size = 96;
    let err = SpatialPrefetcher::new(&config, LINE).unwrap_err();
    assert_eq!(err, ConfigError::RegionSizeNotPowerOfTwo(96));
}

#[test]
fn line_size_must_be_power_of_two() {
    let err = SpatialPrefetcher::new(&small_spatial(REGION), 24).unwrap_err();
    assert_eq!(err, ConfigError::LineSizeNotPowerOfTwo(24));
}

#[test]
fn region_must_hold_a_line() {
    let err = SpatialPrefetcher::new(&small_spatial(8), LINE).unwrap_err();
    assert_eq!(err, ConfigError::RegionSmallerThanLine { region: 8, line: 16 });
}

#[test]
fn fresh_engine_is_empty() {
    let pf = engine();
    assert_eq!(pf.region_size(), 64);
    assert!(pf.filter_table().is_empty());
    assert!(pf.active_generation_table().is_empty());
    assert!(pf.pattern_sequence_table().is_empty());
    assert!(pf.transitions().is_empty());
    assert_eq!(pf.prev_region(), 0);
    assert_eq!(pf.predicted_region(), None);
    assert_eq!(pf.counters(), SpatialCounters::default());
}

/// Accesses without a PC leave every table untouched.
#[test]
fn no_pc_is_ignored() {
    let mut pf = engine();
    let probe = MockProbe::new();
    let out = pf
        .calculate_prefetch(&access_no_pc(0x1000), 1, &probe)
        .unwrap();
    assert!(out.is_empty());
    assert!(pf.filter_table().is_empty());
    assert_eq!(pf.prev_region(), 0);
    assert_eq!(pf.name(), "spatial");
}

// ══════════════════════════════════════════════════════════
// 2. Filter and active generation tables
// ══════════════════════════════════════════════════════════

/// First touch fills the FT, second touch promotes, later touches record.
#[test]
fn region_lifecycle() {
    init_tracing();
    let mut pf = engine();
    let probe = ScriptedProbe::new(16);

    assert!(feed(&mut pf, &probe, PC, &[0x1000]).is_empty());
    assert!(pf.filter_table().find(A, false).is_some());
    assert!(active(&pf, A).is_none());
    assert_eq!(pf.transitions().len(), 1);
    assert_eq!(pf.prev_region(), A);

    let _ = feed(&mut pf, &probe, PC, &[0x1010]);
    let gen_a = active(&pf, A).unwrap();
    assert_eq!(gen_a.pc, PC);
    assert_eq!(gen_a.paddr, 0x1010);
    // The promoting access is the first recorded offset.
    assert_eq!(gen_a.recorded_offsets().collect::<Vec<_>>(), vec![1]);
    // The FT entry stays valid after promotion.
    assert!(pf.filter_table().find(A, false).is_some());

    let _ = feed(&mut pf, &probe, PC, &[0x1020, 0x1020]);
    let gen_a = active(&pf, A).unwrap();
    assert_eq!(gen_a.recorded_offsets().collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(gen_a.sequence[1].counter.value(), 2);

    assert_eq!(
        pf.counters(),
        SpatialCounters {
            accesses_since_trigger: 2,
            generations_ended: 0,
            pattern_hits: 0,
            promotions: 1,
            filter_allocations: 1,
        }
    );
    // A -> A counted on promotion and on both recorded accesses.
    assert_eq!(pf.transitions().successors(A).unwrap()[0].count, 3);
}

/// Secure and non-secure accesses to the same region are separate entries.
#[test]
fn security_domains_are_separate() {
    let mut pf = engine();
    let probe = ScriptedProbe::new(16);
    let _ = pf.observe(PC, &access(PC, 0x1000), &probe).unwrap();
    let _ = pf
        .observe(PC, &access(PC, 0x1010).with_secure(true), &probe)
        .unwrap();
    assert_eq!(pf.filter_table().len(), 2);
    assert_eq!(pf.counters().promotions, 0);
}

/// Every access to another region advances the interleaving count of live
/// generations, and the count is stamped on the next recorded offset.
#[test]
fn interleaving_is_stamped_on_offsets() {
    let mut pf = engine();
    let probe = ScriptedProbe::new(16);
    let _ = feed(&mut pf, &probe, PC, &[0x1000, 0x1010]);
    // A was promoted by a trigger access, so it counts that access too.
    assert_eq!(active(&pf, A).unwrap().seq_counter, 1);

    let _ = feed(&mut pf, &probe, PC, &[0x1040, 0x1050]);
    assert_eq!(active(&pf, A).unwrap().seq_counter, 3);
    assert_eq!(active(&pf, B).unwrap().seq_counter, 1);

    let _ = feed(&mut pf, &probe, PC, &[0x1020]);
    let gen_a = active(&pf, A).unwrap();
    assert_eq!(gen_a.seq_counter, 0);
    assert_eq!(gen_a.sequence[1].offset, 2);
    assert_eq!(gen_a.sequence[1].delta, 3);
    assert_eq!(active(&pf, B).unwrap().seq_counter, 2);
}

// ══════════════════════════════════════════════════════════
// 3. Generation end
// ══════════════════════════════════════════════════════════

/// While every recorded line stays resident nothing migrates.
#[test]
fn resident_generation_stays_active() {
    let mut pf = engine();
    let probe = MockProbe::all_resident();
    for a in [0x1000, 0x1010, 0x1020, 0x1030, 0x1000, 0x1010] {
        let _ = pf.observe(PC, &access(PC, a), &probe).unwrap();
    }
    assert_eq!(pf.counters().generations_ended, 0);
    assert!(pf.pattern_sequence_table().is_empty());
    assert_eq!(
        active(&pf, A).unwrap().recorded_offsets().collect::<Vec<_>>(),
        vec![1, 2, 3, 0]
    );
}

/// The sweep probes each recorded line at the region-aligned base plus offset.
#[test]
fn sweep_probes_recorded_lines() {
    let mut pf = engine();
    let mut probe = MockProbe::new();
    let _ = probe
        .expect_resident()
        .with(eq(0x1010_u64), eq(false))
        .times(1)
        .return_const(true);
    let _ = probe.expect_in_flight().never();

    // Nothing is active during the first two sweeps.
    for a in [0x1000, 0x1010, 0x1020] {
        let _ = pf.observe(PC, &access(PC, a), &probe).unwrap();
    }
}

/// A recorded line that is gone but still being filled keeps the generation.
#[test]
fn in_flight_line_keeps_generation() {
    let mut pf = engine();
    let mut probe = ScriptedProbe::new(16);
    let _ = feed(&mut pf, &probe, PC, &[0x1000, 0x1010, 0x1020]);
    probe.evict(0x1010, false);
    probe.start_fill(0x1010, false);
    let _ = feed(&mut pf, &probe, PC, &[0x1030]);
    assert_eq!(pf.counters().generations_ended, 0);
    assert!(active(&pf, A).is_some());
}

/// Losing one recorded line migrates the generation to the PST under its PC.
#[test]
fn eviction_ends_generation() {
    init_tracing();
    let mut pf = engine();
    let mut probe = ScriptedProbe::new(16);
    let _ = feed(&mut pf, &probe, PC, &[0x1000, 0x1010, 0x1020]);
    assert!(pf.pattern_sequence_table().is_empty());

    probe.evict(0x1010, false);
    // Access another region so the old one is not re-promoted.
    let out = feed(&mut pf, &probe, 0x500, &[0x4000]);
    assert!(out.is_empty());

    assert_eq!(pf.counters().generations_ended, 1);
    assert!(active(&pf, A).is_none());
    let stored = pattern(&pf, PC).unwrap();
    assert_eq!(stored.pc, PC);
    assert_eq!(stored.paddr, 0x1010);
    assert_eq!(stored.recorded_offsets().collect::<Vec<_>>(), vec![1, 2]);
    // The PST is keyed by PC, not by region.
    assert!(pf.pattern_sequence_table().find(A, false).is_none());

    // The next sweep finds nothing left to migrate.
    let _ = feed(&mut pf, &probe, 0x500, &[0x4000]);
    assert_eq!(pf.counters().generations_ended, 1);
}

/// A later generation from the same PC overwrites the stored pattern.
#[test]
fn same_pc_overwrites_pattern() {
    let mut pf = engine();
    let mut probe = ScriptedProbe::new(16);
    let _ = feed(&mut pf, &probe, PC, &[0x1000, 0x1010]);
    probe.evict(0x1010, false);
    let _ = feed(&mut pf, &probe, PC, &[0x2000, 0x2030, 0x2020]);
    assert_eq!(pf.counters().generations_ended, 1);

    probe.evict(0x2020, false);
    let _ = feed(&mut pf, &probe, 0x500, &[0x4000]);
    assert_eq!(pf.counters().generations_ended, 2);
    assert_eq!(pf.pattern_sequence_table().len(), 1);
    let stored = pattern(&pf, PC).unwrap();
    assert_eq!(stored.paddr, 0x2030);
    assert_eq!(stored.recorded_offsets().collect::<Vec<_>>(), vec![3, 2]);
}

/// Generation tracking follows the physical address of the access.
#[test]
fn generation_end_uses_physical_address() {
    let mut pf = engine();
    let mut probe = ScriptedProbe::new(16);
    for (va, pa) in [(0x1000, 0x9000), (0x1010, 0x9010)] {
        let a = access(PC, va).with_paddr(pa);
        let _ = pf.observe(PC, &a, &probe).unwrap();
    }
    assert_eq!(active(&pf, A).unwrap().paddr, 0x9010);

    probe.evict(0x1010, false);
    let _ = feed(&mut pf, &probe, 0x500, &[0x4000]);
    assert_eq!(pf.counters().generations_ended, 0);

    probe.evict(0x9010, false);
    let _ = feed(&mut pf, &probe, 0x500, &[0x4000]);
    assert_eq!(pf.counters().generations_ended, 1);
}

// ══════════════════════════════════════════════════════════
// 4. Pattern reuse and region prediction
// ══════════════════════════════════════════════════════════

/// A trigger whose region matches a stored key emits the stored address.
#[test]
fn pattern_hit_emits_stored_address() {
    let mut pf = engine();
    let mut probe = ScriptedProbe::new(16);
    // The generation of region A is stored under instruction 0x80, which is
    // also the region number of 0x2000.
    let _ = feed(&mut pf, &probe, 0x80, &[0x1000, 0x1010, 0x1020]);
    probe.evict(0x1020, false);

    let out = feed(&mut pf, &probe, 0x80, &[0x2000]);
    assert_eq!(out, vec![AddrPriority::new(0x1010, 0)]);
    assert_eq!(pf.counters().pattern_hits, 1);
    assert_eq!(pf.counters().generations_ended, 1);
    // A pattern hit allocates nothing.
    assert!(pf.filter_table().find(0x80, false).is_none());
}

/// Triggers record the Markov prediction for the previous region.
#[test]
fn trigger_predicts_next_region() {
    let mut pf = engine();
    let probe = ScriptedProbe::new(16);
    let _ = feed(&mut pf, &probe, PC, &[0x1000, 0x1010]);
    // A's only successor so far is A itself.
    assert_eq!(pf.transitions().predict(A), Some(A));

    let _ = feed(&mut pf, &probe, PC, &[0x1040]);
    assert_eq!(pf.predicted_region(), Some(A));
    assert_eq!(pf.prev_region(), B);

    // B has an entry but no successors yet.
    let _ = feed(&mut pf, &probe, PC, &[0x2000]);
    assert_eq!(pf.predicted_region(), None);
}

/// Re-allocating a filter entry clears the region's stale transitions.
#[test]
fn filter_allocation_resets_transitions() {
    let mut pf = engine();
    let mut probe = ScriptedProbe::new(16);
    let _ = feed(&mut pf, &probe, PC, &[0x1000, 0x1010, 0x1020]);
    assert!(pf.transitions().predict(A).is_some());

    // Flood the 8-entry FT so region A is evicted, then touch A again.
    let flood: Vec<u64> = (1..=8).map(|i| 0x1000 + i * 0x1000).collect();
    let _ = feed(&mut pf, &probe, PC, &flood);
    assert!(pf.filter_table().find(A, false).is_none());

    // End A's generation so the next touch is a trigger.
    probe.evict(0x1010, false);
    let _ = feed(&mut pf, &probe, PC, &[0x1000]);
    assert!(active(&pf, A).is_none());
    assert!(pf.filter_table().find(A, false).is_some());
    assert_eq!(pf.transitions().successors(A), Some(&[][..]));
    // The cleared slot is reused rather than duplicated.
    assert_eq!(pf.transitions().entries()[0].region, A);
    assert_eq!(pf.transitions().len(), 9);
}

/// Cycling more regions than the filter holds keeps one Markov slot per
/// region instead of one per allocation.
#[test]
fn filter_thrashing_keeps_transitions_bounded() {
    let mut pf = engine();
    let probe = ScriptedProbe::new(16);
    let regions: Vec<u64> = (0..9u64).map(|i| 0x1000 + i * 0x1000).collect();
    for _ in 0..200 {
        let _ = feed(&mut pf, &probe, PC, &regions);
    }
    assert_eq!(pf.counters().filter_allocations, 1800);
    assert_eq!(pf.transitions().len(), 9);
    assert!(pf.transitions().entries().iter().all(|e| e.region != 0));
}
