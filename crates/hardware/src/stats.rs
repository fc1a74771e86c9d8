//! Replay statistics collection and reporting.
//!
//! This module tracks what happened while a trace was replayed. It provides:
//! 1. **Demand behaviour:** Accesses, hits, misses and evictions of the cache model.
//! 2. **Prefetch outcome:** Candidates produced by the engines and what became of
//!    them (issued, redundant, dropped, useful, evicted unused).
//! 3. **Engine counters:** Stride predictions and spatial engine events.
//! 4. **Derived metrics:** Hit rate, prefetch accuracy and coverage.

use serde::Serialize;

use crate::core::units::prefetch::spatial::SpatialCounters;

/// Replay statistics.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PrefetchStats {
    /// Wall-clock time spent replaying, in seconds.
    pub host_seconds: f64,
    /// Accesses replayed.
    pub accesses: u64,
    /// Accesses without an instruction address (ignored by the engines).
    pub skipped_no_pc: u64,
    /// Demand hits.
    pub hits: u64,
    /// Demand misses.
    pub misses: u64,
    /// Demand misses that found their line already being filled.
    pub in_flight_hits: u64,
    /// Lines displaced from the cache.
    pub evictions: u64,

    /// Candidates returned by the dispatcher.
    pub candidates: u64,
    /// Candidates turned into fills.
    pub prefetches_issued: u64,
    /// Candidates whose line was already resident or in flight.
    pub prefetches_redundant: u64,
    /// Candidates discarded because the miss queue was full.
    pub prefetches_dropped: u64,
    /// Prefetched lines later touched by a demand access.
    pub prefetches_useful: u64,
    /// Prefetched lines evicted before any demand use.
    pub prefetches_unused_evicted: u64,

    /// Candidates emitted by the stride predictor.
    pub stride_predictions: u64,
    /// Spatial engine counters.
    pub spatial: SpatialCounters,
}

/// Section names for selective stats output.
///
/// Valid section identifiers: `"summary"`, `"cache"`, `"prefetch"`, `"engines"`.
/// Pass an empty slice to `print_sections` to print all sections.
pub const STATS_SECTIONS: &[&str] = &["summary", "cache", "prefetch", "engines"];

/// Ratio as a percentage; zero when the denominator is zero.
fn percent(num: u64, den: u64) -> f64 {
    if den == 0 {
        0.0
    } else {
        100.0 * num as f64 / den as f64
    }
}

impl PrefetchStats {
    /// Demand hit rate in percent.
    pub fn hit_rate(&self) -> f64 {
        percent(self.hits, self.accesses)
    }

    /// Share of issued prefetches that were used, in percent.
    pub fn accuracy(&self) -> f64 {
        percent(self.prefetches_useful, self.prefetches_issued)
    }

    /// Share of would-be misses removed by prefetching, in percent.
    pub fn coverage(&self) -> f64 {
        percent(self.prefetches_useful, self.prefetches_useful + self.misses)
    }

    /// Prints only the requested statistics sections to stdout.
    ///
    /// # Arguments
    ///
    /// * `sections` - Slice of section names to print, or empty for all.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        if want("summary") {
            let rate = if self.host_seconds > 0.0 {
                self.accesses as f64 / self.host_seconds / 1_000_000.0
            } else {
                0.0
            };
            println!("\n==========================================================");
            println!("PREFETCH SIMULATION STATISTICS");
            println!("==========================================================");
            println!("host_seconds             {:.4} s", self.host_seconds);
            println!("sim_accesses             {}", self.accesses);
            println!("sim_maps                 {rate:.2} M accesses/s");
            println!(
                "sim_skipped_no_pc        {} ({:.2}%)",
                self.skipped_no_pc,
                percent(self.skipped_no_pc, self.accesses)
            );
            println!("----------------------------------------------------------");
        }
        if want("cache") {
            println!("CACHE");
            println!("  hits                   {} ({:.2}%)", self.hits, self.hit_rate());
            println!(
                "  misses                 {} ({:.2}%)",
                self.misses,
                percent(self.misses, self.accesses)
            );
            println!("  misses.in_flight       {}", self.in_flight_hits);
            println!("  evictions              {}", self.evictions);
            println!("----------------------------------------------------------");
        }
        if want("prefetch") {
            println!("PREFETCH");
            println!("  candidates             {}", self.candidates);
            println!("  issued                 {}", self.prefetches_issued);
            println!("  redundant              {}", self.prefetches_redundant);
            println!("  dropped                {}", self.prefetches_dropped);
            println!("  useful                 {}", self.prefetches_useful);
            println!("  evicted_unused         {}", self.prefetches_unused_evicted);
            println!("  accuracy               {:.2}%", self.accuracy());
            println!("  coverage               {:.2}%", self.coverage());
            println!("----------------------------------------------------------");
        }
        if want("engines") {
            println!("ENGINES");
            println!("  stride.predictions     {}", self.stride_predictions);
            println!(
                "  spatial.filter_allocs  {}",
                self.spatial.filter_allocations
            );
            println!("  spatial.promotions     {}", self.spatial.promotions);
            println!(
                "  spatial.recorded       {}",
                self.spatial.accesses_since_trigger
            );
            println!(
                "  spatial.gen_ended      {}",
                self.spatial.generations_ended
            );
            println!("  spatial.pattern_hits   {}", self.spatial.pattern_hits);
        }
        println!("==========================================================");
    }

    /// Prints all statistics sections to stdout.
    ///
    /// Equivalent to `print_sections(&[])`.
    pub fn print(&self) {
        self.print_sections(&[]);
    }
}
