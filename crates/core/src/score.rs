use crate::verify::{Family, Verdict};
use serde::{Deserialize, Serialize};

/// Pass/fail tally for one operation family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FamilyScore {
    pub family: Family,
    pub passed: u32,
    pub failed: u32,
    pub total: u32,
}

impl FamilyScore {
    pub fn new(family: Family) -> Self {
        Self {
            family,
            passed: 0,
            failed: 0,
            total: 0,
        }
    }

    pub fn record(&mut self, verdict: &Verdict) {
        if verdict.passed {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
        self.total += 1;
    }

    /// `max * passed / total`, rounded down.
    pub fn points(&self, max: u32) -> u32 {
        if self.total == 0 {
            return 0;
        }
        (u64::from(max) * u64::from(self.passed) / u64::from(self.total)) as u32
    }
}

/// Combined result of both families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinalScore {
    pub swap: FamilyScore,
    pub sort: FamilyScore,
    pub swap_points: u32,
    pub swap_points_max: u32,
    pub sort_points: u32,
    pub sort_points_max: u32,
}

impl FinalScore {
    pub fn new(swap: FamilyScore, sort: FamilyScore, swap_points_max: u32, sort_points_max: u32) -> Self {
        Self {
            swap,
            sort,
            swap_points: swap.points(swap_points_max),
            swap_points_max,
            sort_points: sort.points(sort_points_max),
            sort_points_max,
        }
    }

    pub fn points(&self) -> u32 {
        self.swap_points + self.sort_points
    }

    pub fn passed(&self) -> u32 {
        self.swap.passed + self.sort.passed
    }

    pub fn failed(&self) -> u32 {
        self.swap.failed + self.sort.failed
    }

    pub fn total(&self) -> u32 {
        self.swap.total + self.sort.total
    }
}
