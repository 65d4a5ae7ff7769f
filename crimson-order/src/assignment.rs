use crimson_core::account::Staff;
use rand::seq::SliceRandom;

/// Fulfillment assignment policy: uniform random over all staff on record.
///
/// No workload balancing and no active/inactive filtering; the business has
/// not specified either, so the policy stays a single swap point here.
#[derive(Debug, Default)]
pub struct StaffAssigner;

impl StaffAssigner {
    pub fn new() -> Self {
        StaffAssigner
    }

    pub fn assign<'a>(&self, staff: &'a [Staff]) -> Option<&'a Staff> {
        staff.choose(&mut rand::thread_rng())
    }
}
