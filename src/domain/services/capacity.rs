/// Admission decision for a new RSVP request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Accept,
    Waitlist,
}

/// Pure and total: no capacity means always accept, otherwise accept while
/// the confirmed count is below capacity.
pub fn evaluate(max_capacity: Option<i32>, confirmed_count: i64) -> Decision {
    match max_capacity {
        None => Decision::Accept,
        Some(cap) if confirmed_count < cap as i64 => Decision::Accept,
        Some(_) => Decision::Waitlist,
    }
}
