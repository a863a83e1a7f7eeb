use crate::model::TargetStatus;

/// Map the raw outcome of a probe to a status.
///
/// A non-empty error always wins. Otherwise 5xx is `Down`, 4xx is `Degraded`,
/// 2xx is `Up` and anything else, including the `0` "no response" code, is
/// `Unknown`.
pub fn classify(error: &str, status_code: u16) -> TargetStatus {
    if !error.is_empty() {
        return TargetStatus::Down;
    }

    match status_code {
        500.. => TargetStatus::Down,
        400..=499 => TargetStatus::Degraded,
        200..=299 => TargetStatus::Up,
        _ => TargetStatus::Unknown,
    }
}
