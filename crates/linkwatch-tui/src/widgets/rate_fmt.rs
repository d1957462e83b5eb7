//! Compact rate and utilization formatting for the sidebar.

/// Bits per second as "245.0M", "1.2G", "880K", "12b".
pub fn fmt_rate_short(bps: f64) -> String {
    if bps >= 1e9 {
        format!("{:.1}G", bps / 1e9)
    } else if bps >= 1e6 {
        format!("{:.1}M", bps / 1e6)
    } else if bps >= 1e3 {
        format!("{:.0}K", bps / 1e3)
    } else {
        format!("{bps:.0}b")
    }
}

/// Utilization as a whole percentage; `--` when capacity is unknown.
pub fn fmt_util(utilization: Option<f64>) -> String {
    utilization.map_or_else(|| "--".into(), |u| format!("{:.0}%", u * 100.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_pick_a_unit() {
        assert_eq!(fmt_rate_short(0.0), "0b");
        assert_eq!(fmt_rate_short(880_000.0), "880K");
        assert_eq!(fmt_rate_short(245_000_000.0), "245.0M");
        assert_eq!(fmt_rate_short(1_200_000_000.0), "1.2G");
    }

    #[test]
    fn unknown_utilization_is_dashed() {
        assert_eq!(fmt_util(None), "--");
        assert_eq!(fmt_util(Some(0.456)), "46%");
    }
}
