use std::{fmt::Display, ops::Deref};

#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Percentage(f64);

impl Display for Percentage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}%", self.0.floor())
    }
}

impl Percentage {
    pub fn new_opt(value: f64) -> Option<Percentage> {
        if value < 0. || value.is_nan() {
            None
        } else {
            Some(Percentage(value))
        }
    }
}

impl Deref for Percentage {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Share of `value` in `whole`. An empty whole yields 0%.
pub fn share_percentage(value_ms: u64, whole_ms: u64) -> Percentage {
    if whole_ms == 0 {
        return Percentage(0.);
    }
    Percentage::new_opt(value_ms as f64 / whole_ms as f64 * 100.).unwrap_or(Percentage(0.))
}
