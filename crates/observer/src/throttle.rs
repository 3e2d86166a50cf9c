/// Gates a `during`-phase writer so it fires at most once per
/// `writing_period` simulation-time units, rather than on every single
/// event. A period of `0.0` means "write on every call".
#[derive(Debug, Clone, Default)]
pub struct Throttle {
    period: f64,
    last_floor: Option<i64>,
}

impl Throttle {
    /// A throttle gated to `period` time units; non-positive periods
    /// write unconditionally.
    pub fn new(period: f64) -> Self {
        Self { period, last_floor: None }
    }

    /// Whether a writer gated by this throttle should fire at `time`.
    /// Advances internal state as a side effect of a `true` answer, so
    /// each instant is only accepted once.
    pub fn should_write(&mut self, time: f64) -> bool {
        let period = self.period as i64;
        if period <= 0 {
            return true;
        }
        let floor_t = time.floor() as i64;
        if floor_t % period != 0 {
            return false;
        }
        if self.last_floor == Some(floor_t) {
            return false;
        }
        self.last_floor = Some(floor_t);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_period_always_writes() {
        let mut t = Throttle::new(0.0);
        assert!(t.should_write(0.3));
        assert!(t.should_write(0.3));
    }

    #[test]
    fn period_gates_repeated_instants_in_the_same_floor() {
        let mut t = Throttle::new(5.0);
        assert!(t.should_write(10.2));
        assert!(!t.should_write(10.7));
        assert!(!t.should_write(12.0));
        assert!(t.should_write(15.0));
    }
}
