//! Normalized time of day

/// Time of day in `[0, 1)`, where one unit is a full simulated day
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DayClock {
    time_of_day: f32,
    day_length_secs: f32,
    days_elapsed: u32,
}

impl DayClock {
    pub fn new(day_length_secs: f32) -> Self {
        Self {
            time_of_day: 0.0,
            day_length_secs,
            days_elapsed: 0,
        }
    }

    /// Starts the clock at a given fraction of the day
    pub fn starting_at(day_length_secs: f32, time_of_day: f32) -> Self {
        Self {
            time_of_day: time_of_day.rem_euclid(1.0),
            ..Self::new(day_length_secs)
        }
    }

    pub fn advance(&mut self, delta_secs: f32) {
        self.time_of_day += delta_secs / self.day_length_secs;
        while self.time_of_day >= 1.0 {
            self.time_of_day -= 1.0;
            self.days_elapsed += 1;
        }
    }

    pub fn time_of_day(&self) -> f32 {
        self.time_of_day
    }

    pub fn days_elapsed(&self) -> u32 {
        self.days_elapsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clock_wraps_and_counts_days() {
        let mut clock = DayClock::new(10.0);
        clock.advance(5.0);
        assert!((clock.time_of_day() - 0.5).abs() < 1e-6);
        clock.advance(7.5);
        assert!((clock.time_of_day() - 0.25).abs() < 1e-6);
        assert_eq!(clock.days_elapsed(), 1);
    }

    #[test]
    fn long_steps_skip_whole_days() {
        let mut clock = DayClock::starting_at(1.0, 0.5);
        clock.advance(2.25);
        assert_eq!(clock.days_elapsed(), 2);
        assert!((clock.time_of_day() - 0.75).abs() < 1e-5);
    }
}
