//! Time source seam.
//!
//! Library code never reads the global embassy clock directly; it asks a
//! [`Clock`]. Firmware uses [`SystemClock`], tests substitute a fake.

use embassy_time::Instant;

/// Something that knows the current time.
pub trait Clock {
    fn now(&self) -> Instant;
}

impl<K: Clock + ?Sized> Clock for &K {
    fn now(&self) -> Instant {
        (**self).now()
    }
}

/// The embassy time driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

#[cfg(test)]
pub(crate) mod fake {
    use core::cell::Cell;

    use embassy_time::{Duration, Instant};
    use embedded_hal_async::delay::DelayNs;

    use super::Clock;

    /// Manually advanced clock.
    #[derive(Debug, Default)]
    pub struct FakeClock {
        micros: Cell<u64>,
    }

    impl FakeClock {
        pub fn at_millis(ms: u64) -> Self {
            Self {
                micros: Cell::new(ms * 1_000),
            }
        }

        pub fn advance(&self, by: Duration) {
            self.micros.set(self.micros.get() + by.as_micros());
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            Instant::from_micros(self.micros.get())
        }
    }

    /// Delay that only moves a [`FakeClock`] forward.
    pub struct FakeDelay<'a> {
        pub clock: &'a FakeClock,
    }

    impl DelayNs for FakeDelay<'_> {
        async fn delay_ns(&mut self, ns: u32) {
            self.clock
                .advance(Duration::from_micros(u64::from(ns).div_ceil(1_000)));
        }
    }
}
