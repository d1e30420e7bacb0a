use crate::utils::time_utils::current_timestamp;

/**
 * Just count the amount of times comment and reply
 * posting endpoints are being called per unit of time,
 * and block them entirely for a specific "block time"
 * when the max amount is reached.
 */
pub struct BasicRateLimiter {
  counter: u32,
  last_update: i64,
  is_limited: bool,
  max_requests: u32,
  max_requests_time: u32,
  block_duration: u32
}

impl BasicRateLimiter {

  pub fn new(
    max_requests: u32,
    max_requests_time: u32,
    block_duration: u32
  ) -> Self {
    Self {
      counter: 0,
      last_update: current_timestamp(),
      is_limited: false,
      max_requests,
      max_requests_time,
      block_duration
    }
  }

  pub fn is_locked(&self) -> bool {
    self.is_limited
  }

  // If currently locked, check if past block_duration.
  // Check if past max_request_time otherwise.
  fn is_expired_at(&self, now: i64) -> bool {
    if self.is_locked() {
      now - self.last_update >= self.block_duration.into()
    } else {
      now - self.last_update >= self.max_requests_time.into()
    }
  }

  // Counts one request, returns true if the caller
  // has to be turned away.
  pub fn update(&mut self) -> bool {
    self.update_at(current_timestamp())
  }

  fn update_at(&mut self, now: i64) -> bool {
    if self.is_expired_at(now) {
      // Reset:
      self.counter = 1;
      self.last_update = now;
      self.is_limited = false;
    } else if !self.is_limited {
      self.counter += 1;
      // Are we above the rate limit?
      if self.counter > self.max_requests {
        self.is_limited = true;
        // Reset last_update:
        self.last_update = now;
      }
    }
    self.is_limited
  }

}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn locks_after_max_requests() {
    let mut sut = BasicRateLimiter::new(3, 60, 60);
    let now = sut.last_update;
    assert!(!sut.update_at(now));
    assert!(!sut.update_at(now));
    assert!(!sut.update_at(now));
    assert!(sut.update_at(now + 1));
    assert!(sut.is_locked());
  }

  #[test]
  fn lock_expires_after_block_duration() {
    let mut sut = BasicRateLimiter::new(1, 60, 30);
    let now = sut.last_update;
    sut.update_at(now);
    assert!(sut.update_at(now));
    assert!(sut.update_at(now + 29));
    assert!(!sut.update_at(now + 30));
  }

  #[test]
  fn counter_resets_after_time_window() {
    let mut sut = BasicRateLimiter::new(2, 10, 60);
    let now = sut.last_update;
    sut.update_at(now);
    sut.update_at(now + 1);
    // The window is over, we start counting again.
    assert!(!sut.update_at(now + 10));
    assert!(!sut.update_at(now + 11));
  }
}
