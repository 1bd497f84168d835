use std::time::{Duration, Instant};

/// Digits typed ahead of a "go to slide" key. Forgotten after a pause.
#[derive(Debug)]
pub struct SlideNumberInput {
    digits: String,
    last_key_time: Instant,
    timeout: Duration,
}

impl Default for SlideNumberInput {
    fn default() -> Self {
        Self::new()
    }
}

impl SlideNumberInput {
    /// Longest number accepted; more digits than any deck could need
    const MAX_DIGITS: usize = 6;

    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(2))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            digits: String::new(),
            last_key_time: Instant::now(),
            timeout,
        }
    }

    /// Append a digit. Returns false (and ignores the key) for anything else.
    pub fn push(&mut self, c: char) -> bool {
        if !c.is_ascii_digit() {
            return false;
        }
        self.check_timeout();
        if self.digits.len() < Self::MAX_DIGITS {
            self.digits.push(c);
        }
        self.last_key_time = Instant::now();
        true
    }

    /// The typed 1-based slide number as a 0-based index, clearing the input.
    /// `None` when nothing (or only zeros) was typed.
    pub fn take(&mut self) -> Option<usize> {
        let expired = self.is_expired();
        let digits = std::mem::take(&mut self.digits);
        if expired {
            return None;
        }
        digits.parse::<usize>().ok()?.checked_sub(1)
    }

    pub fn pending(&self) -> &str {
        if self.is_expired() { "" } else { &self.digits }
    }

    pub fn is_empty(&self) -> bool {
        self.pending().is_empty()
    }

    pub fn is_expired(&self) -> bool {
        self.digits.is_empty() || self.last_key_time.elapsed() > self.timeout
    }

    pub fn clear(&mut self) {
        self.digits.clear();
    }

    fn check_timeout(&mut self) {
        if !self.digits.is_empty() && self.last_key_time.elapsed() > self.timeout {
            self.digits.clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn digits_become_zero_based_index() {
        let mut input = SlideNumberInput::new();
        assert!(input.push('1'));
        assert!(input.push('2'));
        assert_eq!(input.pending(), "12");

        assert_eq!(input.take(), Some(11));
        assert!(input.is_empty());
        assert_eq!(input.take(), None);
    }

    #[test]
    fn non_digits_are_rejected() {
        let mut input = SlideNumberInput::new();
        assert!(!input.push('g'));
        assert!(input.is_empty());
    }

    #[test]
    fn zero_is_not_a_slide() {
        let mut input = SlideNumberInput::new();
        input.push('0');
        assert_eq!(input.take(), None);
    }

    #[test]
    fn long_input_is_capped() {
        let mut input = SlideNumberInput::new();
        for _ in 0..10 {
            input.push('9');
        }
        assert_eq!(input.take(), Some(999_998));
    }

    #[test]
    fn timeout_forgets_digits() {
        let mut input = SlideNumberInput::with_timeout(Duration::from_millis(10));
        input.push('3');
        std::thread::sleep(Duration::from_millis(20));

        assert!(input.is_expired());
        assert_eq!(input.pending(), "");
        assert_eq!(input.take(), None);

        input.push('4');
        assert_eq!(input.take(), Some(3));
    }
}
