use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use crate::Encoder;


/// Encoder returning a value set by the test
#[derive(Default)]
pub struct MockEncoder {
    value: AtomicI32,
    failing: AtomicBool,
}

impl MockEncoder {
    pub fn new(value: i32) -> Self {
        Self {
            value: AtomicI32::new(value),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set(&self, value: i32) {
        self.value.store(value, Ordering::SeqCst);
    }

    pub fn add(&self, delta: i32) {
        self.value.fetch_add(delta, Ordering::SeqCst);
    }

    /// Make subsequent reads fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockEncoderError;

impl Encoder<i32> for MockEncoder {
    type Error = MockEncoderError;

    fn get_value(&self) -> Result<i32, Self::Error> {
        if self.failing.load(Ordering::SeqCst) {
            Err(MockEncoderError)
        } else {
            Ok(self.value.load(Ordering::SeqCst))
        }
    }
}
