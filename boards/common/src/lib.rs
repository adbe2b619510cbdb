//! Common elements shared by all boards
#[cfg(not(target_os = "espidf"))]
pub mod mock;

use std::sync::Arc;


/// Generic encoder, fetch a value of given type
pub trait Encoder<T> {
    type Error: core::fmt::Debug;

    /// Get encoded value
    fn get_value(&self) -> Result<T, Self::Error>;
}

// Allow sharing one encoder between the command handler and the control loop
impl<T, E: Encoder<T> + ?Sized> Encoder<T> for Arc<E> {
    type Error = E::Error;

    fn get_value(&self) -> Result<T, Self::Error> {
        (**self).get_value()
    }
}

impl<T, E: Encoder<T> + ?Sized> Encoder<T> for &E {
    type Error = E::Error;

    fn get_value(&self) -> Result<T, Self::Error> {
        (**self).get_value()
    }
}
