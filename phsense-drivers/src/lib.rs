//! Hardware driver implementations
//!
//! Concrete implementations of the traits defined in phsense-core:
//!
//! - Analog pH probe front ends sampled through a 12-bit ADC

#![no_std]
#![deny(unsafe_code)]

pub mod sensor;
