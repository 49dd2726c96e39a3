// src/decoders/pump/mod.rs

pub mod bonding_curve;
