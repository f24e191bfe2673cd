#![allow(dead_code)]

pub mod env;
pub mod stub_remote;
