//! Test suites for the lab controller daemon.

mod behaviour;
mod support;
