//! System-on-chip tests: physical memory and devices.
