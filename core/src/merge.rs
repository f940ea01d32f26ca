//! Device list merger.
//!
//! Each range-oriented worker folds one list per scanned range into its
//! accumulator. Devices from the most recent range come first; within a
//! fold nothing is lost and nothing is duplicated. (The same physical
//! device showing up in two scanned ranges is not filtered — that is the
//! caller's address plan, not a merge artifact.)

use powerscan_common::device::DeviceList;

/// Folds a freshly returned list into the accumulator.
pub fn merge_devices(mut fresh: DeviceList, acc: DeviceList) -> DeviceList {
    if acc.is_empty() {
        return fresh;
    }
    if fresh.is_empty() {
        return acc;
    }
    fresh.extend(acc);
    fresh
}
