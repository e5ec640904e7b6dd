//! Build configuration
//!
//! The backing region is chosen at compile time through cargo features:
//!
//! ```bash
//! # Global heap (default - hosts and CI)
//! cargo build
//!
//! # Board-supplied secondary bank
//! cargo build --features external
//! ```

use crate::{DefaultRegion, Region};

/// Detect which region backs [`DefaultRegion`] at compile time
pub fn region_mode() -> &'static str {
    DefaultRegion::NAME
}

/// Check if the board's external region is the default
pub const fn is_external() -> bool {
    cfg!(feature = "external")
}

/// Check if the instrumented mock region is compiled in
pub const fn is_mock() -> bool {
    cfg!(any(test, feature = "mock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_mode_detection() {
        let mode = region_mode();
        assert!(mode == "system" || mode == "external");
        assert_eq!(mode == "external", is_external());
    }

    #[test]
    fn test_mock_available_in_tests() {
        assert!(is_mock());
    }
}
