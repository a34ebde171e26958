//! This module defines the [`AggregateOpts`] configuration which controls how an aggregate sizes
//! its group pools and treats the flush latch.

use crate::pool::MAX_GROUPS;

/// Aggregate options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, typed_builder::TypedBuilder)]
pub struct AggregateOpts {
    /// Number of group identifiers in each leaf switch's pool. Must be in `1..=MAX_GROUPS`.
    #[builder(default = MAX_GROUPS)]
    pub group_capacity: u32,
    /// Clear a switch's flush latch whenever it reconnects.
    #[builder(default)]
    pub reset_flush_on_connect: bool,
}

impl Default for AggregateOpts {
    fn default() -> Self {
        Self::builder().build()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_keep_the_flush_latch() {
        let opts = AggregateOpts::default();
        assert_eq!(opts.group_capacity, 10);
        assert!(!opts.reset_flush_on_connect);
    }

    #[test]
    fn builder_overrides() {
        let opts = AggregateOpts::builder()
            .group_capacity(4)
            .reset_flush_on_connect(true)
            .build();
        assert_eq!(opts.group_capacity, 4);
        assert!(opts.reset_flush_on_connect);
    }
}
