use core::num::NonZeroUsize;

use derivative::Derivative;
use nonzero_ext::nonzero;
use serde::Deserialize;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Deserialize, Derivative)]
#[derivative(Default)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// Maximum number of `(block, slot)` ancestor lookups kept between fork choice runs.
    #[derivative(Default(value = "nonzero!(8192_usize)"))]
    pub ancestor_cache_size: NonZeroUsize,
}
