mod discovery_retry_policy;

pub use self::discovery_retry_policy::{
    ConstantDiscoveryRetryPolicy, DiscoveryRetryPolicy, ExponentialDiscoveryRetryPolicy,
    NeverDiscoveryRetryPolicy, RetrySchedule,
};
