mod subscribers;

pub use subscribers::{Callback, SubscriptionId, Subscribers};
