pub mod content_provider;
pub mod mastery;
pub mod notifier;
pub mod risk;
