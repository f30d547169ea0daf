pub mod content;
pub mod engagement;
pub mod mastery;
pub mod notifications;
pub mod practice;
pub mod profiles;
pub mod risk;
