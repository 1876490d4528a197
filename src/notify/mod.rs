pub mod markup;
pub mod notifier;
pub mod telegram;
