pub mod delivery;
pub mod notifier;
pub mod scheduler;

pub use delivery::{DeliveryService, DeliveryStats};
pub use notifier::{LogNotifier, Notifier, TelegramNotifier};
pub use scheduler::DeliveryScheduler;
