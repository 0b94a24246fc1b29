pub mod journal;
pub mod logging;
pub mod telegram;

pub use journal::{JournalError, JournalWriter};
pub use telegram::{Notifier, NotifyError, NotifyOutcome, TelegramNotifier};
