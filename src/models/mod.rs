pub mod config;
pub mod language;
pub mod observable;

pub use config::BindingConfig;
pub use language::{LanguageType, LanguageUnit};
pub use observable::{
    ChangeEvent, ChangeObserver, Channel, ChannelObserver, CollectionAction, ErrorReporter,
    FnObserver, ObservableObject, SubscriptionId,
};
