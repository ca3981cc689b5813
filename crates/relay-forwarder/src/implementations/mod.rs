mod custom;
mod minimal;
mod native_holder;
mod standard;

pub use custom::CustomWallet;
pub use minimal::MinimalWallet;
pub use native_holder::NativeHolderWallet;
pub use standard::StandardWallet;
