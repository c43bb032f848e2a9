mod remote;
mod resolve;
mod vendor;

pub use remote::CranIndex;
pub use resolve::{ensure_all_resolvable, resolve_sources};
pub use vendor::{scan_vendor_dir, VENDOR_DIR_NAME};

#[cfg(test)]
mod tests;
