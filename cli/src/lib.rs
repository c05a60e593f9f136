//! CLI utilities for namecast.
//!
//! Context-based configuration, directory layout, input loading and output
//! rendering shared by the command line tools.

pub mod config;
pub mod input;
pub mod output;
pub mod paths;

pub use config::{Config, Context, ProviderCredentials, load_config, mask_api_key};
pub use input::{InputError, load_document, load_recording, parse_document};
pub use output::{Output, OutputFormat, extension_for_mime};
pub use paths::Paths;
