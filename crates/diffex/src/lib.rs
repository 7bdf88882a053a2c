//! Pull placeholder values out of text that was rendered from a template.
//!
//! ```
//! use diffex::{Options, Template};
//!
//! let template = Template::new("Hello, {{name}}", Options::default()).unwrap();
//! let values = template.parse("Hello, Bob");
//! assert_eq!(values.get("name").map(String::as_str), Some("Bob"));
//! ```

pub mod cli;
pub mod error;
pub mod template;

pub use error::{Error, Result};
pub use template::{parse_opt, Options, Template};
