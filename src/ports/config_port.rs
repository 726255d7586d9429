//! Configuration access port trait.
//!
//! Missing keys read as `Ok(None)`; a present value that does not parse as
//! the requested type is an error rather than a silent default.

use crate::domain::error::MtfError;

pub trait ConfigPort {
    fn get_string(&self, section: &str, key: &str) -> Option<String>;
    fn get_int(&self, section: &str, key: &str) -> Result<Option<i64>, MtfError>;
    fn get_double(&self, section: &str, key: &str) -> Result<Option<f64>, MtfError>;
    fn get_bool(&self, section: &str, key: &str) -> Result<Option<bool>, MtfError>;
}
