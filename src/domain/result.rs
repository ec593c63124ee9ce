//! Result type alias
//!
//! This module provides a convenient Result type alias that uses `OdmError`
//! as the error type.

use super::errors::OdmError;

/// Result type alias for exporter operations
///
/// # Examples
///
/// ```
/// use odm_i2b2::domain::result::Result;
/// use odm_i2b2::domain::errors::OdmError;
///
/// fn example_function() -> Result<String> {
///     Ok("success".to_string())
/// }
///
/// fn failing_function() -> Result<()> {
///     Err(OdmError::Configuration("Invalid input".to_string()))
/// }
/// ```
pub type Result<T> = std::result::Result<T, OdmError>;
