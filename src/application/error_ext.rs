//! Path context for I/O errors raised while reading documents and framework definitions

use std::io;
use std::path::Path;

use crate::application::{ApplicationError, ApplicationResult};

pub trait IoResultExt<T> {
    /// Wrap an I/O error as [`ApplicationError::OperationFailed`] naming the action and path.
    ///
    /// # Example
    /// ```ignore
    /// let content = fs
    ///     .read_to_string(&path)
    ///     .with_path_context("read framework", &path)?;
    /// ```
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T>;
}

impl<T> IoResultExt<T> for io::Result<T> {
    fn with_path_context(self, action: &str, path: &Path) -> ApplicationResult<T> {
        self.map_err(|e| ApplicationError::OperationFailed {
            context: format!("{action} {}", path.display()),
            source: Box::new(e),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_missing_file_when_adding_context_then_message_names_action_and_path() {
        let path = Path::new("frameworks/review.json");
        let result: io::Result<String> = Err(io::Error::new(io::ErrorKind::NotFound, "gone"));

        let err = result.with_path_context("read framework", path).unwrap_err();

        assert!(matches!(
            &err,
            ApplicationError::OperationFailed { context, .. }
                if context == "read framework frameworks/review.json"
        ));
    }
}
