// State management module.
// Handles navigation, paging, forms, and the activity log for the UI.

pub mod books;
pub mod console;
pub mod form;
pub mod navigation;

pub use books::BooksTabState;
pub use console::{ConsoleLevel, ConsoleLog, ConsoleMessage, Toast};
pub use form::{BookField, BookForm, BorrowField, BorrowForm, FormMode};
pub use navigation::{BreadcrumbNode, NavigationStack, ViewLevel};
