// Form state for the book editor and borrow dialogs.
// Holds raw field text, focus, and the inline validation message.

use chrono::NaiveDate;

use crate::api::{Book, BookInput, Genre};
use crate::validate::{self, ValidationError};

/// Fields of the book editor, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookField {
    Title,
    Author,
    Genre,
    Isbn,
    Description,
    Copies,
    Available,
}

impl BookField {
    pub const ALL: [BookField; 7] = [
        BookField::Title,
        BookField::Author,
        BookField::Genre,
        BookField::Isbn,
        BookField::Description,
        BookField::Copies,
        BookField::Available,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            BookField::Title => "Title",
            BookField::Author => "Author",
            BookField::Genre => "Genre",
            BookField::Isbn => "ISBN",
            BookField::Description => "Description",
            BookField::Copies => "Copies",
            BookField::Available => "Available",
        }
    }

    fn index(&self) -> usize {
        Self::ALL.iter().position(|f| f == self).unwrap_or(0)
    }

    pub fn next(&self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    pub fn prev(&self) -> Self {
        Self::ALL[(self.index() + Self::ALL.len() - 1) % Self::ALL.len()]
    }
}

/// Whether the editor creates a book or edits an existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormMode {
    Add,
    Edit { id: String },
}

/// Book editor state.
#[derive(Debug, Clone)]
pub struct BookForm {
    pub mode: FormMode,
    pub title: String,
    pub author: String,
    pub genre: Genre,
    pub isbn: String,
    pub description: String,
    pub copies: String,
    pub available: bool,
    pub focus: BookField,
    pub error: Option<String>,
    /// A request is in flight; input is ignored until it finishes.
    pub submitting: bool,
}

impl BookForm {
    /// Blank form for a new book.
    pub fn add() -> Self {
        Self {
            mode: FormMode::Add,
            title: String::new(),
            author: String::new(),
            genre: Genre::Science,
            isbn: String::new(),
            description: String::new(),
            copies: "0".to_string(),
            available: true,
            focus: BookField::Title,
            error: None,
            submitting: false,
        }
    }

    /// Form prefilled from an existing book.
    pub fn edit(book: &Book) -> Self {
        // Genres the editor can't offer fall back to the default.
        let genre = if book.genre == Genre::Unknown {
            Genre::default()
        } else {
            book.genre
        };
        Self {
            mode: FormMode::Edit {
                id: book.id.clone(),
            },
            title: book.title.clone(),
            author: book.author.clone(),
            genre,
            isbn: book.isbn.clone(),
            description: book.description.clone(),
            copies: book.copies.to_string(),
            available: book.available,
            focus: BookField::Title,
            error: None,
            submitting: false,
        }
    }

    pub fn heading(&self) -> &'static str {
        match self.mode {
            FormMode::Add => "Add New Book",
            FormMode::Edit { .. } => "Edit Book",
        }
    }

    /// Display text for a field.
    pub fn value(&self, field: BookField) -> String {
        match field {
            BookField::Title => self.title.clone(),
            BookField::Author => self.author.clone(),
            BookField::Genre => format!("< {} >", self.genre),
            BookField::Isbn => self.isbn.clone(),
            BookField::Description => self.description.clone(),
            BookField::Copies => self.copies.clone(),
            BookField::Available => if self.available { "[x]" } else { "[ ]" }.to_string(),
        }
    }

    fn text_mut(&mut self, field: BookField) -> Option<&mut String> {
        match field {
            BookField::Title => Some(&mut self.title),
            BookField::Author => Some(&mut self.author),
            BookField::Isbn => Some(&mut self.isbn),
            BookField::Description => Some(&mut self.description),
            BookField::Copies => Some(&mut self.copies),
            BookField::Genre | BookField::Available => None,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = self.focus.next();
    }

    pub fn focus_prev(&mut self) {
        self.focus = self.focus.prev();
    }

    /// Type a character into the focused field.
    pub fn input(&mut self, c: char) {
        self.error = None;
        match self.focus {
            BookField::Available if c == ' ' => self.available = !self.available,
            BookField::Copies if !c.is_ascii_digit() => {}
            BookField::Isbn if !c.is_ascii_digit() => {}
            field => {
                if let Some(text) = self.text_mut(field) {
                    // Replace the placeholder zero rather than appending to it.
                    if field == BookField::Copies && text == "0" {
                        text.clear();
                    }
                    text.push(c);
                }
            }
        }
    }

    pub fn backspace(&mut self) {
        self.error = None;
        if let Some(text) = self.text_mut(self.focus) {
            text.pop();
        }
    }

    /// Cycle the genre when it has focus.
    pub fn cycle_genre(&mut self, forward: bool) {
        if self.focus == BookField::Genre {
            self.genre = if forward {
                self.genre.next()
            } else {
                self.genre.prev()
            };
        }
    }

    /// Parse and validate the form for its mode.
    pub fn submit(&self) -> Result<BookInput, ValidationError> {
        let copies = validate::parse_count(&self.copies, "copies")?;
        let input = BookInput {
            title: self.title.clone(),
            author: self.author.clone(),
            genre: self.genre,
            isbn: self.isbn.clone(),
            description: self.description.clone(),
            copies,
            available: self.available,
        };

        match self.mode {
            FormMode::Add => validate::validate_new_book(&input)?,
            FormMode::Edit { .. } => validate::validate_book_update(&input)?,
        }
        Ok(input)
    }
}

/// Fields of the borrow dialog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BorrowField {
    Quantity,
    DueDate,
}

/// Borrow dialog state.
#[derive(Debug, Clone)]
pub struct BorrowForm {
    /// The book as shown when the dialog opened; its copies bound the quantity.
    pub book: Book,
    pub quantity: String,
    pub due_date: String,
    pub focus: BorrowField,
    pub error: Option<String>,
    pub submitting: bool,
}

impl BorrowForm {
    pub fn new(book: Book) -> Self {
        Self {
            book,
            quantity: "1".to_string(),
            due_date: String::new(),
            focus: BorrowField::Quantity,
            error: None,
            submitting: false,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            BorrowField::Quantity => BorrowField::DueDate,
            BorrowField::DueDate => BorrowField::Quantity,
        };
    }

    pub fn input(&mut self, c: char) {
        self.error = None;
        match self.focus {
            BorrowField::Quantity if c.is_ascii_digit() => self.quantity.push(c),
            BorrowField::DueDate if c.is_ascii_digit() || c == '-' => self.due_date.push(c),
            _ => {}
        }
    }

    pub fn backspace(&mut self) {
        self.error = None;
        match self.focus {
            BorrowField::Quantity => self.quantity.pop(),
            BorrowField::DueDate => self.due_date.pop(),
        };
    }

    /// Validate quantity and due date against the copies shown to the user.
    pub fn submit(&self) -> Result<(u32, NaiveDate), ValidationError> {
        // Blank or unparsable quantities count as zero, which is out of range.
        let quantity = self.quantity.trim().parse::<u32>().unwrap_or(0);
        let due_date = validate::parse_due_date(&self.due_date)?;
        let due_date = validate::validate_borrow(&self.book, quantity, due_date)?;
        Ok((quantity, due_date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn book(copies: u32) -> Book {
        Book {
            id: "b1".to_string(),
            title: "A".to_string(),
            author: "Anon".to_string(),
            genre: Genre::Unknown,
            isbn: "1234567890".to_string(),
            description: "Short".to_string(),
            copies,
            available: true,
            created_at: None,
            updated_at: None,
        }
    }

    fn type_text(form: &mut BookForm, text: &str) {
        for c in text.chars() {
            form.input(c);
        }
    }

    #[test]
    fn test_add_form_flow() {
        let mut form = BookForm::add();
        assert_eq!(form.heading(), "Add New Book");

        type_text(&mut form, "Dune");
        form.focus_next();
        type_text(&mut form, "Frank Herbert");
        form.focus_next();
        form.cycle_genre(true);
        assert_eq!(form.genre, Genre::Fiction);
        form.focus_next();
        type_text(&mut form, "978-0441013593");
        assert_eq!(form.isbn, "9780441013593");
        form.focus_next();
        type_text(&mut form, "Desert planet");
        form.focus_next();
        type_text(&mut form, "3x");
        assert_eq!(form.copies, "3");
        form.focus_next();
        form.input(' ');
        assert!(!form.available);

        let input = form.submit().unwrap();
        assert_eq!(input.title, "Dune");
        assert_eq!(input.copies, 3);
        assert!(!input.available);
    }

    #[test]
    fn test_add_form_reports_first_missing_field() {
        let mut form = BookForm::add();
        type_text(&mut form, "Dune");
        assert_eq!(
            form.submit().unwrap_err().to_string(),
            "Please fill out the author field."
        );
    }

    #[test]
    fn test_edit_form_allows_zero_copies() {
        let mut form = BookForm::edit(&book(0));
        assert_eq!(form.heading(), "Edit Book");
        assert_eq!(form.genre, Genre::Science);
        assert_eq!(form.mode, FormMode::Edit { id: "b1".to_string() });
        assert_eq!(form.submit().unwrap().copies, 0);

        form.focus = BookField::Isbn;
        form.backspace();
        assert_eq!(form.submit(), Err(ValidationError::InvalidIsbn));
    }

    #[test]
    fn test_field_cycle_wraps() {
        assert_eq!(BookField::Available.next(), BookField::Title);
        assert_eq!(BookField::Title.prev(), BookField::Available);
    }

    #[test]
    fn test_borrow_form_validation() {
        let mut form = BorrowForm::new(book(3));
        assert_eq!(form.submit(), Err(ValidationError::MissingDueDate));

        form.toggle_focus();
        for c in "2026-11-01".chars() {
            form.input(c);
        }
        assert_eq!(
            form.submit(),
            Ok((1, NaiveDate::from_ymd_opt(2026, 11, 1).unwrap()))
        );

        form.toggle_focus();
        form.backspace();
        form.input('5');
        assert_eq!(
            form.submit().unwrap_err().to_string(),
            "Quantity must be between 1 and 3"
        );

        form.backspace();
        assert_eq!(
            form.submit(),
            Err(ValidationError::QuantityOutOfRange { max: 3 })
        );
    }
}
