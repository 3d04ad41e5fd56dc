// In-memory library server shared by the integration tests.
// Implements Transport with the same envelopes the real API returns.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Value, json};
use tokio::sync::watch;

use shelf::api::{ApiRequest, Book, BookInput, BorrowRequest, Envelope, Genre, Method, Transport};
use shelf::cache::QueryCache;
use shelf::library::Library;
use shelf::{Result, ShelfError};

#[derive(Default)]
struct Db {
    books: Vec<Book>,
    /// Borrowed quantity per book id, in first-borrow order.
    borrows: Vec<(String, u32)>,
    next_id: u32,
}

/// Fake server. Requests can be held at a gate and the next one can be made to fail.
pub struct FakeServer {
    db: Mutex<Db>,
    calls: Mutex<Vec<String>>,
    gate: watch::Sender<bool>,
    fail_next: Mutex<Option<String>>,
}

impl FakeServer {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            db: Mutex::new(Db::default()),
            calls: Mutex::new(Vec::new()),
            gate: watch::channel(true).0,
            fail_next: Mutex::new(None),
        })
    }

    /// Seed a book directly, bypassing the API. Returns its id.
    pub fn seed(&self, title: &str, isbn: &str, copies: u32) -> String {
        let mut db = self.db.lock().unwrap();
        let id = next_id(&mut db);
        db.books.push(Book {
            id: id.clone(),
            title: title.to_string(),
            author: "Seeded Author".to_string(),
            genre: Genre::Fiction,
            isbn: isbn.to_string(),
            description: "Seeded description".to_string(),
            copies,
            available: copies > 0,
            created_at: Some(Utc::now()),
            updated_at: Some(Utc::now()),
        });
        id
    }

    /// Every request received so far, e.g. `GET books?page=1&limit=10`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Number of requests whose display form starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.starts_with(prefix))
            .count()
    }

    /// Hold requests until [`release`](Self::release).
    pub fn hold(&self) {
        self.gate.send_replace(false);
    }

    pub fn release(&self) {
        self.gate.send_replace(true);
    }

    /// Make the next request fail with a 500 and `message`.
    pub fn fail_next(&self, message: &str) {
        *self.fail_next.lock().unwrap() = Some(message.to_string());
    }

    pub fn book(&self, id: &str) -> Option<Book> {
        self.db
            .lock()
            .unwrap()
            .books
            .iter()
            .find(|b| b.id == id)
            .cloned()
    }

    fn handle(&self, request: &ApiRequest) -> Result<Envelope<Value>> {
        let mut db = self.db.lock().unwrap();
        let segments: Vec<&str> = request.path.split('/').collect();

        match (request.method, segments.as_slice()) {
            (Method::Get, ["books"]) => {
                let page: usize = param(request, "page", 1);
                let limit: usize = param(request, "limit", 10).max(1);
                let total_pages = db.books.len().div_ceil(limit).max(1);
                let books: Vec<&Book> = db
                    .books
                    .iter()
                    .skip((page.saturating_sub(1)) * limit)
                    .take(limit)
                    .collect();
                let mut envelope = Envelope::ok("Books retrieved successfully", json!(books));
                envelope.total_pages = Some(total_pages as u32);
                Ok(envelope)
            }
            (Method::Get, ["books", id]) => {
                let book = find(&db, id)?;
                Ok(Envelope::ok("Book retrieved successfully", json!(book)))
            }
            (Method::Post, ["books"]) => {
                let input: BookInput = body(request)?;
                let id = next_id(&mut db);
                let now = Utc::now();
                let book = Book {
                    id,
                    title: input.title,
                    author: input.author,
                    genre: input.genre,
                    isbn: input.isbn,
                    description: input.description,
                    copies: input.copies,
                    available: input.copies > 0 && input.available,
                    created_at: Some(now),
                    updated_at: Some(now),
                };
                db.books.push(book.clone());
                Ok(Envelope::ok("Book created successfully", json!(book)))
            }
            (Method::Put, ["books", id]) => {
                let input: BookInput = body(request)?;
                let book = db
                    .books
                    .iter_mut()
                    .find(|b| b.id == *id)
                    .ok_or_else(|| ShelfError::api(Some(404), "Book not found"))?;
                book.title = input.title;
                book.author = input.author;
                book.genre = input.genre;
                book.isbn = input.isbn;
                book.description = input.description;
                book.copies = input.copies;
                book.available = input.copies > 0 && input.available;
                book.updated_at = Some(Utc::now());
                Ok(Envelope::ok("Book updated successfully", json!(book)))
            }
            (Method::Delete, ["books", id]) => {
                let before = db.books.len();
                db.books.retain(|b| b.id != *id);
                if db.books.len() == before {
                    return Err(ShelfError::api(Some(404), "Book not found"));
                }
                Ok(Envelope::message("Book deleted successfully"))
            }
            (Method::Post, ["borrow"]) => {
                let borrow: BorrowRequest = body(request)?;
                let book = db
                    .books
                    .iter_mut()
                    .find(|b| b.id == borrow.book)
                    .ok_or_else(|| ShelfError::api(Some(404), "Book not found"))?;
                if borrow.quantity > book.copies {
                    return Err(ShelfError::api(Some(400), "Not enough copies available"));
                }
                book.copies -= borrow.quantity;
                if book.copies == 0 {
                    book.available = false;
                }

                let existing = db.borrows.iter().position(|(id, _)| *id == borrow.book);
                match existing {
                    Some(i) => db.borrows[i].1 += borrow.quantity,
                    None => db.borrows.push((borrow.book.clone(), borrow.quantity)),
                }
                Ok(Envelope::ok("Book borrowed successfully", json!(borrow)))
            }
            (Method::Get, ["borrow"]) => {
                let titles: HashMap<&str, &Book> =
                    db.books.iter().map(|b| (b.id.as_str(), b)).collect();
                let summary: Vec<Value> = db
                    .borrows
                    .iter()
                    .filter_map(|(id, total)| {
                        titles.get(id.as_str()).map(|book| {
                            json!({
                                "book": { "title": book.title, "isbn": book.isbn },
                                "totalQuantity": total
                            })
                        })
                    })
                    .collect();
                Ok(Envelope::ok("Borrowed books summary retrieved successfully", json!(summary)))
            }
            _ => Err(ShelfError::api(Some(404), "Route not found")),
        }
    }
}

#[async_trait]
impl Transport for FakeServer {
    async fn send(&self, request: ApiRequest) -> Result<Envelope<Value>> {
        self.calls.lock().unwrap().push(request.to_string());

        let mut gate = self.gate.subscribe();
        let _ = gate.wait_for(|open| *open).await;

        if let Some(message) = self.fail_next.lock().unwrap().take() {
            return Err(ShelfError::api(Some(500), message));
        }
        self.handle(&request)
    }
}

fn next_id(db: &mut Db) -> String {
    db.next_id += 1;
    format!("book-{}", db.next_id)
}

fn find<'a>(db: &'a Db, id: &str) -> Result<&'a Book> {
    db.books
        .iter()
        .find(|b| b.id == id)
        .ok_or_else(|| ShelfError::api(Some(404), "Book not found"))
}

fn param(request: &ApiRequest, key: &str, default: usize) -> usize {
    request
        .param(key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn body<T: serde::de::DeserializeOwned>(request: &ApiRequest) -> Result<T> {
    let value = request
        .body
        .clone()
        .ok_or_else(|| ShelfError::api(Some(400), "Missing body"))?;
    Ok(serde_json::from_value(value)?)
}

/// A library wired to a fresh fake server.
pub fn library() -> (Arc<FakeServer>, Library) {
    let server = FakeServer::new();
    let cache = QueryCache::new(server.clone());
    (server, Library::new(cache))
}

/// A valid new book.
pub fn new_book(title: &str, isbn: &str, copies: u32) -> BookInput {
    BookInput {
        title: title.to_string(),
        author: "Author".to_string(),
        genre: Genre::Science,
        isbn: isbn.to_string(),
        description: "A book".to_string(),
        copies,
        available: true,
    }
}

/// Poll until `check` holds, yielding to background fetches in between.
pub async fn eventually(mut check: impl FnMut() -> bool) {
    for _ in 0..1000 {
        if check() {
            return;
        }
        tokio::task::yield_now().await;
    }
    panic!("condition not reached");
}
