//! Seed catalog loaded at startup

use crate::domain::{Book, Member};

pub fn seed_books() -> Vec<Book> {
    vec![
        Book::new("JK-45", "Harry Potter", "J.K Rowling", 1),
        Book::new("SHR-1", "A Study in Scarlet", "Arthur Conan Doyle", 1),
        Book::new("TW-11", "Twilight", "Stephenie Meyer", 1),
        Book::new("HOB-83", "The Hobbit, or There and Back Again", "J.R.R. Tolkien", 1),
        Book::new("NRN-7", "The Lion, the Witch and the Wardrobe", "C.S. Lewis", 1),
    ]
}

pub fn seed_members() -> Vec<Member> {
    vec![
        Member::new("M001", "Angga"),
        Member::new("M002", "Ferry"),
        Member::new("M003", "Putri"),
    ]
}
