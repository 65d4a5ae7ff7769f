use async_trait::async_trait;
use sqlx::SqlitePool;

use crimson_core::catalog::{Author, Book, NewAuthor};
use crimson_core::repository::CatalogRepository;
use crimson_core::StoreError;

use crate::database::map_db_err;

pub struct SqliteCatalogRepository {
    pool: SqlitePool,
}

impl SqliteCatalogRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct BookRow {
    isbn: String,
    title: String,
    course: String,
    major: String,
    image_url: Option<String>,
}

impl From<BookRow> for Book {
    fn from(row: BookRow) -> Self {
        Book {
            isbn: row.isbn,
            title: row.title,
            course: row.course,
            major: row.major,
            image_url: row.image_url,
        }
    }
}

#[derive(sqlx::FromRow)]
struct AuthorRow {
    author_id: i64,
    isbn: String,
    first_name: String,
    last_name: String,
}

impl From<AuthorRow> for Author {
    fn from(row: AuthorRow) -> Self {
        Author {
            author_id: row.author_id,
            isbn: row.isbn,
            first_name: row.first_name,
            last_name: row.last_name,
        }
    }
}

#[async_trait]
impl CatalogRepository for SqliteCatalogRepository {
    async fn list_books(&self) -> Result<Vec<Book>, StoreError> {
        let rows: Vec<BookRow> =
            sqlx::query_as("SELECT isbn, title, course, major, image_url FROM books ORDER BY title")
                .fetch_all(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Book::from).collect())
    }

    async fn get_book(&self, isbn: &str) -> Result<Option<Book>, StoreError> {
        let row: Option<BookRow> =
            sqlx::query_as("SELECT isbn, title, course, major, image_url FROM books WHERE isbn = ?")
                .bind(isbn)
                .fetch_optional(&self.pool)
                .await
                .map_err(map_db_err)?;
        Ok(row.map(Book::from))
    }

    async fn create_book(&self, book: &Book) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO books (isbn, title, course, major, image_url) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&book.isbn)
        .bind(&book.title)
        .bind(&book.course)
        .bind(&book.major)
        .bind(&book.image_url)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(())
    }

    async fn update_book(&self, book: &Book) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE books SET title = ?, course = ?, major = ?, image_url = ? WHERE isbn = ?",
        )
        .bind(&book.title)
        .bind(&book.course)
        .bind(&book.major)
        .bind(&book.image_url)
        .bind(&book.isbn)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("book", &book.isbn));
        }
        Ok(())
    }

    async fn delete_book(&self, isbn: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM books WHERE isbn = ?")
            .bind(isbn)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("book", isbn));
        }
        Ok(())
    }

    async fn list_authors(&self) -> Result<Vec<Author>, StoreError> {
        let rows: Vec<AuthorRow> = sqlx::query_as(
            "SELECT author_id, isbn, first_name, last_name FROM authors ORDER BY author_id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Author::from).collect())
    }

    async fn list_authors_by_isbn(&self, isbn: &str) -> Result<Vec<Author>, StoreError> {
        let rows: Vec<AuthorRow> = sqlx::query_as(
            "SELECT author_id, isbn, first_name, last_name FROM authors WHERE isbn = ? ORDER BY author_id",
        )
        .bind(isbn)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_err)?;
        Ok(rows.into_iter().map(Author::from).collect())
    }

    async fn create_author(&self, author: &NewAuthor) -> Result<Author, StoreError> {
        let result =
            sqlx::query("INSERT INTO authors (isbn, first_name, last_name) VALUES (?, ?, ?)")
                .bind(&author.isbn)
                .bind(&author.first_name)
                .bind(&author.last_name)
                .execute(&self.pool)
                .await
                .map_err(map_db_err)?;

        Ok(Author {
            author_id: result.last_insert_rowid(),
            isbn: author.isbn.clone(),
            first_name: author.first_name.clone(),
            last_name: author.last_name.clone(),
        })
    }

    async fn update_author(&self, author: &Author) -> Result<(), StoreError> {
        let result = sqlx::query(
            "UPDATE authors SET isbn = ?, first_name = ?, last_name = ? WHERE author_id = ?",
        )
        .bind(&author.isbn)
        .bind(&author.first_name)
        .bind(&author.last_name)
        .bind(author.author_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("author", author.author_id));
        }
        Ok(())
    }

    async fn delete_author(&self, author_id: i64) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM authors WHERE author_id = ?")
            .bind(author_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_err)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::not_found("author", author_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::DbClient;

    fn book(isbn: &str, title: &str) -> Book {
        Book {
            isbn: isbn.to_string(),
            title: title.to_string(),
            course: "CS 101".to_string(),
            major: "Computer Science".to_string(),
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_book_crud() {
        let db = DbClient::in_memory().await.unwrap();
        let repo = SqliteCatalogRepository::new(db.pool);

        repo.create_book(&book("9780131103627", "The C Programming Language"))
            .await
            .unwrap();
        assert_eq!(repo.list_books().await.unwrap().len(), 1);

        let mut updated = book("9780131103627", "The C Programming Language, 2nd Edition");
        updated.image_url = Some("https://covers.example/k-and-r.jpg".to_string());
        repo.update_book(&updated).await.unwrap();

        let fetched = repo.get_book("9780131103627").await.unwrap().unwrap();
        assert_eq!(fetched.title, "The C Programming Language, 2nd Edition");
        assert!(fetched.image_url.is_some());

        repo.delete_book("9780131103627").await.unwrap();
        assert!(repo.get_book("9780131103627").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_isbn_is_constraint() {
        let db = DbClient::in_memory().await.unwrap();
        let repo = SqliteCatalogRepository::new(db.pool);

        repo.create_book(&book("9780131103627", "K&R")).await.unwrap();
        let err = repo
            .create_book(&book("9780131103627", "K&R again"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Constraint(_)));
    }

    #[tokio::test]
    async fn test_authors_follow_their_book() {
        let db = DbClient::in_memory().await.unwrap();
        let repo = SqliteCatalogRepository::new(db.pool);
        repo.create_book(&book("9780131103627", "K&R")).await.unwrap();

        let kernighan = repo
            .create_author(&NewAuthor {
                isbn: "9780131103627".to_string(),
                first_name: "Brian".to_string(),
                last_name: "Kernighan".to_string(),
            })
            .await
            .unwrap();
        repo.create_author(&NewAuthor {
            isbn: "9780131103627".to_string(),
            first_name: "Dennis".to_string(),
            last_name: "Ritchie".to_string(),
        })
        .await
        .unwrap();

        assert_eq!(
            repo.list_authors_by_isbn("9780131103627").await.unwrap().len(),
            2
        );

        repo.delete_author(kernighan.author_id).await.unwrap();
        assert_eq!(repo.list_authors().await.unwrap().len(), 1);

        // ON DELETE CASCADE clears the rest.
        repo.delete_book("9780131103627").await.unwrap();
        assert!(repo.list_authors().await.unwrap().is_empty());
    }
}
